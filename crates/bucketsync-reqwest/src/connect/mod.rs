//! Reqwest client module.
//!
//! This module provides the client handle bound to one storage project and
//! the HTTP settings shared by all clients.

mod client;
mod config;

pub use client::{ReqwestClient, TRACING_TARGET};
pub use config::{ReqwestConfig, StorageEndpoint};
