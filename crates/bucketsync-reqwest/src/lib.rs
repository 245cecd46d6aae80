//! Reqwest-based storage API client for bucketsync.
//!
//! This crate provides [`ReqwestClient`], an implementation of
//! [`bucketsync_core::StorageProvider`] for the storage REST API of a
//! hosted Postgres backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use bucketsync_reqwest::{ReqwestClient, ReqwestConfig, StorageEndpoint};
//!
//! let endpoint = StorageEndpoint::parse("https://abc.supabase.co", service_key)?;
//! let client = ReqwestClient::new(endpoint, ReqwestConfig::default())?;
//!
//! // Convert to a labelled service for the migration pipeline
//! let source = client.into_service("source");
//! let buckets = source.list_buckets().await?;
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod connect;
mod error;
mod service;

pub use crate::connect::{ReqwestClient, ReqwestConfig, StorageEndpoint, TRACING_TARGET};
pub use crate::error::{Error, Result};
