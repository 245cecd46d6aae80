#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for storage calls made through [`StorageService`].
pub const TRACING_TARGET_STORAGE: &str = "bucketsync_core::storage";

/// Tracing target for retry attempts.
pub const TRACING_TARGET_RETRY: &str = "bucketsync_core::retry";

mod error;
mod provider;
mod service;

pub mod retry;
pub mod types;

#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

#[doc(hidden)]
pub mod prelude;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use provider::StorageProvider;
pub use retry::RetryPolicy;
pub use service::StorageService;
