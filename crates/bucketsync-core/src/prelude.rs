//! Convenient re-exports for common use.

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::provider::StorageProvider;
pub use crate::retry::RetryPolicy;
pub use crate::service::StorageService;
pub use crate::types::{
    BucketInfo, CreateBucket, ListEntry, ListOptions, ObjectBody, ObjectPath, UploadOptions,
};
