//! Storage provider trait.

use crate::Result;
use crate::types::{BucketInfo, CreateBucket, ListEntry, ListOptions, ObjectBody, UploadOptions};

/// Core trait for object storage backends.
///
/// Implement this trait to plug a storage API into the migration pipeline.
/// Each method is a single remote call; retries are layered on top by the
/// caller through [`crate::retry`].
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    /// Lists all buckets visible to the configured credentials.
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;

    /// Creates a bucket.
    ///
    /// Returns an [`ErrorKind::AlreadyExists`](crate::ErrorKind::AlreadyExists)
    /// error when the bucket is already present.
    async fn create_bucket(&self, request: &CreateBucket) -> Result<()>;

    /// Lists the immediate children of `prefix` in `bucket`.
    ///
    /// The empty prefix denotes the bucket root.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> Result<Vec<ListEntry>>;

    /// Downloads the full body of an object.
    async fn download(&self, bucket: &str, path: &str) -> Result<ObjectBody>;

    /// Uploads an object.
    ///
    /// When `options.upsert` is false and the object exists the provider
    /// returns an already exists error instead of overwriting.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: ObjectBody,
        options: &UploadOptions,
    ) -> Result<()>;
}
