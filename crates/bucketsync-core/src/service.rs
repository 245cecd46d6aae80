//! Shared handle to a storage provider.

use std::fmt;
use std::sync::Arc;

use crate::provider::StorageProvider;
use crate::types::{BucketInfo, CreateBucket, ListEntry, ListOptions, ObjectBody, UploadOptions};
use crate::{Result, TRACING_TARGET_STORAGE};

/// Cheaply cloneable handle to a [`StorageProvider`].
///
/// Carries a label (for example `source` or `destination`) that is attached
/// to every log line and error produced through the handle.
#[derive(Clone)]
pub struct StorageService {
    inner: Arc<dyn StorageProvider>,
    label: &'static str,
}

impl fmt::Debug for StorageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageService")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl StorageService {
    /// Wraps a provider under the given label.
    pub fn new(provider: impl StorageProvider + 'static, label: &'static str) -> Self {
        Self {
            inner: Arc::new(provider),
            label,
        }
    }

    /// Wraps an already shared provider under the given label.
    pub fn from_arc(provider: Arc<dyn StorageProvider>, label: &'static str) -> Self {
        Self {
            inner: provider,
            label,
        }
    }

    /// Returns the label of this handle.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Lists all buckets.
    pub async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        tracing::debug!(
            target: TRACING_TARGET_STORAGE,
            storage = self.label,
            "Listing buckets"
        );

        self.inner
            .list_buckets()
            .await
            .map_err(|e| e.with_context(self.label))
    }

    /// Creates a bucket.
    pub async fn create_bucket(&self, request: &CreateBucket) -> Result<()> {
        tracing::debug!(
            target: TRACING_TARGET_STORAGE,
            storage = self.label,
            bucket = %request.id,
            public = request.public,
            "Creating bucket"
        );

        self.inner
            .create_bucket(request)
            .await
            .map_err(|e| e.with_context(format!("{}: {}", self.label, request.id)))
    }

    /// Lists the immediate children of a prefix.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> Result<Vec<ListEntry>> {
        tracing::debug!(
            target: TRACING_TARGET_STORAGE,
            storage = self.label,
            bucket = %bucket,
            prefix = %prefix,
            limit = options.limit,
            offset = options.offset,
            search = ?options.search,
            "Listing objects"
        );

        self.inner
            .list_objects(bucket, prefix, options)
            .await
            .map_err(|e| e.with_context(format!("{}: {bucket}/{prefix}", self.label)))
    }

    /// Downloads an object.
    pub async fn download(&self, bucket: &str, path: &str) -> Result<ObjectBody> {
        tracing::debug!(
            target: TRACING_TARGET_STORAGE,
            storage = self.label,
            bucket = %bucket,
            path = %path,
            "Downloading object"
        );

        self.inner
            .download(bucket, path)
            .await
            .map_err(|e| e.with_context(format!("{}: {bucket}/{path}", self.label)))
    }

    /// Uploads an object.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: ObjectBody,
        options: &UploadOptions,
    ) -> Result<()> {
        tracing::debug!(
            target: TRACING_TARGET_STORAGE,
            storage = self.label,
            bucket = %bucket,
            path = %path,
            size = body.len(),
            content_type = ?body.content_type,
            upsert = options.upsert,
            "Uploading object"
        );

        self.inner
            .upload(bucket, path, body, options)
            .await
            .map_err(|e| e.with_context(format!("{}: {bucket}/{path}", self.label)))
    }
}
