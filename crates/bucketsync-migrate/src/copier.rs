//! Single-object copy with an idempotency gate.

use bucketsync_core::types::{ObjectBody, ObjectPath, UploadOptions};
use bucketsync_core::{Error, ErrorKind, Result, RetryPolicy, StorageService};

use crate::{CopyOutcome, ExistenceChecker, MigrationOptions, TRACING_TARGET_COPIER};

/// Copies objects from a source to a destination storage.
///
/// Objects already present at the destination are never uploaded again,
/// and uploads never overwrite, so a copy can be repeated safely.
#[derive(Debug, Clone)]
pub struct ObjectCopier {
    source: StorageService,
    destination: StorageService,
    exists: ExistenceChecker,
    retry: RetryPolicy,
    dry_run: bool,
    upload: UploadOptions,
}

impl ObjectCopier {
    /// Creates a copier between two storages.
    pub fn new(
        source: StorageService,
        destination: StorageService,
        options: &MigrationOptions,
    ) -> Self {
        let exists =
            ExistenceChecker::new(destination.clone(), options.retry, options.page_size);
        let upload = UploadOptions::create_only().with_cache_control(&options.cache_control);

        Self {
            source,
            destination,
            exists,
            retry: options.retry,
            dry_run: options.dry_run,
            upload,
        }
    }

    /// Copies `path` of `bucket`.
    ///
    /// `destination_missing` tells the copier that the destination bucket
    /// does not exist yet (it is only planned in dry-run mode), so the
    /// existence check can be skipped.
    ///
    /// # Errors
    ///
    /// Returns the error of the existence check, the download or the upload
    /// once retries are exhausted. An empty download is an
    /// [`ErrorKind::EmptyBody`] error. Upload conflicts are not errors.
    pub async fn copy(
        &self,
        bucket: &str,
        path: &ObjectPath,
        destination_missing: bool,
    ) -> Result<CopyOutcome> {
        if !destination_missing && self.exists.exists(bucket, path).await? {
            tracing::debug!(
                target: TRACING_TARGET_COPIER,
                bucket = %bucket,
                path = %path,
                "Object already present at destination"
            );
            return Ok(CopyOutcome::SkippedExists);
        }

        if self.dry_run {
            tracing::info!(
                target: TRACING_TARGET_COPIER,
                bucket = %bucket,
                path = %path,
                "[dry-run] copy {bucket}/{path}"
            );
            return Ok(CopyOutcome::SkippedDryRun);
        }

        let body = self.download(bucket, path).await?;
        let size = body.len();

        match self.upload(bucket, path, body).await {
            Ok(()) => {
                tracing::debug!(
                    target: TRACING_TARGET_COPIER,
                    bucket = %bucket,
                    path = %path,
                    bytes = size,
                    "Object copied"
                );
                Ok(CopyOutcome::Copied)
            }
            Err(error) if error.is_already_exists() => {
                tracing::debug!(
                    target: TRACING_TARGET_COPIER,
                    bucket = %bucket,
                    path = %path,
                    "Upload conflicted with an existing object"
                );
                Ok(CopyOutcome::SkippedExists)
            }
            Err(error) => Err(error),
        }
    }

    async fn download(&self, bucket: &str, path: &ObjectPath) -> Result<ObjectBody> {
        let body = self
            .retry
            .run("download", || self.source.download(bucket, path.as_str()))
            .await?;

        if body.is_empty() {
            return Err(Error::new(ErrorKind::EmptyBody)
                .with_message("download returned no bytes")
                .with_context(format!("{bucket}/{path}")));
        }
        Ok(body)
    }

    async fn upload(&self, bucket: &str, path: &ObjectPath, body: ObjectBody) -> Result<()> {
        let options = self.upload.clone().with_content_type(body.content_type.clone());
        self.retry
            .run("upload", || {
                self.destination
                    .upload(bucket, path.as_str(), body.clone(), &options)
            })
            .await
    }
}
