//! Bucket orchestration.

use bucketsync_core::types::{BucketInfo, CreateBucket};
use bucketsync_core::{Result, StorageService};

use crate::{
    BucketSummary, CopyOutcome, MigrationOptions, MigrationSummary, ObjectCopier, ObjectLister,
    TRACING_TARGET_MIGRATOR,
};

/// State of a destination bucket after the ensure step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationBucket {
    /// The bucket already existed.
    Present,
    /// The bucket was created by this run.
    Created,
    /// Dry-run mode: the bucket is missing and its creation was only logged.
    Planned,
}

impl DestinationBucket {
    /// Returns true if the bucket does not exist at the destination.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Planned)
    }
}

/// Migrates the selected buckets of a source storage into a destination.
///
/// Buckets and the objects inside them are processed one at a time. A
/// listing failure aborts the run; a failed object is counted and the walk
/// moves on to the next one.
#[derive(Debug, Clone)]
pub struct Migrator {
    source: StorageService,
    destination: StorageService,
    lister: ObjectLister,
    copier: ObjectCopier,
    options: MigrationOptions,
}

impl Migrator {
    /// Creates a migrator between two storages.
    pub fn new(
        source: StorageService,
        destination: StorageService,
        options: MigrationOptions,
    ) -> Self {
        let lister = ObjectLister::new(source.clone(), options.retry, options.page_size);
        let copier = ObjectCopier::new(source.clone(), destination.clone(), &options);

        Self {
            source,
            destination,
            lister,
            copier,
            options,
        }
    }

    /// Returns the run options.
    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Runs the migration over every selected bucket.
    ///
    /// # Errors
    ///
    /// Returns the first bucket-level error: listing the source buckets,
    /// ensuring a destination bucket, or listing a bucket's objects.
    pub async fn run(&self) -> Result<MigrationSummary> {
        let mode = if self.options.dry_run { "DRY RUN" } else { "COPY" };
        tracing::info!(
            target: TRACING_TARGET_MIGRATOR,
            source = self.source.label(),
            destination = self.destination.label(),
            mode,
            "Starting migration"
        );

        let buckets = self.select_buckets().await?;
        let mut summary = MigrationSummary::new();

        for bucket in &buckets {
            let bucket_summary = self.migrate_bucket(&bucket.id).await?;
            summary.insert(bucket.id.clone(), bucket_summary);
        }

        let totals = summary.totals();
        tracing::info!(
            target: TRACING_TARGET_MIGRATOR,
            buckets = summary.len(),
            total = totals.total,
            copied = totals.copied,
            skipped = totals.skipped,
            failed = totals.failed,
            "Migration finished"
        );

        Ok(summary)
    }

    /// Lists the source buckets and applies the allow-list.
    pub async fn select_buckets(&self) -> Result<Vec<BucketInfo>> {
        let buckets = self
            .options
            .retry
            .run("list_buckets", || self.source.list_buckets())
            .await?;
        let found = buckets.len();

        if let Some(allowed) = &self.options.bucket_allow_list {
            for name in allowed {
                if !buckets.iter().any(|b| &b.id == name) {
                    tracing::warn!(
                        target: TRACING_TARGET_MIGRATOR,
                        bucket = %name,
                        "Requested bucket not found in source"
                    );
                }
            }
        }

        let selected: Vec<BucketInfo> = buckets
            .into_iter()
            .filter(|b| self.options.is_selected(&b.id))
            .collect();

        tracing::info!(
            target: TRACING_TARGET_MIGRATOR,
            found,
            selected = selected.len(),
            buckets = ?selected.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(),
            "Source buckets"
        );

        Ok(selected)
    }

    /// Makes sure `bucket` exists at the destination.
    ///
    /// Missing buckets are created public. A conflict with a bucket created
    /// concurrently counts as present. In dry-run mode nothing is created.
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<DestinationBucket> {
        let existing = self
            .options
            .retry
            .run("list_buckets", || self.destination.list_buckets())
            .await?;

        if existing.iter().any(|b| b.id == bucket) {
            return Ok(DestinationBucket::Present);
        }

        if self.options.dry_run {
            tracing::info!(
                target: TRACING_TARGET_MIGRATOR,
                bucket = %bucket,
                "[dry-run] create bucket {bucket}"
            );
            return Ok(DestinationBucket::Planned);
        }

        match self
            .destination
            .create_bucket(&CreateBucket::public(bucket))
            .await
        {
            Ok(()) => {
                tracing::info!(
                    target: TRACING_TARGET_MIGRATOR,
                    bucket = %bucket,
                    "Created destination bucket"
                );
                Ok(DestinationBucket::Created)
            }
            Err(error) if error.is_already_exists() => Ok(DestinationBucket::Present),
            Err(error) => Err(error),
        }
    }

    /// Migrates every object of one bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination bucket cannot be ensured or the
    /// source bucket cannot be listed. Per-object failures are counted in
    /// the returned summary instead.
    pub async fn migrate_bucket(&self, bucket: &str) -> Result<BucketSummary> {
        tracing::info!(
            target: TRACING_TARGET_MIGRATOR,
            bucket = %bucket,
            "Migrating bucket"
        );

        let destination = self.ensure_bucket(bucket).await?;
        let paths = self.lister.list(bucket).await?;
        let total = paths.len();
        let interval = self.options.progress_interval.max(1);

        tracing::info!(
            target: TRACING_TARGET_MIGRATOR,
            bucket = %bucket,
            objects = total,
            "Objects found"
        );

        let mut summary = BucketSummary::with_total(total as u64);

        for (index, path) in paths.iter().enumerate() {
            let outcome = match self.copier.copy(bucket, path, destination.is_missing()).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::error!(
                        target: TRACING_TARGET_MIGRATOR,
                        bucket = %bucket,
                        path = %path,
                        error = %error,
                        "Failed to copy object"
                    );
                    CopyOutcome::Failed
                }
            };
            summary.record(outcome);

            let processed = index + 1;
            if processed % interval == 0 || processed == total {
                tracing::info!(
                    target: TRACING_TARGET_MIGRATOR,
                    bucket = %bucket,
                    processed,
                    total,
                    copied = summary.copied,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "Progress"
                );
            }
        }

        tracing::info!(
            target: TRACING_TARGET_MIGRATOR,
            bucket = %bucket,
            copied = summary.copied,
            skipped = summary.skipped,
            failed = summary.failed,
            "Bucket done"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bucketsync_core::ErrorKind;
    use bucketsync_core::RetryPolicy;
    use bucketsync_core::mock::{Fault, MemoryStorage, Operation, storage_with_paths};

    use super::*;

    fn migrator(
        source: &MemoryStorage,
        destination: &MemoryStorage,
        options: MigrationOptions,
    ) -> Migrator {
        Migrator::new(
            source.clone().into_service("source"),
            destination.clone().into_service("destination"),
            options.with_retry(RetryPolicy::new(3, Duration::ZERO)),
        )
    }

    #[tokio::test]
    async fn test_ensure_creates_public_bucket() {
        let source = storage_with_paths("avatars", &[]);
        let destination = MemoryStorage::new();
        let migrator = migrator(&source, &destination, MigrationOptions::default());

        let state = migrator.ensure_bucket("avatars").await.unwrap();
        assert_eq!(state, DestinationBucket::Created);
        assert_eq!(destination.is_public("avatars"), Some(true));

        let state = migrator.ensure_bucket("avatars").await.unwrap();
        assert_eq!(state, DestinationBucket::Present);
        assert_eq!(destination.count(Operation::CreateBucket), 1);
    }

    #[tokio::test]
    async fn test_ensure_tolerates_concurrent_create() {
        let source = storage_with_paths("avatars", &[]);
        let destination = MemoryStorage::new();
        destination.inject(
            Fault::new(Operation::CreateBucket, ErrorKind::InvalidInput)
                .with_message("The resource already exists"),
        );
        let migrator = migrator(&source, &destination, MigrationOptions::default());

        let state = migrator.ensure_bucket("avatars").await.unwrap();
        assert_eq!(state, DestinationBucket::Present);
    }

    #[tokio::test]
    async fn test_ensure_in_dry_run_only_plans() {
        let source = storage_with_paths("avatars", &[]);
        let destination = MemoryStorage::new();
        let options = MigrationOptions::default().with_dry_run(true);
        let migrator = migrator(&source, &destination, options);

        let state = migrator.ensure_bucket("avatars").await.unwrap();
        assert_eq!(state, DestinationBucket::Planned);
        assert!(state.is_missing());
        assert_eq!(destination.count(Operation::CreateBucket), 0);
    }

    #[tokio::test]
    async fn test_allow_list_filters_buckets() {
        let source = MemoryStorage::new()
            .with_bucket("avatars")
            .with_bucket("docs")
            .with_bucket("logos");
        let destination = MemoryStorage::new();
        let options = MigrationOptions::default().with_buckets(["docs", "missing"]);
        let migrator = migrator(&source, &destination, options);

        let selected = migrator.select_buckets().await.unwrap();
        let ids: Vec<&str> = selected.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["docs"]);
    }

    #[tokio::test]
    async fn test_per_object_failure_does_not_stop_bucket() {
        let source = storage_with_paths("x", &["a", "b", "c"]);
        source.inject(Fault::new(Operation::Download, ErrorKind::NotFound).on("b"));
        let destination = MemoryStorage::new();
        let migrator = migrator(&source, &destination, MigrationOptions::default());

        let summary = migrator.migrate_bucket("x").await.unwrap();
        assert_eq!(
            summary,
            BucketSummary {
                total: 3,
                copied: 2,
                skipped: 0,
                failed: 1,
            }
        );
        assert_eq!(destination.object_paths("x"), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_run() {
        let source = storage_with_paths("x", &["a"]);
        source.inject(Fault::new(Operation::ListObjects, ErrorKind::Authentication));
        let destination = MemoryStorage::new();
        let migrator = migrator(&source, &destination, MigrationOptions::default());

        let err = migrator.run().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}
