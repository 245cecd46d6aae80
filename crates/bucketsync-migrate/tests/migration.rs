//! End-to-end pipeline properties against in-memory storages.

use std::time::Duration;

use bucketsync_core::mock::{Fault, MemoryStorage, Operation, storage_with_paths};
use bucketsync_core::{ErrorKind, RetryPolicy};
use bucketsync_migrate::{BucketSummary, CopyOutcome, MigrationOptions, Migrator, ObjectCopier};

fn options() -> MigrationOptions {
    MigrationOptions::default().with_retry(RetryPolicy::new(3, Duration::ZERO))
}

fn migrator(
    source: &MemoryStorage,
    destination: &MemoryStorage,
    options: MigrationOptions,
) -> Migrator {
    Migrator::new(
        source.clone().into_service("source"),
        destination.clone().into_service("destination"),
        options,
    )
}

#[tokio::test]
async fn second_run_copies_nothing() {
    let source = storage_with_paths("avatars", &["a.png", "dir1/b.png", "dir1/dir2/c.png"]);
    let destination = MemoryStorage::new();

    let first = migrator(&source, &destination, options()).run().await.unwrap();
    assert_eq!(first.get("avatars").map(|s| s.copied), Some(3));

    destination.reset_calls();
    let second = migrator(&source, &destination, options()).run().await.unwrap();
    assert_eq!(
        second.get("avatars"),
        Some(&BucketSummary {
            total: 3,
            copied: 0,
            skipped: 3,
            failed: 0,
        })
    );
    assert_eq!(destination.count(Operation::Upload), 0);
    assert_eq!(second.exit_code(), 0);
}

#[tokio::test]
async fn present_objects_are_never_uploaded() {
    let source = storage_with_paths("docs", &["keep.pdf", "new.pdf", "sub/keep.pdf"]);
    let destination = storage_with_paths("docs", &["keep.pdf", "sub/keep.pdf"]);

    let summary = migrator(&source, &destination, options()).run().await.unwrap();

    assert_eq!(destination.targets(Operation::Upload), vec!["new.pdf"]);
    assert_eq!(source.targets(Operation::Download), vec!["new.pdf"]);
    assert_eq!(summary.get("docs").map(|s| (s.copied, s.skipped)), Some((1, 2)));
}

#[tokio::test]
async fn dry_run_only_reads() {
    let source = MemoryStorage::new()
        .with_object("avatars", "a.png", b"a".as_slice(), None)
        .with_object("avatars", "dir/b.png", b"b".as_slice(), None)
        .with_object("logos", "l.svg", b"l".as_slice(), Some("image/svg+xml"));
    let destination = storage_with_paths("avatars", &["a.png"]);

    let summary = migrator(&source, &destination, options().with_dry_run(true))
        .run()
        .await
        .unwrap();

    for storage in [&source, &destination] {
        assert_eq!(storage.count(Operation::CreateBucket), 0);
        assert_eq!(storage.count(Operation::Download), 0);
        assert_eq!(storage.count(Operation::Upload), 0);
    }
    assert!(!destination.has_bucket("logos"));
    assert_eq!(summary.get("avatars").map(|s| s.skipped), Some(2));
    assert_eq!(summary.get("logos").map(|s| s.skipped), Some(1));
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn nested_listing_is_independent_of_page_size() {
    let expected = vec!["a.png", "dir1/b.png", "dir1/dir2/c.png"];

    for page_size in [1, 2, 3, 1000] {
        let source = storage_with_paths("b", &["a.png", "dir1/b.png", "dir1/dir2/c.png"]);
        let destination = MemoryStorage::new();

        let summary = migrator(&source, &destination, options().with_page_size(page_size))
            .run()
            .await
            .unwrap();

        assert_eq!(summary.get("b").map(|s| s.total), Some(3), "page size {page_size}");
        assert_eq!(destination.object_paths("b"), expected, "page size {page_size}");
    }
}

#[tokio::test]
async fn transient_listing_errors_are_transparent() {
    let source = storage_with_paths("b", &["a.png", "dir1/b.png"]);
    source.inject(
        Fault::new(Operation::ListObjects, ErrorKind::ServiceUnavailable)
            .on("dir1")
            .times(2),
    );
    let destination = MemoryStorage::new();

    let summary = migrator(&source, &destination, options()).run().await.unwrap();

    assert_eq!(summary.get("b").map(|s| s.copied), Some(2));
    assert!(destination.object("b", "dir1/b.png").is_some());
    assert_eq!(
        source
            .targets(Operation::ListObjects)
            .iter()
            .filter(|t| *t == "dir1")
            .count(),
        3
    );
}

#[tokio::test]
async fn upload_conflict_counts_as_skipped() {
    let source = storage_with_paths("b", &["race.png"]);
    let destination = MemoryStorage::new().with_bucket("b");
    destination.inject(
        Fault::new(Operation::Upload, ErrorKind::InvalidInput)
            .on("race.png")
            .with_message("The resource already exists"),
    );

    let copier = ObjectCopier::new(
        source.clone().into_service("source"),
        destination.clone().into_service("destination"),
        &options(),
    );
    let outcome = copier.copy("b", &"race.png".into(), false).await.unwrap();
    assert_eq!(outcome, CopyOutcome::SkippedExists);

    let summary = migrator(&source, &destination, options()).run().await.unwrap();
    assert_eq!(summary.get("b").map(|s| (s.skipped, s.failed)), Some((1, 0)));
}

#[tokio::test]
async fn one_failure_yields_partial_failure_exit() {
    let source =
        storage_with_paths("x", &["x1", "x2"]).with_object("y", "y1", b"y1".as_slice(), None);
    source.inject(Fault::new(Operation::Download, ErrorKind::Timeout).on("x2"));
    let destination = MemoryStorage::new();

    let summary = migrator(&source, &destination, options()).run().await.unwrap();

    assert_eq!(
        serde_json::to_value(&summary).unwrap(),
        serde_json::json!({
            "x": {"total": 2, "copied": 1, "skipped": 0, "failed": 1},
            "y": {"total": 1, "copied": 1, "skipped": 0, "failed": 0},
        })
    );
    assert_eq!(summary.exit_code(), 2);
    // Timeouts are retried before the object is given up.
    assert_eq!(source.targets(Operation::Download).len(), 1 + 4 + 1);
}

#[tokio::test]
async fn destination_buckets_are_created_public() {
    let source = storage_with_paths("avatars", &["a.png"]);
    let destination = MemoryStorage::new();

    migrator(&source, &destination, options()).run().await.unwrap();

    assert_eq!(destination.is_public("avatars"), Some(true));
    let stored = destination.object("avatars", "a.png").unwrap();
    assert_eq!(stored.content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(stored.cache_control.as_deref(), Some("31536000"));
}

#[tokio::test]
async fn empty_allow_list_selects_nothing() {
    let source = storage_with_paths("avatars", &["a.png"]);
    let destination = MemoryStorage::new();

    let summary = migrator(&source, &destination, options().with_buckets([" ", ""]))
        .run()
        .await
        .unwrap();

    assert!(summary.is_empty());
    assert!(destination.calls().is_empty());
}
