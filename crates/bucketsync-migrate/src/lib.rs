#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for prefix tree walks.
pub const TRACING_TARGET_LISTER: &str = "bucketsync_migrate::lister";

/// Tracing target for per-object copies.
pub const TRACING_TARGET_COPIER: &str = "bucketsync_migrate::copier";

/// Tracing target for bucket orchestration and progress.
pub const TRACING_TARGET_MIGRATOR: &str = "bucketsync_migrate::migrator";

mod copier;
mod exists;
mod lister;
mod migrator;
mod options;
mod outcome;
mod summary;

pub use copier::ObjectCopier;
pub use exists::ExistenceChecker;
pub use lister::ObjectLister;
pub use migrator::{DestinationBucket, Migrator};
pub use options::{DEFAULT_CACHE_CONTROL, DEFAULT_PROGRESS_INTERVAL, MigrationOptions};
pub use outcome::CopyOutcome;
pub use summary::{BucketSummary, ExitStatus, MigrationSummary};
