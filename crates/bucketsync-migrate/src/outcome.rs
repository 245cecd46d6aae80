//! Result of copying a single object.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

/// Terminal state of one object in a migration run.
///
/// ```text
/// pending ─┬─ exists at destination ──────────────▶ skipped_exists
///          ├─ dry run ────────────────────────────▶ skipped_dry_run
///          └─ downloading ─▶ uploading ─┬─────────▶ copied
///                  │             ├─ conflict ─────▶ skipped_exists
///                  └─────────────┴─ error ────────▶ failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CopyOutcome {
    /// Bytes were transferred and stored at the destination.
    Copied,
    /// An object with the same name already exists at the destination.
    SkippedExists,
    /// Dry-run mode: the copy was only logged.
    SkippedDryRun,
    /// The copy failed after retries.
    Failed,
}

impl CopyOutcome {
    /// Returns true for both skip variants.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedExists | Self::SkippedDryRun)
    }
}
