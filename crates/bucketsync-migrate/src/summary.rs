//! Per-bucket counters and the run summary.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::CopyOutcome;

/// Process exit status of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every object was copied or skipped.
    Success,
    /// Configuration or unhandled error.
    Error,
    /// The run completed with at least one failed object.
    PartialFailure,
}

impl ExitStatus {
    /// Returns the numeric process exit code.
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Error => 1,
            Self::PartialFailure => 2,
        }
    }
}

/// Outcome counters for one bucket.
///
/// `skipped` counts both objects already present at the destination and
/// objects skipped in dry-run mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSummary {
    /// Objects discovered in the source bucket.
    pub total: u64,
    /// Objects transferred.
    pub copied: u64,
    /// Objects skipped.
    pub skipped: u64,
    /// Objects that failed.
    pub failed: u64,
}

impl BucketSummary {
    /// Creates counters for a bucket holding `total` objects.
    pub fn with_total(total: u64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Counts one object outcome.
    pub fn record(&mut self, outcome: CopyOutcome) {
        match outcome {
            CopyOutcome::Copied => self.copied += 1,
            CopyOutcome::SkippedExists | CopyOutcome::SkippedDryRun => self.skipped += 1,
            CopyOutcome::Failed => self.failed += 1,
        }
    }

    /// Number of objects with a recorded outcome.
    pub fn processed(&self) -> u64 {
        self.copied + self.skipped + self.failed
    }
}

/// Summaries of all processed buckets, in processing order.
///
/// Serializes as a JSON object keyed by bucket id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    buckets: Vec<(String, BucketSummary)>,
}

impl MigrationSummary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the summary of a bucket, replacing an earlier one.
    pub fn insert(&mut self, bucket: impl Into<String>, summary: BucketSummary) {
        let bucket = bucket.into();
        match self.buckets.iter_mut().find(|(id, _)| *id == bucket) {
            Some((_, existing)) => *existing = summary,
            None => self.buckets.push((bucket, summary)),
        }
    }

    /// Returns the summary of a bucket.
    pub fn get(&self, bucket: &str) -> Option<&BucketSummary> {
        self.buckets
            .iter()
            .find(|(id, _)| id == bucket)
            .map(|(_, summary)| summary)
    }

    /// Iterates bucket summaries in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BucketSummary)> {
        self.buckets.iter().map(|(id, s)| (id.as_str(), s))
    }

    /// Number of processed buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if no bucket was processed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sums the counters of every bucket.
    pub fn totals(&self) -> BucketSummary {
        self.buckets
            .iter()
            .fold(BucketSummary::default(), |acc, (_, s)| BucketSummary {
                total: acc.total + s.total,
                copied: acc.copied + s.copied,
                skipped: acc.skipped + s.skipped,
                failed: acc.failed + s.failed,
            })
    }

    /// Returns true if any bucket recorded a failed object.
    pub fn has_failures(&self) -> bool {
        self.buckets.iter().any(|(_, s)| s.failed > 0)
    }

    /// Exit status for a run that reached the end.
    pub fn exit_status(&self) -> ExitStatus {
        if self.has_failures() {
            ExitStatus::PartialFailure
        } else {
            ExitStatus::Success
        }
    }

    /// Numeric exit code for a run that reached the end: 0 or 2.
    pub fn exit_code(&self) -> i32 {
        self.exit_status().code()
    }
}

impl Serialize for MigrationSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (bucket, summary) in &self.buckets {
            map.serialize_entry(bucket, summary)?;
        }
        map.end()
    }
}
