//! Migration run options.

use std::collections::BTreeSet;

use bucketsync_core::RetryPolicy;
use bucketsync_core::types::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Cache lifetime (seconds) applied to uploaded objects: one year.
pub const DEFAULT_CACHE_CONTROL: &str = "31536000";

/// Number of objects between two progress lines.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 25;

/// Options controlling one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Perform discovery only; never create buckets or transfer bytes.
    pub dry_run: bool,
    /// Buckets to migrate; `None` selects every source bucket.
    pub bucket_allow_list: Option<BTreeSet<String>>,
    /// Entries requested per listing call.
    pub page_size: u32,
    /// Retry policy for list, download and upload calls.
    pub retry: RetryPolicy,
    /// Cache lifetime in seconds for uploaded objects.
    pub cache_control: String,
    /// Objects between two progress lines.
    pub progress_interval: usize,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            bucket_allow_list: None,
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::default(),
            cache_control: DEFAULT_CACHE_CONTROL.to_owned(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl MigrationOptions {
    /// Enables or disables dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Restricts the run to the given buckets.
    ///
    /// Entries are trimmed and empty entries dropped. An allow-list that
    /// ends up empty selects no bucket at all.
    pub fn with_buckets<I, S>(mut self, buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allow_list = buckets
            .into_iter()
            .map(|b| b.as_ref().trim().to_owned())
            .filter(|b| !b.is_empty())
            .collect();
        self.bucket_allow_list = Some(allow_list);
        self
    }

    /// Sets the listing page size; zero is raised to one.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the cache lifetime in seconds for uploaded objects.
    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = cache_control.into();
        self
    }

    /// Sets how many objects pass between progress lines; zero is raised to one.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Returns true if `bucket` passes the allow-list.
    pub fn is_selected(&self, bucket: &str) -> bool {
        self.bucket_allow_list
            .as_ref()
            .is_none_or(|allowed| allowed.contains(bucket))
    }
}
