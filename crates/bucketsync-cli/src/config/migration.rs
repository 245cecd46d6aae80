//! Migration behavior configuration.

use std::time::Duration;

use anyhow::anyhow;
use bucketsync_core::RetryPolicy;
use bucketsync_core::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};
use bucketsync_core::types::DEFAULT_PAGE_SIZE;
use bucketsync_migrate::{DEFAULT_CACHE_CONTROL, MigrationOptions};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Largest page size accepted by the storage listing API.
const MAX_PAGE_SIZE: u32 = 1000;

const DEFAULT_RETRY_BASE_DELAY_MS: u64 = DEFAULT_BASE_DELAY.as_millis() as u64;

/// What to migrate and how hard to try.
///
/// # Environment Variables
///
/// - `BUCKETSYNC_DRY_RUN` - Only list and check, never write (default: false)
/// - `BUCKETSYNC_BUCKETS` - Comma-separated bucket allow-list (default: all)
/// - `BUCKETSYNC_PAGE_SIZE` - Listing page size, 1-1000 (default: 1000)
/// - `BUCKETSYNC_MAX_RETRIES` - Retries per storage call (default: 3)
/// - `BUCKETSYNC_RETRY_BASE_DELAY_MS` - First backoff delay (default: 300)
/// - `BUCKETSYNC_CACHE_CONTROL` - Cache lifetime of uploads in seconds (default: 31536000)
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Perform listing and existence checks only; never create or upload.
    #[arg(long, env = "BUCKETSYNC_DRY_RUN")]
    #[serde(default)]
    pub dry_run: bool,

    /// Buckets to migrate, e.g. `avatars,documents`. All buckets when omitted.
    #[arg(long, env = "BUCKETSYNC_BUCKETS", value_delimiter = ',')]
    #[serde(default)]
    pub buckets: Option<Vec<String>>,

    /// Number of entries requested per listing call.
    #[arg(
        long,
        env = "BUCKETSYNC_PAGE_SIZE",
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PAGE_SIZE))
    )]
    pub page_size: u32,

    /// Retries after the first attempt of a list, download or upload call.
    #[arg(long, env = "BUCKETSYNC_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds; doubles on every retry.
    #[arg(
        long,
        env = "BUCKETSYNC_RETRY_BASE_DELAY_MS",
        default_value_t = DEFAULT_RETRY_BASE_DELAY_MS
    )]
    pub retry_base_delay_ms: u64,

    /// Cache lifetime in seconds set on uploaded objects.
    #[arg(long, env = "BUCKETSYNC_CACHE_CONTROL", default_value = DEFAULT_CACHE_CONTROL)]
    pub cache_control: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            buckets: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            cache_control: DEFAULT_CACHE_CONTROL.to_owned(),
        }
    }
}

impl MigrationConfig {
    /// Validates value ranges not covered by the argument parser.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(anyhow!(
                "page size {} is invalid, must be between 1 and {MAX_PAGE_SIZE}",
                self.page_size
            ));
        }

        let cache_control = self.cache_control.trim();
        if cache_control.is_empty() || !cache_control.bytes().all(|b| b.is_ascii_digit()) {
            return Err(anyhow!(
                "cache control '{}' must be a number of seconds",
                self.cache_control
            ));
        }

        Ok(())
    }

    /// Returns the retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    /// Converts the configuration into pipeline options.
    pub fn to_options(&self) -> MigrationOptions {
        let options = MigrationOptions::default()
            .with_dry_run(self.dry_run)
            .with_page_size(self.page_size)
            .with_retry(self.retry_policy())
            .with_cache_control(self.cache_control.trim());

        match &self.buckets {
            Some(buckets) => options.with_buckets(buckets),
            None => options,
        }
    }

    /// Logs the migration settings.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            mode = if self.dry_run { "DRY RUN" } else { "COPY" },
            buckets = ?self.buckets,
            page_size = self.page_size,
            max_retries = self.max_retries,
            retry_base_delay_ms = self.retry_base_delay_ms,
            cache_control = %self.cache_control,
            "Migration configuration"
        );
    }
}
