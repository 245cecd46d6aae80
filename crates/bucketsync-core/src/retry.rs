//! Bounded retry with exponential backoff.
//!
//! [`retry`] is a generic combinator over any fallible async operation. It
//! retries only errors whose kind is retryable (network failures, timeouts,
//! rate limiting, unavailable service) and sleeps between attempts for the
//! duration returned by a caller-provided delay function. [`RetryPolicy`]
//! bundles the attempt bound with an exponential delay function.
//!
//! # Example
//!
//! ```rust,ignore
//! use bucketsync_core::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::default();
//! let buckets = policy.run("list_buckets", || storage.list_buckets()).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, TRACING_TARGET_RETRY};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(300);

/// Default upper bound for a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Retry bound and exponential backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further retry.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given retry bound and base delay.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Sets the upper bound for a single delay.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Returns the delay before retry number `retry` (0-based).
    ///
    /// The delay is `base_delay * 2^retry`, capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `operation` under this policy.
    pub async fn run<T, F, Fut>(&self, operation: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        retry(self.max_retries, |n| self.delay_for(n), operation, op).await
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `max_retries` retries have been spent.
///
/// `delay` maps the 0-based retry number to the sleep before that retry.
/// The last error is returned once the bound is exhausted.
pub async fn retry<T, F, Fut, D>(
    max_retries: u32,
    delay: D,
    operation: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    D: Fn(u32) -> Duration,
{
    let mut retries = 0;

    loop {
        match op().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::debug!(
                        target: TRACING_TARGET_RETRY,
                        operation,
                        attempt = retries + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(error) if error.is_retryable() && retries < max_retries => {
                let backoff = delay(retries);
                retries += 1;

                tracing::warn!(
                    target: TRACING_TARGET_RETRY,
                    operation,
                    attempt = retries,
                    max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %error,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(backoff).await;
            }
            Err(error) => {
                if error.is_retryable() {
                    tracing::warn!(
                        target: TRACING_TARGET_RETRY,
                        operation,
                        attempts = retries + 1,
                        error = %error,
                        "Operation failed, retries exhausted"
                    );
                }
                return Err(error);
            }
        }
    }
}
