//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── endpoints: EndpointConfig   # Source/destination URLs and service keys
//! ├── migration: MigrationConfig  # Dry run, allow-list, paging, retries
//! ├── http: ReqwestConfig         # Request timeout, user agent
//! └── telemetry: TelemetryConfig  # Log format
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! bucketsync --source-url https://src.supabase.co --dest-url https://dst.supabase.co \
//!     --buckets avatars --dry-run
//!
//! # Or via environment variables
//! SOURCE_SUPABASE_URL=... DEST_SUPABASE_URL=... BUCKETSYNC_DRY_RUN=true bucketsync
//! ```

mod endpoint;
mod migration;
mod telemetry;

use std::ffi::OsString;
use std::process;

use anyhow::{Context, anyhow};
use bucketsync_reqwest::ReqwestConfig;
use clap::Parser;
pub use endpoint::EndpointConfig;
pub use migration::MigrationConfig;
use serde::{Deserialize, Serialize};
pub use telemetry::{LogFormat, TelemetryConfig};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
///
/// Combines all configuration groups for a migration run:
/// - [`EndpointConfig`]: Source and destination projects
/// - [`MigrationConfig`]: What to copy and retry behavior
/// - [`ReqwestConfig`]: HTTP client settings
/// - [`TelemetryConfig`]: Log output
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "bucketsync")]
#[command(about = "Copy storage buckets and their objects between two projects")]
#[command(version)]
pub struct Cli {
    /// Source and destination projects.
    #[clap(flatten)]
    pub endpoints: EndpointConfig,

    /// Migration behavior.
    #[clap(flatten)]
    pub migration: MigrationConfig,

    /// HTTP client configuration.
    #[clap(flatten)]
    pub http: ReqwestConfig,

    /// Log output configuration.
    #[clap(flatten)]
    pub telemetry: TelemetryConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments, so its values
    /// act as environment defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument or environment value is invalid.
    pub fn init() -> anyhow::Result<Self> {
        Self::load_dotenv();
        Self::from_args(std::env::args_os())
    }

    /// Parses the given arguments (and the environment).
    ///
    /// `--help` and `--version` print and exit with status 0. Every other
    /// parse failure is returned, so it exits with the configuration error
    /// status instead of clap's own.
    ///
    /// # Errors
    ///
    /// Returns the clap error, wrapped with context, for invalid input.
    pub fn from_args<I, T>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => Ok(cli),
            // Help and version output go to stdout and are not failures.
            Err(error) if !error.use_stderr() => error.exit(),
            Err(error) => Err(anyhow::Error::new(error).context("invalid command-line arguments")),
        }
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    ///
    /// Runs before any client is built, so a missing value never leads to a
    /// network call.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.endpoints.validate()?;
        self.migration
            .validate()
            .context("invalid migration configuration")?;
        if self.http.http_timeout == 0 {
            return Err(anyhow!("request timeout must be at least 1 second"));
        }
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();
        self.endpoints.log();
        self.migration.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.http.effective_timeout().as_secs(),
            user_agent = %self.http.effective_user_agent(),
            "HTTP configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
