//! Log output configuration.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging options. Verbosity is controlled by `RUST_LOG`.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log line format.
    #[arg(long, env = "BUCKETSYNC_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    #[serde(default)]
    pub log_format: LogFormat,
}
