//! Source and destination project configuration.

use anyhow::Context;
use bucketsync_reqwest::StorageEndpoint;
use clap::Args;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TRACING_TARGET_CONFIG;

const SOURCE_URL_ENV: &str = "SOURCE_SUPABASE_URL";
const SOURCE_KEY_ENV: &str = "SOURCE_SERVICE_ROLE_KEY";
const DEST_URL_ENV: &str = "DEST_SUPABASE_URL";
const DEST_KEY_ENV: &str = "DEST_SERVICE_ROLE_KEY";

/// A required configuration value was not provided.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required configuration: {0}")]
pub struct MissingConfig(pub &'static str);

/// Storage projects to copy between.
///
/// The values are optional at parse time so that a missing one is reported
/// by [`EndpointConfig::validate`] under its environment variable name.
/// Service keys are never serialized or logged.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the source project.
    #[arg(long, env = SOURCE_URL_ENV)]
    pub source_url: Option<String>,

    /// Service role key of the source project.
    #[arg(long, env = SOURCE_KEY_ENV, hide_env_values = true)]
    #[serde(skip_serializing)]
    pub source_key: Option<String>,

    /// Base URL of the destination project.
    #[arg(long, env = DEST_URL_ENV)]
    pub dest_url: Option<String>,

    /// Service role key of the destination project.
    #[arg(long, env = DEST_KEY_ENV, hide_env_values = true)]
    #[serde(skip_serializing)]
    pub dest_key: Option<String>,
}

impl EndpointConfig {
    /// Checks that all four values are present and both URLs are usable.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.source()?;
        self.destination()?;
        Ok(())
    }

    /// Builds the source endpoint.
    pub fn source(&self) -> anyhow::Result<StorageEndpoint> {
        endpoint(
            (&self.source_url, SOURCE_URL_ENV),
            (&self.source_key, SOURCE_KEY_ENV),
        )
    }

    /// Builds the destination endpoint.
    pub fn destination(&self) -> anyhow::Result<StorageEndpoint> {
        endpoint(
            (&self.dest_url, DEST_URL_ENV),
            (&self.dest_key, DEST_KEY_ENV),
        )
    }

    /// Logs the project URLs.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            source = self.source_url.as_deref().unwrap_or_default(),
            destination = self.dest_url.as_deref().unwrap_or_default(),
            "Storage projects"
        );
    }
}

fn required<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> std::result::Result<&'a str, MissingConfig> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(MissingConfig(name))
}

fn endpoint(
    (url, url_env): (&Option<String>, &'static str),
    (key, key_env): (&Option<String>, &'static str),
) -> anyhow::Result<StorageEndpoint> {
    let url = required(url, url_env)?;
    let key = required(key, key_env)?;
    StorageEndpoint::parse(url, key).with_context(|| format!("invalid {url_env}"))
}
