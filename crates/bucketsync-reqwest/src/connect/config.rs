//! Reqwest client configuration.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default timeout for HTTP requests: 60 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP settings shared by every storage client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "request-timeout",
            env = "BUCKETSYNC_REQUEST_TIMEOUT",
            default_value = "60"
        )
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "user-agent", env = "BUCKETSYNC_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            http_timeout: default_timeout_secs(),
            user_agent: None,
        }
    }
}

impl ReqwestConfig {
    /// Create a new configuration with the specified timeout.
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            http_timeout: timeout_secs,
            user_agent: None,
        }
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .filter(|ua| !ua.is_empty())
            .unwrap_or_else(Self::default_user_agent)
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("bucketsync/{}", env!("CARGO_PKG_VERSION"))
    }
}

/// Base URL and service key of one storage project.
#[derive(Clone)]
pub struct StorageEndpoint {
    url: Url,
    service_key: String,
}

impl fmt::Debug for StorageEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageEndpoint")
            .field("url", &self.url.as_str())
            .field("service_key", &"<redacted>")
            .finish()
    }
}

impl StorageEndpoint {
    /// Creates an endpoint from an already parsed URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or cannot carry a path.
    pub fn new(url: Url, service_key: impl Into<String>) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Url(format!(
                "'{url}' must use the http or https scheme"
            )));
        }
        if url.cannot_be_a_base() {
            return Err(Error::Url(format!("'{url}' cannot be used as a base URL")));
        }

        let service_key = service_key.into();
        if service_key.trim().is_empty() {
            return Err(Error::Key("service key is empty".to_owned()));
        }

        Ok(Self { url, service_key })
    }

    /// Parses a base URL and pairs it with a service key.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or is not usable.
    pub fn parse(url: &str, service_key: impl Into<String>) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::Url(format!("'{url}': {e}")))?;
        Self::new(url, service_key)
    }

    /// Returns the base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the service key.
    pub(crate) fn service_key(&self) -> &str {
        &self.service_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ReqwestConfig::default();
        assert_eq!(config.http_timeout, 60);
        assert!(config.effective_user_agent().starts_with("bucketsync/"));
    }

    #[test]
    fn test_effective_timeout_uses_default_when_zero() {
        let config = ReqwestConfig::new(0);
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_effective_user_agent_uses_default_when_empty() {
        let config = ReqwestConfig {
            user_agent: Some(String::new()),
            ..Default::default()
        };
        assert!(config.effective_user_agent().contains("bucketsync"));
    }

    #[test]
    fn test_endpoint_rejects_non_http_scheme() {
        assert!(StorageEndpoint::parse("ftp://example.com", "key").is_err());
        assert!(StorageEndpoint::parse("not a url", "key").is_err());
    }

    #[test]
    fn test_endpoint_rejects_empty_key() {
        assert!(StorageEndpoint::parse("https://abc.supabase.co", "  ").is_err());
    }

    #[test]
    fn test_endpoint_debug_redacts_key() {
        let endpoint = StorageEndpoint::parse("https://abc.supabase.co", "secret-key").unwrap();
        let debug = format!("{endpoint:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("abc.supabase.co"));
    }
}
