//! Reqwest-based HTTP client for the storage API.

use std::sync::Arc;

use bucketsync_core::StorageService;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use url::Url;

use super::{ReqwestConfig, StorageEndpoint};
use crate::error::{ApiErrorBody, Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "bucketsync_reqwest::client";

/// Header carrying the project API key.
const API_KEY_HEADER: HeaderName = HeaderName::from_static("apikey");

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    endpoint: StorageEndpoint,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client bound to one storage project.
///
/// This client implements [`bucketsync_core::StorageProvider`] against the
/// `/storage/v1` REST API and authenticates every request with the
/// project's service key.
///
/// # Examples
///
/// ```rust,ignore
/// use bucketsync_reqwest::{ReqwestClient, ReqwestConfig, StorageEndpoint};
///
/// let endpoint = StorageEndpoint::parse("https://abc.supabase.co", key)?;
/// let client = ReqwestClient::new(endpoint, ReqwestConfig::default())?;
/// let destination = client.into_service("destination");
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("endpoint", &self.inner.endpoint)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client for the given project.
    ///
    /// # Errors
    ///
    /// Returns an error if the service key is not a valid header value or
    /// the HTTP client cannot be built.
    pub fn new(endpoint: StorageEndpoint, config: ReqwestConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            url = %endpoint.url(),
            timeout_ms = timeout.as_millis() as u64,
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .default_headers(Self::auth_headers(endpoint.service_key())?)
            .build()?;

        let inner = ReqwestClientInner {
            http,
            endpoint,
            config,
        };
        let client = Self {
            inner: Arc::new(inner),
        };

        tracing::info!(
            target: TRACING_TARGET,
            url = %client.inner.endpoint.url(),
            "Reqwest client created successfully"
        );

        Ok(client)
    }

    /// Builds the authentication headers sent with every request.
    fn auth_headers(service_key: &str) -> Result<HeaderMap> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {service_key}"))
            .map_err(|e| Error::Key(e.to_string()))?;
        bearer.set_sensitive(true);

        let mut api_key =
            HeaderValue::from_str(service_key).map_err(|e| Error::Key(e.to_string()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(API_KEY_HEADER, api_key);
        Ok(headers)
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the project endpoint.
    pub fn endpoint(&self) -> &StorageEndpoint {
        &self.inner.endpoint
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a labelled [`StorageService`].
    pub fn into_service(self, label: &'static str) -> StorageService {
        StorageService::new(self, label)
    }

    /// Builds `{base}/storage/v1/{segments...}`.
    ///
    /// Each segment is percent-encoded on its own, so object paths must be
    /// passed already split on `/`.
    pub(crate) fn api_url<'a, I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.inner.endpoint.url().clone();
        url.path_segments_mut()
            .map_err(|()| Error::Url("base URL cannot carry a path".to_owned()))?
            .pop_if_empty()
            .extend(["storage", "v1"])
            .extend(segments);
        Ok(url)
    }

    /// Builds the URL of an object: `/storage/v1/object/{bucket}/{path}`.
    pub(crate) fn object_url(&self, bucket: &str, path: &str) -> Result<Url> {
        self.api_url(["object", bucket].into_iter().chain(path.split('/')))
    }

    /// Turns non-success responses into [`Error::Status`].
    pub(crate) async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = ApiErrorBody::parse(&text);

        tracing::debug!(
            target: TRACING_TARGET,
            status = status.as_u16(),
            error = %body.describe(),
            "Storage API returned an error"
        );

        Err(Error::Status { status, body })
    }
}
