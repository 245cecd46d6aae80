//! Internal error types for bucketsync-reqwest.

use bucketsync_core::ErrorKind;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for bucketsync-reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for bucketsync-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The endpoint URL cannot be used as a base for API paths.
    #[error("Invalid endpoint URL: {0}")]
    Url(String),
    /// The service key cannot be sent as a header value.
    #[error("Invalid service key: {0}")]
    Key(String),
    /// The API answered with a non-success status.
    #[error("API error {status}: {}", body.describe())]
    Status {
        /// HTTP status of the response.
        status: StatusCode,
        /// Parsed error body.
        body: ApiErrorBody,
    },
}

/// Error payload returned by the storage API.
///
/// The API reports its own `statusCode`, which can differ from the HTTP
/// status (conflicts are sometimes sent as HTTP 400 with `"409"` inside).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// API-level status code, sent as a string or a number.
    #[serde(default, deserialize_with = "string_or_number")]
    pub status_code: Option<String>,
    /// Short error name, e.g. `Duplicate`.
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Parses an error body, keeping the raw text as the message when it
    /// is not the expected JSON shape.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Self>(text) {
            Ok(body) => body,
            Err(_) if text.trim().is_empty() => Self::default(),
            Err(_) => Self {
                message: Some(text.chars().take(512).collect()),
                ..Self::default()
            },
        }
    }

    /// Returns the API status code if it is a valid HTTP status.
    pub fn api_status(&self) -> Option<StatusCode> {
        self.status_code
            .as_deref()
            .and_then(|code| code.trim().parse::<u16>().ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
    }

    /// Renders the body for error messages.
    pub fn describe(&self) -> String {
        match (&self.error, &self.message) {
            (Some(error), Some(message)) => format!("{error}: {message}"),
            (None, Some(message)) => message.clone(),
            (Some(error), None) => error.clone(),
            (None, None) => "no details".to_owned(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Maps an HTTP status onto an error kind.
pub(crate) fn classify_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
        StatusCode::FORBIDDEN => ErrorKind::Authorization,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::AlreadyExists,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE => ErrorKind::ServiceUnavailable,
        s if s.is_server_error() => ErrorKind::ExternalError,
        s if s.is_client_error() => ErrorKind::InvalidInput,
        _ => ErrorKind::Unknown,
    }
}

impl From<Error> for bucketsync_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                let kind = if e.is_timeout() {
                    ErrorKind::Timeout
                } else if e.is_decode() {
                    ErrorKind::Serialization
                } else {
                    ErrorKind::NetworkError
                };
                let message = if e.is_connect() {
                    "Connection failed".to_owned()
                } else {
                    e.to_string()
                };
                bucketsync_core::Error::new(kind)
                    .with_message(message)
                    .with_source(e)
            }
            Error::Serde(e) => bucketsync_core::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::Url(msg) | Error::Key(msg) => {
                bucketsync_core::Error::configuration().with_message(msg)
            }
            Error::Status { status, body } => {
                let effective = body.api_status().unwrap_or(status);
                bucketsync_core::Error::new(classify_status(effective))
                    .with_message(format!("HTTP {}: {}", status.as_u16(), body.describe()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16, text: &str) -> bucketsync_core::Error {
        Error::Status {
            status: StatusCode::from_u16(status).unwrap(),
            body: ApiErrorBody::parse(text),
        }
        .into()
    }

    #[test]
    fn test_parse_error_body() {
        let body = ApiErrorBody::parse(
            r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#,
        );
        assert_eq!(body.status_code.as_deref(), Some("409"));
        assert_eq!(body.api_status(), Some(StatusCode::CONFLICT));
        assert_eq!(body.describe(), "Duplicate: The resource already exists");
    }

    #[test]
    fn test_parse_numeric_status_code() {
        let body = ApiErrorBody::parse(r#"{"statusCode":404,"message":"Object not found"}"#);
        assert_eq!(body.api_status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_parse_plain_text_body() {
        let body = ApiErrorBody::parse("upstream connect error");
        assert_eq!(body.message.as_deref(), Some("upstream connect error"));
        assert_eq!(body.api_status(), None);
    }

    #[test]
    fn test_conflict_inside_bad_request() {
        let error = status_error(
            400,
            r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#,
        );
        assert_eq!(error.kind, ErrorKind::AlreadyExists);
        assert!(error.is_already_exists());
    }

    #[test]
    fn test_transient_statuses_are_retryable() {
        assert!(status_error(503, "").is_retryable());
        assert!(status_error(502, "").is_retryable());
        assert!(status_error(429, "").is_retryable());
        assert!(status_error(504, "").is_retryable());
    }

    #[test]
    fn test_permanent_statuses_are_not_retryable() {
        assert_eq!(status_error(401, "").kind, ErrorKind::Authentication);
        assert_eq!(status_error(403, "").kind, ErrorKind::Authorization);
        assert_eq!(status_error(404, "").kind, ErrorKind::NotFound);
        assert_eq!(status_error(422, "").kind, ErrorKind::InvalidInput);
        assert!(!status_error(400, "bad").is_retryable());
    }

    #[test]
    fn test_key_error_is_configuration() {
        let error: bucketsync_core::Error = Error::Key("contains newline".to_owned()).into();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }
}
