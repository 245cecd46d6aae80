//! Structured error handling for storage operations.

use hipstr::HipStr;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur in storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Input validation failed.
    InvalidInput,
    /// Network-related error occurred.
    NetworkError,
    /// Authentication failed.
    Authentication,
    /// Authorization failed.
    Authorization,
    /// Rate limit exceeded.
    RateLimited,
    /// Service temporarily unavailable.
    ServiceUnavailable,
    /// Internal error.
    InternalError,
    /// External service returned an unexpected error.
    ExternalError,
    /// Configuration error.
    Configuration,
    /// Resource not found.
    NotFound,
    /// Resource (bucket or object) already exists.
    AlreadyExists,
    /// A download completed without any bytes.
    EmptyBody,
    /// Timeout occurred.
    Timeout,
    /// Serialization/deserialization error.
    Serialization,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Check if this error kind is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::Timeout | Self::ServiceUnavailable | Self::RateLimited
        )
    }
}

/// Structured error type with classification and context tracking.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}{}",
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default(),
    context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<HipStr<'static>>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
    /// Additional context information.
    pub context: Option<HipStr<'static>>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
            context: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
            context: None,
        }
    }

    /// Shorthand for a network error.
    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    /// Shorthand for a timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Shorthand for a not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Shorthand for an already exists error.
    pub fn already_exists() -> Self {
        Self::new(ErrorKind::AlreadyExists)
    }

    /// Shorthand for a configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Shorthand for a serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<HipStr<'static>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: impl Into<HipStr<'static>>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Check if this error is retryable based on its kind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns true when the error reports a conflict with an existing
    /// bucket or object.
    ///
    /// Some providers only signal conflicts through the message text, so
    /// the message is matched as well as the kind.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.kind == ErrorKind::AlreadyExists
            || self
                .message
                .as_deref()
                .is_some_and(|m| m.to_ascii_lowercase().contains("already exists"))
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::from_source(ErrorKind::InternalError, error).with_message("I/O operation failed")
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::Serialization, error).with_message("Invalid JSON payload")
    }
}
