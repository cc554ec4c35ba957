//! Error types for the Zoho CRM tap
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// Remote error codes that mean "this module is not accessible to the
/// current credentials". The executor logs them and returns an empty body.
pub const SKIPPABLE_ERROR_CODES: &[&str] = &[
    "OAUTH_SCOPE_MISMATCH",
    "NO_PERMISSION",
    "FEATURE_NOT_ENABLED",
    "FEATURE_NOT_SUPPORTED",
];

/// The main error type for the tap
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP-error-code: {status}, Error: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("HTTP-error-code: 429, Error: {message} (Retry after {retry_after_seconds} seconds.)")]
    RateLimited {
        retry_after_seconds: u64,
        message: String,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Unsupported method: {method}")]
    UnsupportedMethod { method: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Schema / Discovery Errors
    // ============================================================================
    #[error("Schema error for stream '{stream}': {message}")]
    Schema { stream: String, message: String },

    #[error("Unresolvable schema reference: {reference}")]
    SchemaReference { reference: String },

    #[error("Transform failed at '{path}': {message}")]
    Transform { path: String, message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // Stream Errors
    // ============================================================================
    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    #[error("Stream '{stream}': {message}")]
    Stream { stream: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an API error from a status and an optional remote payload.
    ///
    /// The remote `message` wins over the default text for the status.
    pub fn api(status: u16, code: Option<String>, remote_message: Option<String>) -> Self {
        let message =
            remote_message.unwrap_or_else(|| default_status_message(status).to_string());
        Self::Api {
            status,
            code,
            message,
        }
    }

    /// Create a schema error
    pub fn schema(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Create a transform error
    pub fn transform(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a stream error
    pub fn stream(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stream {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::RateLimited { .. } => Some(429),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::Http(e) => e.status().is_none() && !e.is_builder(),
            Error::Api { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this error means "module not accessible" rather than a failure
    pub fn is_skippable(&self) -> bool {
        match self {
            Error::Api {
                code: Some(code), ..
            } => SKIPPABLE_ERROR_CODES.contains(&code.as_str()),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 422 | 429 | 500 | 501 | 502 | 503)
}

/// Default human readable message for a status code
pub(crate) fn default_status_message(status: u16) -> &'static str {
    match status {
        400 => "A validation exception has occurred.",
        401 => "The access token provided is expired, revoked, malformed or invalid for other reasons.",
        403 => "You are missing the following required scopes: read",
        404 => "The resource you have specified cannot be found.",
        409 => "The API request cannot be completed because the requested operation would conflict with an existing item.",
        422 => "The request content itself is not processable by the server.",
        429 => "The API rate limit for your organisation/application pairing has been exceeded.",
        500 => "The server encountered an unexpected condition which prevented it from fulfilling the request.",
        501 => "The server does not support the functionality required to fulfill the request.",
        502 => "Server received an invalid response.",
        503 => "API service is currently unavailable.",
        _ => "Unknown Error",
    }
}

/// Result type alias for the tap
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
