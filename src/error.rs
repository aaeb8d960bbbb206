//! Error types for po-extract
//!
//! Two layers of errors exist:
//! - [`Error`] is returned by run-level operations (configuration, session setup,
//!   starting a run). A run that starts always completes, so no fetch problem ever
//!   surfaces here.
//! - [`FetchError`] describes why a single record's detail fetch failed. It is
//!   recovered locally by the scheduler, logged, and counted in the run summary.

use thiserror::Error;

/// Result type alias for po-extract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for po-extract
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "batch.batch_size")
        key: Option<String>,
    },

    /// The record source could not supply an account context or any records
    #[error("record source unavailable: {reason}")]
    SourceUnavailable {
        /// Why the source could not be resolved
        reason: String,
    },

    /// A run is already in progress on this session
    #[error("an extraction run is already in progress")]
    RunInProgress,

    /// Network error (HTTP client construction)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Why a single record's detail fetch failed
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("HTTP {status}")]
    Status {
        /// Numeric HTTP status code
        status: u16,
    },

    /// The response body was not valid JSON
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The JSON envelope did not contain the expected wrapper object
    #[error("response envelope has no `{key}` object")]
    MissingEnvelope {
        /// The wrapper key that was expected
        key: String,
    },

    /// The request URL could not be built from the base URL and path segments
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Short machine-readable category, used in events and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(e) if e.is_timeout() => "timeout",
            FetchError::Transport(_) => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Parse(_) => "parse",
            FetchError::MissingEnvelope { .. } => "envelope",
            FetchError::InvalidUrl(_) => "url",
        }
    }
}
