//! Error types and handling for revive-core operations.
//!
//! Per-URL problems (a blocked page, a missing sitemap, malformed XML) are not
//! errors in this crate: the sitemap resolver answers with an empty page list
//! and the content fetcher answers with [`FetchResult::Failed`]. The [`Error`]
//! type covers the remaining failures, such as building HTTP clients, loading
//! configuration and talking to the language model API.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: reading configuration or URL lists, writing output
//! - **Network Errors**: HTTP client construction and model API transport
//! - **Parse Errors**: content that could not be interpreted
//! - **Configuration Errors**: invalid settings or config files
//! - **API Errors**: non-success responses from the language model API
//!
//! ```rust
//! use revive_core::Error;
//!
//! let err = Error::Api { status: 529, message: "overloaded".into() };
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "api");
//! ```
//!
//! [`FetchResult::Failed`]: crate::types::FetchResult::Failed

use thiserror::Error;

/// The main error type for revive-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// The underlying `reqwest::Error` is preserved for detailed connection
    /// information.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Content could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The language model API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Response body excerpt or error message.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through a retry.
    ///
    /// Connection failures, timeouts, rate limiting and server-side API errors
    /// are considered transient. Everything else is permanent.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a static string identifier.
    ///
    /// Useful for logging and for mapping errors onto CLI exit codes.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Api { .. } => "api",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
