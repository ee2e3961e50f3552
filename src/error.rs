//! Unified error handling for the sitestream crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`SitestreamErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust
//! use sitestream::crawler::FetchError;
//! use sitestream::error::{Error, ErrorCategory, SitestreamErrorTrait};
//!
//! let err: Error = FetchError::Timeout.into();
//! assert_eq!(err.category(), ErrorCategory::Network);
//! assert!(err.is_recoverable());
//! ```

use std::io;
use thiserror::Error;

pub use crate::client::ClientError;
pub use crate::config::ConfigError;
pub use crate::crawler::{CrawlError, FetchError};
pub use crate::server::ServerError;

/// Common trait for all sitestream error types
pub trait SitestreamErrorTrait: std::error::Error {
    /// Check if this error is recoverable (the same request may succeed later)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, connection)
    Network,
    /// Malformed requests, frames or URLs
    Protocol,
    /// Configuration and validation errors
    Config,
    /// File and socket I/O errors
    Io,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Protocol => "protocol",
            Self::Config => "config",
            Self::Io => "io",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the sitestream crate
#[derive(Error, Debug)]
pub enum Error {
    /// Crawl session errors
    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Streaming client errors
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Scrape server errors
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SitestreamErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl(_) => ErrorCategory::Protocol,
            Self::Http(_) | Self::Timeout | Self::Body(_) => ErrorCategory::Network,
        }
    }
}

impl SitestreamErrorTrait for CrawlError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch { source, .. } => source.is_recoverable(),
            Self::InvalidRequest(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch { source, .. } => source.category(),
            Self::InvalidRequest(_) => ErrorCategory::Protocol,
        }
    }
}

impl SitestreamErrorTrait for ClientError {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Stream(_) | Self::Truncated { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Init(_)
            | Self::Remote { .. }
            | Self::Decode(_)
            | Self::FrameTooLong { .. }
            | Self::Io(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection(_) | Self::Stream(_) => ErrorCategory::Network,
            Self::Http { .. }
            | Self::Remote { .. }
            | Self::Truncated { .. }
            | Self::Decode(_)
            | Self::FrameTooLong { .. } => {
                ErrorCategory::Protocol
            }
            Self::Init(_) => ErrorCategory::Config,
            Self::Io(_) => ErrorCategory::Io,
        }
    }
}

impl SitestreamErrorTrait for ServerError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::Bind { .. } | Self::Serve(_) => ErrorCategory::Io,
        }
    }
}

impl SitestreamErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Crawl(e) => e.is_recoverable(),
            Self::Fetch(e) => e.is_recoverable(),
            Self::Client(e) => e.is_recoverable(),
            Self::Server(e) => e.is_recoverable(),
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Http(_) => true, // HTTP errors are often transient
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Crawl(e) => e.category(),
            Self::Fetch(e) => e.category(),
            Self::Client(e) => e.category(),
            Self::Server(e) => e.category(),
            Self::Http(_) => ErrorCategory::Network,
            Self::Json(_) => ErrorCategory::Protocol,
            Self::Io(_) => ErrorCategory::Io,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Status code carried in a stream error frame
    ///
    /// The caller sent something unusable: `invalid_argument`. Anything else
    /// happened on our side of the stream: `internal`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Crawl(CrawlError::InvalidRequest(_)) => "invalid_argument",
            _ => "internal",
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let fetch_err = Error::Fetch(FetchError::Timeout);
        assert_eq!(fetch_err.category(), ErrorCategory::Network);

        let url_err = Error::Fetch(FetchError::InvalidUrl("ftp://x".to_string()));
        assert_eq!(url_err.category(), ErrorCategory::Protocol);
    }

    #[test]
    fn test_is_recoverable() {
        let fetch_err = Error::Fetch(FetchError::Timeout);
        assert!(fetch_err.is_recoverable());

        let invalid = Error::Crawl(CrawlError::InvalidRequest("negative depth".to_string()));
        assert!(!invalid.is_recoverable());
    }

    #[test]
    fn test_crawl_error_delegates_to_source() {
        let err: Error = CrawlError::fetch("https://example.com/", FetchError::Timeout).into();
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_frame_codes() {
        let fetch: Error = CrawlError::fetch("https://example.com/", FetchError::Timeout).into();
        assert_eq!(fetch.code(), "internal");

        // A bad seed is still our failure to fetch, not a rejected request
        let seed: Error =
            CrawlError::fetch("::", FetchError::InvalidUrl("relative URL".to_string())).into();
        assert_eq!(seed.code(), "internal");

        let invalid: Error = CrawlError::InvalidRequest("negative depth".to_string()).into();
        assert_eq!(invalid.code(), "invalid_argument");
    }

    #[test]
    fn test_client_error_classification() {
        let remote = ClientError::Remote {
            code: "internal".to_string(),
            message: "error scraping".to_string(),
        };
        assert_eq!(remote.category(), ErrorCategory::Protocol);
        assert!(!remote.is_recoverable());

        let truncated = ClientError::Truncated { pages: 3 };
        assert!(truncated.is_recoverable());

        let http = ClientError::Http {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(http.is_recoverable());
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("stream_buffer must be positive");
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());

        let err: Error = ConfigError::InvalidValue {
            field: "port".to_string(),
            reason: "out of range".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("Something went wrong");
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(err.code(), "internal");
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ErrorCategory::Network.as_str(), "network");
        assert_eq!(ErrorCategory::Io.as_str(), "io");
    }
}
