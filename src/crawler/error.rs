//! Error types for the crawl engine
//!
//! Only transport-level fetch failures and invalid requests are errors here.
//! Deadline expiry and consumer disconnects are not errors at all, they end a
//! session with an aborted outcome (see [`super::stream::AbortReason`]).

use thiserror::Error;

/// Errors that can occur while fetching a single page
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP transport error (DNS, connection refused, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request did not complete within the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Response headers arrived but the body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// URL cannot be requested
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Classify a reqwest error, keeping timeouts distinct
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Errors that end a crawl session as failed
#[derive(Error, Debug)]
pub enum CrawlError {
    /// A page fetch failed; fatal for the whole session
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    /// Request rejected before the session started
    #[error("invalid crawl request: {0}")]
    InvalidRequest(String),
}

impl CrawlError {
    pub fn fetch(url: impl Into<String>, source: FetchError) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    /// Whether the request itself was at fault rather than the crawl
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
