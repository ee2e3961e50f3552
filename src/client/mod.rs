//! Streaming scrape client
//!
//! Sends one crawl request to a scrape server and writes every page frame to
//! an [`NdjsonWriter`] as it arrives.

pub mod frames;
pub mod output;

use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;

use crate::models::{CrawlRequest, Outcome, StreamFrame};
use crate::server::api::REQUEST_TIMEOUT_HEADER;

pub use frames::{FrameDecoder, DEFAULT_MAX_FRAME_LEN};
pub use output::NdjsonWriter;

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the scrape client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host name
    pub host: String,

    /// Server port
    pub port: u16,

    /// Use plain http instead of https
    pub insecure: bool,

    /// Bearer token sent with the request
    pub token: Option<String>,

    /// Whole-request deadline, also propagated to the server
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a new client config
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            insecure: false,
            token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connect over plain http
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.insecure { "http" } else { "https" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

// ============================================================================
// Client Errors
// ============================================================================

/// Scrape client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP client could not be built
    #[error("failed to initialize client: {0}")]
    Init(String),

    /// Server unreachable
    #[error("could not connect: {0}")]
    Connection(#[source] reqwest::Error),

    /// Request rejected before any frame was sent
    #[error("server returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Stream broke after it started
    #[error("stream interrupted: {0}")]
    Stream(#[source] reqwest::Error),

    /// Frame or page could not be (de)serialized
    #[error("invalid frame: {0}")]
    Decode(#[from] serde_json::Error),

    /// Server sent a line longer than the frame limit
    #[error("frame exceeds {limit} bytes")]
    FrameTooLong { limit: usize },

    /// Server reported a failed session
    #[error("remote error ({code}): {message}")]
    Remote { code: String, message: String },

    /// Stream closed without an end or error frame
    #[error("stream ended without a terminal frame after {pages} pages")]
    Truncated { pages: u64 },

    /// Output file error
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a finished receive loop saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveSummary {
    pub pages: u64,

    /// `Aborted` also when the client's own deadline expired
    pub outcome: Outcome,
}

// ============================================================================
// Crawl Client
// ============================================================================

/// Client for a scrape server
pub struct CrawlClient {
    config: ClientConfig,
    http_client: Client,
}

impl CrawlClient {
    /// Create a new scrape client
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run one crawl and write its pages to `writer`
    ///
    /// The client deadline expiring mid-stream is not an error: whatever
    /// arrived is kept and the summary reports an aborted outcome.
    ///
    /// # Errors
    ///
    /// Connection failures, rejected requests, error frames, broken or
    /// truncated streams, and output failures.
    pub async fn crawl<W>(
        &self,
        request: &CrawlRequest,
        writer: &mut NdjsonWriter<W>,
    ) -> Result<ReceiveSummary, ClientError>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        let url = format!("{}/api/v1/scrape", self.config.base_url());

        let mut builder = self
            .http_client
            .post(&url)
            .header(REQUEST_TIMEOUT_HEADER, self.config.timeout.as_millis().to_string())
            .json(request);
        if let Some(token) = &self.config.token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(url = %url, "Sending scrape request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return deadline_exceeded(writer, 0).await,
            Err(e) => return Err(ClientError::Connection(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let mut stream = response.bytes_stream();
        let mut decoder = FrameDecoder::new();
        let mut pages = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) if e.is_timeout() => return deadline_exceeded(writer, pages).await,
                Err(e) => {
                    writer.flush().await?;
                    return Err(ClientError::Stream(e));
                }
            };
            decoder.push(&chunk);

            while let Some(frame) = decoder.next_frame() {
                match frame? {
                    StreamFrame::Page(page) => {
                        tracing::debug!(url = %page.url, status = page.status, "Received page");
                        writer.write_page(&page).await?;
                        pages += 1;
                    }
                    StreamFrame::End(end) => {
                        writer.flush().await?;
                        tracing::info!(
                            pages,
                            outcome = end.outcome.as_str(),
                            "received all messages"
                        );
                        return Ok(ReceiveSummary {
                            pages,
                            outcome: end.outcome,
                        });
                    }
                    StreamFrame::Error(error) => {
                        writer.flush().await?;
                        return Err(ClientError::Remote {
                            code: error.code,
                            message: error.message,
                        });
                    }
                }
            }
        }

        writer.flush().await?;
        Err(ClientError::Truncated { pages })
    }
}

async fn deadline_exceeded<W>(
    writer: &mut NdjsonWriter<W>,
    pages: u64,
) -> Result<ReceiveSummary, ClientError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    tracing::info!(pages, "deadline exceeded");
    writer.flush().await?;
    Ok(ReceiveSummary {
        pages,
        outcome: Outcome::Aborted,
    })
}
