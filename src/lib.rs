//! sitestream - streaming, depth-bounded web scraper
//!
//! Crawls outward from a seed URL in pre-order, restricted to an allow-list
//! of host names and a maximum link depth, and streams every fetched page to
//! the caller as soon as it is fetched.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Traversal, fetching, link extraction and cancellation
//! - [`models`] - Requests, page results and stream frames
//! - [`server`] - NDJSON scrape server (axum)
//! - [`client`] - Streaming client writing pages to a file
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use sitestream::crawler::{CancellationGate, CrawlScope, CrawlSession, HttpFetcher};
//! use sitestream::models::{CrawlRequest, PageResult};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let request = CrawlRequest::new("https://example.com/", 1)
//!         .with_allowed_domains(["example.com"]);
//!     let scope = CrawlScope::from_request(&request)?;
//!     let fetcher = HttpFetcher::with_defaults()?;
//!
//!     let mut pages: Vec<PageResult> = Vec::new();
//!     let gate = CancellationGate::with_timeout(Duration::from_secs(30));
//!     let report = CrawlSession::new(scope, fetcher, &mut pages, gate).run().await?;
//!
//!     println!("{} pages, {:?}", report.pages, report.outcome);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod server;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{ClientConfig, CrawlClient, NdjsonWriter, ReceiveSummary};
    pub use crate::config::Config;
    pub use crate::crawler::{
        AbortReason, CancellationGate, CrawlScope, CrawlSession, HttpFetcher, SessionOutcome,
    };
    pub use crate::error::{Error, ErrorCategory, Result, SitestreamErrorTrait};
    pub use crate::models::{CrawlRequest, Outcome, PageResult, StreamFrame};
    pub use crate::server::CrawlServer;
}

// Direct re-exports for convenience
pub use models::{CrawlRequest, PageResult, StreamFrame};
