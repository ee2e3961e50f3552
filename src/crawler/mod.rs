//! Depth-bounded, domain-filtered web crawling
//!
//! This module implements the crawl engine behind one scrape request:
//!
//! - [`fetcher`] - single-GET page fetcher with User-Agent rotation
//! - [`headers`] - browser-like request headers
//! - [`links`] - anchor extraction and URL resolution
//! - [`url`] - canonicalization, domain allow-list, visited set
//! - [`frontier`] - pre-order depth-first traversal
//! - [`stream`] - page sink with deadline and cancellation gate
//! - [`session`] - one crawl from seed to terminal outcome

pub mod error;
pub mod fetcher;
pub mod frontier;
pub mod headers;
pub mod links;
pub mod session;
pub mod stream;
pub mod url;

pub use error::{CrawlError, FetchError};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use frontier::Frontier;
pub use links::LinkExtractor;
pub use session::{CrawlScope, CrawlSession, SessionOutcome, SessionReport};
pub use stream::{AbortReason, CancellationGate, PageSink, SinkClosed, StreamSink};
pub use url::{DomainFilter, VisitedSet};
