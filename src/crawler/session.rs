//! One crawl session: scope, traversal and terminal outcome
//!
//! A session is owned by the task serving one request. It holds no state
//! shared with other sessions and is dropped once [`CrawlSession::run`]
//! returns.

use std::time::Instant;

use super::error::CrawlError;
use super::fetcher::PageFetcher;
use super::frontier::Frontier;
use super::stream::{AbortReason, CancellationGate, PageSink, StreamSink};
use super::url::DomainFilter;
use crate::error::SitestreamErrorTrait;
use crate::models::{CrawlRequest, Outcome};

/// Validated, immutable view of a crawl request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    pub seed: String,
    pub domains: DomainFilter,
    pub max_depth: u32,
}

impl CrawlScope {
    /// Validate a wire request
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::InvalidRequest` for a negative `max_depth`.
    /// The seed URL is not parsed here; a bad seed fails the session like
    /// any other unfetchable URL.
    pub fn from_request(request: &CrawlRequest) -> Result<Self, CrawlError> {
        let max_depth = u32::try_from(request.max_depth).map_err(|_| {
            CrawlError::InvalidRequest(format!(
                "max_depth must not be negative, got {}",
                request.max_depth
            ))
        })?;

        Ok(Self {
            seed: request.url.trim().to_string(),
            domains: DomainFilter::new(&request.allowed_domains),
            max_depth,
        })
    }
}

/// Terminal state of a session that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Frontier exhausted
    Completed,
    /// Stopped early; still a successful completion
    Aborted(AbortReason),
}

impl SessionOutcome {
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Completed => Outcome::Completed,
            Self::Aborted(_) => Outcome::Aborted,
        }
    }
}

/// Summary of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub pages: u64,
}

/// A single crawl, from seed to terminal state
pub struct CrawlSession<F, S> {
    frontier: Frontier,
    fetcher: F,
    sink: StreamSink<S>,
}

impl<F, S> CrawlSession<F, S>
where
    F: PageFetcher,
    S: PageSink,
{
    pub fn new(scope: CrawlScope, fetcher: F, sink: S, gate: CancellationGate) -> Self {
        Self {
            frontier: Frontier::new(scope),
            fetcher,
            sink: StreamSink::new(sink, gate),
        }
    }

    /// Pages delivered so far, also valid after a failed run
    pub fn pages(&self) -> u64 {
        self.frontier.pages()
    }

    /// Drive the session to a terminal state
    ///
    /// # Errors
    ///
    /// Returns the first fetch failure. Everything pushed before it has
    /// already been delivered to the sink.
    pub async fn run(&mut self) -> Result<SessionReport, CrawlError> {
        let started = Instant::now();
        tracing::info!("starting scraping");

        let result = self.frontier.run(&self.fetcher, &mut self.sink).await;
        let pages = self.frontier.pages();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(SessionOutcome::Completed) => {
                tracing::info!(pages, elapsed_ms, "finished scraping");
            }
            Ok(SessionOutcome::Aborted(AbortReason::DeadlineExpired)) => {
                tracing::info!(pages, elapsed_ms, "interrupting scraping: deadline exceeded");
            }
            Ok(SessionOutcome::Aborted(AbortReason::Cancelled)) => {
                tracing::info!(pages, elapsed_ms, "interrupting scraping: cancelled");
            }
            Ok(SessionOutcome::Aborted(AbortReason::ConsumerGone)) => {
                // Also covers a broken transport; the two look the same here
                tracing::warn!(pages, elapsed_ms, "interrupting scraping: consumer gone");
            }
            Err(ref e) => {
                tracing::error!(
                    pages,
                    elapsed_ms,
                    error = %e,
                    category = e.category().as_str(),
                    recoverable = e.is_recoverable(),
                    "error scraping"
                );
            }
        }

        result.map(|outcome| SessionReport { outcome, pages })
    }
}
