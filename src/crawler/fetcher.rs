//! HTTP page fetcher
//!
//! This module provides the single-GET fetcher used by crawl sessions:
//! - User-Agent rotation from a configurable pool
//! - Referer header pointing at the previously fetched page
//! - Redirects followed only inside the session's allowed domains
//! - Non-2xx responses returned as ordinary pages, never as errors

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

use super::error::FetchError;
use super::headers::{build_page_headers, random_user_agent};
use super::url::{is_crawlable, DomainFilter};
use crate::config::FetcherConfig;
use crate::models::PageResult;

/// Raw outcome of one GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after any followed redirects
    pub url: Url,
    pub status: u16,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    /// Split into the emitted result and the final URL used as link base
    pub fn into_result(self) -> (PageResult, Url) {
        let result = PageResult {
            url: self.url.to_string(),
            status: self.status,
            text: self.body,
            timestamp: self.fetched_at,
        };
        (result, self.url)
    }
}

/// Anything that can fetch one page for the frontier
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, sending `referer` when one is known
    ///
    /// # Errors
    ///
    /// Only transport-level failures are errors. An HTTP 404 or 500 is a
    /// successful fetch.
    async fn fetch(&self, url: &Url, referer: Option<&Url>) -> Result<FetchedPage, FetchError>;
}

/// reqwest-backed fetcher, built once per crawl session
pub struct HttpFetcher {
    /// HTTP client with per-session redirect policy and cookie store
    client: Client,

    /// User agents to rotate through
    user_agents: Vec<String>,
}

impl HttpFetcher {
    /// Create a fetcher for a session restricted to `domains`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &FetcherConfig, domains: DomainFilter) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(redirect_policy(config.max_redirects, domains))
            .gzip(true)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            user_agents: config.user_agents.clone(),
        })
    }

    /// Create a fetcher with default settings and no domain restriction
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(&FetcherConfig::default(), DomainFilter::unrestricted())
    }
}

/// Follow at most `max_redirects` hops, and never out of `domains`
///
/// A redirect that is not followed is not an error: the 3xx response is
/// handed back and becomes the page result.
fn redirect_policy(max_redirects: usize, domains: DomainFilter) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            tracing::debug!(url = %attempt.url(), "Redirect limit reached");
            attempt.stop()
        } else if !domains.allows(attempt.url()) {
            tracing::debug!(url = %attempt.url(), "Not following redirect outside allowed domains");
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, referer: Option<&Url>) -> Result<FetchedPage, FetchError> {
        if !is_crawlable(url) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let user_agent = random_user_agent(&self.user_agents);
        let headers = build_page_headers(user_agent, referer.map(Url::as_str));

        tracing::debug!(url = %url, referer = ?referer.map(Url::as_str), "Fetching URL");

        let response = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
            fetched_at: Utc::now(),
        })
    }
}
