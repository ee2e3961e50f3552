use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use sitestream::client::{ClientConfig, ClientError, CrawlClient, NdjsonWriter};
use sitestream::error::SitestreamErrorTrait;
use sitestream::models::CrawlRequest;

/// Parameters for one streamed crawl
pub struct CrawlParams {
    pub host: String,
    pub port: u16,
    pub insecure: bool,
    pub token: Option<String>,
    pub max_depth: i32,
    pub timeout: Duration,
    pub output: PathBuf,
    pub url: String,
    pub allowed_domains: Vec<String>,
}

/// Request a crawl from a scrape server and save the pages
pub async fn crawl(params: CrawlParams) -> Result<()> {
    let CrawlParams {
        host,
        port,
        insecure,
        token,
        max_depth,
        timeout,
        output,
        url,
        allowed_domains,
    } = params;

    let config = ClientConfig::new(host, port)
        .with_insecure(insecure)
        .with_token(token)
        .with_timeout(timeout);
    tracing::info!(server = %config.base_url(), "Connecting to scrape server");

    let client = CrawlClient::new(config)?;
    let request = CrawlRequest::new(url, max_depth).with_allowed_domains(allowed_domains);

    let mut writer = NdjsonWriter::create(&output)
        .await
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;

    match client.crawl(&request, &mut writer).await {
        Ok(summary) => {
            println!(
                "Saved {} pages to {} ({})",
                summary.pages,
                output.display(),
                summary.outcome.as_str()
            );
            Ok(())
        }
        Err(e) => {
            let pages = writer.lines();
            let category = e.category().as_str();
            let message = failure_message(&e);
            if e.is_recoverable() {
                tracing::warn!(error = %e, pages, category, "{message}");
            } else {
                tracing::error!(error = %e, pages, category, "{message}");
            }
            Err(e.into())
        }
    }
}

/// Log message for a failed crawl, hinting when a rerun may succeed
fn failure_message(err: &ClientError) -> &'static str {
    match err {
        ClientError::Connection(_) => "could not connect",
        e if e.is_recoverable() => "error receiving, a retry may succeed",
        _ => "error receiving",
    }
}
