//! Common test utilities

#![allow(dead_code)]

use std::net::SocketAddr;

use sitestream::config::{Config, FetcherConfig};
use sitestream::crawler::{
    CancellationGate, CrawlError, CrawlScope, CrawlSession, HttpFetcher, SessionReport,
};
use sitestream::models::{CrawlRequest, PageResult};
use sitestream::server::CrawlServer;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// HTML page containing one anchor per href, in order
pub fn links(hrefs: &[&str]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">{href}</a></li>"#))
        .collect();
    format!("<html><body><ul>{anchors}</ul></body></html>")
}

/// Serve `body` with status 200 at `route`
pub async fn mount_page(server: &MockServer, route: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.into()))
        .mount(server)
        .await;
}

/// Serve `body` at `route` and verify it is requested exactly `times` times
pub async fn mount_page_expect(server: &MockServer, route: &str, body: impl Into<String>, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.into()))
        .expect(times)
        .mount(server)
        .await;
}

/// Fetcher settings with a short timeout for tests
pub fn test_fetcher_config() -> FetcherConfig {
    FetcherConfig {
        request_timeout_secs: 5,
        ..FetcherConfig::default()
    }
}

/// Run one session against real HTTP and collect what it emitted
pub async fn crawl(
    seed: &str,
    domains: &[&str],
    max_depth: i32,
    gate: CancellationGate,
) -> (Result<SessionReport, CrawlError>, Vec<PageResult>) {
    let request = CrawlRequest::new(seed, max_depth).with_allowed_domains(domains.iter().copied());
    let scope = CrawlScope::from_request(&request).unwrap();
    let fetcher = HttpFetcher::new(&test_fetcher_config(), scope.domains.clone()).unwrap();

    let mut pages: Vec<PageResult> = Vec::new();
    let result = {
        let mut session = CrawlSession::new(scope, fetcher, &mut pages, gate);
        let result = session.run().await;
        result
    };
    (result, pages)
}

/// URL paths of emitted pages, in emission order
pub fn paths(pages: &[PageResult]) -> Vec<String> {
    pages
        .iter()
        .map(|page| Url::parse(&page.url).unwrap().path().to_string())
        .collect()
}

/// Start a scrape server on an ephemeral port
pub async fn spawn_server(mut config: Config) -> (SocketAddr, CancellationToken) {
    config.server.enable_request_logging = false;
    let server = CrawlServer::new(config).unwrap();
    let token = server.shutdown_token();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { server.serve(listener).await });

    (address, token)
}
