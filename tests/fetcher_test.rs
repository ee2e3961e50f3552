//! Integration tests for HttpFetcher using wiremock
//!
//! These tests validate the HTTP fetcher's behavior with mock servers.

use sitestream::config::FetcherConfig;
use sitestream::crawler::{DomainFilter, FetchError, HttpFetcher, PageFetcher};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

/// Test successful fetch from mock server
#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;
    let html = r#"<!DOCTYPE html>
<html>
<head><title>Test Page</title></head>
<body><h1>Hello</h1><p>Body text.</p></body>
</html>"#;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::with_defaults().unwrap();
    let url = page_url(&mock_server, "/page");
    let result = fetcher.fetch(&url, None).await;

    assert!(result.is_ok(), "Fetch should succeed: {:?}", result.err());
    let page = result.unwrap();
    assert_eq!(page.status, 200);
    assert_eq!(page.url, url);
    assert!(page.body.contains("<h1>Hello</h1>"));
}

/// Test 404 is a page, not an error
#[tokio::test]
async fn test_404_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .expect(1) // Fetched once, never retried
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::with_defaults().unwrap();
    let page = fetcher
        .fetch(&page_url(&mock_server, "/notfound"), None)
        .await
        .unwrap();

    assert_eq!(page.status, 404);
    assert_eq!(page.body, "gone");
}

/// Test browser-like headers are sent
#[tokio::test]
async fn test_headers_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::with_defaults().unwrap();
    let result = fetcher.fetch(&page_url(&mock_server, "/headers"), None).await;

    assert!(result.is_ok(), "Request with headers should succeed");
}

/// Test the configured user agent pool is used
#[tokio::test]
async fn test_configured_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "sitestream-test/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = FetcherConfig {
        user_agents: vec!["sitestream-test/1.0".to_string()],
        ..FetcherConfig::default()
    };
    let fetcher = HttpFetcher::new(&config, DomainFilter::unrestricted()).unwrap();

    for _ in 0..3 {
        let page = fetcher.fetch(&page_url(&mock_server, "/"), None).await.unwrap();
        assert_eq!(page.status, 200);
    }
}

/// Test referer header is sent only when given
#[tokio::test]
async fn test_referer_header() {
    let mock_server = MockServer::start().await;
    let referer = page_url(&mock_server, "/from");

    Mock::given(method("GET"))
        .and(path("/to"))
        .and(header("referer", referer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("with referer"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::with_defaults().unwrap();
    let page = fetcher
        .fetch(&page_url(&mock_server, "/to"), Some(&referer))
        .await
        .unwrap();

    assert_eq!(page.body, "with referer");
}

/// Test request timeout
#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("OK")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let config = FetcherConfig {
        request_timeout_secs: 1,
        ..FetcherConfig::default()
    };
    let fetcher = HttpFetcher::new(&config, DomainFilter::unrestricted()).unwrap();
    let result = fetcher.fetch(&page_url(&mock_server, "/slow"), None).await;

    assert!(
        matches!(result, Err(FetchError::Timeout)),
        "Should time out: {result:?}"
    );
}

/// Test redirect limit keeps the last 3xx as the page
#[tokio::test]
async fn test_redirect_limit() {
    let mock_server = MockServer::start().await;
    let target = page_url(&mock_server, "/target");

    Mock::given(method("GET"))
        .and(path("/hop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", target.as_str()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/target"))
        .respond_with(ResponseTemplate::new(200).set_body_string("arrived"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let hop = page_url(&mock_server, "/hop");

    let follows = HttpFetcher::with_defaults().unwrap();
    let page = follows.fetch(&hop, None).await.unwrap();
    assert_eq!(page.status, 200);
    assert_eq!(page.url, target);

    let config = FetcherConfig {
        max_redirects: 0,
        ..FetcherConfig::default()
    };
    let stops = HttpFetcher::new(&config, DomainFilter::unrestricted()).unwrap();
    let page = stops.fetch(&hop, None).await.unwrap();
    assert_eq!(page.status, 302);
    assert_eq!(page.url, hop);
}

/// Test connection refused is a transport error
#[tokio::test]
async fn test_connection_refused() {
    let fetcher = HttpFetcher::with_defaults().unwrap();
    let url = Url::parse("http://127.0.0.1:1/").unwrap();

    let result = fetcher.fetch(&url, None).await;
    assert!(matches!(result, Err(FetchError::Http(_))));
}
