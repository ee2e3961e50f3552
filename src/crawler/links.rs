//! Anchor link extraction
//!
//! Parses `a[href]` elements in document order and resolves each href
//! against the page it came from. Hrefs that do not resolve are dropped.

use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

fn anchor_selector() -> &'static Selector {
    static ANCHOR: OnceLock<Selector> = OnceLock::new();
    ANCHOR.get_or_init(|| Selector::parse("a[href]").expect("Invalid anchor selector"))
}

/// Extracts absolute link targets from HTML bodies
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkExtractor;

impl LinkExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract every anchor target from `body`, in document order
    ///
    /// Duplicates are kept; deduplication is the frontier's job. Non-http
    /// targets such as `mailto:` are returned too so the caller decides.
    ///
    /// # Examples
    ///
    /// ```
    /// use sitestream::crawler::links::LinkExtractor;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://example.com/docs/").unwrap();
    /// let html = r#"<a href="intro">Intro</a><a href="/about">About</a>"#;
    /// let links = LinkExtractor::new().extract(html, &base);
    ///
    /// assert_eq!(links[0].as_str(), "https://example.com/docs/intro");
    /// assert_eq!(links[1].as_str(), "https://example.com/about");
    /// ```
    pub fn extract(&self, body: &str, base: &Url) -> Vec<Url> {
        let document = Html::parse_document(body);

        document
            .select(anchor_selector())
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve(base, href))
            .collect()
    }
}

/// Resolve an href relative to the page URL
fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match base.join(href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::trace!(href = %href, error = %e, "Skipping malformed link");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/page/").unwrap()
    }

    fn extract(html: &str) -> Vec<String> {
        LinkExtractor::new()
            .extract(html, &base())
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_extract_absolute_link() {
        let links = extract(r#"<a href="https://www.rust-lang.org">Rust</a>"#);
        assert_eq!(links, vec!["https://www.rust-lang.org/"]);
    }

    #[test]
    fn test_resolve_relative_links() {
        let links = extract(
            r#"
            <a href="/docs">Docs</a>
            <a href="../about">About</a>
            <a href="child">Child</a>
            <a href="?q=1">Query</a>
        "#,
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/docs",
                "https://example.com/about",
                "https://example.com/page/child",
                "https://example.com/page/?q=1",
            ]
        );
    }

    #[test]
    fn test_document_order_and_duplicates_kept() {
        let links = extract(
            r#"<ul><li><a href="/b">B</a></li></ul><p><a href="/a">A</a><a href="/b">B again</a></p>"#,
        );
        assert_eq!(
            links,
            vec![
                "https://example.com/b",
                "https://example.com/a",
                "https://example.com/b",
            ]
        );
    }

    #[test]
    fn test_anchor_without_href_ignored() {
        let links = extract(r#"<a name="top">Top</a><a href="/x">X</a>"#);
        assert_eq!(links, vec!["https://example.com/x"]);
    }

    #[test]
    fn test_malformed_href_skipped() {
        let links = extract(r#"<a href="http://[::1">bad</a><a href="">empty</a><a href="/ok">ok</a>"#);
        assert_eq!(links, vec!["https://example.com/ok"]);
    }

    #[test]
    fn test_fragment_links_resolved() {
        let links = extract(r##"<a href="#section">Jump</a>"##);
        assert_eq!(links, vec!["https://example.com/page/#section"]);
    }

    #[test]
    fn test_non_html_body() {
        assert!(extract("plain text, no markup").is_empty());
    }
}
