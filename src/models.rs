// Core data structures for sitestream

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Crawl request as sent by a caller
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CrawlRequest {
    pub url: String,
    #[serde(default)]
    pub allowed_domains: Vec<String>, // exact host names, empty = unrestricted
    #[serde(default)]
    pub max_depth: i32, // link hops from the seed
}

impl CrawlRequest {
    /// Create a request for a seed URL with no domain restriction
    pub fn new(url: impl Into<String>, max_depth: i32) -> Self {
        Self {
            url: url.into(),
            allowed_domains: Vec::new(),
            max_depth,
        }
    }

    /// Restrict the crawl to the given host names
    pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_domains = domains.into_iter().map(Into::into).collect();
        self
    }
}

/// A candidate URL together with its hop count from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32, // seed = 0
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }

    pub fn is_seed(&self) -> bool {
        self.depth == 0
    }
}

/// One fetched page, emitted once per accepted URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageResult {
    pub url: String,
    pub status: u16,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// How a session that did not fail came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Frontier exhausted
    Completed,
    /// Deadline elapsed, consumer gone or cancelled
    Aborted,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

/// Terminal frame of a successful stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndFrame {
    pub outcome: Outcome,
    pub pages: u64,
}

/// Terminal frame of a failed stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorFrame {
    pub code: String,
    pub message: String,
}

/// One line of the NDJSON response stream
///
/// Serialized externally tagged, e.g. `{"page":{...}}` or `{"end":{...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamFrame {
    Page(PageResult),
    End(EndFrame),
    Error(ErrorFrame),
}

impl StreamFrame {
    /// Encode as a single newline-terminated JSON line
    pub fn to_line(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Page(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> PageResult {
        PageResult {
            url: "https://example.com/".to_string(),
            status: 404,
            text: "<html></html>".to_string(),
            timestamp: "2024-01-15T14:30:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_request_defaults_when_fields_missing() {
        let request: CrawlRequest = serde_json::from_str(r#"{"url":"https://example.com"}"#).unwrap();
        assert_eq!(request.url, "https://example.com");
        assert!(request.allowed_domains.is_empty());
        assert_eq!(request.max_depth, 0);
    }

    #[test]
    fn test_request_builder() {
        let request = CrawlRequest::new("https://example.com", 2).with_allowed_domains(["example.com"]);
        assert_eq!(request.allowed_domains, vec!["example.com".to_string()]);
        assert_eq!(request.max_depth, 2);
    }

    #[test]
    fn test_frontier_entry_seed() {
        let url = Url::parse("https://example.com").unwrap();
        assert!(FrontierEntry::new(url.clone(), 0).is_seed());
        assert!(!FrontierEntry::new(url, 1).is_seed());
    }

    #[test]
    fn test_page_frame_wire_format() {
        let line = StreamFrame::Page(sample_page()).to_line().unwrap();
        let text = String::from_utf8(line).unwrap();

        assert!(text.ends_with('\n'));
        assert!(text.starts_with(r#"{"page":{"url":"https://example.com/","status":404"#));
        assert!(text.contains(r#""timestamp":"2024-01-15T14:30:00Z""#));
    }

    #[test]
    fn test_end_frame_wire_format() {
        let frame = StreamFrame::End(EndFrame {
            outcome: Outcome::Aborted,
            pages: 3,
        });
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"end":{"outcome":"aborted","pages":3}}"#);
        assert!(frame.is_terminal());
    }

    #[test]
    fn test_error_frame_parses() {
        let frame: StreamFrame =
            serde_json::from_str(r#"{"error":{"code":"internal","message":"boom"}}"#).unwrap();
        assert_eq!(
            frame,
            StreamFrame::Error(ErrorFrame {
                code: "internal".to_string(),
                message: "boom".to_string(),
            })
        );
    }
}
