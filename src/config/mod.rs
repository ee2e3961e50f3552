//! Configuration management for sitestream
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

pub mod server;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::crawler::headers::DEFAULT_USER_AGENTS;

pub use server::{ConfigError, ServerConfig, ServerConfigBuilder, DEFAULT_PORT};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scrape server configuration
    pub server: ServerConfig,

    /// Page fetcher configuration
    pub fetcher: FetcherConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Page fetcher configuration, applied to every session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Redirect hops followed before the 3xx response is kept as the page
    pub max_redirects: usize,

    /// User agents to rotate through
    pub user_agents: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_redirects: 10,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }
}

impl FetcherConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Parse an environment variable, ignoring unset or malformed values
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = env_parse::<u16>("PORT").unwrap_or(DEFAULT_PORT);

        let bind_host = match std::env::var("SITESTREAM_BIND_HOST") {
            Ok(host) => host
                .trim()
                .parse()
                .with_context(|| format!("Invalid SITESTREAM_BIND_HOST: {host}"))?,
            Err(_) => defaults.server.bind_host,
        };

        let max_session_secs = env_parse::<u64>("SITESTREAM_MAX_SESSION_SECS");

        let stream_buffer = env_parse::<usize>("SITESTREAM_STREAM_BUFFER")
            .unwrap_or(defaults.server.stream_buffer);

        let enable_request_logging = env_parse::<bool>("SITESTREAM_REQUEST_LOGGING")
            .unwrap_or(defaults.server.enable_request_logging);

        let request_timeout_secs = env_parse::<u64>("SITESTREAM_REQUEST_TIMEOUT")
            .unwrap_or(defaults.fetcher.request_timeout_secs);

        let max_redirects = env_parse::<usize>("SITESTREAM_MAX_REDIRECTS")
            .unwrap_or(defaults.fetcher.max_redirects);

        // Comma separated; user agents themselves never contain commas
        let user_agents = std::env::var("SITESTREAM_USER_AGENTS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|ua| !ua.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|agents| !agents.is_empty())
            .unwrap_or(defaults.fetcher.user_agents);

        let log_level =
            std::env::var("SITESTREAM_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format =
            std::env::var("SITESTREAM_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            server: ServerConfig {
                bind_host,
                port,
                max_session_secs,
                stream_buffer,
                enable_request_logging,
            },
            fetcher: FetcherConfig {
                request_timeout_secs,
                max_redirects,
                user_agents,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;

        if self.fetcher.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.fetcher.user_agents.iter().all(|ua| ua.trim().is_empty()) {
            anyhow::bail!("user_agents must contain at least one entry");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json', got '{}'", self.logging.format);
        }

        Ok(())
    }
}
