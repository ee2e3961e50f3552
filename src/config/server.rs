//! Scrape server configuration

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STREAM_BUFFER: usize = 16;

/// Configuration for the scrape server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub bind_host: IpAddr,

    /// Listen port
    pub port: u16,

    /// Upper bound on any session, applied on top of the caller's deadline
    pub max_session_secs: Option<u64>,

    /// Frames buffered between a session and its response body
    pub stream_buffer: usize,

    /// Enable request logging
    pub enable_request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_session_secs: None,
            stream_buffer: DEFAULT_STREAM_BUFFER,
            enable_request_logging: true,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    #[must_use]
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.port)
    }

    #[must_use]
    pub fn max_session(&self) -> Option<Duration> {
        self.max_session_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stream_buffer".to_string(),
                reason: "Must buffer at least 1 frame".to_string(),
            });
        }

        if self.max_session_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_session_secs".to_string(),
                reason: "Must be positive when set".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    bind_host: Option<IpAddr>,
    port: Option<u16>,
    max_session_secs: Option<u64>,
    stream_buffer: Option<usize>,
    enable_request_logging: Option<bool>,
}

impl ServerConfigBuilder {
    /// Set bind host
    pub fn bind_host(mut self, host: IpAddr) -> Self {
        self.bind_host = Some(host);
        self
    }

    /// Set bind host from string
    pub fn bind_host_str(mut self, host: &str) -> Result<Self, ConfigError> {
        self.bind_host = Some(host.parse().map_err(|_| ConfigError::InvalidValue {
            field: "bind_host".to_string(),
            reason: format!("Invalid address: {}", host),
        })?);
        Ok(self)
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Cap every session at `secs`
    pub fn max_session_secs(mut self, secs: u64) -> Self {
        self.max_session_secs = Some(secs);
        self
    }

    pub fn stream_buffer(mut self, frames: usize) -> Self {
        self.stream_buffer = Some(frames);
        self
    }

    /// Enable/disable request logging
    pub fn enable_request_logging(mut self, enable: bool) -> Self {
        self.enable_request_logging = Some(enable);
        self
    }

    /// Build the config
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let defaults = ServerConfig::default();
        let config = ServerConfig {
            bind_host: self.bind_host.unwrap_or(defaults.bind_host),
            port: self.port.unwrap_or(defaults.port),
            max_session_secs: self.max_session_secs,
            stream_buffer: self.stream_buffer.unwrap_or(defaults.stream_buffer),
            enable_request_logging: self
                .enable_request_logging
                .unwrap_or(defaults.enable_request_logging),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
