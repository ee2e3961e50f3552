//! Scrape server
//!
//! Serves `POST /api/v1/scrape` as an NDJSON stream of page frames, one
//! crawl session per request, plus a health endpoint.

pub mod api;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::{Config, ConfigError};

use self::api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Config>,

    /// Server start time
    pub start_time: Instant,

    /// Sessions currently streaming
    pub active_sessions: Arc<AtomicUsize>,

    /// Root token; every session holds a child of it
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            start_time: Instant::now(),
            active_sessions: Arc::new(AtomicUsize::new(0)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }

    /// Count a session as active until the guard is dropped
    pub fn track_session(&self) -> SessionGuard {
        self.active_sessions.fetch_add(1, Ordering::SeqCst);
        SessionGuard {
            active: self.active_sessions.clone(),
        }
    }
}

/// Decrements the active session count on drop
pub struct SessionGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Crawl Server
// ============================================================================

/// Main scrape server
pub struct CrawlServer {
    state: AppState,
}

impl CrawlServer {
    /// Create a new scrape server
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config.server.validate().map_err(ServerError::Config)?;

        Ok(Self {
            state: AppState::new(config),
        })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Token that stops the server and every running session when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        // Add tracing layer if enabled
        if self.state.config.server.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Bind the configured address and serve until ctrl-c
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Bind the configured address and serve until `shutdown_signal` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let address = self.state.config.server.bind_address();
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;

        let token = self.state.shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal.await;
            tracing::info!("Shutdown signal received");
            token.cancel();
        });

        self.serve(listener).await
    }

    /// Serve on an already bound listener until the shutdown token is cancelled
    ///
    /// In-flight sessions see the cancellation at their next gate check and
    /// finish their streams with an aborted end frame.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let router = self.build_router();
        let address = listener.local_addr().map_err(ServerError::Serve)?;

        tracing::info!(address = %address, "Listening");

        let token = self.state.shutdown.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        let server = &self.state.config.server;
        ServerInfo {
            bind_address: server.bind_address(),
            max_session_secs: server.max_session_secs,
            stream_buffer: server.stream_buffer,
            request_logging_enabled: server.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub max_session_secs: Option<u64>,
    pub stream_buffer: usize,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Scrape Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Max Session: {}\n\
             Stream Buffer: {} frames\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.max_session_secs
                .map(|secs| format!("{secs}s"))
                .unwrap_or_else(|| "caller deadline only".to_string()),
            self.stream_buffer,
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error
    Config(ConfigError),

    /// Failed to bind to address
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },

    /// Server error
    Serve(std::io::Error),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Bind { address, source } => write!(f, "Failed to bind {}: {}", address, source),
            Self::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Bind { source, .. } => Some(source),
            Self::Serve(e) => Some(e),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let server = CrawlServer::new(Config::default());
        assert!(server.is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.server.stream_buffer = 0;

        let err = CrawlServer::new(config).err().unwrap();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_server_info() {
        let mut config = Config::default();
        config.server.max_session_secs = Some(90);
        let server = CrawlServer::new(config).unwrap();
        let info = server.info();

        assert_eq!(info.bind_address.port(), 8080);
        assert!(info.display().contains("Max Session: 90s"));
        assert!(info.request_logging_enabled);
    }

    #[test]
    fn test_session_guard_counts() {
        let state = AppState::new(Config::default());
        assert_eq!(state.active_sessions(), 0);

        let first = state.track_session();
        let second = state.track_session();
        assert_eq!(state.active_sessions(), 2);

        drop(first);
        assert_eq!(state.active_sessions(), 1);
        drop(second);
        assert_eq!(state.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown_token() {
        let server = CrawlServer::new(Config::default()).unwrap();
        let token = server.shutdown_token();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let handle = tokio::spawn(async move { server.serve(listener).await });
        token.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
