//! HTTP API handlers for the scrape server
//!
//! `POST /api/v1/scrape` answers with `application/x-ndjson`: one
//! [`StreamFrame`] per line, pages first, then exactly one terminal frame.

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tracing::Instrument;

use crate::crawler::{
    CancellationGate, CrawlScope, CrawlSession, HttpFetcher, PageSink, SinkClosed,
};
use crate::error::Error;
use crate::models::{CrawlRequest, EndFrame, ErrorFrame, PageResult, StreamFrame};

use super::AppState;

/// Caller deadline header, in milliseconds from receipt
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// How long a finished session waits to hand over its terminal frame
const TERMINAL_FRAME_GRACE: Duration = Duration::from_secs(5);

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

// ============================================================================
// Frame Sink
// ============================================================================

/// Page sink feeding the response body channel
pub struct FrameSink {
    tx: mpsc::Sender<StreamFrame>,
}

impl FrameSink {
    pub fn new(tx: mpsc::Sender<StreamFrame>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl PageSink for FrameSink {
    async fn send_page(&mut self, page: PageResult) -> Result<(), SinkClosed> {
        self.tx
            .send(StreamFrame::Page(page))
            .await
            .map_err(|_| SinkClosed)
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/api/health", get(health_check))
        // Crawl endpoints
        .route("/api/v1/scrape", post(scrape))
        .with_state(state)
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();

    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
        active_sessions: state.active_sessions(),
    }))
}

// ============================================================================
// Scrape Handlers
// ============================================================================

/// Parse the caller's deadline header
fn caller_timeout(headers: &HeaderMap) -> Result<Option<Duration>, String> {
    let Some(value) = headers.get(REQUEST_TIMEOUT_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|ms| Some(Duration::from_millis(ms)))
        .ok_or_else(|| format!("invalid {REQUEST_TIMEOUT_HEADER} header"))
}

fn has_bearer_token(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") && v.len() > "Bearer ".len())
}

/// Earlier of the caller's deadline and the server cap
fn session_timeout(caller: Option<Duration>, cap: Option<Duration>) -> Option<Duration> {
    match (caller, cap) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Start a crawl session and stream its pages
async fn scrape(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CrawlRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected scrape request");
            return error_response(rejection.status(), rejection.body_text());
        }
    };

    let timeout = match caller_timeout(&headers) {
        Ok(timeout) => timeout,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let scope = match CrawlScope::from_request(&request) {
        Ok(scope) => scope,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    tracing::info!(
        url = %request.url,
        allowed_domains = ?request.allowed_domains,
        max_depth = request.max_depth,
        timeout_ms = ?timeout.map(|t| t.as_millis()),
        has_token = has_bearer_token(&headers),
        "Scrape request"
    );

    let fetcher = match HttpFetcher::new(&state.config.fetcher, scope.domains.clone()) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create fetcher");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let deadline = session_timeout(timeout, state.config.server.max_session())
        .map(|t| tokio::time::Instant::now() + t);
    let gate = CancellationGate::new(deadline, state.shutdown.child_token());

    let (tx, rx) = mpsc::channel::<StreamFrame>(state.config.server.stream_buffer);
    let guard = state.track_session();
    let span = tracing::info_span!("session", url = %scope.seed, max_depth = scope.max_depth);

    tokio::spawn(
        async move {
            let _guard = guard;
            let mut session = CrawlSession::new(scope, fetcher, FrameSink::new(tx.clone()), gate);

            let terminal = match session.run().await {
                Ok(report) => StreamFrame::End(EndFrame {
                    outcome: report.outcome.outcome(),
                    pages: report.pages,
                }),
                Err(e) => {
                    let message = format!("error scraping: {e}");
                    let err = Error::from(e);
                    StreamFrame::Error(ErrorFrame {
                        code: err.code().to_string(),
                        message,
                    })
                }
            };

            match tokio::time::timeout(TERMINAL_FRAME_GRACE, tx.send(terminal)).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => tracing::debug!("Consumer gone before terminal frame"),
                Err(_) => tracing::warn!("Consumer stalled, dropping terminal frame"),
            }
        }
        .instrument(span),
    );

    let body = Body::from_stream(ReceiverStream::new(rx).map(|frame| frame.to_line()));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

// ============================================================================
// Tests
// ============================================================================
