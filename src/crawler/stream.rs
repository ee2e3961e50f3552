//! Page delivery and cooperative cancellation
//!
//! [`StreamSink`] wraps a [`PageSink`] with a [`CancellationGate`]. The gate
//! is consulted before every fetch and every push; once it reports an
//! [`AbortReason`] the frontier unwinds without touching the network again.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::models::PageResult;

/// Why a session stopped early without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// Session deadline elapsed
    DeadlineExpired,
    /// Receiving side went away (caller disconnected or transport broke)
    ConsumerGone,
    /// Cancelled from outside, e.g. server shutdown
    Cancelled,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeadlineExpired => "deadline_expired",
            Self::ConsumerGone => "consumer_gone",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The consumer of a sink can no longer accept pages
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("page consumer is gone")]
pub struct SinkClosed;

/// Destination for emitted pages
#[async_trait]
pub trait PageSink: Send {
    /// Deliver one page; may wait while the consumer applies backpressure
    async fn send_page(&mut self, page: PageResult) -> Result<(), SinkClosed>;

    /// Whether the consumer is already known to be gone
    fn is_closed(&self) -> bool {
        false
    }
}

#[async_trait]
impl PageSink for Vec<PageResult> {
    async fn send_page(&mut self, page: PageResult) -> Result<(), SinkClosed> {
        self.push(page);
        Ok(())
    }
}

#[async_trait]
impl PageSink for mpsc::Sender<PageResult> {
    async fn send_page(&mut self, page: PageResult) -> Result<(), SinkClosed> {
        self.send(page).await.map_err(|_| SinkClosed)
    }

    fn is_closed(&self) -> bool {
        mpsc::Sender::is_closed(self)
    }
}

#[async_trait]
impl<S: PageSink + ?Sized> PageSink for &mut S {
    async fn send_page(&mut self, page: PageResult) -> Result<(), SinkClosed> {
        (**self).send_page(page).await
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// Deadline plus external cancellation for one session
#[derive(Debug, Clone, Default)]
pub struct CancellationGate {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl CancellationGate {
    pub fn new(deadline: Option<Instant>, token: CancellationToken) -> Self {
        Self { deadline, token }
    }

    /// Gate with no deadline and a private token
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Gate expiring `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(Some(Instant::now() + timeout), CancellationToken::new())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Non-blocking check; `None` means keep going
    pub fn check(&self) -> Option<AbortReason> {
        if self.token.is_cancelled() {
            return Some(AbortReason::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(AbortReason::DeadlineExpired),
            _ => None,
        }
    }

    /// Resolves once the deadline passes or the token is cancelled
    pub async fn closed(&self) -> AbortReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = tokio::time::sleep_until(deadline) => AbortReason::DeadlineExpired,
                _ = self.token.cancelled() => AbortReason::Cancelled,
            },
            None => {
                self.token.cancelled().await;
                AbortReason::Cancelled
            }
        }
    }
}

/// Gate-checked page sink
pub struct StreamSink<S> {
    sink: S,
    gate: CancellationGate,
}

impl<S: PageSink> StreamSink<S> {
    pub fn new(sink: S, gate: CancellationGate) -> Self {
        Self { sink, gate }
    }

    pub fn gate(&self) -> &CancellationGate {
        &self.gate
    }

    /// Current abort condition, if any
    pub fn check(&self) -> Option<AbortReason> {
        self.gate.check().or_else(|| {
            self.sink
                .is_closed()
                .then_some(AbortReason::ConsumerGone)
        })
    }

    /// Push one page unless the gate is closed
    ///
    /// A push blocked on backpressure is abandoned when the deadline passes
    /// or the token is cancelled. Any send failure counts as the consumer
    /// being gone.
    pub async fn push(&mut self, page: PageResult) -> Result<(), AbortReason> {
        if let Some(reason) = self.check() {
            return Err(reason);
        }

        let gate = &self.gate;
        let sink = &mut self.sink;

        tokio::select! {
            biased;
            sent = sink.send_page(page) => sent.map_err(|_| AbortReason::ConsumerGone),
            reason = gate.closed() => Err(reason),
        }
    }
}
