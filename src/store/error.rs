//! Event store error types.
//!
//! Every store failure is classified at the point of detection as transient
//! or fatal. The distinction drives the orchestrator's retry logic:
//!
//! - **Transient** errors are retriable with backoff (5xx, 429, timeouts,
//!   connection failures)
//! - **Fatal** errors are surfaced immediately and never retried (the store
//!   rejected the request itself, e.g. a malformed batch)

use std::fmt;
use thiserror::Error;

/// The kind of store error, categorized for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Transient error - safe to retry with backoff.
    ///
    /// Examples:
    /// - HTTP 5xx (store unavailable or failing)
    /// - HTTP 429 (throttled)
    /// - Request timeouts
    /// - Connection-level failures
    Transient,

    /// Fatal error - the request itself is wrong; retrying cannot help.
    ///
    /// Examples:
    /// - HTTP 4xx (malformed batch, bad credentials, unknown projection)
    /// - An empty batch rejected before any network call
    /// - A state document that fails to parse as JSON
    Fatal,
}

impl StoreErrorKind {
    /// Returns true if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        matches!(self, StoreErrorKind::Transient)
    }
}

/// A classified event store error.
#[derive(Debug, Error)]
pub struct StoreError {
    /// The kind of error (transient or fatal).
    pub kind: StoreErrorKind,

    /// The HTTP status code, if the store answered at all.
    pub status_code: Option<u16>,

    /// A human-readable description, logged but never sent to API callers.
    pub message: String,

    /// The underlying transport error, if any.
    #[source]
    pub source: Option<reqwest::Error>,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "event store error (HTTP {}): {}", code, self.message),
            None => write!(f, "event store error: {}", self.message),
        }
    }
}

impl StoreError {
    /// Creates a fatal error with no transport source.
    pub fn fatal(message: impl Into<String>) -> Self {
        StoreError {
            kind: StoreErrorKind::Fatal,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transient error with no transport source.
    pub fn transient(message: impl Into<String>) -> Self {
        StoreError {
            kind: StoreErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Classifies a transport-level failure (the request never got a
    /// response).
    ///
    /// Timeouts and connection errors are transient; anything else at this
    /// layer (e.g. a request builder error) cannot be fixed by retrying.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() {
            StoreErrorKind::Transient
        } else if err.is_builder() || err.is_decode() {
            StoreErrorKind::Fatal
        } else {
            // Mid-stream failures without a clearer signal: retriable.
            StoreErrorKind::Transient
        };

        StoreError {
            kind,
            status_code: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Classifies a non-success HTTP status returned by the store.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        StoreError {
            kind: classify_status(status),
            status_code: Some(status),
            message: body.into(),
            source: None,
        }
    }
}

/// Status code classification shared by both store clients.
fn classify_status(status: u16) -> StoreErrorKind {
    match status {
        429 => StoreErrorKind::Transient,
        500..=599 => StoreErrorKind::Transient,
        _ => StoreErrorKind::Fatal,
    }
}
