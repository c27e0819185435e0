//! Event store collaborators: the append client and the projection reader.
//!
//! Both sides of the store are modeled as traits so the orchestrator can be
//! exercised against in-memory doubles in tests:
//!
//! - [`EventAppender`] — appends a batch of canonical events to a named,
//!   append-only stream
//! - [`StateReader`] — queries the materialized state of one projection
//!   partition, where "no state yet" is an `Ok(None)`, deliberately ambiguous
//!   between "never created" and "not yet materialized"
//!
//! The HTTP implementations ([`AppendClient`], [`ProjectionClient`]) are pure
//! transport plus error classification; retry policy lives with the caller.

use std::future::Future;
use std::time::Duration;

pub mod append;
pub mod error;
pub mod projection;
pub mod retry;

pub use append::AppendClient;
pub use error::{StoreError, StoreErrorKind};
pub use projection::ProjectionClient;
pub use retry::{RetryConfig, RetryResult, retry_with_backoff};

use crate::events::CanonicalEvent;
use crate::types::{PartitionKey, StreamName};

/// Connection settings for the external event store.
///
/// Constructed once at startup (see `Config::from_env`) and passed into the
/// clients; there is no ambient store configuration anywhere else.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Base URL of the store, e.g. `http://localhost:2113`.
    pub base_url: String,

    /// Basic-auth username.
    pub username: String,

    /// Basic-auth password.
    pub password: String,

    /// Per-request timeout for both store calls. A timeout classifies as a
    /// transient error.
    pub request_timeout: Duration,
}

impl StoreSettings {
    /// The base URL without a trailing slash, ready for path concatenation.
    pub(crate) fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Appends event batches to named streams in the external store.
///
/// Order within the batch is preserved as append order. The store may expose
/// no atomicity guarantee across a batch; callers must not assume partial
/// failure is impossible, which is why event ids are generated once and reused
/// verbatim on any retry.
pub trait EventAppender {
    /// Appends `events` (non-empty, ordered) to `stream` as a single batch.
    fn append(
        &self,
        stream: &StreamName,
        events: &[CanonicalEvent],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Queries materialized projection state by partition key.
///
/// Reads are stateless single queries with no client-side caching: state can
/// change between calls, and staleness is the store's problem, not the
/// reader's. `Ok(None)` means the partition has no materialized state, which
/// the caller must reconcile (it may be "never created" or "not caught up").
pub trait StateReader {
    /// Fetches the state of one partition of a named projection.
    fn get_state(
        &self,
        projection: &'static str,
        partition: &PartitionKey,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, StoreError>> + Send;
}
