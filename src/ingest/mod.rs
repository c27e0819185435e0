//! The ingestion orchestrator.
//!
//! Each inbound request walks a fixed sequence of phases:
//!
//! ```text
//! Validating → ResolvingContext → Translating → Appending → Acknowledging
//! ```
//!
//! with a classified failure reachable from any phase. The orchestrator owns
//! request-scoped data only; all durable state lives in the external store,
//! so concurrent requests never share mutable in-process state.
//!
//! Read-side reconciliation: a projection partition reflects a *prefix* of
//! appended events, so "no state" is ambiguous between "never created" and
//! "not yet materialized". Where the causal chain makes recent creation
//! likely (a digest referenced by the inbox being created for it), the lookup
//! polls inside an explicit, configurable staleness window before concluding
//! the entity does not exist. Where it does not (an inbox targeted by
//! commits), "no state" is an immediate unknown-entity error.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::events::ValidationError;
use crate::store::{StateReader, StoreError};
use crate::translators::{TranslationError, UnsupportedProviderError};
use crate::types::{DigestId, InboxId, PartitionKey, ProviderFamily};

pub mod commits;
pub mod digests;
pub mod inboxes;

pub use commits::{CommitIngestOutcome, CommitsAccepted};
pub use digests::DigestCreated;
pub use inboxes::InboxCreated;

/// The phase an ingestion request is in, used to label failures and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    ResolvingContext,
    Translating,
    Appending,
    Acknowledging,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validating => "validating",
            Phase::ResolvingContext => "resolving-context",
            Phase::Translating => "translating",
            Phase::Appending => "appending",
            Phase::Acknowledging => "acknowledging",
        };
        write!(f, "{name}")
    }
}

/// A classified ingestion failure.
///
/// Every error is typed at the point of detection and carried upward; the
/// HTTP layer maps the variants onto status codes. Nothing is silently
/// swallowed: store failures keep their phase and underlying cause for
/// logging.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Client-supplied data violated schema rules (400-class).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced digest or inbox does not exist (404-class).
    #[error("Could not find a {kind} with id {id}.")]
    UnknownEntity { kind: &'static str, id: String },

    /// No translator recognizes the request (400-class).
    #[error(transparent)]
    UnsupportedProvider(#[from] UnsupportedProviderError),

    /// A recognized provider sent a malformed payload (400-class).
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// A store call failed fatally, or transiently past the retry budget
    /// (500-class).
    #[error("event store failure while {phase}: {source}")]
    Store {
        phase: Phase,
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    pub fn unknown_digest(id: DigestId) -> Self {
        IngestError::UnknownEntity {
            kind: "digest",
            id: id.to_string(),
        }
    }

    pub fn unknown_inbox(id: InboxId) -> Self {
        IngestError::UnknownEntity {
            kind: "inbox",
            id: id.to_string(),
        }
    }

    pub fn store(phase: Phase, source: StoreError) -> Self {
        IngestError::Store { phase, source }
    }
}

/// How long a just-written entity is allowed to stay invisible on the read
/// side, and how often to re-check while waiting.
#[derive(Debug, Clone, Copy)]
pub struct StalenessConfig {
    /// Total window to keep polling before concluding "does not exist".
    pub window: Duration,

    /// Pause between consecutive polls.
    pub poll_interval: Duration,
}

impl StalenessConfig {
    pub const DEFAULT: Self = StalenessConfig {
        window: Duration::from_millis(1500),
        poll_interval: Duration::from_millis(150),
    };
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// Typed projection states
//
// The store hands back raw JSON; these are the documented shapes the read
// side materializes. A state document that fails to decode is a fatal store
// error, not a client error.
// ============================================================================

/// Materialized state of one digest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestState {
    pub digest_id: DigestId,
    pub description: String,
}

/// Materialized state of one inbox.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxState {
    pub inbox_id: InboxId,
    pub digest_id: DigestId,
    pub family: ProviderFamily,
    pub name: String,
    pub url: String,
}

/// Materialized inbox list of one digest, keyed by inbox id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct DigestInboxesState {
    pub inboxes: BTreeMap<InboxId, InboxState>,
}

/// Decodes a raw state document into its documented shape.
pub(crate) fn decode_state<T: serde::de::DeserializeOwned>(
    projection: &'static str,
    value: serde_json::Value,
) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| {
        StoreError::fatal(format!(
            "projection {projection} returned a state document that does not match its schema: {e}"
        ))
    })
}

/// Reads projection state, polling through the staleness window on `None`.
///
/// Store errors propagate immediately — only the not-yet-materialized case is
/// retried. Returns `Ok(None)` once the window elapses without state
/// appearing.
pub(crate) async fn read_state_tolerating_staleness<R: StateReader>(
    reader: &R,
    projection: &'static str,
    partition: &PartitionKey,
    staleness: StalenessConfig,
) -> Result<Option<serde_json::Value>, StoreError> {
    let deadline = Instant::now() + staleness.window;

    loop {
        if let Some(state) = reader.get_state(projection, partition).await? {
            return Ok(Some(state));
        }

        if Instant::now() >= deadline {
            return Ok(None);
        }

        tracing::debug!(
            projection,
            partition = %partition,
            poll_interval_ms = staleness.poll_interval.as_millis() as u64,
            "state not yet materialized, polling within staleness window"
        );
        tokio::time::sleep(staleness.poll_interval).await;
    }
}
