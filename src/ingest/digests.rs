//! Digest creation and lookup.

use crate::events::digest;
use crate::store::{EventAppender, RetryConfig, StateReader, retry_with_backoff};
use crate::types::{DigestId, PartitionKey, StreamName, projections};

use super::{DigestState, IngestError, Phase, decode_state};

/// Acknowledgment of a created digest.
///
/// The digest is durably appended but not necessarily visible on the read
/// side yet; callers reading it back must tolerate the staleness window.
#[derive(Debug, Clone)]
pub struct DigestCreated {
    pub digest_id: DigestId,
    pub description: String,
}

/// Creates a digest: validate → build the `DigestAdded` event → append.
///
/// No context to resolve — digests are root entities.
pub async fn create<A: EventAppender>(
    appender: &A,
    retry: RetryConfig,
    description: Option<&str>,
) -> Result<DigestCreated, IngestError> {
    // Validating
    let new_digest = digest::create(description)?;

    // Appending
    let stream = StreamName::digests();
    let events = [new_digest.event];
    retry_with_backoff(retry, || appender.append(&stream, &events))
        .await
        .into_result()
        .map_err(|e| IngestError::store(Phase::Appending, e))?;

    // Acknowledging
    tracing::info!(digest_id = %new_digest.digest_id, "digest created");

    Ok(DigestCreated {
        digest_id: new_digest.digest_id,
        description: new_digest.description,
    })
}

/// Looks up a digest's materialized state.
///
/// A missing partition is a genuine unknown-entity error here: readers of an
/// arbitrary digest id get no staleness grace.
pub async fn lookup<R: StateReader>(
    reader: &R,
    digest_id: DigestId,
) -> Result<DigestState, IngestError> {
    let partition = PartitionKey::digest(&digest_id);
    let state = reader
        .get_state(projections::DIGEST, &partition)
        .await
        .map_err(|e| IngestError::store(Phase::ResolvingContext, e))?
        .ok_or_else(|| IngestError::unknown_digest(digest_id))?;

    decode_state(projections::DIGEST, state)
        .map_err(|e| IngestError::store(Phase::ResolvingContext, e))
}
