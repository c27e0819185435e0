//! Inbox creation and lookup.

use crate::events::inbox::{self, InboxSpec};
use crate::store::{EventAppender, RetryConfig, StateReader, retry_with_backoff};
use crate::types::{DigestId, InboxId, InstanceId, PartitionKey, StreamName, projections};

use super::{
    DigestInboxesState, IngestError, InboxState, Phase, StalenessConfig, decode_state,
    read_state_tolerating_staleness,
};

/// Acknowledgment of a created inbox.
#[derive(Debug, Clone)]
pub struct InboxCreated {
    pub inbox_id: InboxId,
    pub digest_id: DigestId,
}

/// Creates an inbox on a digest.
///
/// The digest-existence check tolerates read-side staleness: a digest created
/// moments ago in the same causal chain may not have materialized yet, so the
/// lookup polls within the configured window before concluding the digest
/// does not exist. Nothing is appended unless the digest is found.
pub async fn create<R: StateReader, A: EventAppender>(
    reader: &R,
    appender: &A,
    retry: RetryConfig,
    staleness: StalenessConfig,
    instance_id: InstanceId,
    digest_id: DigestId,
    spec: &InboxSpec,
) -> Result<InboxCreated, IngestError> {
    // Validating — construction is pure, so building the event before the
    // existence check costs nothing if the check fails.
    let new_inbox = inbox::create(digest_id, spec)?;

    // ResolvingContext
    let digest_partition = PartitionKey::digest(&digest_id);
    let digest_state = read_state_tolerating_staleness(
        reader,
        projections::DIGEST,
        &digest_partition,
        staleness,
    )
    .await
    .map_err(|e| IngestError::store(Phase::ResolvingContext, e))?;

    if digest_state.is_none() {
        return Err(IngestError::unknown_digest(digest_id));
    }

    // Appending
    let stream = StreamName::inboxes(&instance_id);
    let events = [new_inbox.event];
    retry_with_backoff(retry, || appender.append(&stream, &events))
        .await
        .into_result()
        .map_err(|e| IngestError::store(Phase::Appending, e))?;

    // Acknowledging
    tracing::info!(
        inbox_id = %new_inbox.inbox_id,
        digest_id = %digest_id,
        instance_id = %instance_id,
        "inbox created"
    );

    Ok(InboxCreated {
        inbox_id: new_inbox.inbox_id,
        digest_id,
    })
}

/// Looks up an inbox's materialized state. No staleness grace.
pub async fn lookup<R: StateReader>(
    reader: &R,
    inbox_id: InboxId,
) -> Result<InboxState, IngestError> {
    let partition = PartitionKey::inbox(&inbox_id);
    let state = reader
        .get_state(projections::INBOX, &partition)
        .await
        .map_err(|e| IngestError::store(Phase::ResolvingContext, e))?
        .ok_or_else(|| IngestError::unknown_inbox(inbox_id))?;

    decode_state(projections::INBOX, state)
        .map_err(|e| IngestError::store(Phase::ResolvingContext, e))
}

/// Lists the inboxes of a digest from the inbox-list projection.
///
/// The projection only materializes once the digest has at least one inbox,
/// so "no state" covers both an unknown digest and a digest with no inboxes;
/// either way the caller gets an unknown-entity answer.
pub async fn list_for_digest<R: StateReader>(
    reader: &R,
    digest_id: DigestId,
) -> Result<DigestInboxesState, IngestError> {
    let partition = PartitionKey::digest_inboxes(&digest_id);
    let state = reader
        .get_state(projections::INBOXES_FOR_DIGEST, &partition)
        .await
        .map_err(|e| IngestError::store(Phase::ResolvingContext, e))?
        .ok_or_else(|| IngestError::unknown_digest(digest_id))?;

    decode_state(projections::INBOXES_FOR_DIGEST, state)
        .map_err(|e| IngestError::store(Phase::ResolvingContext, e))
}
