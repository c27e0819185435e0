//! Commit ingestion: the webhook → canonical-events pipeline.
//!
//! The full phase sequence applies here: validate the request, resolve the
//! inbox (and through it the owning digest), select a translator, translate
//! the push payload, append the resulting batch, acknowledge. A recognized
//! ping event short-circuits out of the first phase without touching the
//! store or the registry.

use crate::store::{EventAppender, RetryConfig, StateReader, retry_with_backoff};
use crate::translators::{ProviderHeaders, PushContext, TranslatorRegistry};
use crate::types::{DigestId, InboxId, InstanceId, PartitionKey, StreamName, projections};

use super::{IngestError, InboxState, Phase, decode_state};

/// Acknowledgment of ingested commits.
#[derive(Debug, Clone)]
pub struct CommitsAccepted {
    pub inbox_id: InboxId,
    pub digest_id: DigestId,
    /// How many canonical events the push produced. A push with no commits
    /// is acknowledged without an append.
    pub events_appended: usize,
}

/// Outcome of a commit-ingestion request.
#[derive(Debug, Clone)]
pub enum CommitIngestOutcome {
    /// Commits were translated and appended.
    Accepted(CommitsAccepted),
    /// The request was a provider health check; nothing was stored.
    Pong,
}

/// Runs the ingestion pipeline for one inbound webhook.
pub async fn ingest<R: StateReader, A: EventAppender>(
    reader: &R,
    appender: &A,
    registry: &TranslatorRegistry,
    retry: RetryConfig,
    instance_id: InstanceId,
    inbox_id: InboxId,
    headers: &ProviderHeaders,
    payload: &serde_json::Value,
) -> Result<CommitIngestOutcome, IngestError> {
    // Validating — the ping short-circuit comes first: no store, no registry.
    if headers.is_ping() {
        tracing::debug!(inbox_id = %inbox_id, "ping event, acknowledging without ingestion");
        return Ok(CommitIngestOutcome::Pong);
    }

    // ResolvingContext — an inbox must exist before commits can target it.
    // Unlike the digest check at inbox-creation time there is no staleness
    // grace: nothing in this request's causal chain just created the inbox.
    let partition = PartitionKey::inbox(&inbox_id);
    let state = reader
        .get_state(projections::INBOX, &partition)
        .await
        .map_err(|e| IngestError::store(Phase::ResolvingContext, e))?
        .ok_or_else(|| IngestError::unknown_inbox(inbox_id))?;
    let inbox: InboxState = decode_state(projections::INBOX, state)
        .map_err(|e| IngestError::store(Phase::ResolvingContext, e))?;

    // Translating
    let translator = registry.select(headers)?;
    let ctx = PushContext {
        instance_id,
        digest_id: inbox.digest_id,
        inbox_id,
    };
    let events = translator.translate_push(payload, &ctx)?;

    tracing::debug!(
        inbox_id = %inbox_id,
        digest_id = %inbox.digest_id,
        family = %translator.family(),
        event_count = events.len(),
        "push payload translated"
    );

    // Appending — skipped for an empty push; the append client refuses empty
    // batches and there is nothing to record.
    if !events.is_empty() {
        let stream = StreamName::inbox_commits(&inbox_id);
        retry_with_backoff(retry, || appender.append(&stream, &events))
            .await
            .into_result()
            .map_err(|e| IngestError::store(Phase::Appending, e))?;
    }

    // Acknowledging
    tracing::info!(
        inbox_id = %inbox_id,
        digest_id = %inbox.digest_id,
        events_appended = events.len(),
        "commits ingested"
    );

    Ok(CommitIngestOutcome::Accepted(CommitsAccepted {
        inbox_id,
        digest_id: inbox.digest_id,
        events_appended: events.len(),
    }))
}
