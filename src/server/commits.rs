//! Commit ingestion endpoint.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::ingest::commits::{self, CommitIngestOutcome};
use crate::store::{EventAppender, StateReader};
use crate::translators::ProviderHeaders;
use crate::types::{DigestId, InboxId, InstanceId};

use super::hal::{Hal, Link, Links};
use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitsAcceptedBody {
    #[serde(rename = "_links")]
    links: Links,
    inbox_id: InboxId,
    digest_id: DigestId,
    events_accepted: usize,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct PongBody {
    message: &'static str,
}

/// Pulls the provider event signals out of the request headers.
fn provider_headers(headers: &HeaderMap) -> ProviderHeaders {
    let value_of = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };
    ProviderHeaders {
        github_event: value_of(ProviderHeaders::GITHUB_EVENT),
        gitlab_event: value_of(ProviderHeaders::GITLAB_EVENT),
    }
}

/// `POST /api/{instanceId}/inboxes/{inboxId}/commits` — ingest a push webhook.
///
/// 201 with the translated event count once the batch is appended; 200 with a
/// pong for provider health checks. The `Location` header points at the
/// owning digest, the resource that will eventually reflect this write.
pub async fn post_commits<A, R>(
    State(state): State<AppState<A, R>>,
    Path((instance_id, inbox_id)): Path<(String, String)>,
    headers: HeaderMap,
    axum::Json(payload): axum::Json<serde_json::Value>,
) -> Result<Response, ApiError>
where
    A: EventAppender + Send + Sync,
    R: StateReader + Send + Sync,
{
    let instance_id = InstanceId::parse(&instance_id)?;
    let inbox_id = InboxId::parse(&inbox_id)?;
    let provider = provider_headers(&headers);

    let outcome = commits::ingest(
        state.reader(),
        state.appender(),
        state.registry(),
        state.config().retry,
        instance_id,
        inbox_id,
        &provider,
        &payload,
    )
    .await?;

    let accepted = match outcome {
        CommitIngestOutcome::Pong => {
            return Ok(axum::Json(PongBody { message: "Pong." }).into_response());
        }
        CommitIngestOutcome::Accepted(accepted) => accepted,
    };

    let digest_href = state.href(&format!("/api/digests/{}", accepted.digest_id));
    let mut links = Links::new();
    links.insert(
        "self",
        Link::new(state.href(&format!(
            "/api/{instance_id}/inboxes/{inbox_id}/commits"
        ))),
    );
    links.insert("digest", Link::new(&digest_href));

    let body = CommitsAcceptedBody {
        links,
        inbox_id: accepted.inbox_id,
        digest_id: accepted.digest_id,
        events_accepted: accepted.events_appended,
        status: "accepted",
    };

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, digest_href)],
        Hal(body),
    )
        .into_response())
}
