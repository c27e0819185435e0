//! Inbox endpoints.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::events::InboxSpec;
use crate::ingest::{InboxState, inboxes};
use crate::store::{EventAppender, StateReader};
use crate::types::{DigestId, InboxId, InstanceId};

use super::hal::{Hal, Link, Links};
use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InboxCreatedBody {
    #[serde(rename = "_links")]
    links: Links,
    inbox_id: InboxId,
    digest_id: DigestId,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct InboxBody {
    #[serde(rename = "_links")]
    links: Links,
    #[serde(flatten)]
    inbox: InboxState,
}

/// `POST /api/{instanceId}/digests/{digestId}/inboxes` — create an inbox.
///
/// The digest must exist; the existence check tolerates the configured
/// staleness window because the digest may have been created moments earlier.
pub async fn create_inbox<A, R>(
    State(state): State<AppState<A, R>>,
    Path((instance_id, digest_id)): Path<(String, String)>,
    axum::Json(spec): axum::Json<InboxSpec>,
) -> Result<Response, ApiError>
where
    A: EventAppender + Send + Sync,
    R: StateReader + Send + Sync,
{
    let instance_id = InstanceId::parse(&instance_id)?;
    let digest_id = DigestId::parse(&digest_id)?;

    let created = inboxes::create(
        state.reader(),
        state.appender(),
        state.config().retry,
        state.config().staleness,
        instance_id,
        digest_id,
        &spec,
    )
    .await?;

    let self_href = state.href(&format!("/api/{instance_id}/inboxes/{}", created.inbox_id));
    let mut links = Links::new();
    links.insert("self", Link::new(&self_href));
    links.insert(
        "digest",
        Link::new(state.href(&format!("/api/digests/{digest_id}"))),
    );
    links.insert(
        "inbox-commits",
        Link::new(state.href(&format!(
            "/api/{instance_id}/inboxes/{}/commits",
            created.inbox_id
        )))
        .with_method("POST"),
    );

    let body = InboxCreatedBody {
        links,
        inbox_id: created.inbox_id,
        digest_id: created.digest_id,
        status: "accepted",
    };

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, self_href)],
        Hal(body),
    )
        .into_response())
}

/// `GET /api/{instanceId}/inboxes/{inboxId}` — materialized inbox state.
pub async fn get_inbox<A, R>(
    State(state): State<AppState<A, R>>,
    Path((instance_id, inbox_id)): Path<(String, String)>,
) -> Result<Response, ApiError>
where
    A: EventAppender + Send + Sync,
    R: StateReader + Send + Sync,
{
    let instance_id = InstanceId::parse(&instance_id)?;
    let inbox_id = InboxId::parse(&inbox_id)?;

    let inbox = inboxes::lookup(state.reader(), inbox_id).await?;

    let mut links = Links::new();
    links.insert(
        "self",
        Link::new(state.href(&format!("/api/{instance_id}/inboxes/{inbox_id}"))),
    );
    links.insert(
        "digest",
        Link::new(state.href(&format!("/api/digests/{}", inbox.digest_id))),
    );

    Ok(Hal(InboxBody { links, inbox }).into_response())
}
