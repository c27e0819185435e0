//! Digest endpoints.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::ingest::digests;
use crate::store::{EventAppender, StateReader};
use crate::types::{DigestId, InstanceId};

use super::hal::{Hal, Link, Links};
use super::{ApiError, AppState};

/// Request body for digest creation.
#[derive(Debug, Deserialize)]
pub struct CreateDigestBody {
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DigestCreatedBody {
    #[serde(rename = "_links")]
    links: Links,
    digest_id: DigestId,
    description: String,
    /// The write is durable but may not be visible on the read side yet;
    /// readers must tolerate the documented staleness window.
    status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DigestBody {
    #[serde(rename = "_links")]
    links: Links,
    digest_id: DigestId,
    description: String,
}

/// `POST /api/digests` — create a digest.
///
/// 201 with a `self` link and `status: "accepted"`; the resource becomes
/// readable once the projection catches up.
pub async fn create_digest<A, R>(
    State(state): State<AppState<A, R>>,
    axum::Json(body): axum::Json<CreateDigestBody>,
) -> Result<Response, ApiError>
where
    A: EventAppender + Send + Sync,
    R: StateReader + Send + Sync,
{
    let created = digests::create(
        state.appender(),
        state.config().retry,
        body.description.as_deref(),
    )
    .await?;

    let self_href = state.href(&format!("/api/digests/{}", created.digest_id));
    let mut links = Links::new();
    links.insert("self", Link::new(&self_href));

    let body = DigestCreatedBody {
        links,
        digest_id: created.digest_id,
        description: created.description,
        status: "accepted",
    };

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, self_href)],
        Hal(body),
    )
        .into_response())
}

/// `GET /api/digests/{digestId}` — materialized digest state.
pub async fn get_digest<A, R>(
    State(state): State<AppState<A, R>>,
    Path(digest_id): Path<String>,
) -> Result<Response, ApiError>
where
    A: EventAppender + Send + Sync,
    R: StateReader + Send + Sync,
{
    let digest_id = DigestId::parse(&digest_id)?;
    let digest = digests::lookup(state.reader(), digest_id).await?;

    let mut links = Links::new();
    links.insert(
        "self",
        Link::new(state.href(&format!("/api/digests/{digest_id}"))),
    );

    Ok(Hal(DigestBody {
        links,
        digest_id: digest.digest_id,
        description: digest.description,
    })
    .into_response())
}

/// `GET /api/{instanceId}/digests/{digestId}/inboxes` — the digest's inboxes.
pub async fn list_inboxes<A, R>(
    State(state): State<AppState<A, R>>,
    Path((instance_id, digest_id)): Path<(String, String)>,
) -> Result<Response, ApiError>
where
    A: EventAppender + Send + Sync,
    R: StateReader + Send + Sync,
{
    let instance_id = InstanceId::parse(&instance_id)?;
    let digest_id = DigestId::parse(&digest_id)?;

    let listing = crate::ingest::inboxes::list_for_digest(state.reader(), digest_id).await?;

    let mut links = Links::new();
    links.insert(
        "self",
        Link::new(state.href(&format!(
            "/api/{instance_id}/digests/{digest_id}/inboxes"
        ))),
    );
    links.insert(
        "digest",
        Link::new(state.href(&format!("/api/digests/{digest_id}"))),
    );
    links.insert(
        "inbox-create",
        Link::new(state.href(&format!(
            "/api/{instance_id}/digests/{digest_id}/inboxes"
        )))
        .with_method("POST")
        .with_title(format!(
            "Endpoint for creating an inbox for a repository on digest {digest_id}."
        )),
    );

    let inboxes: Vec<_> = listing
        .inboxes
        .values()
        .map(|inbox| {
            let mut links = Links::new();
            links.insert(
                "self",
                Link::new(state.href(&format!("/api/{instance_id}/inboxes/{}", inbox.inbox_id))),
            );
            links.insert(
                "inbox-commits",
                Link::new(state.href(&format!(
                    "/api/{instance_id}/inboxes/{}/commits",
                    inbox.inbox_id
                )))
                .with_method("POST"),
            );
            EmbeddedInbox {
                links,
                inbox: inbox.clone(),
            }
        })
        .collect();

    Ok(Hal(InboxListBody {
        links,
        count: inboxes.len(),
        embedded: Embedded { inboxes },
    })
    .into_response())
}

#[derive(Debug, Serialize)]
struct InboxListBody {
    #[serde(rename = "_links")]
    links: Links,
    count: usize,
    #[serde(rename = "_embedded")]
    embedded: Embedded,
}

#[derive(Debug, Serialize)]
struct Embedded {
    inboxes: Vec<EmbeddedInbox>,
}

#[derive(Debug, Serialize)]
struct EmbeddedInbox {
    #[serde(rename = "_links")]
    links: Links,
    #[serde(flatten)]
    inbox: crate::ingest::InboxState,
}
