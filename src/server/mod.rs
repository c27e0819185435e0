//! HTTP surface for the ingestion pipeline.
//!
//! The routing table is deliberately mechanical: every handler parses its
//! path parameters, hands off to the orchestrator, and formats the outcome as
//! a hypermedia document. All policy lives below this layer.
//!
//! # Endpoints
//!
//! - `POST /api/digests` — create a digest
//! - `GET  /api/digests/{digestId}` — digest state
//! - `POST /api/{instanceId}/digests/{digestId}/inboxes` — create an inbox
//! - `GET  /api/{instanceId}/digests/{digestId}/inboxes` — list inboxes
//! - `GET  /api/{instanceId}/inboxes/{inboxId}` — inbox state
//! - `POST /api/{instanceId}/inboxes/{inboxId}/commits` — ingest a webhook
//! - `GET  /health` — liveness probe

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use thiserror::Error;

pub mod commits;
pub mod digests;
pub mod hal;
pub mod health;
pub mod inboxes;

pub use health::health_handler;

use crate::config::Config;
use crate::ingest::IngestError;
use crate::store::{EventAppender, StateReader};
use crate::translators::TranslatorRegistry;
use crate::types::InvalidIdentifier;

/// Shared application state, cloned per request.
///
/// Generic over the two store collaborators so tests can run the full router
/// against an in-memory store. The inner Arc keeps cloning cheap regardless
/// of what the collaborators are.
pub struct AppState<A, R> {
    inner: Arc<AppStateInner<A, R>>,
}

impl<A, R> Clone for AppState<A, R> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<A, R> {
    config: Config,
    appender: A,
    reader: R,
    registry: TranslatorRegistry,
}

impl<A, R> AppState<A, R> {
    /// Creates state with the default translator registry.
    pub fn new(config: Config, appender: A, reader: R) -> Self {
        AppState::with_registry(config, appender, reader, TranslatorRegistry::default())
    }

    /// Creates state with an explicit registry (priority order included).
    pub fn with_registry(
        config: Config,
        appender: A,
        reader: R,
        registry: TranslatorRegistry,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                config,
                appender,
                reader,
                registry,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn appender(&self) -> &A {
        &self.inner.appender
    }

    pub fn reader(&self) -> &R {
        &self.inner.reader
    }

    pub fn registry(&self) -> &TranslatorRegistry {
        &self.inner.registry
    }

    /// Absolute URL for a path, rooted at the configured public base URL.
    pub fn href(&self, path: &str) -> String {
        format!(
            "{}{}",
            self.inner.config.public_base_url.trim_end_matches('/'),
            path
        )
    }
}

/// Errors a handler can surface, mapped onto HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A path parameter is not a well-formed identifier.
    #[error("{0}")]
    InvalidIdentifier(#[from] InvalidIdentifier),

    /// A classified orchestrator failure.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// JSON error body: every violated rule, in order.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    errors: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match &self {
            ApiError::InvalidIdentifier(e) => (StatusCode::BAD_REQUEST, vec![e.to_string()]),
            ApiError::Ingest(IngestError::Validation(e)) => {
                (StatusCode::BAD_REQUEST, e.messages())
            }
            ApiError::Ingest(IngestError::UnknownEntity { .. }) => {
                (StatusCode::NOT_FOUND, vec![self.to_string()])
            }
            ApiError::Ingest(IngestError::UnsupportedProvider(e)) => {
                (StatusCode::BAD_REQUEST, vec![e.to_string()])
            }
            ApiError::Ingest(IngestError::Translation(e)) => {
                // Keep the rejected payload out of the response; log it for
                // diagnosis instead.
                tracing::debug!(
                    family = %e.family,
                    payload = %e.payload,
                    "rejected malformed push payload"
                );
                (StatusCode::BAD_REQUEST, vec![e.to_string()])
            }
            ApiError::Ingest(IngestError::Store { phase, source }) => {
                tracing::error!(
                    phase = %phase,
                    error = %source,
                    "store failure surfaced to caller"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![
                        "There was an internal error when trying to process your request."
                            .to_string(),
                    ],
                )
            }
        };

        (status, axum::Json(ErrorResponse { errors })).into_response()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<A, R>(state: AppState<A, R>) -> Router
where
    A: EventAppender + Send + Sync + 'static,
    R: StateReader + Send + Sync + 'static,
{
    Router::new()
        .route("/api/digests", post(digests::create_digest::<A, R>))
        .route("/api/digests/{digest_id}", get(digests::get_digest::<A, R>))
        .route(
            "/api/{instance_id}/digests/{digest_id}/inboxes",
            post(inboxes::create_inbox::<A, R>).get(digests::list_inboxes::<A, R>),
        )
        .route(
            "/api/{instance_id}/inboxes/{inbox_id}",
            get(inboxes::get_inbox::<A, R>),
        )
        .route(
            "/api/{instance_id}/inboxes/{inbox_id}/commits",
            post(commits::post_commits::<A, R>),
        )
        .route("/health", get(health_handler))
        .with_state(state)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::ingest::StalenessConfig;
    use crate::store::{RetryConfig, StoreError, StoreSettings};
    use crate::test_utils::InMemoryStore;
    use crate::types::{DigestId, InboxId, PartitionKey, projections};

    const INSTANCE: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn test_config() -> Config {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            public_base_url: "http://localhost:6565".to_string(),
            store: StoreSettings {
                base_url: "http://localhost:2113".to_string(),
                username: "admin".to_string(),
                password: "changeit".to_string(),
                request_timeout: Duration::from_millis(200),
            },
            retry: RetryConfig::new(1, Duration::from_millis(1), Duration::from_millis(5), 2.0),
            staleness: StalenessConfig {
                window: Duration::from_millis(30),
                poll_interval: Duration::from_millis(5),
            },
        }
    }

    fn test_app(store: InMemoryStore) -> Router {
        build_router(AppState::new(test_config(), store.clone(), store))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn webhook_request(uri: &str, event_header: (&str, &str), body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(event_header.0, event_header.1)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn seed_inbox(store: &InMemoryStore, inbox_id: InboxId, digest_id: DigestId) {
        store.insert_state(
            projections::INBOX,
            &PartitionKey::inbox(&inbox_id),
            json!({
                "inboxId": inbox_id,
                "digestId": digest_id,
                "family": "GitHub",
                "name": "CI inbox",
                "url": "https://github.com/octocat/hello-world"
            }),
        );
    }

    fn github_push() -> Value {
        json!({
            "ref": "refs/heads/main",
            "repository": { "id": 1, "name": "hello-world" },
            "commits": [{
                "id": "abc123",
                "message": "fix",
                "timestamp": "2015-05-05T19:40:15-04:00",
                "url": "https://github.com/octocat/hello-world/commit/abc123",
                "author": { "name": "Octo Cat", "email": "octo@example.com" },
                "committer": { "name": "Octo Cat", "email": "octo@example.com" }
            }]
        })
    }

    // ─── Health ───

    #[tokio::test]
    async fn health_returns_200() {
        let app = test_app(InMemoryStore::default());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // ─── Digest creation ───

    #[tokio::test]
    async fn create_digest_returns_201_with_self_link() {
        let store = InMemoryStore::default();
        let app = test_app(store.clone());

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/digests",
                json!({"description": "hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(location.starts_with("http://localhost:6565/api/digests/"));

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(content_type, "application/hal+json");

        let body = body_json(response).await;
        assert_eq!(body["_links"]["self"]["href"], location);
        assert_eq!(body["description"], "hello");
        assert_eq!(body["status"], "accepted");

        // Exactly one DigestAdded event on the digests stream.
        let appends = store.appends();
        assert_eq!(appends.len(), 1);
        assert_eq!(appends[0].0.as_str(), "digests");
    }

    #[tokio::test]
    async fn oversize_description_returns_400_with_exact_count() {
        let store = InMemoryStore::default();
        let app = test_app(store.clone());

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/digests",
                json!({"description": "a".repeat(147)}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let message = body["errors"][0].as_str().unwrap();
        assert!(message.contains("more than 140 characters"));
        assert!(message.contains("contains 147 characters"));

        assert_eq!(store.appends().len(), 0);
    }

    #[tokio::test]
    async fn markup_description_returns_400() {
        let app = test_app(InMemoryStore::default());
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/digests",
                json!({"description": "<script>alert(1)</script>"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(
            body["errors"][0]
                .as_str()
                .unwrap()
                .contains("script tags or HTML")
        );
    }

    #[tokio::test]
    async fn missing_description_returns_400() {
        let app = test_app(InMemoryStore::default());
        let response = app
            .oneshot(json_request("POST", "/api/digests", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn store_failure_returns_500_with_generic_message() {
        let store = InMemoryStore::default();
        store.fail_next_append(StoreError::fatal("store said no"));
        let app = test_app(store);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/digests",
                json!({"description": "hello"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let message = body["errors"][0].as_str().unwrap();
        assert!(message.contains("internal error"));
        // The store's own words must not leak to the caller.
        assert!(!message.contains("store said no"));
    }

    // ─── Digest reads ───

    #[tokio::test]
    async fn get_digest_with_invalid_id_returns_400() {
        let app = test_app(InMemoryStore::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/digests/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(
            body["errors"][0]
                .as_str()
                .unwrap()
                .contains("not recognized as a valid digest identifier")
        );
    }

    #[tokio::test]
    async fn get_unknown_digest_returns_404() {
        let app = test_app(InMemoryStore::default());
        let digest_id = DigestId::generate();
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/digests/{digest_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(
            body["errors"][0]
                .as_str()
                .unwrap()
                .contains(&digest_id.to_string())
        );
    }

    #[tokio::test]
    async fn get_materialized_digest_returns_state() {
        let store = InMemoryStore::default();
        let digest_id = DigestId::generate();
        store.insert_state(
            projections::DIGEST,
            &PartitionKey::digest(&digest_id),
            json!({"digestId": digest_id, "description": "hello"}),
        );
        let app = test_app(store);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/digests/{digest_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["digestId"], json!(digest_id));
        assert_eq!(body["description"], "hello");
    }

    // ─── Inbox creation ───

    #[tokio::test]
    async fn create_inbox_on_unknown_digest_returns_404_without_append() {
        let store = InMemoryStore::default();
        let app = test_app(store.clone());
        let digest_id = DigestId::generate();

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/{INSTANCE}/digests/{digest_id}/inboxes"),
                json!({
                    "family": "GitHub",
                    "name": "CI inbox",
                    "url": "https://github.com/octocat/hello-world"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.appends().len(), 0);
    }

    #[tokio::test]
    async fn create_inbox_returns_201_with_digest_link() {
        let store = InMemoryStore::default();
        let digest_id = DigestId::generate();
        store.insert_state(
            projections::DIGEST,
            &PartitionKey::digest(&digest_id),
            json!({"digestId": digest_id, "description": "hello"}),
        );
        let app = test_app(store.clone());

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/{INSTANCE}/digests/{digest_id}/inboxes"),
                json!({
                    "family": "GitHub",
                    "name": "CI inbox",
                    "url": "https://github.com/octocat/hello-world"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(
            body["_links"]["digest"]["href"],
            format!("http://localhost:6565/api/digests/{digest_id}")
        );
        assert_eq!(body["status"], "accepted");

        let appends = store.appends();
        assert_eq!(appends.len(), 1);
        assert_eq!(appends[0].0.as_str(), format!("inboxes-{INSTANCE}"));
    }

    // ─── Commit ingestion ───

    #[tokio::test]
    async fn push_to_existing_inbox_returns_201_and_appends() {
        let store = InMemoryStore::default();
        let inbox_id = InboxId::generate();
        let digest_id = DigestId::generate();
        seed_inbox(&store, inbox_id, digest_id);
        let app = test_app(store.clone());

        let response = app
            .oneshot(webhook_request(
                &format!("/api/{INSTANCE}/inboxes/{inbox_id}/commits"),
                ("x-github-event", "push"),
                github_push(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["eventsAccepted"], 1);
        assert_eq!(body["digestId"], json!(digest_id));

        let appends = store.appends();
        assert_eq!(appends.len(), 1);
        assert_eq!(appends[0].0.as_str(), format!("inboxCommits-{inbox_id}"));
        assert_eq!(appends[0].1[0].data["branch"], "main");
        assert_eq!(appends[0].1[0].data["sha"], "abc123");
    }

    #[tokio::test]
    async fn unrecognized_provider_returns_400_and_never_appends() {
        let store = InMemoryStore::default();
        let inbox_id = InboxId::generate();
        seed_inbox(&store, inbox_id, DigestId::generate());
        let app = test_app(store.clone());

        let response = app
            .oneshot(webhook_request(
                &format!("/api/{INSTANCE}/inboxes/{inbox_id}/commits"),
                ("x-github-event", "deployment"),
                json!({}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["errors"][0].as_str().unwrap().contains("deployment"));
        assert_eq!(store.appends().len(), 0, "append client must never be invoked");
    }

    #[tokio::test]
    async fn missing_provider_header_returns_400() {
        let store = InMemoryStore::default();
        let inbox_id = InboxId::generate();
        seed_inbox(&store, inbox_id, DigestId::generate());
        let app = test_app(store.clone());

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/{INSTANCE}/inboxes/{inbox_id}/commits"),
                github_push(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(
            body["errors"][0]
                .as_str()
                .unwrap()
                .contains("Unknown event type")
        );
        assert_eq!(store.appends().len(), 0);
    }

    #[tokio::test]
    async fn ping_returns_200_pong_without_store_traffic() {
        let store = InMemoryStore::default();
        let app = test_app(store.clone());
        let inbox_id = InboxId::generate();

        let response = app
            .oneshot(webhook_request(
                &format!("/api/{INSTANCE}/inboxes/{inbox_id}/commits"),
                ("x-github-event", "ping"),
                json!({"zen": "Approachable is better than simple."}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Pong.");
        assert_eq!(store.read_count(), 0);
        assert_eq!(store.appends().len(), 0);
    }

    #[tokio::test]
    async fn push_to_unknown_inbox_returns_404() {
        let store = InMemoryStore::default();
        let app = test_app(store.clone());
        let inbox_id = InboxId::generate();

        let response = app
            .oneshot(webhook_request(
                &format!("/api/{INSTANCE}/inboxes/{inbox_id}/commits"),
                ("x-github-event", "push"),
                github_push(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.appends().len(), 0);
    }

    // ─── Inbox reads ───

    #[tokio::test]
    async fn get_inbox_returns_state_with_digest_link() {
        let store = InMemoryStore::default();
        let inbox_id = InboxId::generate();
        let digest_id = DigestId::generate();
        seed_inbox(&store, inbox_id, digest_id);
        let app = test_app(store);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/{INSTANCE}/inboxes/{inbox_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], "CI inbox");
        assert_eq!(
            body["_links"]["digest"]["href"],
            format!("http://localhost:6565/api/digests/{digest_id}")
        );
    }

    #[tokio::test]
    async fn list_inboxes_embeds_each_inbox() {
        let store = InMemoryStore::default();
        let digest_id = DigestId::generate();
        let inbox_id = InboxId::generate();
        store.insert_state(
            projections::INBOXES_FOR_DIGEST,
            &PartitionKey::digest_inboxes(&digest_id),
            json!({
                "inboxes": {
                    (inbox_id.to_string()): {
                        "inboxId": inbox_id,
                        "digestId": digest_id,
                        "family": "GitHub",
                        "name": "CI inbox",
                        "url": "https://github.com/octocat/hello-world"
                    }
                }
            }),
        );
        let app = test_app(store);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/{INSTANCE}/digests/{digest_id}/inboxes"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
        let embedded = &body["_embedded"]["inboxes"][0];
        assert_eq!(embedded["name"], "CI inbox");
        assert!(
            embedded["_links"]["inbox-commits"]["href"]
                .as_str()
                .unwrap()
                .ends_with(&format!("/inboxes/{inbox_id}/commits"))
        );
    }
}
