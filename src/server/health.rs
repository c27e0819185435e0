//! Health check endpoint for liveness probes.

use axum::http::StatusCode;

/// Health check handler.
///
/// Returns 200 OK with the text "OK" whenever the server is accepting
/// connections. Deliberately does not probe the event store: the service can
/// usefully report classified store errors even while the store is down.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
