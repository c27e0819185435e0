//! HTTP append client for the external event store.
//!
//! One network call per append: `POST {base}/streams/{name}` with the JSON
//! array of canonical events as the body. The client carries no retry logic
//! and no business logic — it validates its inputs locally, performs the
//! call, and classifies the outcome.

use reqwest::header::CONTENT_TYPE;

use crate::events::CanonicalEvent;
use crate::types::StreamName;

use super::error::StoreError;
use super::{EventAppender, StoreSettings};

/// Media type the store expects for event batches.
const EVENTS_MEDIA_TYPE: &str = "application/vnd.eventstore.events+json";

/// Appends canonical events to named streams over HTTP.
#[derive(Clone)]
pub struct AppendClient {
    http: reqwest::Client,
    settings: StoreSettings,
}

impl AppendClient {
    /// Creates a client from store settings.
    ///
    /// Fails only if the underlying HTTP client cannot be constructed, which
    /// is a startup-time configuration problem, not a request-time one.
    pub fn new(settings: StoreSettings) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(StoreError::from_transport)?;
        Ok(AppendClient { http, settings })
    }
}

impl std::fmt::Debug for AppendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppendClient")
            .field("base_url", &self.settings.base_url)
            .finish_non_exhaustive()
    }
}

impl EventAppender for AppendClient {
    async fn append(
        &self,
        stream: &StreamName,
        events: &[CanonicalEvent],
    ) -> Result<(), StoreError> {
        // An empty batch is a caller bug; fail fatally before any network
        // traffic.
        if events.is_empty() {
            return Err(StoreError::fatal(format!(
                "refusing to append an empty batch to stream {stream}"
            )));
        }

        let url = format!(
            "{}/streams/{}",
            self.settings.trimmed_base_url(),
            stream.as_str()
        );

        tracing::debug!(
            stream = %stream,
            batch_size = events.len(),
            "appending event batch"
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .header(CONTENT_TYPE, EVENTS_MEDIA_TYPE)
            .json(events)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(stream = %stream, batch_size = events.len(), "append acknowledged");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::from_status(status.as_u16(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorKind;
    use std::time::Duration;

    fn settings() -> StoreSettings {
        StoreSettings {
            base_url: "http://localhost:2113".to_string(),
            username: "admin".to_string(),
            password: "changeit".to_string(),
            request_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_without_network_io() {
        // The base URL points nowhere; the fatal error must come from the
        // local check, not from a connection attempt.
        let client = AppendClient::new(StoreSettings {
            base_url: "http://127.0.0.1:1".to_string(),
            ..settings()
        })
        .unwrap();

        let err = client
            .append(&StreamName::digests(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Fatal);
        assert!(err.status_code.is_none());
        assert!(err.to_string().contains("empty batch"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let settings = StoreSettings {
            base_url: "http://localhost:2113/".to_string(),
            ..settings()
        };
        assert_eq!(settings.trimmed_base_url(), "http://localhost:2113");
    }
}
