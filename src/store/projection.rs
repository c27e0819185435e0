//! HTTP projection reader for the external event store.
//!
//! One network call per query: `GET {base}/projection/{name}/state` with the
//! partition key as a query parameter. A 404, an empty body, or an empty JSON
//! object all mean "no state yet" — the reader reports `Ok(None)` and leaves
//! reconciling that ambiguity to the orchestrator.

use crate::types::PartitionKey;

use super::error::StoreError;
use super::{StateReader, StoreSettings};

/// Reads materialized projection state over HTTP.
#[derive(Clone)]
pub struct ProjectionClient {
    http: reqwest::Client,
    settings: StoreSettings,
}

impl ProjectionClient {
    /// Creates a client from store settings.
    pub fn new(settings: StoreSettings) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(StoreError::from_transport)?;
        Ok(ProjectionClient { http, settings })
    }
}

impl std::fmt::Debug for ProjectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectionClient")
            .field("base_url", &self.settings.base_url)
            .finish_non_exhaustive()
    }
}

impl StateReader for ProjectionClient {
    async fn get_state(
        &self,
        projection: &'static str,
        partition: &PartitionKey,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let url = format!(
            "{}/projection/{}/state",
            self.settings.trimmed_base_url(),
            projection
        );

        tracing::debug!(projection, partition = %partition, "querying projection state");

        let response = self
            .http
            .get(&url)
            .query(&[("partition", partition.as_str())])
            .basic_auth(&self.settings.username, Some(&self.settings.password))
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::from_status(status.as_u16(), body));
        }

        let body = response.text().await.map_err(StoreError::from_transport)?;
        parse_state_body(&body)
    }
}

/// Interprets the store's state response body.
///
/// The store answers 200 with an empty body (or an empty object) for
/// partitions it has not materialized; both mean "no state yet". A body that
/// is present but not JSON is a fatal error — the store is misbehaving and a
/// retry will not fix the document.
fn parse_state_body(body: &str) -> Result<Option<serde_json::Value>, StoreError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|e| StoreError::fatal(format!("malformed state document: {e}")))?;

    match &value {
        serde_json::Value::Object(map) if map.is_empty() => Ok(None),
        serde_json::Value::Null => Ok(None),
        _ => Ok(Some(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorKind;

    #[test]
    fn empty_body_means_no_state() {
        assert_eq!(parse_state_body("").unwrap(), None);
        assert_eq!(parse_state_body("   ").unwrap(), None);
    }

    #[test]
    fn empty_object_means_no_state() {
        assert_eq!(parse_state_body("{}").unwrap(), None);
        assert_eq!(parse_state_body(" {} ").unwrap(), None);
    }

    #[test]
    fn null_means_no_state() {
        assert_eq!(parse_state_body("null").unwrap(), None);
    }

    #[test]
    fn populated_state_is_returned() {
        let state = parse_state_body(r#"{"digestId":"abc","description":"hello"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(state["description"], "hello");
    }

    #[test]
    fn non_json_body_is_fatal() {
        let err = parse_state_body("<html>gateway error</html>").unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::Fatal);
        assert!(err.to_string().contains("malformed state document"));
    }
}
