//! The canonical event envelope.
//!
//! Every domain occurrence, whatever its upstream source, is recorded as a
//! [`CanonicalEvent`]: a write-once record with a globally unique id, a type
//! tag, a schema-specific payload, and cross-cutting metadata. The wire shape
//! is camelCase JSON:
//!
//! ```json
//! {
//!   "eventId": "b0d65208-2afc-43f0-8926-6b20026ab1eb",
//!   "eventType": "GitHubCommitReceived",
//!   "data": { ... },
//!   "metadata": { "digestId": "..." }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{DigestId, EventId, InboxId};

/// Type tag identifying the schema variant of an event's `data` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A digest was created.
    DigestAdded,
    /// An inbox was created on a digest.
    InboxAdded,
    /// One commit from a GitHub push payload.
    GitHubCommitReceived,
    /// One commit from a GitLab push payload.
    GitLabCommitReceived,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::DigestAdded => "DigestAdded",
            EventType::InboxAdded => "InboxAdded",
            EventType::GitHubCommitReceived => "GitHubCommitReceived",
            EventType::GitLabCommitReceived => "GitLabCommitReceived",
        };
        write!(f, "{name}")
    }
}

/// Cross-cutting context attached to an event.
///
/// Both fields are optional on the wire; absent fields are omitted entirely so
/// the serialized metadata object stays minimal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// The digest this event ultimately belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_id: Option<DigestId>,

    /// The inbox a translated commit event targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbox_id: Option<InboxId>,
}

impl EventMetadata {
    /// Metadata carrying only an owning digest.
    pub fn for_digest(digest_id: DigestId) -> Self {
        EventMetadata {
            digest_id: Some(digest_id),
            inbox_id: None,
        }
    }

    /// Metadata for a commit event: owning digest plus target inbox.
    pub fn for_inbox_commit(digest_id: DigestId, inbox_id: InboxId) -> Self {
        EventMetadata {
            digest_id: Some(digest_id),
            inbox_id: Some(inbox_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.digest_id.is_none() && self.inbox_id.is_none()
    }
}

/// An immutable canonical event.
///
/// Once constructed the event is never mutated; once appended to a stream it
/// is never deleted. The `event_id` is generated at construction and never
/// reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    pub event_id: EventId,
    pub event_type: EventType,
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "EventMetadata::is_empty")]
    pub metadata: EventMetadata,
}

impl CanonicalEvent {
    /// Builds an envelope around an already-validated payload.
    ///
    /// Payload types in this crate are plain serde structs with string keys,
    /// so serialization cannot fail.
    pub fn new(event_type: EventType, data: impl Serialize, metadata: EventMetadata) -> Self {
        CanonicalEvent {
            event_id: EventId::generate(),
            event_type,
            data: serde_json::to_value(data).expect("event payloads serialize to JSON"),
            metadata,
        }
    }
}
