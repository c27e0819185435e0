//! Stream and partition addressing for the external event store.
//!
//! Stream names and partition keys are derived deterministically from the
//! entity they represent; nothing else in the codebase builds these strings by
//! hand, so the naming scheme lives in exactly one place.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{DigestId, InboxId, InstanceId};

/// Projection names known to the read side.
pub mod projections {
    /// Materialized state of a single digest.
    pub const DIGEST: &str = "digest";
    /// Materialized state of a single inbox.
    pub const INBOX: &str = "inbox";
    /// Materialized inbox list of a digest.
    pub const INBOXES_FOR_DIGEST: &str = "inboxes-for-digest";
}

/// The name of an append-only stream in the external store.
///
/// Constructed only through the derivation methods below, which guarantees the
/// name is non-empty and never reused across unrelated entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamName(String);

impl StreamName {
    /// The global digest stream.
    pub fn digests() -> Self {
        StreamName("digests".to_string())
    }

    /// The inbox stream scoped to one instance.
    pub fn inboxes(instance_id: &InstanceId) -> Self {
        StreamName(format!("inboxes-{instance_id}"))
    }

    /// The commit stream of one inbox.
    pub fn inbox_commits(inbox_id: &InboxId) -> Self {
        StreamName(format!("inboxCommits-{inbox_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The partition key addressing one entity's materialized state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn digest(digest_id: &DigestId) -> Self {
        PartitionKey(format!("digest-{digest_id}"))
    }

    pub fn inbox(inbox_id: &InboxId) -> Self {
        PartitionKey(format!("inbox-{inbox_id}"))
    }

    /// Partition of the inbox-list projection for a digest.
    pub fn digest_inboxes(digest_id: &DigestId) -> Self {
        PartitionKey(format!("digestInbox-{digest_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
