//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID types (e.g., using an
//! InboxId where a DigestId is expected) and make the code more
//! self-documenting. All of them wrap a v4 UUID; `parse` rejects anything that
//! is not a well-formed UUID with an error message suitable for returning to
//! API callers verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a path or payload value is not a well-formed identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The value \"{value}\" is not recognized as a valid {kind} identifier.")]
pub struct InvalidIdentifier {
    /// What kind of identifier was expected ("digest", "inbox", ...).
    pub kind: &'static str,
    /// The offending input, echoed back for diagnostics.
    pub value: String,
}

impl InvalidIdentifier {
    fn new(kind: &'static str, value: &str) -> Self {
        InvalidIdentifier {
            kind,
            value: value.to_string(),
        }
    }
}

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                $name(Uuid::new_v4())
            }

            /// Parses an identifier from its string form.
            pub fn parse(s: &str) -> Result<Self, InvalidIdentifier> {
                Uuid::parse_str(s)
                    .map($name)
                    .map_err(|_| InvalidIdentifier::new($kind, s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                $name(id)
            }
        }
    };
}

uuid_id!(
    /// A canonical event's globally unique identifier.
    ///
    /// Generated once at event construction and never reused; this is what
    /// makes caller-side retries of an append safe.
    EventId,
    "event"
);

uuid_id!(
    /// A digest's identifier, assigned at creation.
    DigestId,
    "digest"
);

uuid_id!(
    /// An inbox's identifier, assigned at creation.
    InboxId,
    "inbox"
);

uuid_id!(
    /// The instance a group of inboxes is scoped to.
    ///
    /// Appears in request paths and in the `inboxes-<instanceId>` stream name.
    InstanceId,
    "instance"
);
