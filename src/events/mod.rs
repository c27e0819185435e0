//! Canonical event schema and factories.
//!
//! This module owns the canonical shapes the rest of the system appends and
//! reads: the event envelope, the typed payloads, and the validated factories
//! that construct them. Construction is pure and side-effect-free; nothing
//! here touches the store.

pub mod digest;
pub mod envelope;
pub mod inbox;
pub mod validation;

pub use digest::{DESCRIPTION_MAX_CHARS, DigestAddedData, NewDigest};
pub use envelope::{CanonicalEvent, EventMetadata, EventType};
pub use inbox::{InboxAddedData, InboxSpec, NewInbox};
pub use validation::{ValidationError, Violation};
