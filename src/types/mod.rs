//! Core domain types for the webhook ingestion service.
//!
//! This module contains the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod family;
pub mod ids;
pub mod streams;

// Re-export commonly used types at the module level
pub use family::{ProviderFamily, UnknownFamily};
pub use ids::{DigestId, EventId, InboxId, InstanceId, InvalidIdentifier};
pub use streams::{PartitionKey, StreamName, projections};
