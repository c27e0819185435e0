//! The `DigestAdded` event factory.
//!
//! Validation rules for a digest description, in declaration order:
//!
//! 1. required (present and non-null)
//! 2. non-empty after trimming whitespace
//! 3. no markup (the value must equal its tag-stripped form)
//! 4. at most [`DESCRIPTION_MAX_CHARS`] characters

use serde::{Deserialize, Serialize};

use super::envelope::{CanonicalEvent, EventMetadata, EventType};
use super::validation::{ValidationError, Violation, strip_markup};
use crate::types::DigestId;

/// Maximum digest description length, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 140;

/// The `data` payload of a `DigestAdded` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestAddedData {
    pub digest_id: DigestId,
    pub description: String,
}

/// A freshly constructed digest: the assigned id plus the event recording it.
#[derive(Debug, Clone)]
pub struct NewDigest {
    pub digest_id: DigestId,
    pub description: String,
    pub event: CanonicalEvent,
}

/// Validates a description and constructs the `DigestAdded` event.
///
/// Pure: assigns the digest id, builds the envelope, touches nothing else.
/// On failure every violated rule is reported, not just the first.
pub fn create(description: Option<&str>) -> Result<NewDigest, ValidationError> {
    let description = validate_description(description)?;

    let digest_id = DigestId::generate();
    let event = CanonicalEvent::new(
        EventType::DigestAdded,
        DigestAddedData {
            digest_id,
            description: description.clone(),
        },
        EventMetadata::default(),
    );

    Ok(NewDigest {
        digest_id,
        description,
        event,
    })
}

fn validate_description(description: Option<&str>) -> Result<String, ValidationError> {
    let Some(original) = description else {
        return Err(ValidationError::new(vec![Violation::new(
            "description",
            "A digest must contain a description.",
        )]));
    };

    let mut violations = Vec::new();

    if original.trim().is_empty() {
        violations.push(Violation::new(
            "description",
            "A digest description must contain a value.",
        ));
    }

    let stripped = strip_markup(original);
    if stripped != original {
        violations.push(Violation::new(
            "description",
            "A digest description cannot contain script tags or HTML.",
        ));
    }

    let length = stripped.chars().count();
    if length > DESCRIPTION_MAX_CHARS {
        violations.push(Violation::new(
            "description",
            format!(
                "A digest description cannot contain more than {DESCRIPTION_MAX_CHARS} characters. \
                 The description you submitted contains {length} characters."
            ),
        ));
    }

    ValidationError::from_violations(violations)?;
    Ok(stripped)
}
