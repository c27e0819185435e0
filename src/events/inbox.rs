//! The `InboxAdded` event factory.
//!
//! Validation rules for an inbox, in declaration order:
//!
//! 1. `family` — required, one of the supported provider families
//! 2. `name` — required, non-empty after trimming, no markup
//! 3. `url` — required, an absolute http(s) URL
//!
//! The owning digest id arrives already parsed from the request path; its
//! existence check is the orchestrator's job, not the factory's.

use serde::{Deserialize, Serialize};

use super::envelope::{CanonicalEvent, EventMetadata, EventType};
use super::validation::{ValidationError, Violation, strip_markup};
use crate::types::{DigestId, InboxId, ProviderFamily};

/// The `data` payload of an `InboxAdded` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxAddedData {
    pub inbox_id: InboxId,
    pub digest_id: DigestId,
    pub family: ProviderFamily,
    pub name: String,
    pub url: String,
}

/// Caller-supplied fields of an inbox, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxSpec {
    pub family: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
}

/// A freshly constructed inbox: the assigned id plus the event recording it.
#[derive(Debug, Clone)]
pub struct NewInbox {
    pub inbox_id: InboxId,
    pub event: CanonicalEvent,
}

/// Validates an inbox spec and constructs the `InboxAdded` event.
///
/// Pure and all-or-nothing; on failure every violated rule is reported.
pub fn create(digest_id: DigestId, spec: &InboxSpec) -> Result<NewInbox, ValidationError> {
    let mut violations = Vec::new();

    let family = validate_family(spec.family.as_deref(), &mut violations);
    let name = validate_name(spec.name.as_deref(), &mut violations);
    let url = validate_url(spec.url.as_deref(), &mut violations);

    ValidationError::from_violations(violations)?;

    // All three validators only return None after pushing a violation, so
    // reaching this point means every field is present.
    let (family, name, url) = (
        family.expect("validated"),
        name.expect("validated"),
        url.expect("validated"),
    );

    let inbox_id = InboxId::generate();
    let event = CanonicalEvent::new(
        EventType::InboxAdded,
        InboxAddedData {
            inbox_id,
            digest_id,
            family,
            name,
            url,
        },
        EventMetadata::for_digest(digest_id),
    );

    Ok(NewInbox { inbox_id, event })
}

fn validate_family(
    family: Option<&str>,
    violations: &mut Vec<Violation>,
) -> Option<ProviderFamily> {
    let Some(family) = family else {
        violations.push(Violation::new(
            "family",
            "An inbox must name the provider family it receives from.",
        ));
        return None;
    };

    match family.parse::<ProviderFamily>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            let supported = ProviderFamily::ALL
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            violations.push(Violation::new(
                "family",
                format!("\"{family}\" is not a supported family. Supported families: {supported}."),
            ));
            None
        }
    }
}

fn validate_name(name: Option<&str>, violations: &mut Vec<Violation>) -> Option<String> {
    let Some(name) = name else {
        violations.push(Violation::new("name", "An inbox must contain a name."));
        return None;
    };

    let mut ok = true;
    if name.trim().is_empty() {
        violations.push(Violation::new("name", "An inbox name must contain a value."));
        ok = false;
    }
    if strip_markup(name) != name {
        violations.push(Violation::new(
            "name",
            "An inbox name cannot contain script tags or HTML.",
        ));
        ok = false;
    }

    ok.then(|| name.to_string())
}

fn validate_url(url: Option<&str>, violations: &mut Vec<Violation>) -> Option<String> {
    let Some(url) = url else {
        violations.push(Violation::new(
            "url",
            "An inbox must contain the url of the repository it receives from.",
        ));
        return None;
    };

    if url.starts_with("http://") || url.starts_with("https://") {
        Some(url.to_string())
    } else {
        violations.push(Violation::new(
            "url",
            format!("\"{url}\" is not an absolute http or https url."),
        ));
        None
    }
}
