//! Webhook translators: provider payloads in, canonical events out.
//!
//! One translator exists per supported provider. Each one can (a) recognize
//! whether it handles a given inbound request, judged purely from the
//! provider event headers, and (b) convert a push payload into canonical
//! commit events — all-or-nothing, one event per upstream commit.
//!
//! Selection walks the registered translators in declared priority order and
//! takes the first match; no match is an [`UnsupportedProviderError`], never a
//! guess.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use chrono::{DateTime, FixedOffset};

use crate::events::CanonicalEvent;
use crate::types::{DigestId, InboxId, InstanceId, ProviderFamily};

pub mod github;
pub mod gitlab;

pub use github::GitHubTranslator;
pub use gitlab::GitLabTranslator;

/// Provider-identifying signals extracted from the inbound request headers.
///
/// Kept framework-free: the HTTP layer extracts the two header values and
/// hands them over, so translators never see a request object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderHeaders {
    /// Value of the `X-GitHub-Event` header, if present.
    pub github_event: Option<String>,
    /// Value of the `X-Gitlab-Event` header, if present.
    pub gitlab_event: Option<String>,
}

impl ProviderHeaders {
    /// Header name GitHub uses to announce its event type.
    pub const GITHUB_EVENT: &'static str = "x-github-event";
    /// Header name GitLab uses to announce its event type.
    pub const GITLAB_EVENT: &'static str = "x-gitlab-event";

    pub fn github(event: impl Into<String>) -> Self {
        ProviderHeaders {
            github_event: Some(event.into()),
            gitlab_event: None,
        }
    }

    pub fn gitlab(event: impl Into<String>) -> Self {
        ProviderHeaders {
            github_event: None,
            gitlab_event: Some(event.into()),
        }
    }

    /// A GitHub webhook health check. Short-circuited by the orchestrator
    /// before translator selection; no translator handles it.
    pub fn is_ping(&self) -> bool {
        self.github_event.as_deref() == Some("ping")
    }

    fn is_empty(&self) -> bool {
        self.github_event.is_none() && self.gitlab_event.is_none()
    }
}

/// Request-scoped context a translator stamps into every event it emits.
#[derive(Debug, Clone, Copy)]
pub struct PushContext {
    pub instance_id: InstanceId,
    pub digest_id: DigestId,
    pub inbox_id: InboxId,
}

/// A recognized provider sent a payload this service cannot make sense of.
///
/// The original payload rides along for diagnostics; it is logged, never
/// echoed to other callers.
#[derive(Debug, Error)]
#[error("malformed {family} push payload: {detail}")]
pub struct TranslationError {
    pub family: ProviderFamily,
    pub detail: String,
    pub payload: Box<serde_json::Value>,
}

impl TranslationError {
    pub fn malformed(
        family: ProviderFamily,
        detail: impl Into<String>,
        payload: &serde_json::Value,
    ) -> Self {
        TranslationError {
            family,
            detail: detail.into(),
            payload: Box::new(payload.clone()),
        }
    }
}

/// No registered translator recognizes the inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedProviderError {
    /// No provider event header at all.
    #[error("Unknown event type. Please include a provider event header.")]
    MissingEventHeader,

    /// A provider header was present but named an event no translator takes.
    #[error("Unknown event type for {header} header: {value}")]
    UnrecognizedEvent {
        header: &'static str,
        value: String,
    },
}

/// The capability set every provider translator implements.
///
/// `can_translate` must be pure: same headers, same answer, no hidden state.
/// `translate_push` is all-or-nothing — on failure no events are emitted.
pub trait Translator: Send + Sync {
    /// The provider family this translator handles.
    fn family(&self) -> ProviderFamily;

    /// Whether this translator recognizes the request, judged from headers.
    fn can_translate(&self, headers: &ProviderHeaders) -> bool;

    /// Converts a push payload into one canonical event per upstream commit.
    fn translate_push(
        &self,
        payload: &serde_json::Value,
        ctx: &PushContext,
    ) -> Result<Vec<CanonicalEvent>, TranslationError>;
}

/// The set of registered translators, scanned in declared priority order.
pub struct TranslatorRegistry {
    translators: Vec<Box<dyn Translator>>,
}

impl TranslatorRegistry {
    /// Builds a registry from an explicit priority-ordered list.
    pub fn new(translators: Vec<Box<dyn Translator>>) -> Self {
        TranslatorRegistry { translators }
    }

    /// The default registry: GitHub first, then GitLab.
    pub fn with_default_providers() -> Self {
        TranslatorRegistry::new(vec![
            Box::new(GitHubTranslator),
            Box::new(GitLabTranslator),
        ])
    }

    /// Selects the first translator whose predicate matches.
    pub fn select(
        &self,
        headers: &ProviderHeaders,
    ) -> Result<&dyn Translator, UnsupportedProviderError> {
        if let Some(translator) = self
            .translators
            .iter()
            .find(|t| t.can_translate(headers))
        {
            return Ok(translator.as_ref());
        }

        if headers.is_empty() {
            return Err(UnsupportedProviderError::MissingEventHeader);
        }

        // Name the header that was present so the caller sees exactly what
        // was rejected.
        let (header, value) = match (&headers.github_event, &headers.gitlab_event) {
            (Some(value), _) => (ProviderHeaders::GITHUB_EVENT, value.clone()),
            (_, Some(value)) => (ProviderHeaders::GITLAB_EVENT, value.clone()),
            (None, None) => unreachable!("is_empty checked above"),
        };
        Err(UnsupportedProviderError::UnrecognizedEvent { header, value })
    }
}

impl Default for TranslatorRegistry {
    fn default() -> Self {
        TranslatorRegistry::with_default_providers()
    }
}

// ============================================================================
// Translated commit shape
//
// Shared by all provider translators: the normalized fields every commit
// event carries, with the upstream commit object preserved verbatim under
// `originalMessage` for forward compatibility.
// ============================================================================

/// An author or committer as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActor {
    pub name: String,
    pub email: String,
}

/// A committer with the commit's timestamp attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSignature {
    pub name: String,
    pub email: String,
    pub date: DateTime<FixedOffset>,
}

/// The inner commit record of a translated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub author: CommitActor,
    pub committer: CommitSignature,
    pub message: String,
}

/// The repository a push originated from, carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub id: u64,
    pub name: String,
}

/// The `data` payload of a translated commit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitData {
    pub sha: String,
    pub commit: CommitDetail,
    pub html_url: String,
    pub repository: RepositorySummary,
    pub branch: String,
    /// The upstream commit object, untouched.
    pub original_message: serde_json::Value,
}

/// Extracts the branch name from a git ref: the last path segment.
///
/// `refs/heads/main` → `main`; a ref with no `/` is returned unchanged.
pub(crate) fn branch_from_ref(ref_name: &str) -> &str {
    ref_name.rsplit('/').next().unwrap_or(ref_name)
}
