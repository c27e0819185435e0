//! GitHub push payload translator.
//!
//! Recognizes requests carrying `X-GitHub-Event: push` and maps each commit
//! in the payload to one `GitHubCommitReceived` event. The payload is parsed
//! in full before any event is constructed, so a malformed commit anywhere in
//! the batch means no events at all.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::events::{CanonicalEvent, EventMetadata, EventType};
use crate::types::ProviderFamily;

use super::{
    CommitActor, CommitData, CommitDetail, CommitSignature, ProviderHeaders, PushContext,
    RepositorySummary, TranslationError, Translator, branch_from_ref,
};

/// Translator for GitHub push webhooks.
pub struct GitHubTranslator;

// ============================================================================
// Raw payload structures for deserialization
//
// These match GitHub's push webhook JSON structure. Required fields are plain
// (a missing field fails the whole translation); everything else is ignored.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPush {
    #[serde(rename = "ref")]
    ref_name: String,
    repository: RawRepository,
    commits: Vec<RawCommit>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    id: String,
    message: String,
    timestamp: DateTime<FixedOffset>,
    url: String,
    author: RawActor,
    committer: RawActor,
}

#[derive(Debug, Deserialize)]
struct RawActor {
    name: String,
    email: String,
}

impl Translator for GitHubTranslator {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::GitHub
    }

    fn can_translate(&self, headers: &ProviderHeaders) -> bool {
        headers.github_event.as_deref() == Some("push")
    }

    fn translate_push(
        &self,
        payload: &serde_json::Value,
        ctx: &PushContext,
    ) -> Result<Vec<CanonicalEvent>, TranslationError> {
        let push: RawPush = serde_json::from_value(payload.clone())
            .map_err(|e| TranslationError::malformed(self.family(), e.to_string(), payload))?;

        let branch = branch_from_ref(&push.ref_name).to_string();
        let repository = RepositorySummary {
            id: push.repository.id,
            name: push.repository.name,
        };

        // Keep the untouched upstream commit objects for `originalMessage`.
        let originals = payload
            .get("commits")
            .and_then(|c| c.as_array())
            .cloned()
            .unwrap_or_default();

        let events = push
            .commits
            .into_iter()
            .zip(originals)
            .map(|(commit, original)| {
                let data = CommitData {
                    sha: commit.id,
                    commit: CommitDetail {
                        author: CommitActor {
                            name: commit.author.name,
                            email: commit.author.email,
                        },
                        committer: CommitSignature {
                            name: commit.committer.name,
                            email: commit.committer.email,
                            date: commit.timestamp,
                        },
                        message: commit.message,
                    },
                    html_url: commit.url,
                    repository: repository.clone(),
                    branch: branch.clone(),
                    original_message: original,
                };
                CanonicalEvent::new(
                    EventType::GitHubCommitReceived,
                    data,
                    EventMetadata::for_inbox_commit(ctx.digest_id, ctx.inbox_id),
                )
            })
            .collect();

        Ok(events)
    }
}
