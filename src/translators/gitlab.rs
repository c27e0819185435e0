//! GitLab push payload translator.
//!
//! Recognizes requests carrying `X-Gitlab-Event: Push Hook` and maps each
//! commit to one `GitLabCommitReceived` event. GitLab's push payload reports
//! only an author per commit, so the committer signature reuses the author
//! with the commit timestamp as its date.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::events::{CanonicalEvent, EventMetadata, EventType};
use crate::types::ProviderFamily;

use super::{
    CommitActor, CommitData, CommitDetail, CommitSignature, ProviderHeaders, PushContext,
    RepositorySummary, TranslationError, Translator, branch_from_ref,
};

/// Translator for GitLab push webhooks.
pub struct GitLabTranslator;

#[derive(Debug, Deserialize)]
struct RawPush {
    #[serde(rename = "ref")]
    ref_name: String,
    project_id: u64,
    project: RawProject,
    commits: Vec<RawCommit>,
}

#[derive(Debug, Deserialize)]
struct RawProject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    id: String,
    message: String,
    timestamp: DateTime<FixedOffset>,
    url: String,
    author: RawActor,
}

#[derive(Debug, Deserialize)]
struct RawActor {
    name: String,
    email: String,
}

impl Translator for GitLabTranslator {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::GitLab
    }

    fn can_translate(&self, headers: &ProviderHeaders) -> bool {
        headers.gitlab_event.as_deref() == Some("Push Hook")
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
            id: push.project_id,
            name: push.project.name,
        };

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
                            name: commit.author.name.clone(),
                            email: commit.author.email.clone(),
                        },
                        committer: CommitSignature {
                            name: commit.author.name,
                            email: commit.author.email,
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
                    EventType::GitLabCommitReceived,
                    data,
                    EventMetadata::for_inbox_commit(ctx.digest_id, ctx.inbox_id),
                )
            })
            .collect();

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DigestId, InboxId, InstanceId};
    use serde_json::json;

    fn ctx() -> PushContext {
        PushContext {
            instance_id: InstanceId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            digest_id: DigestId::parse("e9be4a71-f6ca-4f02-b431-d74489dee5d0").unwrap(),
            inbox_id: InboxId::parse("c347948f-e1d0-4cd7-9341-f0f6ef5289bf").unwrap(),
        }
    }

    fn push_payload() -> serde_json::Value {
        json!({
            "object_kind": "push",
            "ref": "refs/heads/main",
            "project_id": 15,
            "project": {
                "name": "diaspora",
                "web_url": "https://gitlab.example.com/mike/diaspora"
            },
            "commits": [
                {
                    "id": "b6568db1bc1dcd7f8b4d5a946b0b91f9dacd7327",
                    "message": "Update Catalan translation to e38cb41.",
                    "timestamp": "2011-12-12T14:27:31+02:00",
                    "url": "https://gitlab.example.com/mike/diaspora/commit/b6568db1",
                    "author": { "name": "Jordi Mallach", "email": "jordi@softcatala.org" }
                },
                {
                    "id": "da1560886d4f094c3e6c9ef40349f7d38b5d27d7",
                    "message": "fixed readme",
                    "timestamp": "2012-01-03T23:36:29+02:00",
                    "url": "https://gitlab.example.com/mike/diaspora/commit/da156088",
                    "author": { "name": "GitLab dev user", "email": "gitlabdev@dv6700.(none)" }
                }
            ]
        })
    }

    #[test]
    fn can_translate_only_push_hooks() {
        let t = GitLabTranslator;
        assert!(t.can_translate(&ProviderHeaders::gitlab("Push Hook")));
        assert!(!t.can_translate(&ProviderHeaders::gitlab("Tag Push Hook")));
        assert!(!t.can_translate(&ProviderHeaders::github("push")));
        assert!(!t.can_translate(&ProviderHeaders::default()));
    }

    #[test]
    fn commits_translate_with_author_as_committer() {
        let events = GitLabTranslator
            .translate_push(&push_payload(), &ctx())
            .unwrap();
        assert_eq!(events.len(), 2);

        let event = &events[0];
        assert_eq!(event.event_type, EventType::GitLabCommitReceived);

        let data: CommitData = serde_json::from_value(event.data.clone()).unwrap();
        assert_eq!(data.sha, "b6568db1bc1dcd7f8b4d5a946b0b91f9dacd7327");
        assert_eq!(data.branch, "main");
        assert_eq!(data.repository.id, 15);
        assert_eq!(data.repository.name, "diaspora");
        assert_eq!(data.commit.author.name, "Jordi Mallach");
        assert_eq!(data.commit.committer.name, "Jordi Mallach");
        assert_eq!(
            data.commit.committer.date.to_rfc3339(),
            "2011-12-12T14:27:31+02:00"
        );
    }

    #[test]
    fn events_share_digest_metadata_with_distinct_ids() {
        let events = GitLabTranslator
            .translate_push(&push_payload(), &ctx())
            .unwrap();
        assert_ne!(events[0].event_id, events[1].event_id);
        for event in &events {
            assert_eq!(event.metadata.digest_id, Some(ctx().digest_id));
            assert_eq!(event.metadata.inbox_id, Some(ctx().inbox_id));
        }
    }

    #[test]
    fn missing_project_fails_translation() {
        let mut payload = push_payload();
        payload.as_object_mut().unwrap().remove("project");
        let err = GitLabTranslator
            .translate_push(&payload, &ctx())
            .unwrap_err();
        assert_eq!(err.family, ProviderFamily::GitLab);
    }

    #[test]
    fn commit_missing_author_fails_whole_batch() {
        let mut payload = push_payload();
        payload["commits"][1].as_object_mut().unwrap().remove("author");
        assert!(GitLabTranslator.translate_push(&payload, &ctx()).is_err());
    }
}
