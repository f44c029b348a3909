//! Workflow event payload parsing.
//!
//! Actions hands workflows a JSON payload describing the triggering event.
//! Only a small slice of it matters here: the repository identity, the pull
//! request refs when the trigger was a pull request, and the pushed ref and
//! commit otherwise.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use branchscout_core::{clean_branch_ref, EventContext};

/// The slice of an Actions event payload this tool reads.
#[derive(Debug, Deserialize)]
pub struct EventPayload {
    pub repository: Option<RepositoryInfo>,
    pub pull_request: Option<PullRequestRefs>,
    /// Pushed ref, namespace-prefixed, present on push events.
    #[serde(rename = "ref")]
    pub pushed_ref: Option<String>,
    /// Head commit SHA after a push.
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub organization: Option<OrgRef>,
    pub owner: Option<OwnerRef>,
}

/// The webhook encodes the owning organization either as a bare login
/// string or as an object, depending on the event kind.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OrgRef {
    Login(String),
    Object { login: String },
}

impl OrgRef {
    fn login(&self) -> &str {
        match self {
            OrgRef::Login(login) => login,
            OrgRef::Object { login } => login,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OwnerRef {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestRefs {
    pub head: BranchRef,
    pub base: BranchRef,
}

#[derive(Debug, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub branch: String,
    pub label: Option<String>,
    pub sha: Option<String>,
}

/// Repository and branch identity printed by the `context` command.
#[derive(Debug, Serialize)]
pub struct ContextSummary {
    pub owner: Option<String>,
    pub repository: String,
    pub branch: Option<String>,
    pub branch_label: Option<String>,
    pub sha: Option<String>,
}

impl EventPayload {
    /// Repository owner login: the owning organization when the payload
    /// carries one, the plain repository owner otherwise.
    pub fn owner(&self) -> Option<String> {
        let repository = self.repository.as_ref()?;
        repository
            .organization
            .as_ref()
            .map(|org| org.login().to_string())
            .or_else(|| repository.owner.as_ref().map(|owner| owner.login.clone()))
    }

    pub fn repo_name(&self) -> Option<String> {
        self.repository.as_ref().map(|repo| repo.name.clone())
    }

    /// Trigger context used to derive default branch candidates.
    pub fn event_context(&self) -> EventContext {
        match &self.pull_request {
            Some(pull) => EventContext::PullRequest {
                head_ref: pull.head.branch.clone(),
                base_ref: pull.base.branch.clone(),
            },
            None => EventContext::Push {
                pushed_ref: self.pushed_ref.clone(),
            },
        }
    }

    /// Summarize repository and branch identity. Ref namespaces are
    /// stripped from every field so callers get bare names.
    pub fn context_summary(&self) -> Result<ContextSummary> {
        let repository = self
            .repository
            .as_ref()
            .context("event payload has no repository")?;

        let (branch, label, sha) = match &self.pull_request {
            Some(pull) => (
                Some(pull.head.branch.as_str()),
                pull.head.label.as_deref(),
                pull.head.sha.as_deref(),
            ),
            None => (
                self.pushed_ref.as_deref(),
                self.pushed_ref.as_deref(),
                self.after.as_deref(),
            ),
        };

        Ok(ContextSummary {
            owner: self.owner(),
            repository: repository.name.clone(),
            branch: clean_branch_ref(branch),
            branch_label: clean_branch_ref(label),
            sha: clean_branch_ref(sha),
        })
    }
}

/// Read and parse the event payload at `path`.
pub fn load(path: &Path) -> Result<EventPayload> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read event payload {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse event payload {}", path.display()))
}

/// Load the payload when a path is known. Running outside Actions without
/// a payload is fine for commands that take explicit coordinates.
pub fn load_optional(path: Option<&Path>) -> Result<Option<EventPayload>> {
    match path {
        Some(path) => Ok(Some(load(path)?)),
        None => Ok(None),
    }
}
