//! Domain types for branch resolution
//!
//! Everything here is constructed fresh per reconciliation call; nothing is
//! cached or persisted across calls. Run and pull-request data are sourced
//! from the host and read-only.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Branches and pull requests
// ---------------------------------------------------------------------------

/// Head of a branch as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchHead {
    /// Commit SHA the branch currently points at.
    pub sha: String,
}

/// State of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

/// Pull request whose head is a candidate branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    /// Host-assigned pull request number.
    pub number: u64,
    /// Current state.
    pub state: PullRequestState,
}

// ---------------------------------------------------------------------------
// Workflow runs
// ---------------------------------------------------------------------------

/// Lifecycle status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    /// Any status this crate does not model (`waiting`, `requested`, ...).
    #[serde(other)]
    Unknown,
}

/// Final verdict of a completed workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    Neutral,
    ActionRequired,
    StartupFailure,
    Stale,
    #[serde(other)]
    Unknown,
}

/// Repository a run's head branch lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRepository {
    /// `owner/name` form.
    pub full_name: String,
    /// True when the repository is a fork.
    #[serde(default)]
    pub fork: bool,
}

/// One execution record of a build workflow.
///
/// Field names match the host's wire representation so adapters can
/// deserialize listings directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Host-assigned run id.
    pub id: u64,
    /// Sequential run number within the workflow.
    pub run_number: u64,
    /// Attempt counter; re-runs increment it.
    pub run_attempt: u64,
    /// Lifecycle status.
    pub status: RunStatus,
    /// Verdict; absent while the run is queued or in progress.
    pub conclusion: Option<RunConclusion>,
    /// Link to the run page.
    pub html_url: String,
    /// API endpoint for re-running the workflow.
    pub rerun_url: String,
    /// Branch the run was recorded for; the host may omit it for some
    /// trigger kinds.
    pub head_branch: Option<String>,
    /// Trigger event kind (`push`, `pull_request`, `pull_request_target`, ...).
    pub event: String,
    /// Repository the head branch lives in.
    pub head_repository: Option<RunRepository>,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
}

impl WorkflowRun {
    /// True when the run's head branch lives in a fork.
    ///
    /// An absent head repository counts as not-a-fork; only a positively
    /// fork-flagged source repository disqualifies a run.
    pub fn is_from_fork(&self) -> bool {
        self.head_repository.as_ref().is_some_and(|r| r.fork)
    }

    /// True when the run finished and concluded successfully.
    pub fn is_successful(&self) -> bool {
        self.status == RunStatus::Completed && self.conclusion == Some(RunConclusion::Success)
    }
}

// ---------------------------------------------------------------------------
// Reconciliation result
// ---------------------------------------------------------------------------

/// Aggregate answer of a reconciliation: the first candidate branch that
/// exists and is relevant, enriched with best-effort build information.
///
/// `latest_run` and `latest_successful_run` are kept independently: a branch
/// may have a recent failing run and an older successful one, and callers
/// need both to tell "currently red but was green" from "never built".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchMatch {
    /// Normalized branch name.
    pub name: String,
    /// Commit SHA the branch pointed at during resolution.
    pub sha: String,
    /// Pull request whose head is this branch, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestInfo>,
    /// Most recent run recorded for the branch, any status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_run: Option<WorkflowRun>,
    /// Most recent run that completed successfully.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_successful_run: Option<WorkflowRun>,
}

// ---------------------------------------------------------------------------
// Trigger context
// ---------------------------------------------------------------------------

/// Context the reconciliation was triggered from.
///
/// Used only to derive the default candidate list when the caller supplies
/// no candidates of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventContext {
    /// A pull-request style trigger.
    PullRequest {
        /// Source branch of the pull request.
        head_ref: String,
        /// Target branch of the pull request.
        base_ref: String,
    },
    /// A push style trigger. The ref is absent for triggers that carry no
    /// branch (manual dispatch, schedule).
    Push { pushed_ref: Option<String> },
}

impl EventContext {
    /// Candidate branches to probe, in priority order, when the caller
    /// supplied none. Entries may be absent; downstream skips them.
    pub fn default_candidates(&self) -> Vec<Option<String>> {
        match self {
            EventContext::PullRequest { head_ref, base_ref } => vec![
                Some(head_ref.clone()),
                Some(base_ref.clone()),
                Some("main".to_string()),
                Some("master".to_string()),
            ],
            EventContext::Push { pushed_ref } => vec![
                pushed_ref.clone(),
                Some("main".to_string()),
                Some("master".to_string()),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow mapping
// ---------------------------------------------------------------------------

/// Maps repository names to the workflow file whose run history carries the
/// build signal. The reconciler treats the mapping as opaque: it only ever
/// calls [`WorkflowMap::resolve`] for the repository it was asked about.
#[derive(Debug, Clone)]
pub struct WorkflowMap {
    default: String,
    overrides: HashMap<String, String>,
}

impl WorkflowMap {
    /// Mapping that resolves every repository to `default`.
    pub fn new(default: impl Into<String>) -> Self {
        WorkflowMap {
            default: default.into(),
            overrides: HashMap::new(),
        }
    }

    /// Use `workflow` for `repo` instead of the default.
    pub fn with_override(mut self, repo: impl Into<String>, workflow: impl Into<String>) -> Self {
        self.overrides.insert(repo.into(), workflow.into());
        self
    }

    /// Workflow file for `repo`. Total: unmapped repositories get the default.
    pub fn resolve(&self, repo: &str) -> &str {
        self.overrides
            .get(repo)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_json() -> &'static str {
        r#"{
            "id": 31337,
            "run_number": 207,
            "run_attempt": 1,
            "status": "completed",
            "conclusion": "success",
            "html_url": "https://example.test/runs/31337",
            "rerun_url": "https://api.example.test/runs/31337/rerun",
            "head_branch": "main",
            "event": "push",
            "head_repository": {
                "full_name": "acme/widgets",
                "fork": false,
                "private": false
            },
            "created_at": "2024-03-01T12:00:00Z"
        }"#
    }

    #[test]
    fn test_workflow_run_deserializes_from_host_payload() {
        let run: WorkflowRun = serde_json::from_str(run_json()).expect("deserialize run");
        assert_eq!(run.id, 31337);
        assert_eq!(run.run_number, 207);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.conclusion, Some(RunConclusion::Success));
        assert_eq!(run.head_branch.as_deref(), Some("main"));
        assert!(run.is_successful());
        assert!(!run.is_from_fork());
    }

    #[test]
    fn test_unknown_status_and_conclusion_do_not_fail_decoding() {
        let json = run_json()
            .replace("\"completed\"", "\"waiting\"")
            .replace("\"success\"", "\"some_future_verdict\"");
        let run: WorkflowRun = serde_json::from_str(&json).expect("deserialize run");
        assert_eq!(run.status, RunStatus::Unknown);
        assert_eq!(run.conclusion, Some(RunConclusion::Unknown));
        assert!(!run.is_successful());
    }

    #[test]
    fn test_absent_head_repository_counts_as_not_a_fork() {
        let run: WorkflowRun = serde_json::from_str(run_json()).expect("deserialize run");
        let run = WorkflowRun {
            head_repository: None,
            ..run
        };
        assert!(!run.is_from_fork());
    }

    #[test]
    fn test_pull_request_context_candidates_in_priority_order() {
        let ctx = EventContext::PullRequest {
            head_ref: "feature-a".to_string(),
            base_ref: "develop".to_string(),
        };
        let candidates: Vec<Option<String>> = ctx.default_candidates();
        let names: Vec<&str> = candidates.iter().map(|c| c.as_deref().unwrap()).collect();
        assert_eq!(names, ["feature-a", "develop", "main", "master"]);
    }

    #[test]
    fn test_push_context_without_ref_keeps_placeholder() {
        let ctx = EventContext::Push { pushed_ref: None };
        let candidates = ctx.default_candidates();
        assert_eq!(candidates.len(), 3);
        assert!(candidates[0].is_none());
        assert_eq!(candidates[1].as_deref(), Some("main"));
    }

    #[test]
    fn test_workflow_map_override_and_default() {
        let map = WorkflowMap::new("build.yml").with_override("widgets-tests", "test.yml");
        assert_eq!(map.resolve("widgets-tests"), "test.yml");
        assert_eq!(map.resolve("anything-else"), "build.yml");
    }

    #[test]
    fn test_branch_match_omits_absent_fields_in_json() {
        let m = BranchMatch {
            name: "main".to_string(),
            sha: "0d1e2f".to_string(),
            pull_request: None,
            latest_run: None,
            latest_successful_run: None,
        };
        let json = serde_json::to_value(&m).expect("serialize");
        assert_eq!(json["name"], "main");
        assert!(json.get("pull_request").is_none());
        assert!(json.get("latest_run").is_none());
    }
}
