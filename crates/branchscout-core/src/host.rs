//! Repository host capability
//!
//! The reconciliation core is transport-agnostic: everything it needs from
//! the hosting platform goes through [`RepositoryHost`]. The HTTP adapter
//! lives in the `branchscout-github` crate; an in-memory scripted
//! implementation for tests is provided by the `fakes` module.

use async_trait::async_trait;

use crate::error::HostResult;
use crate::model::{BranchHead, PullRequestInfo, WorkflowRun};

/// Read-side operations against a repository hosting and CI platform.
///
/// Guarantees expected from implementations:
/// - `get_branch` returns `HostError::NotFound` for a missing branch.
/// - `list_pull_requests` orders results per the host's default (most
///   recently created first) and may return an empty page.
/// - `list_workflow_runs` orders runs newest-first; `HostError::NotFound`
///   is a valid outcome meaning the workflow has no run history.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Look up a branch by name, returning its head commit.
    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> HostResult<BranchHead>;

    /// List pull requests whose head matches `head` (`owner:branch` form).
    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
        page: u32,
        per_page: u8,
    ) -> HostResult<Vec<PullRequestInfo>>;

    /// List one page of a workflow's runs, newest-first.
    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        page: u32,
        per_page: u8,
    ) -> HostResult<Vec<WorkflowRun>>;
}
