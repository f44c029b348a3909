//! In-memory host for exercising reconciliation without a network
//!
//! `ScriptedHost` satisfies the `RepositoryHost` contract from seeded
//! branches, pull requests, and paged run listings, and counts the queries a
//! scenario issues. Clones share state, so a test can keep a handle for
//! call-count assertions after handing the host to a reconciler.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::DateTime;

use crate::error::{HostError, HostResult};
use crate::host::RepositoryHost;
use crate::model::{BranchHead, PullRequestInfo, RunConclusion, RunStatus, WorkflowRun};

/// One scripted page of a run listing.
#[derive(Debug, Clone)]
enum RunPage {
    Runs(Vec<WorkflowRun>),
    Fail(u16),
}

#[derive(Debug, Default)]
struct ScriptedState {
    branches: HashMap<String, Result<BranchHead, u16>>,
    pulls: HashMap<String, Result<Vec<PullRequestInfo>, u16>>,
    run_pages: HashMap<String, Vec<RunPage>>,
}

#[derive(Debug, Default)]
struct ScriptedInner {
    state: Mutex<ScriptedState>,
    branch_calls: AtomicUsize,
    pull_calls: AtomicUsize,
    run_calls: AtomicUsize,
}

/// Scriptable in-memory [`RepositoryHost`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    inner: Arc<ScriptedInner>,
}

fn branch_key(owner: &str, repo: &str, branch: &str) -> String {
    format!("{owner}/{repo}#{branch}")
}

fn pull_key(owner: &str, repo: &str, head: &str) -> String {
    format!("{owner}/{repo}#{head}")
}

fn run_key(owner: &str, repo: &str, workflow: &str) -> String {
    format!("{owner}/{repo}#{workflow}")
}

fn scripted_error(status: u16, what: String) -> HostError {
    if status == 404 {
        HostError::NotFound(what)
    } else {
        HostError::Status {
            status,
            message: format!("scripted failure for {what}"),
        }
    }
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a branch with its head commit.
    pub fn add_branch(&self, owner: &str, repo: &str, branch: &str, sha: &str) {
        let mut state = self.inner.state.lock().unwrap();
        state.branches.insert(
            branch_key(owner, repo, branch),
            Ok(BranchHead {
                sha: sha.to_string(),
            }),
        );
    }

    /// Make lookups of `branch` fail with `status` (404 maps to not-found).
    pub fn fail_branch(&self, owner: &str, repo: &str, branch: &str, status: u16) {
        let mut state = self.inner.state.lock().unwrap();
        state
            .branches
            .insert(branch_key(owner, repo, branch), Err(status));
    }

    /// Append a pull request to the listing for `head` (`owner:branch`).
    pub fn add_pull(&self, owner: &str, repo: &str, head: &str, pull: PullRequestInfo) {
        let mut state = self.inner.state.lock().unwrap();
        let entry = state
            .pulls
            .entry(pull_key(owner, repo, head))
            .or_insert_with(|| Ok(Vec::new()));
        if let Ok(list) = entry {
            list.push(pull);
        }
    }

    /// Make pull-request listings for `head` fail with `status`.
    pub fn fail_pulls(&self, owner: &str, repo: &str, head: &str, status: u16) {
        let mut state = self.inner.state.lock().unwrap();
        state.pulls.insert(pull_key(owner, repo, head), Err(status));
    }

    /// Append one page to a workflow's run listing. Pages serve in the
    /// order they were added; pages past the scripted ones come back empty.
    /// A workflow with no scripted pages at all answers not-found.
    pub fn add_run_page(&self, owner: &str, repo: &str, workflow: &str, runs: Vec<WorkflowRun>) {
        let mut state = self.inner.state.lock().unwrap();
        state
            .run_pages
            .entry(run_key(owner, repo, workflow))
            .or_default()
            .push(RunPage::Runs(runs));
    }

    /// Append a failing page to a workflow's run listing.
    pub fn fail_run_page(&self, owner: &str, repo: &str, workflow: &str, status: u16) {
        let mut state = self.inner.state.lock().unwrap();
        state
            .run_pages
            .entry(run_key(owner, repo, workflow))
            .or_default()
            .push(RunPage::Fail(status));
    }

    /// Number of branch lookups issued so far.
    pub fn branch_calls(&self) -> usize {
        self.inner.branch_calls.load(Ordering::SeqCst)
    }

    /// Number of pull-request listings issued so far.
    pub fn pull_calls(&self) -> usize {
        self.inner.pull_calls.load(Ordering::SeqCst)
    }

    /// Number of run listings issued so far.
    pub fn run_calls(&self) -> usize {
        self.inner.run_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryHost for ScriptedHost {
    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> HostResult<BranchHead> {
        self.inner.branch_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.inner.state.lock().unwrap();
        match state.branches.get(&branch_key(owner, repo, branch)) {
            Some(Ok(head)) => Ok(head.clone()),
            Some(Err(status)) => Err(scripted_error(
                *status,
                format!("branch {owner}/{repo}@{branch}"),
            )),
            None => Err(HostError::NotFound(format!(
                "branch {owner}/{repo}@{branch}"
            ))),
        }
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
        page: u32,
        per_page: u8,
    ) -> HostResult<Vec<PullRequestInfo>> {
        self.inner.pull_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.inner.state.lock().unwrap();
        match state.pulls.get(&pull_key(owner, repo, head)) {
            Some(Ok(pulls)) => {
                let offset = (page.max(1) as usize - 1) * per_page as usize;
                Ok(pulls
                    .iter()
                    .skip(offset)
                    .take(per_page as usize)
                    .cloned()
                    .collect())
            }
            Some(Err(status)) => Err(scripted_error(
                *status,
                format!("pulls of {owner}/{repo} for {head}"),
            )),
            None => Ok(Vec::new()),
        }
    }

    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        page: u32,
        _per_page: u8,
    ) -> HostResult<Vec<WorkflowRun>> {
        self.inner.run_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.inner.state.lock().unwrap();
        let pages = state
            .run_pages
            .get(&run_key(owner, repo, workflow))
            .ok_or_else(|| HostError::NotFound(format!("workflow {workflow} in {owner}/{repo}")))?;
        match pages.get(page.max(1) as usize - 1) {
            Some(RunPage::Runs(runs)) => Ok(runs.clone()),
            Some(RunPage::Fail(status)) => Err(scripted_error(
                *status,
                format!("runs of {workflow} page {page}"),
            )),
            None => Ok(Vec::new()),
        }
    }
}

/// Build a plain push-triggered run for scripting scenarios. Callers adjust
/// the event kind or head repository on the returned value as needed.
pub fn make_run(
    id: u64,
    branch: &str,
    status: RunStatus,
    conclusion: Option<RunConclusion>,
) -> WorkflowRun {
    WorkflowRun {
        id,
        run_number: id,
        run_attempt: 1,
        status,
        conclusion,
        html_url: format!("https://github.example/acme/widgets/actions/runs/{id}"),
        rerun_url: format!("https://api.github.example/repos/acme/widgets/actions/runs/{id}/rerun"),
        head_branch: Some(branch.to_string()),
        event: "push".to_string(),
        head_repository: None,
        created_at: DateTime::from_timestamp(1_709_290_000 + id as i64, 0).unwrap_or_default(),
    }
}
