//! Ordered candidate resolution.

use tracing::{debug, info};

use crate::error::HostResult;
use crate::host::RepositoryHost;
use crate::model::{BranchMatch, EventContext, WorkflowMap};
use crate::pulls::find_pull_request;
use crate::refs::clean_branch_ref;
use crate::scanner::RunScanner;

/// Branches expected to build without an open review request.
const DEFAULT_INTEGRATION_BRANCHES: [&str; 2] = ["master", "main"];

/// True for the narrow, fixed set of default integration branches that
/// bypass the pull-request relevance requirement.
pub fn is_default_integration_branch(name: &str) -> bool {
    DEFAULT_INTEGRATION_BRANCHES.contains(&name)
}

/// One reconciliation request.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    /// Repository owner (organization or user).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Candidate branches in priority order. Absent entries are skipped;
    /// when the whole list is empty a default is derived from `context`.
    pub candidates: Vec<Option<String>>,
    /// Trigger context for default-candidate derivation.
    pub context: Option<EventContext>,
    /// Repository to workflow-file mapping used for run enrichment.
    pub workflows: WorkflowMap,
}

/// Resolves the first candidate branch that exists and is relevant, then
/// enriches it with pull-request and workflow-run information.
pub struct BranchReconciler<H> {
    host: H,
    scanner: RunScanner,
}

impl<H> BranchReconciler<H>
where
    H: RepositoryHost,
{
    pub fn new(host: H) -> Self {
        BranchReconciler {
            host,
            scanner: RunScanner::default(),
        }
    }

    /// Replace the default run scanner (page cap, page size).
    pub fn with_scanner(mut self, scanner: RunScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Resolve `request` to at most one enriched branch.
    ///
    /// Candidates are probed strictly in order; the first branch that both
    /// exists on the host and passes the relevance filter wins, and later
    /// candidates are never consulted even when they would carry richer
    /// build data. `Ok(None)` means every candidate was exhausted, which
    /// is a defined outcome, not an error. Host errors other than
    /// not-found abort the whole call.
    pub async fn reconcile(&self, request: &ReconcileRequest) -> HostResult<Option<BranchMatch>> {
        let candidates: Vec<Option<String>> = if request.candidates.is_empty() {
            match &request.context {
                Some(ctx) => ctx.default_candidates(),
                None => Vec::new(),
            }
        } else {
            request.candidates.clone()
        };

        for candidate in &candidates {
            let name = match clean_branch_ref(candidate.as_deref()) {
                Some(name) if !name.is_empty() => name,
                _ => {
                    debug!("skipping absent or empty candidate");
                    continue;
                }
            };

            let head = match self
                .host
                .get_branch(&request.owner, &request.repo, &name)
                .await
            {
                Ok(head) => head,
                Err(err) if err.is_not_found() => {
                    info!(branch = %name, "candidate branch does not exist");
                    continue;
                }
                Err(err) => return Err(err),
            };
            info!(branch = %name, sha = %head.sha, "candidate branch exists");

            let pull_request =
                find_pull_request(&self.host, &request.owner, &request.repo, &name).await?;

            if pull_request.is_none() && !is_default_integration_branch(&name) {
                info!(branch = %name, "branch has no pull request, skipping");
                continue;
            }

            let workflow = request.workflows.resolve(&request.repo);
            let runs = self
                .scanner
                .scan(
                    &self.host,
                    &request.owner,
                    &request.repo,
                    workflow,
                    &name,
                    pull_request.is_some(),
                )
                .await?;

            return Ok(Some(BranchMatch {
                name,
                sha: head.sha,
                pull_request,
                latest_run: runs.latest,
                latest_successful_run: runs.latest_success,
            }));
        }

        info!("no candidate branch matched");
        Ok(None)
    }
}
