//! Paginated workflow-run scanning for a single branch.

use tracing::{debug, info};

use crate::error::HostResult;
use crate::host::RepositoryHost;
use crate::model::WorkflowRun;

/// Page cap for a single scan. Bounds cost when a long-lived workflow has
/// no runs for the requested branch; a tunable constant, not domain law.
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Host page size for run listings.
pub const DEFAULT_PER_PAGE: u8 = 100;

/// Trigger kind of cross-fork pull-request runs, which are trusted only
/// under the conditions checked in [`RunScanner::scan`].
const PULL_REQUEST_TARGET_EVENT: &str = "pull_request_target";

/// Runs found for one branch during a scan.
///
/// Both fields are captured first-wins in newest-first order and kept
/// independently: `latest` may be a failing run while `latest_success`
/// points at an older green one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchRuns {
    /// Most recent run surviving the filters, any status. Set once per
    /// scan; later survivors never overwrite it.
    pub latest: Option<WorkflowRun>,
    /// Most recent run that completed successfully.
    pub latest_success: Option<WorkflowRun>,
}

/// Scans a workflow's run history newest-first, classifying runs for one
/// branch.
#[derive(Debug, Clone)]
pub struct RunScanner {
    max_pages: u32,
    per_page: u8,
}

impl Default for RunScanner {
    fn default() -> Self {
        RunScanner::new(DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE)
    }
}

impl RunScanner {
    pub fn new(max_pages: u32, per_page: u8) -> Self {
        RunScanner {
            max_pages,
            per_page,
        }
    }

    /// Find the most recent and most recent successful run of `workflow`
    /// for `branch`.
    ///
    /// Per-run filters, applied in order:
    /// - a `pull_request_target` run is trusted only when the branch has a
    ///   known pull request and the run's source repository is not a fork;
    ///   forked runs of that trigger never count as a build signal;
    /// - runs recorded for a different head branch are skipped.
    ///
    /// The scan stops at the first successful survivor, at the page cap, or
    /// when the host reports the workflow has no run history. An empty page
    /// does not terminate the scan. Errors other than not-found abort it.
    pub async fn scan(
        &self,
        host: &dyn RepositoryHost,
        owner: &str,
        repo: &str,
        workflow: &str,
        branch: &str,
        has_pull_request: bool,
    ) -> HostResult<BranchRuns> {
        let mut found = BranchRuns::default();

        'pages: for page in 1..=self.max_pages {
            debug!(workflow = %workflow, page, "listing workflow runs");
            let runs = match host
                .list_workflow_runs(owner, repo, workflow, page, self.per_page)
                .await
            {
                Ok(runs) => runs,
                Err(err) if err.is_not_found() => {
                    info!(workflow = %workflow, branch = %branch, "workflow has no run history");
                    break 'pages;
                }
                Err(err) => return Err(err),
            };

            for run in runs {
                if run.event == PULL_REQUEST_TARGET_EVENT {
                    if !has_pull_request {
                        debug!(
                            run = run.id,
                            "skipping pull_request_target run, branch has no pull request"
                        );
                        continue;
                    }
                    if run.is_from_fork() {
                        debug!(run = run.id, "skipping pull_request_target run from fork");
                        continue;
                    }
                }
                if run.head_branch.as_deref() != Some(branch) {
                    continue;
                }

                if found.latest.is_none() {
                    info!(
                        branch = %branch,
                        run_number = run.run_number,
                        status = ?run.status,
                        conclusion = ?run.conclusion,
                        "latest run found"
                    );
                    found.latest = Some(run.clone());
                }

                if run.is_successful() {
                    info!(branch = %branch, run_number = run.run_number, "successful run found");
                    found.latest_success = Some(run);
                    break 'pages;
                }
            }
        }

        if found.latest.is_none() {
            info!(workflow = %workflow, branch = %branch, "no runs for branch");
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{make_run, ScriptedHost};
    use crate::model::{RunConclusion, RunRepository, RunStatus};

    const OWNER: &str = "acme";
    const REPO: &str = "widgets";
    const WORKFLOW: &str = "build.yml";

    fn target_run(id: u64, branch: &str, fork: bool) -> crate::model::WorkflowRun {
        let mut run = make_run(id, branch, RunStatus::Completed, Some(RunConclusion::Success));
        run.event = PULL_REQUEST_TARGET_EVENT.to_string();
        run.head_repository = Some(RunRepository {
            full_name: if fork {
                "someone/widgets".to_string()
            } else {
                format!("{OWNER}/{REPO}")
            },
            fork,
        });
        run
    }

    #[tokio::test]
    async fn test_forked_target_run_never_counts_without_pull_request() {
        let host = ScriptedHost::new();
        host.add_run_page(OWNER, REPO, WORKFLOW, vec![target_run(1, "feature-a", true)]);

        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", false)
            .await
            .expect("scan");
        assert!(found.latest.is_none());
        assert!(found.latest_success.is_none());
    }

    #[tokio::test]
    async fn test_forked_target_run_skipped_even_with_pull_request() {
        let host = ScriptedHost::new();
        host.add_run_page(OWNER, REPO, WORKFLOW, vec![target_run(1, "feature-a", true)]);

        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", true)
            .await
            .expect("scan");
        assert!(found.latest.is_none());
    }

    #[tokio::test]
    async fn test_same_repo_target_run_trusted_with_pull_request() {
        let host = ScriptedHost::new();
        host.add_run_page(OWNER, REPO, WORKFLOW, vec![target_run(1, "feature-a", false)]);

        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", true)
            .await
            .expect("scan");
        assert_eq!(found.latest.map(|r| r.id), Some(1));
    }

    #[tokio::test]
    async fn test_runs_for_other_branches_are_skipped() {
        let host = ScriptedHost::new();
        host.add_run_page(
            OWNER,
            REPO,
            WORKFLOW,
            vec![
                make_run(9, "other", RunStatus::Completed, Some(RunConclusion::Success)),
                make_run(8, "feature-a", RunStatus::Completed, Some(RunConclusion::Failure)),
            ],
        );

        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", false)
            .await
            .expect("scan");
        assert_eq!(found.latest.map(|r| r.id), Some(8));
        assert!(found.latest_success.is_none());
    }

    #[tokio::test]
    async fn test_latest_is_frozen_at_first_survivor() {
        let host = ScriptedHost::new();
        host.add_run_page(
            OWNER,
            REPO,
            WORKFLOW,
            vec![
                make_run(20, "feature-a", RunStatus::InProgress, None),
                make_run(19, "feature-a", RunStatus::Completed, Some(RunConclusion::Failure)),
                make_run(18, "feature-a", RunStatus::Completed, Some(RunConclusion::Success)),
            ],
        );

        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", false)
            .await
            .expect("scan");
        assert_eq!(found.latest.as_ref().map(|r| r.id), Some(20));
        assert_eq!(found.latest_success.map(|r| r.id), Some(18));
    }

    #[tokio::test]
    async fn test_scan_stops_at_first_success() {
        let host = ScriptedHost::new();
        host.add_run_page(
            OWNER,
            REPO,
            WORKFLOW,
            vec![make_run(5, "feature-a", RunStatus::Completed, Some(RunConclusion::Success))],
        );
        host.add_run_page(
            OWNER,
            REPO,
            WORKFLOW,
            vec![make_run(4, "feature-a", RunStatus::Completed, Some(RunConclusion::Success))],
        );

        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", false)
            .await
            .expect("scan");
        assert_eq!(found.latest_success.map(|r| r.id), Some(5));
        assert_eq!(host.run_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_pages_do_not_stop_the_scan() {
        let host = ScriptedHost::new();
        host.add_run_page(OWNER, REPO, WORKFLOW, vec![]);
        host.add_run_page(OWNER, REPO, WORKFLOW, vec![]);
        host.add_run_page(
            OWNER,
            REPO,
            WORKFLOW,
            vec![make_run(3, "feature-a", RunStatus::Completed, Some(RunConclusion::Success))],
        );

        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", false)
            .await
            .expect("scan");
        assert_eq!(found.latest_success.map(|r| r.id), Some(3));
        assert_eq!(host.run_calls(), 3);
    }

    #[tokio::test]
    async fn test_page_cap_bounds_the_scan() {
        let host = ScriptedHost::new();
        host.add_run_page(
            OWNER,
            REPO,
            WORKFLOW,
            vec![make_run(2, "feature-a", RunStatus::Completed, Some(RunConclusion::Failure))],
        );

        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", false)
            .await
            .expect("scan");
        assert_eq!(found.latest.map(|r| r.id), Some(2));
        assert!(found.latest_success.is_none());
        assert_eq!(host.run_calls(), DEFAULT_MAX_PAGES as usize);
    }

    #[tokio::test]
    async fn test_missing_run_history_returns_accumulated() {
        let host = ScriptedHost::new();
        host.add_run_page(
            OWNER,
            REPO,
            WORKFLOW,
            vec![make_run(7, "feature-a", RunStatus::Completed, Some(RunConclusion::Failure))],
        );
        host.fail_run_page(OWNER, REPO, WORKFLOW, 404);

        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", false)
            .await
            .expect("scan");
        assert_eq!(found.latest.map(|r| r.id), Some(7));
        assert!(found.latest_success.is_none());
        assert_eq!(host.run_calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_no_run_history() {
        let host = ScriptedHost::new();
        let found = RunScanner::default()
            .scan(&host, OWNER, REPO, "missing.yml", "feature-a", false)
            .await
            .expect("scan");
        assert_eq!(found, BranchRuns::default());
        assert_eq!(host.run_calls(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_abort_the_scan() {
        let host = ScriptedHost::new();
        host.fail_run_page(OWNER, REPO, WORKFLOW, 500);
        let err = RunScanner::default()
            .scan(&host, OWNER, REPO, WORKFLOW, "feature-a", false)
            .await
            .expect_err("should abort");
        assert!(!err.is_not_found());
    }
}
