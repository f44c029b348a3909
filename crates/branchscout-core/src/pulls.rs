//! Pull-request association for candidate branches.

use tracing::debug;

use crate::error::HostResult;
use crate::host::RepositoryHost;
use crate::model::PullRequestInfo;

/// Find the pull request whose head is `owner:branch`, if any.
///
/// Requests only the first result of the first page; the host's default
/// ordering puts the newest request first. A branch without a pull request
/// is a normal outcome, never an error, and host not-found answers are
/// folded into it. This is a relevance signal for the reconciler, not a
/// hard dependency.
pub async fn find_pull_request(
    host: &dyn RepositoryHost,
    owner: &str,
    repo: &str,
    branch: &str,
) -> HostResult<Option<PullRequestInfo>> {
    let head = format!("{owner}:{branch}");
    let pulls = match host.list_pull_requests(owner, repo, &head, 1, 1).await {
        Ok(pulls) => pulls,
        Err(err) if err.is_not_found() => Vec::new(),
        Err(err) => return Err(err),
    };

    match pulls.into_iter().next() {
        Some(pr) => {
            debug!(branch = %branch, number = pr.number, state = ?pr.state, "pull request found");
            Ok(Some(pr))
        }
        None => {
            debug!(branch = %branch, "no pull request for branch");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedHost;
    use crate::model::{PullRequestInfo, PullRequestState};

    #[tokio::test]
    async fn test_first_result_of_first_page_wins() {
        let host = ScriptedHost::new();
        host.add_pull(
            "acme",
            "widgets",
            "acme:feature-a",
            PullRequestInfo {
                number: 41,
                state: PullRequestState::Open,
            },
        );
        host.add_pull(
            "acme",
            "widgets",
            "acme:feature-a",
            PullRequestInfo {
                number: 17,
                state: PullRequestState::Closed,
            },
        );

        let found = find_pull_request(&host, "acme", "widgets", "feature-a")
            .await
            .expect("lookup");
        assert_eq!(found.map(|pr| pr.number), Some(41));
    }

    #[tokio::test]
    async fn test_no_pull_request_is_not_an_error() {
        let host = ScriptedHost::new();
        let found = find_pull_request(&host, "acme", "widgets", "feature-a")
            .await
            .expect("lookup");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_host_not_found_folds_into_absent() {
        let host = ScriptedHost::new();
        host.fail_pulls("acme", "widgets", "acme:feature-a", 404);
        let found = find_pull_request(&host, "acme", "widgets", "feature-a")
            .await
            .expect("lookup");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_other_host_errors_propagate() {
        let host = ScriptedHost::new();
        host.fail_pulls("acme", "widgets", "acme:feature-a", 502);
        let err = find_pull_request(&host, "acme", "widgets", "feature-a")
            .await
            .expect_err("should propagate");
        assert!(!err.is_not_found());
    }
}
