//! GitHub REST client
//!
//! Implements the `RepositoryHost` capability over the GitHub v3 API.
//! Only the three read endpoints reconciliation needs are covered: branch
//! lookup, pull-request listing by head, and workflow-run listing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use branchscout_core::{BranchHead, HostError, HostResult, PullRequestInfo, PullRequestState};
use branchscout_core::{RepositoryHost, WorkflowRun};

/// GitHub API configuration
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Base URL of the REST API
    pub api_url: String,
    /// Bearer token; optional for public data, but unauthenticated calls
    /// get much tighter rate limits
    pub token: Option<String>,
    /// User-agent header; the API rejects requests without one
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            api_url: std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            token: std::env::var("GITHUB_TOKEN").ok(),
            user_agent: concat!("branchscout/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GithubConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific API endpoint
    pub fn new(api_url: &str) -> Self {
        GithubConfig {
            api_url: api_url.to_string(),
            token: None,
            ..Self::default()
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

/// GitHub client implementing the repository host capability
pub struct GithubHost {
    config: GithubConfig,
    http: reqwest::Client,
}

impl GithubHost {
    /// Create a new client
    pub fn new(config: GithubConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");

        GithubHost { config, http }
    }

    /// Create client from environment variables
    pub fn from_env() -> Self {
        Self::new(GithubConfig::from_env())
    }

    /// Build an API URL from path segments. Segments are percent-encoded,
    /// so branch names containing `/` stay a single segment.
    fn api_url(&self, segments: &[&str]) -> HostResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.config.api_url)
            .map_err(|e| HostError::Transport(format!("invalid API url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| HostError::Transport("API url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T>(
        &self,
        url: reqwest::Url,
        query: &[(&str, String)],
        what: &str,
    ) -> HostResult<T>
    where
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .query(query);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(HostError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HostError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| HostError::Payload(e.to_string()))
    }
}

#[async_trait]
impl RepositoryHost for GithubHost {
    async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> HostResult<BranchHead> {
        debug!(owner = %owner, repo = %repo, branch = %branch, "fetching branch");
        let url = self.api_url(&["repos", owner, repo, "branches", branch])?;
        let payload: BranchPayload = self
            .get_json(url, &[], &format!("branch {owner}/{repo}@{branch}"))
            .await?;
        Ok(BranchHead {
            sha: payload.commit.sha,
        })
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
        page: u32,
        per_page: u8,
    ) -> HostResult<Vec<PullRequestInfo>> {
        debug!(owner = %owner, repo = %repo, head = %head, "listing pull requests");
        let url = self.api_url(&["repos", owner, repo, "pulls"])?;
        let query = [
            ("head", head.to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let pulls: Vec<PullPayload> = self
            .get_json(url, &query, &format!("pulls of {owner}/{repo} for {head}"))
            .await?;
        Ok(pulls.into_iter().map(PullPayload::into_info).collect())
    }

    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        page: u32,
        per_page: u8,
    ) -> HostResult<Vec<WorkflowRun>> {
        debug!(owner = %owner, repo = %repo, workflow = %workflow, page, "listing workflow runs");
        let url = self.api_url(&["repos", owner, repo, "actions", "workflows", workflow, "runs"])?;
        let query = [
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        let payload: RunsPayload = self
            .get_json(url, &query, &format!("workflow {workflow} in {owner}/{repo}"))
            .await?;
        Ok(payload.workflow_runs)
    }
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BranchPayload {
    commit: CommitPayload,
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullPayload {
    number: u64,
    state: String,
    merged_at: Option<DateTime<Utc>>,
}

impl PullPayload {
    /// The wire carries `open`/`closed` plus a merge timestamp; fold the
    /// pair into the three-valued state.
    fn into_info(self) -> PullRequestInfo {
        let state = if self.merged_at.is_some() {
            PullRequestState::Merged
        } else if self.state == "closed" {
            PullRequestState::Closed
        } else {
            PullRequestState::Open
        };
        PullRequestInfo {
            number: self.number,
            state,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunsPayload {
    workflow_runs: Vec<WorkflowRun>,
}

/// GitHub error bodies are JSON with a `message` field; fall back to the
/// raw body for anything else (proxies, HTML error pages).
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiMessage {
        message: String,
    }
    serde_json::from_str::<ApiMessage>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
