//! Core domain for branchscout
//!
//! Resolves, for a repository and an ordered list of candidate branch
//! names, the first candidate that exists on the host and is relevant
//! (carries a pull request, or is a default integration branch), and
//! enriches it with the most recent and most recent successful workflow
//! run for that branch.
//!
//! The crate is transport-agnostic: everything that touches the hosting
//! platform goes through the [`RepositoryHost`] trait. The GitHub adapter
//! lives in `branchscout-github`; tests run against [`fakes::ScriptedHost`].

pub mod error;
pub mod fakes;
pub mod host;
pub mod model;
pub mod pulls;
pub mod reconciler;
pub mod refs;
pub mod scanner;
pub mod telemetry;

pub use error::{HostError, HostResult};
pub use host::RepositoryHost;
pub use model::{
    BranchHead, BranchMatch, EventContext, PullRequestInfo, PullRequestState, RunConclusion,
    RunRepository, RunStatus, WorkflowMap, WorkflowRun,
};
pub use pulls::find_pull_request;
pub use reconciler::{is_default_integration_branch, BranchReconciler, ReconcileRequest};
pub use refs::clean_branch_ref;
pub use scanner::{BranchRuns, RunScanner, DEFAULT_MAX_PAGES, DEFAULT_PER_PAGE};
