//! branchscout command-line interface.
//!
//! Two commands:
//!
//! * `resolve` probes an ordered list of candidate branches against the
//!   hosting platform and prints the first existing, relevant one as a
//!   JSON record enriched with pull-request and workflow-run data.
//! * `context` prints the repository and branch identity carried by the
//!   triggering event payload.
//!
//! Both commands read the Actions event payload when one is available;
//! `resolve` also accepts explicit coordinates for use outside Actions.

mod event;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use branchscout_core::telemetry::init_tracing;
use branchscout_core::{BranchReconciler, ReconcileRequest, WorkflowMap};
use branchscout_github::GithubHost;

use event::EventPayload;

#[derive(Parser)]
#[command(
    name = "branchscout",
    version,
    about = "Resolve branch candidates against a repository host"
)]
struct Cli {
    /// Emit newline-delimited JSON logs
    #[arg(long, global = true)]
    json_logs: bool,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the first candidate branch that exists and is relevant
    Resolve {
        /// Repository owner; read from the event payload when omitted
        #[arg(long)]
        owner: Option<String>,

        /// Repository name; read from the event payload when omitted
        #[arg(long)]
        repo: Option<String>,

        /// Candidate branch, highest priority first; repeat for more.
        /// With no candidates, defaults are derived from the event payload.
        #[arg(long = "candidate")]
        candidates: Vec<String>,

        /// Workflow file whose run history enriches the match
        #[arg(long, default_value = "build.yml")]
        workflow: String,

        /// Per-repository workflow override as <repo>=<file>; repeatable
        #[arg(long = "workflow-for")]
        workflow_overrides: Vec<String>,

        /// Event payload path; defaults to $GITHUB_EVENT_PATH
        #[arg(long)]
        event_path: Option<PathBuf>,
    },

    /// Print repository and branch identity from the event payload
    Context {
        /// Event payload path; defaults to $GITHUB_EVENT_PATH
        #[arg(long)]
        event_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Resolve {
            owner,
            repo,
            candidates,
            workflow,
            workflow_overrides,
            event_path,
        } => {
            cmd_resolve(
                owner,
                repo,
                candidates,
                &workflow,
                &workflow_overrides,
                resolve_event_path(event_path).as_deref(),
            )
            .await
        }
        Commands::Context { event_path } => cmd_context(resolve_event_path(event_path).as_deref()),
    }
}

/// Event payload location: the flag when given, the path Actions exports
/// otherwise.
fn resolve_event_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| std::env::var_os("GITHUB_EVENT_PATH").map(PathBuf::from))
}

/// Parse repeated `<repo>=<file>` flags into a workflow mapping.
fn parse_workflow_overrides(default: &str, overrides: &[String]) -> Result<WorkflowMap> {
    let mut workflows = WorkflowMap::new(default);
    for entry in overrides {
        let (repo, file) = entry.split_once('=').with_context(|| {
            format!("invalid workflow override {entry:?}, expected <repo>=<file>")
        })?;
        workflows = workflows.with_override(repo, file);
    }
    Ok(workflows)
}

/// Resolve the first candidate branch that exists and is relevant, then
/// print its enriched record as pretty JSON on stdout. Prints `null` when
/// every candidate is exhausted.
async fn cmd_resolve(
    owner: Option<String>,
    repo: Option<String>,
    candidates: Vec<String>,
    workflow: &str,
    overrides: &[String],
    event_path: Option<&Path>,
) -> Result<()> {
    let payload = event::load_optional(event_path)?;

    let owner = owner
        .or_else(|| payload.as_ref().and_then(EventPayload::owner))
        .context("repository owner unknown; pass --owner or provide an event payload")?;
    let repo = repo
        .or_else(|| payload.as_ref().and_then(EventPayload::repo_name))
        .context("repository name unknown; pass --repo or provide an event payload")?;

    let request = ReconcileRequest {
        owner,
        repo,
        candidates: candidates.into_iter().map(Some).collect(),
        context: payload.as_ref().map(EventPayload::event_context),
        workflows: parse_workflow_overrides(workflow, overrides)?,
    };

    info!(owner = %request.owner, repo = %request.repo, "resolving branch candidates");
    let reconciler = BranchReconciler::new(GithubHost::from_env());
    match reconciler.reconcile(&request).await? {
        Some(found) => println!("{}", serde_json::to_string_pretty(&found)?),
        None => {
            info!("no candidate branch qualified");
            println!("null");
        }
    }
    Ok(())
}

/// Print repository and branch identity from the event payload as pretty
/// JSON on stdout.
fn cmd_context(event_path: Option<&Path>) -> Result<()> {
    let path =
        event_path.context("no event payload; pass --event-path or set GITHUB_EVENT_PATH")?;
    let payload = event::load(path)?;
    let summary = payload.context_summary()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
