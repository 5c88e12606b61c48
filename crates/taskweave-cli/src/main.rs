use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use taskweave_core::domain::{ApplyReport, ProjectId, ProposalKey, TaskId};
use taskweave_core::impls::{InMemoryWorkspace, WorkspaceFixture};
use taskweave_core::{
    AssignmentProposalSet, AutoAssignmentEngine, DependencyEditor, EngineConfig, ProposalApplier,
};

/// Run auto-assignment and dependency checks against a JSON workspace snapshot.
#[derive(Debug, Parser)]
#[command(name = "taskweave", version)]
struct Cli {
    /// Workspace fixture (projects, members, users, tasks) as JSON
    #[arg(long, short)]
    workspace: PathBuf,

    /// Engine configuration as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Propose assignees for unassigned tasks, then apply the accepted ones
    Assign {
        /// Proposals to reject before applying, as `project/task`
        #[arg(long, value_delimiter = ',')]
        reject: Vec<String>,

        /// Only print the proposals
        #[arg(long)]
        dry_run: bool,
    },

    /// Add a dependency `from -> to` if it keeps the project acyclic
    AddDependency {
        project: String,
        from: String,
        to: String,
    },

    /// List tasks that may become dependencies of `task`
    Targets { project: String, task: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignOutput<'a> {
    proposals: &'a AssignmentProposalSet,

    #[serde(skip_serializing_if = "Option::is_none")]
    apply: Option<ApplyReport>,
}

fn parse_key(s: &str) -> Result<ProposalKey> {
    let (project, task) = s
        .split_once('/')
        .ok_or_else(|| anyhow!("expected `project/task`, got `{s}`"))?;
    Ok(ProposalKey::new(project, task))
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_json(&raw).with_context(|| format!("parsing config {}", path.display()))
}

/// Apply the selected proposals and fold the outcome back into `set`.
async fn apply_and_record(
    workspace: Arc<InMemoryWorkspace>,
    set: &mut AssignmentProposalSet,
    config: EngineConfig,
    token: CancellationToken,
) -> Result<ApplyReport> {
    let applier = ProposalApplier::new(workspace)
        .with_config(config)
        .with_cancellation(token);
    let result = applier.apply(set).await?;
    set.record_outcome(&result);
    tracing::info!(
        session = %set.session_id(),
        cancelled = result.cancelled,
        "{}",
        result.summary()
    );
    Ok(result.report())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let raw = std::fs::read_to_string(&cli.workspace)
        .with_context(|| format!("reading workspace {}", cli.workspace.display()))?;
    let fixture = WorkspaceFixture::from_json(&raw).context("parsing workspace fixture")?;
    let workspace = Arc::new(InMemoryWorkspace::from_fixture(fixture));

    match cli.command {
        Command::Assign { reject, dry_run } => {
            let engine = AutoAssignmentEngine::new(
                workspace.clone(),
                workspace.clone(),
                workspace.clone(),
            )
            .with_config(config.clone());
            let mut set = engine.propose().await?;

            for key in &reject {
                set.reject(&parse_key(key)?)?;
            }

            let apply = if dry_run {
                None
            } else {
                let token = CancellationToken::new();
                let on_interrupt = token.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::warn!("interrupted; remaining assignments are skipped");
                        on_interrupt.cancel();
                    }
                });
                Some(apply_and_record(workspace.clone(), &mut set, config, token).await?)
            };

            print_json(&AssignOutput {
                proposals: &set,
                apply,
            })?;
        }
        Command::AddDependency { project, from, to } => {
            let editor = DependencyEditor::new(workspace.clone());
            let deps = editor
                .add_dependency(
                    &ProjectId::new(project),
                    &TaskId::new(from),
                    &TaskId::new(to),
                )
                .await?;
            tracing::info!(count = deps.len(), "dependency list saved");
            print_json(&deps)?;
        }
        Command::Targets { project, task } => {
            let editor = DependencyEditor::new(workspace.clone());
            let targets = editor
                .available_targets(&ProjectId::new(project), &TaskId::new(task))
                .await?;
            print_json(&targets)?;
        }
    }

    Ok(())
}
