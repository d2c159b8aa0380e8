mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use octopus_lib::consts::DEFAULT_TASK_LIST;

use cmd::Workspace;

/// octopus - manifest-driven workspace orchestrator
#[derive(Parser)]
#[command(name = "octopus")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Manifest file to use instead of octopus.json / octopus-dev.json
  #[arg(long, global = true)]
  manifest: Option<PathBuf>,

  /// Use the floating manifest and development builds (same as DEV=true)
  #[arg(long, global = true)]
  dev: bool,

  /// Start from an empty manifest instead of the bootstrap dependency when none exists
  #[arg(long, global = true)]
  no_init: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Execution settings shared by every command that runs tasks.
#[derive(Args, Debug, Clone)]
pub struct ExecArgs {
  /// Maximum number of independent tasks to run at once
  #[arg(short, long, default_value_t = 1)]
  pub jobs: usize,

  /// Skip every remaining task after the first failure
  #[arg(long)]
  pub fail_fast: bool,

  /// Upper bound for each command or clone, e.g. "90s" or "10m"
  #[arg(long, value_parser = humantime::parse_duration)]
  pub timeout: Option<Duration>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a task list of the manifest
  Run {
    /// Task list to run
    #[arg(default_value = DEFAULT_TASK_LIST)]
    list: String,

    #[command(flatten)]
    exec: ExecArgs,
  },

  /// Pin the floating manifest's clones to their checked-out revisions
  Freeze {
    /// Task lists to freeze (default: dependencies)
    lists: Vec<String>,
  },

  /// Build, stage and merge web components
  Build {
    /// Only build and stage these components, without merging
    #[arg(long, num_args = 1..)]
    only: Vec<String>,

    #[command(flatten)]
    exec: ExecArgs,
  },

  /// Clone component repositories and install their packages
  Install {
    /// JSON file listing `{ "name", "src" }` entries
    #[arg(long)]
    from: PathBuf,

    #[command(flatten)]
    exec: ExecArgs,
  },

  /// Stage theme sources
  Themes {
    #[command(flatten)]
    exec: ExecArgs,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "info" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let workspace = Workspace::new(cli.manifest, cli.dev, !cli.no_init);

  match cli.command {
    Commands::Run { list, exec } => cmd::cmd_run(&workspace, &list, &workspace.execute_config(&exec)),
    Commands::Freeze { lists } => cmd::cmd_freeze(&workspace, &lists),
    Commands::Build { only, exec } => cmd::cmd_build(&workspace, only, &workspace.execute_config(&exec)),
    Commands::Install { from, exec } => cmd::cmd_install(&workspace, &from, &workspace.execute_config(&exec)),
    Commands::Themes { exec } => cmd::cmd_themes(&workspace, &workspace.execute_config(&exec)),
  }
}
