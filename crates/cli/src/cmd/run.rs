//! Implementation of the `octopus run` command.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use octopus_lib::execute::{ExecuteConfig, execute_task_list};

use super::{Workspace, ensure_success, runtime};
use crate::output::{print_info, print_summary};

/// Run the task list called `list` from the active manifest.
///
/// A manifest that does not exist yet is created from the default one before
/// anything runs, so the next invocation sees the same tasks.
pub fn cmd_run(workspace: &Workspace, list: &str, config: &ExecuteConfig) -> Result<()> {
  let start = Instant::now();
  let store = workspace.store();
  let manifest = store
    .read()
    .with_context(|| format!("Failed to load manifest {}", workspace.manifest.display()))?;

  if !store.current_path().exists() {
    store.write(&manifest).context("Failed to create manifest")?;
    info!(path = %store.current_path().display(), "created manifest");
  }

  print_info(&format!("Running '{}' from {}", list, workspace.manifest.display()));

  let summary = runtime()?
    .block_on(execute_task_list(&manifest, list, config))
    .with_context(|| format!("Failed to run task list '{list}'"))?;

  print_summary(&summary, start.elapsed());
  ensure_success(&summary, &format!("Task list '{list}'"))
}
