//! Implementation of the `octopus themes` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use octopus_lib::components::{ThemesOptions, ThemesPlanner};
use octopus_lib::execute::{ExecuteConfig, execute_tasks};

use super::{Workspace, ensure_success, runtime};
use crate::output::{print_info, print_summary};

pub fn cmd_themes(workspace: &Workspace, config: &ExecuteConfig) -> Result<()> {
  let start = Instant::now();
  let planner = ThemesPlanner::new(ThemesOptions::default(), &workspace.root());
  if planner.themes().is_empty() {
    print_info("No themes found");
    return Ok(());
  }

  let tasks = planner.plan_copy_all().context("Failed to plan theme copies")?;
  let summary = runtime()?
    .block_on(execute_tasks(Path::new("."), &tasks, config))
    .context("Failed to stage themes")?;

  print_summary(&summary, start.elapsed());
  ensure_success(&summary, "Theme staging")
}
