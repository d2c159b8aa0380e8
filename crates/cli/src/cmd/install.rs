//! Implementation of the `octopus install` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use octopus_lib::components::{BuilderOptions, ComponentSource, ComponentsInstaller};
use octopus_lib::execute::ExecuteConfig;

use super::{Workspace, runtime};
use crate::output::{print_info, print_summary};

/// Clone the components listed in `from` and install their packages.
pub fn cmd_install(workspace: &Workspace, from: &Path, config: &ExecuteConfig) -> Result<()> {
  let start = Instant::now();
  let content =
    std::fs::read_to_string(from).with_context(|| format!("Failed to read component list {}", from.display()))?;
  let sources: Vec<ComponentSource> =
    serde_json::from_str(&content).with_context(|| format!("Invalid component list {}", from.display()))?;

  print_info(&format!("Installing {} component(s)", sources.len()));

  let installer = ComponentsInstaller::new(&BuilderOptions::default(), &workspace.root());
  let report = runtime()?
    .block_on(installer.run(&sources, config))
    .context("Failed to install components")?;

  print_summary(&report.clone, start.elapsed());
  if let Some(install) = &report.install {
    print_summary(install, start.elapsed());
  }

  if !report.is_success() {
    bail!("Component installation did not complete");
  }
  Ok(())
}
