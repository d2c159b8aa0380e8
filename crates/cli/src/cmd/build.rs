//! Implementation of the `octopus build` command.

use std::collections::BTreeSet;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use octopus_lib::components::{BuilderOptions, ComponentOptions, ComponentsBuilder, MergeOutcome};
use octopus_lib::execute::ExecuteConfig;

use super::{Workspace, runtime};
use crate::output::{print_info, print_stat, print_success, print_summary};

/// Build the web components found under the components source root.
///
/// With `only` empty every component is built, staged and merged into the
/// aggregate entry files. Otherwise just the named components are built and
/// staged.
pub fn cmd_build(workspace: &Workspace, only: Vec<String>, config: &ExecuteConfig) -> Result<()> {
  let start = Instant::now();
  let options = BuilderOptions {
    components: ComponentOptions {
      development: workspace.development(),
      target_components: (!only.is_empty()).then(|| only.into_iter().collect::<BTreeSet<_>>()),
    },
    ..BuilderOptions::default()
  };
  let builder = ComponentsBuilder::new(options, workspace.root());

  print_info(&format!(
    "Building components from {}",
    builder.options().source_root.display()
  ));

  let report = runtime()?
    .block_on(builder.run(config))
    .context("Failed to build components")?;

  print_summary(&report.build, start.elapsed());
  if let Some(copy) = &report.copy {
    print_summary(copy, start.elapsed());
  }

  match &report.merge {
    Some(MergeOutcome::Written { script, components, .. }) => {
      print_success(&format!("Merged {} component(s)", components));
      print_stat("Entry", &script.display().to_string());
    }
    Some(MergeOutcome::Skipped) => print_info("Core component not staged, nothing merged"),
    None => {}
  }

  if !report.is_success() {
    bail!("Component build did not complete");
  }
  Ok(())
}
