//! Implementation of the `octopus freeze` command.
//!
//! Reads the floating manifest next to the active one, pins every cloned
//! dependency to the revision currently checked out and writes the result as
//! the stable manifest.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use octopus_lib::config::Environment;
use octopus_lib::freeze::{GitRevisions, freeze_workflow};

use super::Workspace;
use crate::output::{print_success, print_warning, symbols, truncate_hash};

pub fn cmd_freeze(workspace: &Workspace, lists: &[String]) -> Result<()> {
  let root = workspace.root();
  let floating = Environment::Floating.manifest_path(&root);
  let stable = Environment::Stable.manifest_path(&root);

  let mut store = workspace.store();
  let outcome = freeze_workflow(&mut store, &floating, &stable, lists, Some(root.as_path()), &GitRevisions)
    .with_context(|| format!("Failed to freeze {}", floating.display()))?;

  for pin in &outcome.pinned {
    println!(
      "  {} {}/{} {}",
      symbols::PIN.if_supports_color(Stream::Stdout, |s| s.green()),
      pin.list,
      pin.task,
      truncate_hash(&pin.commit).if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
  for unpinned in &outcome.unpinned {
    print_warning(&format!("{}/{} left floating: {}", unpinned.list, unpinned.task, unpinned.reason));
  }

  print_success(&format!(
    "Pinned {} clone(s) into {}",
    outcome.pinned.len(),
    stable.display()
  ));
  Ok(())
}
