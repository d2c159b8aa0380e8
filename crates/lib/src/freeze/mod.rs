//! Pinning floating `smartClone` actions to the revisions currently checked out.
//!
//! Freezing reads the revision of every checkout referenced by the selected
//! task lists and records it as the action's `commit`. It is best effort per
//! action: a missing checkout or an unusable revision is logged and the action
//! is left as it was.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ConfigStore};
use crate::consts::{DEFAULT_TASK_LIST, REVISION_LEN};
use crate::git::{self, GitError};
use crate::manifest::{Action, Manifest};

#[derive(Debug, Error)]
pub enum FreezeError {
  #[error("unable to find the task list called <{0}> in current config")]
  UnknownTaskList(String),

  #[error(transparent)]
  Config(#[from] ConfigError),
}

/// Where revisions of checkouts come from.
pub trait RevisionSource {
  /// The commit checked out in `dir`.
  fn revision(&self, dir: &Path) -> Result<String, GitError>;
}

/// Reads `HEAD` of git checkouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitRevisions;

impl RevisionSource for GitRevisions {
  fn revision(&self, dir: &Path) -> Result<String, GitError> {
    git::head_revision(dir)
  }
}

/// A `smartClone` action that received a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
  pub list: String,
  pub task: String,
  pub commit: String,
}

/// A `smartClone` action that was left as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unpinned {
  pub list: String,
  pub task: String,
  pub reason: String,
}

#[derive(Debug, Clone)]
pub struct FreezeOutcome {
  pub manifest: Manifest,
  pub pinned: Vec<Pin>,
  pub unpinned: Vec<Unpinned>,
}

/// Pin every `smartClone` action of the task lists named in `targets`
/// (`dependencies` when empty).
///
/// A relative `workDir` resolves against `root`, or the current directory when
/// `root` is `None`, the same way execution resolves it. An unknown list name
/// is an error and leaves the manifest untouched.
pub fn freeze(
  mut manifest: Manifest,
  targets: &[String],
  root: Option<&Path>,
  revisions: &impl RevisionSource,
) -> Result<FreezeOutcome, FreezeError> {
  let targets: Vec<String> = if targets.is_empty() {
    vec![DEFAULT_TASK_LIST.to_string()]
  } else {
    targets.to_vec()
  };

  if let Some(unknown) = targets.iter().find(|t| manifest.task_list(t).is_none()) {
    return Err(FreezeError::UnknownTaskList(unknown.clone()));
  }

  let work_dir = match root {
    Some(root) => root.join(&manifest.work_dir),
    None => manifest.work_dir.clone(),
  };
  debug!(work_dir = %work_dir.display(), "looking for checkouts");
  let mut pinned = Vec::new();
  let mut unpinned = Vec::new();

  for list in &targets {
    let Some(tasks) = manifest.task_list_mut(list) else {
      continue;
    };

    for task in tasks.iter_mut() {
      for action in task.actions.iter_mut() {
        let Action::SmartClone { target, commit, .. } = action else {
          continue;
        };

        match pin_revision(&work_dir, target, &task.name, revisions) {
          Ok(rev) => {
            debug!(list = %list, task = %task.name, commit = %rev, "pinned");
            *commit = Some(rev.clone());
            pinned.push(Pin {
              list: list.clone(),
              task: task.name.clone(),
              commit: rev,
            });
          }
          Err(reason) => {
            warn!(list = %list, task = %task.name, reason = %reason, "leaving action unpinned");
            unpinned.push(Unpinned {
              list: list.clone(),
              task: task.name.clone(),
              reason,
            });
          }
        }
      }
    }
  }

  info!(pinned = pinned.len(), unpinned = unpinned.len(), "freeze complete");
  Ok(FreezeOutcome {
    manifest,
    pinned,
    unpinned,
  })
}

/// Read the floating manifest, freeze it, and write the result as the stable
/// manifest. The store's active path is restored afterwards, also on error.
pub fn freeze_workflow(
  store: &mut ConfigStore,
  floating: &Path,
  stable: &Path,
  targets: &[String],
  root: Option<&Path>,
  revisions: &impl RevisionSource,
) -> Result<FreezeOutcome, FreezeError> {
  let manifest = store.select(floating).read()?;
  let outcome = freeze(manifest, targets, root, revisions)?;
  store.select(stable).write(&outcome.manifest)?;
  Ok(outcome)
}

fn pin_revision(
  work_dir: &Path,
  target: &Path,
  task: &str,
  revisions: &impl RevisionSource,
) -> Result<String, String> {
  let dir = checkout_dir(work_dir, target, task)
    .ok_or_else(|| format!("checkout of '{task}' not available, make sure it was cloned"))?;

  let rev = revisions
    .revision(&dir)
    .map_err(|e| format!("cannot read revision in '{}': {e}", dir.display()))?;

  if is_full_revision(&rev) {
    Ok(rev)
  } else {
    Err(format!("'{rev}' is not a full revision"))
  }
}

/// `workDir/<task>`, or `workDir/<target>/<task>` when the former is missing or
/// empty.
fn checkout_dir(work_dir: &Path, target: &Path, task: &str) -> Option<PathBuf> {
  [work_dir.join(task), work_dir.join(target).join(task)]
    .into_iter()
    .find(|dir| is_non_empty_dir(dir))
}

fn is_non_empty_dir(dir: &Path) -> bool {
  fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

fn is_full_revision(rev: &str) -> bool {
  rev.len() == REVISION_LEN && rev.chars().all(|c| c.is_ascii_hexdigit())
}
