//! `smartClone` action implementation.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::execute::types::ExecuteError;
use crate::git;

/// Ensure `target/<name>` holds `src` at `commit`, or at the latest revision
/// when unpinned.
///
/// Git work is blocking and runs on the blocking thread pool. Dropping the
/// returned future (for example when the action times out) interrupts the
/// clone or fetch still running there.
///
/// # Returns
///
/// The checked-out revision, followed by the commit summary when
/// `collect_log` is set.
pub async fn execute_smart_clone(
  name: &str,
  src: &str,
  target: &Path,
  commit: Option<&str>,
  collect_log: bool,
) -> Result<String, ExecuteError> {
  let repo_path = target.join(name);
  let url = src.to_string();
  let commit = commit.map(str::to_string);

  let guard = InterruptOnDrop::default();
  let interrupt = Arc::clone(&guard.0);
  let checkout = tokio::task::spawn_blocking(move || {
    git::sync_checkout_with_interrupt(&url, &repo_path, commit.as_deref(), &interrupt)
  })
  .await
  .map_err(|e| ExecuteError::Join(e.to_string()))??;
  drop(guard);

  info!(
    name,
    rev = %checkout.rev,
    cloned = checkout.cloned,
    path = %checkout.path.display(),
    "checkout ready"
  );

  if !collect_log {
    return Ok(checkout.rev);
  }

  let path = checkout.path.clone();
  let summary = tokio::task::spawn_blocking(move || git::head_summary(&path))
    .await
    .map_err(|e| ExecuteError::Join(e.to_string()))?;

  match summary {
    Ok(summary) => Ok(format!("{} {}", checkout.rev, summary)),
    Err(e) => {
      warn!(name, error = %e, "could not collect commit log");
      Ok(checkout.rev)
    }
  }
}

/// Raises its flag when dropped.
#[derive(Default)]
struct InterruptOnDrop(Arc<AtomicBool>);

impl Drop for InterruptOnDrop {
  fn drop(&mut self) {
    self.0.store(true, Ordering::Relaxed);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{commit_file, init_repo};
  use tempfile::TempDir;

  #[tokio::test]
  async fn clones_into_target_named_after_task() {
    let temp_dir = TempDir::new().unwrap();
    let upstream = temp_dir.path().join("upstream");
    let rev = init_repo(&upstream);
    let target = temp_dir.path().join("work");

    let output = execute_smart_clone("lib", upstream.to_str().unwrap(), &target, None, false)
      .await
      .unwrap();

    assert_eq!(output, rev);
    assert!(target.join("lib").join("README.md").exists());
  }

  #[tokio::test]
  async fn collect_log_appends_summary() {
    let temp_dir = TempDir::new().unwrap();
    let upstream = temp_dir.path().join("upstream");
    init_repo(&upstream);
    let rev = commit_file(&upstream, "a.txt", "a\n", "add a");
    let target = temp_dir.path().join("work");

    let output = execute_smart_clone("lib", upstream.to_str().unwrap(), &target, None, true)
      .await
      .unwrap();

    assert_eq!(output, format!("{rev} add a"));
  }

  #[tokio::test]
  async fn pinned_clone_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let upstream = temp_dir.path().join("upstream");
    let first = init_repo(&upstream);
    commit_file(&upstream, "b.txt", "b\n", "add b");
    let target = temp_dir.path().join("work");

    for _ in 0..2 {
      let output = execute_smart_clone("lib", upstream.to_str().unwrap(), &target, Some(&first), false)
        .await
        .unwrap();
      assert_eq!(output, first);
    }
    assert!(!target.join("lib").join("b.txt").exists());
  }

  #[test]
  fn dropping_guard_raises_flag() {
    let guard = InterruptOnDrop::default();
    let flag = Arc::clone(&guard.0);
    assert!(!flag.load(Ordering::Relaxed));

    drop(guard);

    assert!(flag.load(Ordering::Relaxed));
  }
}
