//! Git primitives used by `smartClone` and by freezing.
//!
//! Cloning, fetching, and revision resolution go through gix. Moving the
//! worktree of an existing checkout to another revision is delegated to the
//! `git` binary.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use gix::remote::Direction;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during git operations.
#[derive(Debug, Error)]
pub enum GitError {
  /// Failed to create the parent directory of a checkout.
  #[error("failed to create directory '{0}': {1}")]
  CreateDir(PathBuf, #[source] std::io::Error),

  /// Failed to clone a git repository.
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to open an existing git repository.
  #[error("failed to open repository at '{path}': {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: Box<gix::open::Error>,
  },

  /// Failed to fetch from remote.
  #[error("failed to fetch from '{url}': {source}")]
  Fetch {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// No remote configured for the repository.
  #[error("no remote configured for repository")]
  NoRemote,

  /// Failed to connect to remote.
  #[error("failed to connect to remote '{url}': {source}")]
  Connect {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to find the specified revision.
  #[error("revision '{rev}' not found in repository")]
  RevisionNotFound { rev: String },

  /// Failed to resolve HEAD reference.
  #[error("failed to resolve HEAD: {0}")]
  ResolveHead(String),

  /// Failed to run the git binary.
  #[error("failed to run git: {0}")]
  Spawn(#[source] std::io::Error),

  /// The operation was interrupted before it finished.
  #[error("interrupted while syncing '{0}'")]
  Interrupted(PathBuf),

  /// The git binary exited unsuccessfully.
  #[error("git {args} failed with exit code {code:?}: {stderr}")]
  Command {
    args: String,
    code: Option<i32>,
    stderr: String,
  },
}

/// Outcome of [`sync_checkout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
  /// Path of the working copy.
  pub path: PathBuf,
  /// Commit the working copy is at afterwards.
  pub rev: String,
  /// Whether the repository was freshly cloned.
  pub cloned: bool,
}

/// Make `repo_path` reflect `url` at `rev`, or at the latest remote state when
/// `rev` is `None`.
///
/// - Missing checkout: clone, then check out `rev` if given.
/// - Existing checkout pinned to the revision it is already at: nothing to do.
/// - Otherwise: fetch, then move the worktree to `rev` or fast-forward.
pub fn sync_checkout(url: &str, repo_path: &Path, rev: Option<&str>) -> Result<Checkout, GitError> {
  sync_checkout_with_interrupt(url, repo_path, rev, &gix::interrupt::IS_INTERRUPTED)
}

/// [`sync_checkout`] that stops as soon as `interrupt` is set.
///
/// gix observes the flag while cloning and fetching. The worktree is not
/// touched once the flag is set.
pub fn sync_checkout_with_interrupt(
  url: &str,
  repo_path: &Path,
  rev: Option<&str>,
  interrupt: &AtomicBool,
) -> Result<Checkout, GitError> {
  check_interrupt(interrupt, repo_path)?;

  if let Some(parent) = repo_path.parent() {
    if !parent.as_os_str().is_empty() && !parent.exists() {
      std::fs::create_dir_all(parent).map_err(|e| GitError::CreateDir(parent.to_path_buf(), e))?;
    }
  }

  if !repo_path.join(".git").exists() {
    info!(url, path = %repo_path.display(), "cloning repository");
    let repo = clone_repo(url, repo_path, interrupt)?;
    if let Some(rev) = rev {
      check_interrupt(interrupt, repo_path)?;
      checkout_detached(repo_path, rev)?;
    }
    let rev = resolve_revision(&repo, rev)?;
    return Ok(Checkout {
      path: repo_path.to_path_buf(),
      rev,
      cloned: true,
    });
  }

  debug!(path = %repo_path.display(), "opening existing repository");
  let repo = open(repo_path)?;

  if let Some(rev) = rev {
    let head = resolve_revision(&repo, None)?;
    if head == rev {
      debug!(path = %repo_path.display(), rev, "already at pinned revision");
      return Ok(Checkout {
        path: repo_path.to_path_buf(),
        rev: head,
        cloned: false,
      });
    }
  }

  fetch_updates(&repo, url, interrupt)?;
  check_interrupt(interrupt, repo_path)?;

  match rev {
    Some(rev) => {
      // make sure the pinned revision exists before touching the worktree
      let commit = resolve_revision(&repo, Some(rev))?;
      checkout_detached(repo_path, &commit)?;
    }
    None => update_to_latest(&repo, repo_path)?,
  }

  let repo = open(repo_path)?;
  let rev = resolve_revision(&repo, None)?;
  debug!(path = %repo_path.display(), rev = %rev, "checkout synchronized");
  Ok(Checkout {
    path: repo_path.to_path_buf(),
    rev,
    cloned: false,
  })
}

/// Resolve the commit currently checked out at `repo_path`.
pub fn head_revision(repo_path: &Path) -> Result<String, GitError> {
  let repo = open(repo_path)?;
  resolve_revision(&repo, None)
}

/// First line of the message of the commit checked out at `repo_path`.
pub fn head_summary(repo_path: &Path) -> Result<String, GitError> {
  let repo = open(repo_path)?;
  let mut head = repo.head().map_err(|e| GitError::ResolveHead(e.to_string()))?;
  let commit = head
    .peel_to_commit()
    .map_err(|e| GitError::ResolveHead(e.to_string()))?;
  let message = commit.message_raw_sloppy().to_string();
  Ok(message.lines().next().unwrap_or_default().trim().to_string())
}

fn open(repo_path: &Path) -> Result<gix::Repository, GitError> {
  gix::open(repo_path).map_err(|e| GitError::Open {
    path: repo_path.to_path_buf(),
    source: Box::new(e),
  })
}

/// Clone a git repository to the specified path.
fn clone_repo(url: &str, dest: &Path, interrupt: &AtomicBool) -> Result<gix::Repository, GitError> {
  let mut prepared = gix::prepare_clone(url, dest).map_err(|e| GitError::Clone {
    url: url.to_string(),
    source: Box::new(e),
  })?;

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, interrupt)
    .map_err(|e| GitError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  let (repo, _outcome) = checkout
    .main_worktree(gix::progress::Discard, interrupt)
    .map_err(|e| GitError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  Ok(repo)
}

/// Fetch updates from the default remote.
fn fetch_updates(repo: &gix::Repository, url: &str, interrupt: &AtomicBool) -> Result<(), GitError> {
  debug!(url, "fetching updates");

  let remote = repo
    .find_default_remote(Direction::Fetch)
    .ok_or(GitError::NoRemote)?
    .map_err(|e| GitError::Connect {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  let connection = remote.connect(Direction::Fetch).map_err(|e| GitError::Connect {
    url: url.to_string(),
    source: Box::new(e),
  })?;

  connection
    .prepare_fetch(gix::progress::Discard, Default::default())
    .map_err(|e| GitError::Fetch {
      url: url.to_string(),
      source: Box::new(e),
    })?
    .receive(gix::progress::Discard, interrupt)
    .map_err(|e| GitError::Fetch {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  Ok(())
}

/// Resolve a revision spec to a commit hash. `None` resolves HEAD.
fn resolve_revision(repo: &gix::Repository, rev: Option<&str>) -> Result<String, GitError> {
  match rev {
    Some(rev_str) => {
      let spec = repo.rev_parse(rev_str).map_err(|_| GitError::RevisionNotFound {
        rev: rev_str.to_string(),
      })?;

      let object_id = spec.single().ok_or_else(|| GitError::RevisionNotFound {
        rev: format!("{} (ambiguous)", rev_str),
      })?;

      let commit = object_id.object().map_err(|e| GitError::RevisionNotFound {
        rev: format!("{}: {}", rev_str, e),
      })?;

      Ok(commit.id.to_string())
    }
    None => {
      let mut head = repo.head().map_err(|e| GitError::ResolveHead(e.to_string()))?;

      let commit = head
        .peel_to_commit()
        .map_err(|e| GitError::ResolveHead(e.to_string()))?;

      Ok(commit.id.to_string())
    }
  }
}

/// Remote-tracking refs tried, in order, when a detached checkout floats again.
const REMOTE_HEADS: [&str; 3] = ["refs/remotes/origin/HEAD", "refs/remotes/origin/main", "refs/remotes/origin/master"];

/// Bring a floating checkout up to date with its remote.
///
/// A checkout on a branch is fast-forwarded to its remote-tracking branch. A
/// detached checkout (previously pinned) is moved to the remote's default head.
fn update_to_latest(repo: &gix::Repository, repo_path: &Path) -> Result<(), GitError> {
  let head_name = repo.head_name().map_err(|e| GitError::ResolveHead(e.to_string()))?;

  match head_name {
    Some(name) => {
      let upstream = format!("refs/remotes/origin/{}", name.shorten());
      run_git(repo_path, &["merge", "--ff-only", "--quiet", &upstream]).map(|_| ())
    }
    None => {
      let latest = REMOTE_HEADS
        .iter()
        .find_map(|candidate| resolve_revision(repo, Some(candidate)).ok())
        .ok_or_else(|| GitError::RevisionNotFound {
          rev: "refs/remotes/origin/HEAD".to_string(),
        })?;
      checkout_detached(repo_path, &latest)
    }
  }
}

fn check_interrupt(interrupt: &AtomicBool, repo_path: &Path) -> Result<(), GitError> {
  if interrupt.load(Ordering::Relaxed) {
    return Err(GitError::Interrupted(repo_path.to_path_buf()));
  }
  Ok(())
}

fn checkout_detached(repo_path: &Path, rev: &str) -> Result<(), GitError> {
  debug!(path = %repo_path.display(), rev, "checking out revision");
  run_git(repo_path, &["checkout", "--quiet", "--force", "--detach", rev]).map(|_| ())
}

fn run_git(repo_path: &Path, args: &[&str]) -> Result<String, GitError> {
  let output = Command::new("git")
    .args(args)
    .current_dir(repo_path)
    .output()
    .map_err(GitError::Spawn)?;

  if !output.status.success() {
    return Err(GitError::Command {
      args: args.join(" "),
      code: output.status.code(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }

  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn head_revision_of_plain_directory_is_an_error() {
    let temp_dir = TempDir::new().unwrap();

    let result = head_revision(temp_dir.path());
    assert!(matches!(result, Err(GitError::Open { .. })));
  }

  #[test]
  fn clone_of_missing_local_source_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist");
    let dest = temp_dir.path().join("checkouts").join("lib");

    let result = sync_checkout(missing.to_str().unwrap(), &dest, None);
    assert!(matches!(result, Err(GitError::Clone { .. })));
  }

  mod fixtures {
    use super::*;
    use crate::util::testutil::{commit_file, git, init_repo};

    #[test]
    fn clone_then_float_to_latest() {
      let temp_dir = TempDir::new().unwrap();
      let upstream = temp_dir.path().join("upstream");
      let first = init_repo(&upstream);
      let dest = temp_dir.path().join("work").join("lib");

      let checkout = sync_checkout(upstream.to_str().unwrap(), &dest, None).unwrap();
      assert!(checkout.cloned);
      assert_eq!(checkout.rev, first);

      let second = commit_file(&upstream, "lib.js", "export {}\n", "add lib");
      let checkout = sync_checkout(upstream.to_str().unwrap(), &dest, None).unwrap();
      assert!(!checkout.cloned);
      assert_eq!(checkout.rev, second);
      assert!(dest.join("lib.js").exists());
    }

    #[test]
    fn pinned_checkout_moves_to_commit_and_is_stable() {
      let temp_dir = TempDir::new().unwrap();
      let upstream = temp_dir.path().join("upstream");
      let first = init_repo(&upstream);
      let second = commit_file(&upstream, "next.txt", "next\n", "second");
      let dest = temp_dir.path().join("work").join("lib");

      let checkout = sync_checkout(upstream.to_str().unwrap(), &dest, Some(&first)).unwrap();
      assert_eq!(checkout.rev, first);
      assert!(!dest.join("next.txt").exists());

      let again = sync_checkout(upstream.to_str().unwrap(), &dest, Some(&first)).unwrap();
      assert_eq!(again.rev, first);

      let moved = sync_checkout(upstream.to_str().unwrap(), &dest, Some(&second)).unwrap();
      assert_eq!(moved.rev, second);
      assert_eq!(head_revision(&dest).unwrap(), second);
    }

    #[test]
    fn unpinning_a_detached_checkout_returns_to_latest() {
      let temp_dir = TempDir::new().unwrap();
      let upstream = temp_dir.path().join("upstream");
      let first = init_repo(&upstream);
      let dest = temp_dir.path().join("work").join("lib");
      sync_checkout(upstream.to_str().unwrap(), &dest, Some(&first)).unwrap();

      let latest = commit_file(&upstream, "x.txt", "x\n", "later");
      let checkout = sync_checkout(upstream.to_str().unwrap(), &dest, None).unwrap();

      assert_eq!(checkout.rev, latest);
    }

    #[test]
    fn unknown_pin_is_reported() {
      let temp_dir = TempDir::new().unwrap();
      let upstream = temp_dir.path().join("upstream");
      init_repo(&upstream);
      let dest = temp_dir.path().join("work").join("lib");
      sync_checkout(upstream.to_str().unwrap(), &dest, None).unwrap();

      let result = sync_checkout(
        upstream.to_str().unwrap(),
        &dest,
        Some("0000000000000000000000000000000000000001"),
      );
      assert!(matches!(result, Err(GitError::RevisionNotFound { .. })));
    }

    #[test]
    fn interrupted_sync_leaves_no_checkout() {
      let temp_dir = TempDir::new().unwrap();
      let upstream = temp_dir.path().join("upstream");
      init_repo(&upstream);
      let dest = temp_dir.path().join("work").join("lib");

      let result = sync_checkout_with_interrupt(upstream.to_str().unwrap(), &dest, None, &AtomicBool::new(true));

      assert!(matches!(result, Err(GitError::Interrupted(_))));
      assert!(!dest.exists());
    }

    #[test]
    fn interrupted_update_keeps_worktree() {
      let temp_dir = TempDir::new().unwrap();
      let upstream = temp_dir.path().join("upstream");
      let first = init_repo(&upstream);
      let dest = temp_dir.path().join("work").join("lib");
      sync_checkout(upstream.to_str().unwrap(), &dest, None).unwrap();
      commit_file(&upstream, "later.txt", "later\n", "later");

      let result = sync_checkout_with_interrupt(upstream.to_str().unwrap(), &dest, None, &AtomicBool::new(true));

      assert!(matches!(result, Err(GitError::Interrupted(_))));
      assert_eq!(head_revision(&dest).unwrap(), first);
    }

    #[test]
    fn head_summary_is_first_message_line() {
      let temp_dir = TempDir::new().unwrap();
      let repo = temp_dir.path().join("repo");
      init_repo(&repo);
      git(&repo, &["commit", "--quiet", "--allow-empty", "-m", "subject line", "-m", "body"]);

      assert_eq!(head_summary(&repo).unwrap(), "subject line");
    }
  }
}
