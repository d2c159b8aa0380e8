//! Types for task execution.
//!
//! This module defines the error types, result types, and configuration
//! for executing the task lists of a manifest.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::git::GitError;

/// Why a task was not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
  /// A barrier task before this one failed.
  BarrierFailed(String),
  /// An earlier task failed and the run was configured to stop.
  Aborted(String),
}

impl std::fmt::Display for SkipReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SkipReason::BarrierFailed(name) => write!(f, "barrier task '{}' failed", name),
      SkipReason::Aborted(name) => write!(f, "run aborted after task '{}' failed", name),
    }
  }
}

/// Errors that can occur during execution.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The manifest's work directory could not be resolved.
  #[error("cannot resolve work directory '{path}': {source}")]
  WorkDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The requested task list does not exist in the manifest.
  #[error("unable to find the task list called <{0}> in current config")]
  UnknownTaskList(String),

  /// Command execution failed.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed {
    cmd: String,
    code: Option<i32>,
    /// Captured stderr (or stdout when stderr is empty), trimmed.
    output: String,
  },

  /// `copy` source does not exist.
  #[error("copy source does not exist: {0}")]
  CopySourceMissing(PathBuf),

  /// A `smartClone` action belongs to a task without `src`.
  #[error("task '{0}' has a smartClone action but no src")]
  MissingSource(String),

  /// Git operation failed.
  #[error("git error: {0}")]
  Git(#[from] GitError),

  /// An action did not finish within the configured timeout.
  #[error("action timed out after {0:?}")]
  Timeout(Duration),

  /// A blocking worker panicked or was cancelled.
  #[error("worker failed: {0}")]
  Join(String),

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Result of executing a single action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
  /// Human readable description of the action.
  pub action: String,
  /// Captured output (stdout for `execute`, revision for `smartClone`).
  pub output: String,
}

/// Outcome of one task.
#[derive(Debug)]
pub enum TaskStatus {
  /// Every action succeeded.
  Succeeded { actions: Vec<ActionResult> },
  /// An action failed; the remaining actions of the task were not run.
  Failed {
    /// Results of the actions that completed before the failure.
    completed: Vec<ActionResult>,
    /// Index of the failing action.
    action_index: usize,
    error: ExecuteError,
  },
  /// The task was not started.
  Skipped(SkipReason),
}

/// Result of one task, in manifest order.
#[derive(Debug)]
pub struct TaskResult {
  pub name: String,
  pub status: TaskStatus,
}

impl TaskResult {
  pub fn is_success(&self) -> bool {
    matches!(self.status, TaskStatus::Succeeded { .. })
  }

  pub fn is_failed(&self) -> bool {
    matches!(self.status, TaskStatus::Failed { .. })
  }

  pub fn is_skipped(&self) -> bool {
    matches!(self.status, TaskStatus::Skipped(_))
  }
}

/// Result of executing a task list.
#[derive(Debug, Default)]
pub struct ExecutionSummary {
  /// Per-task results, in the order the tasks were listed.
  pub tasks: Vec<TaskResult>,
}

impl ExecutionSummary {
  /// Returns true if every task succeeded.
  pub fn is_success(&self) -> bool {
    self.tasks.iter().all(TaskResult::is_success)
  }

  pub fn succeeded(&self) -> usize {
    self.tasks.iter().filter(|t| t.is_success()).count()
  }

  pub fn failed(&self) -> usize {
    self.tasks.iter().filter(|t| t.is_failed()).count()
  }

  pub fn skipped(&self) -> usize {
    self.tasks.iter().filter(|t| t.is_skipped()).count()
  }

  pub fn get(&self, name: &str) -> Option<&TaskResult> {
    self.tasks.iter().find(|t| t.name == name)
  }
}

/// Configuration for task execution.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Maximum number of tasks to run at the same time. `1` runs strictly in order.
  pub parallelism: usize,

  /// Skip every remaining task after the first failure.
  pub fail_fast: bool,

  /// Upper bound for each `execute` and `smartClone` action.
  pub timeout: Option<Duration>,

  /// Directory a relative `workDir` resolves against. Defaults to the current directory.
  pub root: Option<PathBuf>,

  /// Shell to use for command execution.
  /// If None, uses /bin/sh (Unix) or powershell.exe (Windows).
  pub shell: Option<String>,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: 1,
      fail_fast: false,
      timeout: None,
      root: None,
      shell: None,
    }
  }
}

impl ExecuteConfig {
  /// Use up to the number of available CPUs for independent tasks.
  pub fn parallel() -> Self {
    Self {
      parallelism: num_cpus(),
      ..Self::default()
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
