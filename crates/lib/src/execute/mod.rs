//! Task list execution module.
//!
//! This module provides the main entry points for running the task lists of a manifest.
//! It handles:
//! - Work directory resolution
//! - Sequential actions within a task
//! - Bounded concurrency across consecutive non-barrier tasks
//! - Failure propagation and skip tracking

pub mod actions;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::consts::DEFAULT_TASK_LIST;
use crate::manifest::{Manifest, Task};

use actions::{ActionContext, execute_action};

pub use types::{
  ActionResult, ExecuteConfig, ExecuteError, ExecutionSummary, SkipReason, TaskResult, TaskStatus,
};

/// Run the default `dependencies` task list of a manifest.
pub async fn execute_manifest(manifest: &Manifest, config: &ExecuteConfig) -> Result<ExecutionSummary, ExecuteError> {
  execute_task_list(manifest, DEFAULT_TASK_LIST, config).await
}

/// Run the task list called `name`.
///
/// # Errors
///
/// Returns `UnknownTaskList` when the manifest has no list called `name`, and
/// `WorkDir` when the manifest's work directory cannot be resolved. Failures of
/// individual tasks are reported in the summary, not as errors.
pub async fn execute_task_list(
  manifest: &Manifest,
  name: &str,
  config: &ExecuteConfig,
) -> Result<ExecutionSummary, ExecuteError> {
  let tasks = manifest
    .task_list(name)
    .ok_or_else(|| ExecuteError::UnknownTaskList(name.to_string()))?;

  info!(list = name, task_count = tasks.len(), "running task list");
  execute_tasks(&manifest.work_dir, tasks, config).await
}

/// Run `tasks` against `work_dir`.
pub async fn execute_tasks(
  work_dir: &Path,
  tasks: &[Task],
  config: &ExecuteConfig,
) -> Result<ExecutionSummary, ExecuteError> {
  let work_dir = resolve_work_dir(work_dir, config.root.as_deref())?;
  debug!(work_dir = %work_dir.display(), "resolved work directory");

  let ctx = Arc::new(ActionContext {
    work_dir,
    shell: config.shell.clone(),
    timeout: config.timeout,
  });
  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));

  let mut summary = ExecutionSummary::default();
  let mut halted: Option<SkipReason> = None;

  for (wave_idx, wave) in waves(tasks).into_iter().enumerate() {
    if let Some(reason) = &halted {
      for task in wave {
        warn!(task = %task.name, reason = %reason, "skipping task");
        summary.tasks.push(TaskResult {
          name: task.name.clone(),
          status: TaskStatus::Skipped(reason.clone()),
        });
      }
      continue;
    }

    debug!(wave = wave_idx, tasks = wave.len(), "executing wave");
    let results = execute_wave(wave, &ctx, config, semaphore.clone()).await;

    for result in results {
      if result.is_failed() && halted.is_none() {
        if wave.len() == 1 && wave[0].barrier {
          halted = Some(SkipReason::BarrierFailed(result.name.clone()));
        } else if config.fail_fast {
          halted = Some(SkipReason::Aborted(result.name.clone()));
        }
      }
      summary.tasks.push(result);
    }
  }

  info!(
    succeeded = summary.succeeded(),
    failed = summary.failed(),
    skipped = summary.skipped(),
    "task list complete"
  );

  Ok(summary)
}

/// Resolve a manifest work directory to an absolute, existing path.
pub fn resolve_work_dir(work_dir: &Path, root: Option<&Path>) -> Result<PathBuf, ExecuteError> {
  let base = match root {
    Some(root) => root.to_path_buf(),
    None => std::env::current_dir()?,
  };
  let path = base.join(work_dir);

  dunce::canonicalize(&path).map_err(|source| ExecuteError::WorkDir { path, source })
}

/// Split tasks into waves. A barrier always forms a wave of its own.
fn waves(tasks: &[Task]) -> Vec<&[Task]> {
  let mut waves = Vec::new();
  let mut start = 0;

  for (idx, task) in tasks.iter().enumerate() {
    if task.barrier {
      if start < idx {
        waves.push(&tasks[start..idx]);
      }
      waves.push(&tasks[idx..=idx]);
      start = idx + 1;
    }
  }
  if start < tasks.len() {
    waves.push(&tasks[start..]);
  }

  waves
}

/// Execute one wave, returning results in task order.
async fn execute_wave(
  wave: &[Task],
  ctx: &Arc<ActionContext>,
  config: &ExecuteConfig,
  semaphore: Arc<Semaphore>,
) -> Vec<TaskResult> {
  // first failure seen in this wave, used by fail_fast
  let first_failure: Arc<OnceLock<String>> = Arc::new(OnceLock::new());

  if config.parallelism <= 1 || wave.len() == 1 {
    let mut results = Vec::with_capacity(wave.len());
    for task in wave {
      results.push(run_or_skip(task, ctx, config.fail_fast, &first_failure).await);
    }
    return results;
  }

  let mut join_set = JoinSet::new();

  for (idx, task) in wave.iter().enumerate() {
    let task = task.clone();
    let ctx = ctx.clone();
    let semaphore = semaphore.clone();
    let first_failure = first_failure.clone();
    let fail_fast = config.fail_fast;

    join_set.spawn(async move {
      let _permit = semaphore.acquire_owned().await;
      (idx, run_or_skip(&task, &ctx, fail_fast, &first_failure).await)
    });
  }

  let mut slots: Vec<Option<TaskResult>> = wave.iter().map(|_| None).collect();

  while let Some(join_result) = join_set.join_next().await {
    match join_result {
      Ok((idx, result)) => slots[idx] = Some(result),
      Err(e) => error!(error = %e, "task worker panicked"),
    }
  }

  slots
    .into_iter()
    .zip(wave)
    .map(|(slot, task)| {
      slot.unwrap_or_else(|| TaskResult {
        name: task.name.clone(),
        status: TaskStatus::Failed {
          completed: Vec::new(),
          action_index: 0,
          error: ExecuteError::Join(format!("worker for task '{}' did not finish", task.name)),
        },
      })
    })
    .collect()
}

async fn run_or_skip(
  task: &Task,
  ctx: &ActionContext,
  fail_fast: bool,
  first_failure: &OnceLock<String>,
) -> TaskResult {
  if fail_fast {
    if let Some(failed) = first_failure.get() {
      warn!(task = %task.name, failed = %failed, "skipping task after failure");
      return TaskResult {
        name: task.name.clone(),
        status: TaskStatus::Skipped(SkipReason::Aborted(failed.clone())),
      };
    }
  }

  let result = run_task(task, ctx).await;
  if result.is_failed() {
    let _ = first_failure.set(task.name.clone());
  }
  result
}

/// Run every action of `task` in order, stopping at the first failure.
async fn run_task(task: &Task, ctx: &ActionContext) -> TaskResult {
  info!(task = %task.name, actions = task.actions.len(), "running task");

  let mut completed = Vec::with_capacity(task.actions.len());

  for (action_index, action) in task.actions.iter().enumerate() {
    debug!(task = %task.name, action = %action, "running action");

    match execute_action(action, task, ctx).await {
      Ok(result) => completed.push(result),
      Err(e) => {
        error!(task = %task.name, action = %action, error = %e, "task failed");
        return TaskResult {
          name: task.name.clone(),
          status: TaskStatus::Failed {
            completed,
            action_index,
            error: e,
          },
        };
      }
    }
  }

  info!(task = %task.name, "task succeeded");
  TaskResult {
    name: task.name.clone(),
    status: TaskStatus::Succeeded { actions: completed },
  }
}
