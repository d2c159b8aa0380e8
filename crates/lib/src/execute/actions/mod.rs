//! Action execution module.
//!
//! This module provides the dispatch logic for executing the actions of a task.

pub mod clone;
pub mod cmd;
pub mod fs;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::execute::types::{ActionResult, ExecuteError};
use crate::manifest::{Action, CopyOptions, Task};

pub use clone::execute_smart_clone;
pub use cmd::execute_cmd;

/// Everything an action needs besides itself.
#[derive(Debug, Clone)]
pub struct ActionContext {
  /// Resolved, absolute work directory.
  pub work_dir: PathBuf,
  pub shell: Option<String>,
  pub timeout: Option<Duration>,
}

impl ActionContext {
  fn resolve(&self, path: &Path) -> PathBuf {
    self.work_dir.join(path)
  }
}

/// Execute a single action of `task`.
///
/// Relative paths resolve against the context's work directory. `execute` and
/// `smartClone` are bounded by the context's timeout.
pub async fn execute_action(action: &Action, task: &Task, ctx: &ActionContext) -> Result<ActionResult, ExecuteError> {
  let output = match action {
    Action::Remove { target } => {
      let target = ctx.resolve(target);
      let removed = blocking(move || fs::remove_target(&target)).await?;
      if removed { "removed".to_string() } else { String::new() }
    }

    Action::Copy { src, target, options } => {
      let src = ctx.resolve(src);
      let target = ctx.resolve(target);
      let overwrite = options.unwrap_or_default().overwrite;
      let copied = blocking(move || fs::copy_tree(&src, &target, overwrite)).await?;
      format!("{} file(s) copied", copied)
    }

    Action::Execute { cmd } => {
      with_timeout(ctx.timeout, execute_cmd(cmd, &ctx.work_dir, ctx.shell.as_deref())).await?
    }

    Action::SmartClone {
      target,
      collect_log,
      commit,
    } => {
      let src = task
        .src
        .as_deref()
        .ok_or_else(|| ExecuteError::MissingSource(task.name.clone()))?;
      let target = ctx.resolve(target);
      with_timeout(
        ctx.timeout,
        execute_smart_clone(&task.name, src, &target, commit.as_deref(), *collect_log),
      )
      .await?
    }
  };

  Ok(ActionResult {
    action: action.to_string(),
    output,
  })
}

async fn blocking<T, F>(f: F) -> Result<T, ExecuteError>
where
  F: FnOnce() -> Result<T, ExecuteError> + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(f)
    .await
    .map_err(|e| ExecuteError::Join(e.to_string()))?
}

async fn with_timeout<T>(
  timeout: Option<Duration>,
  fut: impl Future<Output = Result<T, ExecuteError>>,
) -> Result<T, ExecuteError> {
  match timeout {
    Some(limit) => tokio::time::timeout(limit, fut)
      .await
      .map_err(|_| ExecuteError::Timeout(limit))?,
    None => fut.await,
  }
}
