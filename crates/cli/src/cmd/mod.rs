mod build;
mod freeze;
mod install;
mod run;
mod themes;

pub use build::cmd_build;
pub use freeze::cmd_freeze;
pub use install::cmd_install;
pub use run::cmd_run;
pub use themes::cmd_themes;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use octopus_lib::config::{ConfigStore, Environment};
use octopus_lib::execute::{ExecuteConfig, ExecutionSummary};

use crate::ExecArgs;

/// Where the commands operate: the manifest in use and the directory around it.
#[derive(Debug, Clone)]
pub struct Workspace {
  pub environment: Environment,
  pub manifest: PathBuf,
  pub initialize: bool,
}

impl Workspace {
  /// `--dev` forces the floating environment; otherwise `DEV` decides.
  pub fn new(manifest: Option<PathBuf>, dev: bool, initialize: bool) -> Self {
    let environment = if dev { Environment::Floating } else { Environment::from_env() };
    let manifest = manifest.unwrap_or_else(|| environment.manifest_path(Path::new(".")));
    Self {
      environment,
      manifest,
      initialize,
    }
  }

  /// Directory holding the manifest. Relative work directories resolve against it.
  pub fn root(&self) -> PathBuf {
    match self.manifest.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    }
  }

  pub fn store(&self) -> ConfigStore {
    let store = ConfigStore::new(&self.manifest);
    if self.initialize { store } else { store.without_initialization() }
  }

  pub fn development(&self) -> bool {
    self.environment == Environment::Floating
  }

  pub fn execute_config(&self, exec: &ExecArgs) -> ExecuteConfig {
    ExecuteConfig {
      parallelism: exec.jobs,
      fail_fast: exec.fail_fast,
      timeout: exec.timeout,
      root: Some(self.root()),
      shell: None,
    }
  }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Runtime::new().context("Failed to create async runtime")
}

/// Turn a summary with failures into an error so the process exits non-zero.
fn ensure_success(summary: &ExecutionSummary, what: &str) -> Result<()> {
  if !summary.is_success() {
    bail!(
      "{what} did not complete: {} failed, {} skipped",
      summary.failed(),
      summary.skipped()
    );
  }
  Ok(())
}
