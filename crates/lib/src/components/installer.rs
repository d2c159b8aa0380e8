//! Fetching component repositories and installing their packages.
//!
//! Components that live in the same npm scope as a local core package are
//! linked against the checked-out core instead of the published one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::execute::{ExecuteConfig, ExecuteError, ExecutionSummary, execute_tasks};
use crate::manifest::{Action, Task};

use super::resolver::CoreIdentities;
use super::scanner::LocalPackages;
use super::types::{BuilderOptions, Component, PlanError, validate_name};

/// A component repository to check out under the source root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSource {
  /// Directory name of the checkout.
  #[serde(default)]
  pub name: Option<String>,
  /// Repository URL.
  #[serde(default)]
  pub src: Option<String>,
}

impl ComponentSource {
  pub fn new(name: impl Into<String>, src: impl Into<String>) -> Self {
    Self {
      name: Some(name.into()),
      src: Some(src.into()),
    }
  }
}

/// Outcome of [`ComponentsInstaller::run`].
#[derive(Debug)]
pub struct InstallReport {
  pub clone: ExecutionSummary,
  /// `None` when cloning failed and nothing was installed.
  pub install: Option<ExecutionSummary>,
}

impl InstallReport {
  pub fn is_success(&self) -> bool {
    self.clone.is_success() && self.install.as_ref().is_some_and(ExecutionSummary::is_success)
  }
}

#[derive(Debug, Clone)]
pub struct ComponentsInstaller {
  root: PathBuf,
  source_root: PathBuf,
  package_manager: String,
  identities: CoreIdentities,
}

impl ComponentsInstaller {
  pub fn new(options: &BuilderOptions, root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
      source_root: options.source_root.clone(),
      package_manager: options.package_manager.clone(),
      identities: options.identities.clone(),
    }
  }

  /// A task cloning `source` into the source root.
  pub fn plan_clone(&self, source: &ComponentSource) -> Result<Task, PlanError> {
    let name = source.name.as_deref().ok_or(PlanError::IncompleteSource("name"))?;
    let src = source.src.as_deref().ok_or(PlanError::IncompleteSource("src"))?;
    validate_name(name)?;

    Ok(Task::new(name, vec![Action::smart_clone(&self.source_root)]).with_src(src))
  }

  /// A task installing the packages of a checked-out component.
  ///
  /// Returns `Ok(None)` when the component has not been checked out.
  pub fn plan_install(&self, source: &ComponentSource, packages: &LocalPackages) -> Result<Option<Task>, PlanError> {
    let name = source.name.as_deref().ok_or(PlanError::IncompleteSource("name"))?;
    validate_name(name)?;

    let dir = self.source_root.join(name);
    if !self.root.join(&dir).is_dir() {
      debug!(component = name, "component not checked out, nothing to install");
      return Ok(None);
    }

    let mut cmd = format!("cd {}", dir.display());
    if let Some(component) = packages.by_dir(name) {
      for link in self.local_links(component, packages) {
        cmd.push_str(" && ");
        cmd.push_str(&link);
      }
    }
    cmd.push_str(&format!(" && {} install", self.package_manager));

    Ok(Some(Task::new(
      format!("install-component_{name}"),
      vec![Action::execute(cmd)],
    )))
  }

  /// Clone every source, then install each checked-out one.
  pub async fn run(&self, sources: &[ComponentSource], config: &ExecuteConfig) -> Result<InstallReport, InstallError> {
    let config = ExecuteConfig {
      root: Some(self.root.clone()),
      ..config.clone()
    };

    let clones = sources
      .iter()
      .map(|source| self.plan_clone(source))
      .collect::<Result<Vec<_>, _>>()?;

    info!(count = clones.len(), "cloning components");
    let clone = execute_tasks(Path::new("."), &clones, &config).await?;
    if !clone.is_success() {
      return Ok(InstallReport { clone, install: None });
    }

    let packages = LocalPackages::scan(&self.root.join(&self.source_root));
    let mut installs = Vec::with_capacity(sources.len());
    for source in sources {
      if let Some(task) = self.plan_install(source, &packages)? {
        installs.push(task);
      }
    }

    info!(count = installs.len(), "installing components");
    let install = execute_tasks(Path::new("."), &installs, &config).await?;
    Ok(InstallReport {
      clone,
      install: Some(install),
    })
  }

  /// `<pm> install [--save-dev] ../<core dir>` for every local core the
  /// component declares and shares a scope with.
  fn local_links(&self, component: &Component, packages: &LocalPackages) -> Vec<String> {
    [&self.identities.primary, &self.identities.secondary]
      .into_iter()
      .filter(|core| **core != component.name)
      .filter(|core| scope(core).is_some_and(|scope| component.name.starts_with(scope)))
      .filter_map(|core| {
        let local = packages.by_name(core)?;
        let flag = if component.dev_dependencies.contains(core.as_str()) {
          " --save-dev"
        } else if component.dependencies.contains(core.as_str()) {
          ""
        } else {
          return None;
        };
        Some(format!("{} install{flag} ../{}", self.package_manager, local.src))
      })
      .collect()
  }
}

/// Errors from [`ComponentsInstaller::run`].
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
  #[error(transparent)]
  Plan(#[from] PlanError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),
}

/// `@scope/` of a scoped package name.
fn scope(name: &str) -> Option<&str> {
  if !name.starts_with('@') {
    return None;
  }
  name.find('/').map(|idx| &name[..=idx])
}
