//! Turning components into build and copy tasks.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{ARTIFACT_DIR, BASE_DIR, EXTENDED_DIR};
use crate::manifest::{Action, Task};

use super::resolver::{BuildMode, BuildOrder, CoreComponent, find_core};
use super::scanner::LocalPackages;
use super::types::{BuilderOptions, PlanError, sibling_path, validate_name};

/// Plans the tasks that build components and stage their artifacts.
///
/// Paths written into actions are relative to the work directory; `root` is
/// where that directory lives, used to look at the source tree while planning.
#[derive(Debug, Clone)]
pub struct ActionPlanner {
  root: PathBuf,
  source_root: PathBuf,
  output_root: PathBuf,
  package_manager: String,
  mode: BuildMode,
  packages: LocalPackages,
  core: Option<CoreComponent>,
}

impl ActionPlanner {
  /// Scan the source tree under `root` and prepare to plan against it.
  pub fn new(options: &BuilderOptions, root: &Path) -> Self {
    let packages = LocalPackages::scan(&root.join(&options.source_root));
    Self::with_packages(options, root, packages)
  }

  pub fn with_packages(options: &BuilderOptions, root: &Path, packages: LocalPackages) -> Self {
    let core = find_core(&packages, &options.identities);
    Self {
      root: root.to_path_buf(),
      source_root: options.source_root.clone(),
      output_root: options.output_root.clone(),
      package_manager: options.package_manager.clone(),
      mode: BuildMode::from_development(options.components.development),
      packages,
      core,
    }
  }

  pub fn packages(&self) -> &LocalPackages {
    &self.packages
  }

  pub fn core(&self) -> Option<&CoreComponent> {
    self.core.as_ref()
  }

  /// `remove(output/c)` then run the component's `dev` or `build` script.
  ///
  /// `dev` runs only in development mode and when `force_production` is unset.
  /// Unless `safe`, a component that was not scanned yields `Ok(None)`.
  pub fn plan_build(&self, component: &str, force_production: bool, safe: bool) -> Result<Option<Task>, PlanError> {
    validate_name(component)?;
    if !self.is_known(component, safe) {
      return Ok(None);
    }

    let mode = if force_production { BuildMode::Production } else { self.mode };
    Ok(Some(Task::new(
      format!("build-component_{component}"),
      self.build_actions(component, mode),
    )))
  }

  /// `remove(output/c)` then copy the component's artifacts into it.
  ///
  /// The core also stages its base runtime files into `output/../base`; a
  /// component with an `extended` directory stages it into
  /// `output/../extended/<c>`. Unless `safe`, a component that was not scanned
  /// yields `Ok(None)`.
  pub fn plan_copy(&self, component: &str, safe: bool) -> Result<Option<Task>, PlanError> {
    validate_name(component)?;
    if !self.is_known(component, safe) {
      return Ok(None);
    }

    let source = self.source_root.join(component);
    let target = self.output_root.join(component);

    let mut actions = vec![
      Action::remove(&target),
      Action::copy(source.join(ARTIFACT_DIR), &target),
    ];

    if self.is_core(component) {
      let base = sibling_path(&self.output_root, BASE_DIR);
      actions.push(Action::remove(&base));
      actions.push(Action::copy(source.join(BASE_DIR), base));
    }

    if self.root.join(&source).join(EXTENDED_DIR).is_dir() {
      let extended = sibling_path(&self.output_root, EXTENDED_DIR).join(component);
      actions.push(Action::remove(&extended));
      actions.push(Action::copy(source.join(EXTENDED_DIR), extended));
    }

    let mut task = Task::new(format!("copy-component_{component}"), actions);
    task.barrier = self.is_core(component);
    Ok(Some(task))
  }

  /// Build tasks for a resolved order. Core steps are barriers.
  pub fn plan_build_all(&self, order: &BuildOrder) -> Result<Vec<Task>, PlanError> {
    order
      .steps
      .iter()
      .map(|step| {
        validate_name(&step.component)?;
        let prefix = if step.rebuild { "rebuild" } else { "build" };
        let mut task = Task::new(
          format!("{prefix}-component_{}", step.component),
          self.build_actions(&step.component, step.mode),
        );
        task.barrier = step.core;
        Ok(task)
      })
      .collect()
  }

  /// Copy tasks for every scanned component, the core first.
  pub fn plan_copy_all(&self) -> Result<Vec<Task>, PlanError> {
    let core = self.core.as_ref().map(|c| c.src.as_str());
    let ordered = core
      .into_iter()
      .chain(self.packages.dirs().iter().map(String::as_str).filter(|dir| Some(*dir) != core));

    let mut tasks = Vec::with_capacity(self.packages.dirs().len());
    for component in ordered {
      if let Some(task) = self.plan_copy(component, true)? {
        tasks.push(task);
      }
    }
    Ok(tasks)
  }

  fn build_actions(&self, component: &str, mode: BuildMode) -> Vec<Action> {
    let source = self.source_root.join(component);
    vec![
      Action::remove(self.output_root.join(component)),
      Action::execute(format!(
        "cd {} && {} run {}",
        source.display(),
        self.package_manager,
        mode.script()
      )),
    ]
  }

  fn is_known(&self, component: &str, safe: bool) -> bool {
    if safe || self.packages.contains_dir(component) {
      return true;
    }
    debug!(component, "component not found in source tree");
    false
  }

  fn is_core(&self, component: &str) -> bool {
    self.core.as_ref().is_some_and(|core| core.src == component)
  }
}
