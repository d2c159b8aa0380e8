//! The component build workflow.
//!
//! Without a component selection: resolve the build order, build everything,
//! stage everything, then write the aggregate entry files. Each phase runs only
//! when the previous one fully succeeded. With a selection: build and stage
//! just those components, without merging.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::execute::{ExecuteConfig, ExecuteError, ExecutionSummary, execute_tasks};
use crate::manifest::Task;

use super::merge::{MergeError, MergeOutcome, merge};
use super::planner::ActionPlanner;
use super::resolver::{BuildMode, ResolveError, resolve_build_order};
use super::types::{BuilderOptions, PlanError};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Plan(#[from] PlanError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error(transparent)]
  Merge(#[from] MergeError),
}

/// What a builder run did. Phases that did not run are `None`.
#[derive(Debug, Default)]
pub struct BuildReport {
  pub build: ExecutionSummary,
  pub copy: Option<ExecutionSummary>,
  pub merge: Option<MergeOutcome>,
}

impl BuildReport {
  pub fn is_success(&self) -> bool {
    self.build.is_success() && self.copy.as_ref().is_some_and(ExecutionSummary::is_success)
  }
}

#[derive(Debug, Clone)]
pub struct ComponentsBuilder {
  options: BuilderOptions,
  root: PathBuf,
}

impl ComponentsBuilder {
  /// `root` is the directory the work directory `.` stands for.
  pub fn new(options: BuilderOptions, root: impl Into<PathBuf>) -> Self {
    Self {
      options,
      root: root.into(),
    }
  }

  pub fn options(&self) -> &BuilderOptions {
    &self.options
  }

  pub async fn run(&self, config: &ExecuteConfig) -> Result<BuildReport, BuildError> {
    let config = ExecuteConfig {
      root: Some(self.root.clone()),
      ..config.clone()
    };

    match &self.options.components.target_components {
      None => self.run_all(&config).await,
      Some(targets) => self.run_targets(targets.iter().map(String::as_str), &config).await,
    }
  }

  async fn run_all(&self, config: &ExecuteConfig) -> Result<BuildReport, BuildError> {
    let planner = ActionPlanner::new(&self.options, &self.root);
    let mode = BuildMode::from_development(self.options.components.development);
    let order = resolve_build_order(planner.packages(), mode, &self.options.identities)?;

    info!(core = %order.core.src, steps = order.steps.len(), "building components");
    let build = run_phase(&planner.plan_build_all(&order)?, config).await?;
    if !build.is_success() {
      warn!(failed = build.failed(), "build phase failed, not copying");
      return Ok(BuildReport {
        build,
        ..BuildReport::default()
      });
    }

    info!("copying components");
    let copy = run_phase(&planner.plan_copy_all()?, config).await?;
    if !copy.is_success() {
      warn!(failed = copy.failed(), "copy phase failed, not merging");
      return Ok(BuildReport {
        build,
        copy: Some(copy),
        merge: None,
      });
    }

    let output_root = self.root.join(&self.options.output_root);
    let merged = merge(&output_root, &order.core)?;

    Ok(BuildReport {
      build,
      copy: Some(copy),
      merge: Some(merged),
    })
  }

  async fn run_targets<'a>(
    &self,
    targets: impl Iterator<Item = &'a str> + Clone,
    config: &ExecuteConfig,
  ) -> Result<BuildReport, BuildError> {
    let planner = ActionPlanner::new(&self.options, &self.root);

    let mut builds = Vec::new();
    for component in targets.clone() {
      match planner.plan_build(component, false, false)? {
        Some(task) => builds.push(task),
        None => warn!(component, "unknown component, skipping"),
      }
    }

    let build = run_phase(&builds, config).await?;
    if !build.is_success() {
      return Ok(BuildReport {
        build,
        ..BuildReport::default()
      });
    }

    let mut copies = Vec::new();
    for component in targets {
      copies.extend(planner.plan_copy(component, false)?);
    }
    let copy = run_phase(&copies, config).await?;

    Ok(BuildReport {
      build,
      copy: Some(copy),
      merge: None,
    })
  }
}

async fn run_phase(tasks: &[Task], config: &ExecuteConfig) -> Result<ExecutionSummary, ExecuteError> {
  execute_tasks(Path::new("."), tasks, config).await
}
