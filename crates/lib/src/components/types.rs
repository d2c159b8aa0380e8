//! Types shared by the component planners.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::consts::{COMPONENTS_OUTPUT, COMPONENTS_SOURCE, PACKAGE_MANAGER};

use super::resolver::CoreIdentities;

/// Errors raised while turning components into tasks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
  /// The name cannot be used as a single directory component.
  #[error("invalid component name '{0}'")]
  InvalidName(String),

  /// A component source is missing its name or its repository.
  #[error("component source is missing its {0}")]
  IncompleteSource(&'static str),
}

/// Declared identity and dependencies of a package, as read from `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
  pub name: String,
  #[serde(default)]
  pub dependencies: BTreeMap<String, serde_json::Value>,
  #[serde(default)]
  pub dev_dependencies: BTreeMap<String, serde_json::Value>,
}

/// A package discovered under the components source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
  /// Package identity, e.g. `@webcardinal/core`.
  pub name: String,
  /// Directory name under the source root.
  pub src: String,
  pub dependencies: BTreeSet<String>,
  pub dev_dependencies: BTreeSet<String>,
}

impl Component {
  pub fn new(name: impl Into<String>, src: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      src: src.into(),
      dependencies: BTreeSet::new(),
      dev_dependencies: BTreeSet::new(),
    }
  }

  pub fn from_metadata(src: impl Into<String>, metadata: PackageMetadata) -> Self {
    Self {
      name: metadata.name,
      src: src.into(),
      dependencies: metadata.dependencies.into_keys().collect(),
      dev_dependencies: metadata.dev_dependencies.into_keys().collect(),
    }
  }

  pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
    self.dependencies.insert(name.into());
    self
  }

  pub fn with_dev_dependency(mut self, name: impl Into<String>) -> Self {
    self.dev_dependencies.insert(name.into());
    self
  }
}

/// Mode flags and component selection for one builder run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentOptions {
  /// Run the `dev` script instead of `build` where the order allows it.
  pub development: bool,
  /// Build and copy only these components. `None` runs the full workflow.
  pub target_components: Option<BTreeSet<String>>,
}

/// Where components live and how they are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderOptions {
  /// Component checkouts, relative to the work directory.
  pub source_root: PathBuf,
  /// Staging tree for built components, relative to the work directory.
  pub output_root: PathBuf,
  pub package_manager: String,
  pub identities: CoreIdentities,
  pub components: ComponentOptions,
}

impl Default for BuilderOptions {
  fn default() -> Self {
    Self {
      source_root: PathBuf::from(COMPONENTS_SOURCE),
      output_root: PathBuf::from(COMPONENTS_OUTPUT),
      package_manager: PACKAGE_MANAGER.to_string(),
      identities: CoreIdentities::default(),
      components: ComponentOptions::default(),
    }
  }
}

/// Reject names that would escape or alias their parent directory.
pub(crate) fn validate_name(name: &str) -> Result<(), PlanError> {
  let invalid = name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']);
  if invalid {
    return Err(PlanError::InvalidName(name.to_string()));
  }
  Ok(())
}

/// `dir/../name`, without leaving a `..` behind when `dir` has a parent.
pub(crate) fn sibling_path(dir: &Path, name: &str) -> PathBuf {
  match (dir.parent(), dir.file_name()) {
    (Some(parent), Some(_)) => parent.join(name),
    _ => dir.join("..").join(name),
  }
}
