//! Component build ordering.
//!
//! There is no general dependency graph between components. The only ordering
//! rule is that the core builds before everything else; when both the primary
//! core and the legacy core are checked out, the legacy core follows the
//! primary one as a production build.

use thiserror::Error;
use tracing::debug;

use crate::consts::{PRIMARY_CORE, SECONDARY_CORE};

use super::scanner::LocalPackages;

/// Errors from build ordering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
  #[error("no core component found (expected '{primary}' or '{secondary}')")]
  NoCore { primary: String, secondary: String },
}

/// Package identities that mark a component as the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreIdentities {
  pub primary: String,
  /// Legacy alias, accepted when the primary core is absent.
  pub secondary: String,
}

impl Default for CoreIdentities {
  fn default() -> Self {
    Self {
      primary: PRIMARY_CORE.to_string(),
      secondary: SECONDARY_CORE.to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreRole {
  Primary,
  SecondaryAlias,
}

/// The component resolved to the core role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreComponent {
  pub name: String,
  /// Directory name under the source root.
  pub src: String,
  pub role: CoreRole,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
  Development,
  #[default]
  Production,
}

impl BuildMode {
  pub fn from_development(development: bool) -> Self {
    if development {
      BuildMode::Development
    } else {
      BuildMode::Production
    }
  }

  /// Package script running this kind of build.
  pub fn script(self) -> &'static str {
    match self {
      BuildMode::Development => "dev",
      BuildMode::Production => "build",
    }
  }
}

/// One build in the resolved order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
  /// Directory name under the source root.
  pub component: String,
  pub mode: BuildMode,
  /// Either core. Core steps must finish before later steps start.
  pub core: bool,
  /// Second build of a component already built earlier in the order.
  pub rebuild: bool,
}

impl BuildStep {
  fn new(component: &str, mode: BuildMode, core: bool) -> Self {
    Self {
      component: component.to_string(),
      mode,
      core,
      rebuild: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOrder {
  pub core: CoreComponent,
  pub steps: Vec<BuildStep>,
}

impl BuildOrder {
  /// Component directories in build order.
  pub fn components(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.component.as_str()).collect()
  }
}

/// Find the core among the scanned packages: the primary identity wins over
/// the legacy alias.
pub fn find_core(packages: &LocalPackages, identities: &CoreIdentities) -> Option<CoreComponent> {
  let (component, role) = match packages.by_name(&identities.primary) {
    Some(component) => (component, CoreRole::Primary),
    None => (packages.by_name(&identities.secondary)?, CoreRole::SecondaryAlias),
  };

  Some(CoreComponent {
    name: component.name.clone(),
    src: component.src.clone(),
    role,
  })
}

/// Order the builds of every scanned component.
///
/// - Primary and legacy core both present: primary core in `mode`, legacy core
///   in production, the rest in `mode`, and in development mode a final
///   production rebuild of the legacy core.
/// - A single core: the core in production, then the rest in `mode`.
///
/// Non-core components keep scan order.
pub fn resolve_build_order(
  packages: &LocalPackages,
  mode: BuildMode,
  identities: &CoreIdentities,
) -> Result<BuildOrder, ResolveError> {
  let core = find_core(packages, identities).ok_or_else(|| ResolveError::NoCore {
    primary: identities.primary.clone(),
    secondary: identities.secondary.clone(),
  })?;

  let legacy = match core.role {
    CoreRole::Primary => packages.by_name(&identities.secondary).map(|c| c.src.clone()),
    CoreRole::SecondaryAlias => None,
  };

  let mut steps = Vec::with_capacity(packages.dirs().len() + 1);

  match &legacy {
    Some(legacy) => {
      steps.push(BuildStep::new(&core.src, mode, true));
      steps.push(BuildStep::new(legacy, BuildMode::Production, true));
    }
    None => steps.push(BuildStep::new(&core.src, BuildMode::Production, true)),
  }

  steps.extend(
    packages
      .dirs()
      .iter()
      .filter(|dir| **dir != core.src && Some(*dir) != legacy.as_ref())
      .map(|dir| BuildStep::new(dir, mode, false)),
  );

  if let (Some(legacy), BuildMode::Development) = (&legacy, mode) {
    steps.push(BuildStep {
      rebuild: true,
      ..BuildStep::new(legacy, BuildMode::Production, true)
    });
  }

  debug!(core = %core.src, role = ?core.role, steps = steps.len(), "resolved build order");
  Ok(BuildOrder { core, steps })
}
