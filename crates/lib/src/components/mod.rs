//! Local component builds.
//!
//! Components are packages checked out side by side under a source root. One
//! of them is the core every other component depends on. This module discovers
//! them, orders their builds core first, plans the tasks that build and stage
//! them into an output tree, and finally emits the aggregate entry files.
//!
//! Planning is synchronous and only produces [`Task`](crate::manifest::Task)
//! values; running them is left to [`crate::execute`].

pub mod builder;
pub mod installer;
pub mod merge;
pub mod planner;
pub mod resolver;
pub mod scanner;
pub mod themes;
mod types;

pub use builder::{BuildError, BuildReport, ComponentsBuilder};
pub use installer::{ComponentSource, ComponentsInstaller, InstallError, InstallReport};
pub use merge::{MergeError, MergeOutcome, merge};
pub use planner::ActionPlanner;
pub use resolver::{
  BuildMode, BuildOrder, BuildStep, CoreComponent, CoreIdentities, CoreRole, ResolveError, find_core,
  resolve_build_order,
};
pub use scanner::{LocalPackages, read_package_metadata, scan, scan_components};
pub use themes::{ThemesOptions, ThemesPlanner};
pub use types::*;
