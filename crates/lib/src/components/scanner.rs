//! Component discovery.
//!
//! A missing or unreadable source root is not an error: an empty component set
//! means there is nothing to build yet.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::consts::PACKAGE_FILE;

use super::types::{Component, PackageMetadata};

/// List the directories under `root`, sorted by name.
///
/// Returns an empty list when `root` does not exist or cannot be read.
pub fn scan(root: &Path) -> Vec<String> {
  let entries = match fs::read_dir(root) {
    Ok(entries) => entries,
    Err(e) => {
      if root.exists() {
        warn!(path = %root.display(), error = %e, "cannot list directory");
      } else {
        debug!(path = %root.display(), "directory does not exist");
      }
      return Vec::new();
    }
  };

  let mut dirs: Vec<String> = entries
    .filter_map(|entry| match entry {
      Ok(entry) => Some(entry),
      Err(e) => {
        warn!(path = %root.display(), error = %e, "cannot read directory entry");
        None
      }
    })
    .filter(|entry| entry.path().is_dir())
    .filter_map(|entry| entry.file_name().into_string().ok())
    .collect();

  dirs.sort();
  dirs
}

/// Read `root/dir/package.json`.
///
/// Returns `None`, after logging, when the file is missing or unparsable.
pub fn read_package_metadata(root: &Path, dir: &str) -> Option<PackageMetadata> {
  let path = root.join(dir).join(PACKAGE_FILE);

  let content = match fs::read_to_string(&path) {
    Ok(content) => content,
    Err(e) => {
      warn!(path = %path.display(), error = %e, "skipping component without readable package metadata");
      return None;
    }
  };

  match serde_json::from_str(&content) {
    Ok(metadata) => Some(metadata),
    Err(e) => {
      warn!(path = %path.display(), error = %e, "skipping component with invalid package metadata");
      None
    }
  }
}

/// Scan `root` and read the metadata of every component found there.
pub fn scan_components(root: &Path) -> Vec<Component> {
  LocalPackages::scan(root).components
}

/// The result of one scan of a source root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalPackages {
  dirs: Vec<String>,
  components: Vec<Component>,
}

impl LocalPackages {
  pub fn scan(root: &Path) -> Self {
    let dirs = scan(root);
    let components = dirs
      .iter()
      .filter_map(|dir| read_package_metadata(root, dir).map(|metadata| Component::from_metadata(dir, metadata)))
      .collect::<Vec<_>>();

    debug!(
      path = %root.display(),
      dirs = dirs.len(),
      components = components.len(),
      "scanned components"
    );

    Self { dirs, components }
  }

  /// Build from already known components; their directories are the scanned set.
  pub fn from_components(components: Vec<Component>) -> Self {
    Self {
      dirs: components.iter().map(|c| c.src.clone()).collect(),
      components,
    }
  }

  /// Every scanned directory, with or without metadata, in scan order.
  pub fn dirs(&self) -> &[String] {
    &self.dirs
  }

  /// Components whose metadata could be read, in scan order.
  pub fn components(&self) -> &[Component] {
    &self.components
  }

  pub fn by_name(&self, name: &str) -> Option<&Component> {
    self.components.iter().find(|c| c.name == name)
  }

  pub fn by_dir(&self, dir: &str) -> Option<&Component> {
    self.components.iter().find(|c| c.src == dir)
  }

  pub fn contains_dir(&self, dir: &str) -> bool {
    self.dirs.iter().any(|d| d == dir)
  }

  pub fn is_empty(&self) -> bool {
    self.dirs.is_empty()
  }
}
