//! Aggregate entry files for the staged components.
//!
//! `merge` writes `<bundle>.js` and `<bundle>.css` next to the output tree, each
//! importing the per-component entry files, core first.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::BUNDLE_NAME;

use super::resolver::CoreComponent;
use super::scanner::scan;
use super::types::sibling_path;

#[derive(Debug, Error)]
pub enum MergeError {
  /// The output root has no final directory name to import from.
  #[error("output root '{0}' has no directory name")]
  InvalidOutputRoot(PathBuf),

  #[error("failed to write '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
  Written {
    script: PathBuf,
    style: PathBuf,
    /// Number of components imported by the script.
    components: usize,
  },
  /// The core is not staged yet; nothing was written.
  Skipped,
}

/// Write the aggregate script and stylesheet for the components staged under
/// `output_root`.
///
/// Every staged component is imported by the script. The stylesheet imports
/// only the components that produced a stylesheet.
pub fn merge(output_root: &Path, core: &CoreComponent) -> Result<MergeOutcome, MergeError> {
  let staged = scan(output_root);
  if !staged.iter().any(|c| *c == core.src) {
    debug!(path = %output_root.display(), core = %core.src, "core not staged, skipping merge");
    return Ok(MergeOutcome::Skipped);
  }

  let dir_name = output_root
    .file_name()
    .and_then(|name| name.to_str())
    .ok_or_else(|| MergeError::InvalidOutputRoot(output_root.to_path_buf()))?;

  let ordered = std::iter::once(core.src.as_str()).chain(
    staged
      .iter()
      .map(String::as_str)
      .filter(|component| *component != core.src),
  );

  let mut script = String::new();
  let mut style = String::new();
  let mut components = 0;

  for component in ordered {
    let module = format!("./{dir_name}/{component}");
    script.push_str(&format!("import '{module}/{BUNDLE_NAME}.esm.js';\n"));
    components += 1;

    if output_root.join(component).join(format!("{BUNDLE_NAME}.css")).is_file() {
      style.push_str(&format!("@import \"{module}/{BUNDLE_NAME}.css\";\n"));
    }
  }

  let script_path = sibling_path(output_root, &format!("{BUNDLE_NAME}.js"));
  let style_path = sibling_path(output_root, &format!("{BUNDLE_NAME}.css"));
  write(&script_path, &script)?;
  write(&style_path, &style)?;

  info!(script = %script_path.display(), components, "wrote aggregate entry files");
  Ok(MergeOutcome::Written {
    script: script_path,
    style: style_path,
    components,
  })
}

fn write(path: &Path, content: &str) -> Result<(), MergeError> {
  fs::write(path, content).map_err(|source| MergeError::Write {
    path: path.to_path_buf(),
    source,
  })
}
