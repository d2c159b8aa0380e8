//! `remove` and `copy` action implementations.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::execute::types::ExecuteError;

/// Delete `target` recursively. A missing target is not an error.
///
/// Returns whether anything was removed.
pub fn remove_target(target: &Path) -> Result<bool, ExecuteError> {
  let metadata = match fs::symlink_metadata(target) {
    Ok(metadata) => metadata,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      debug!(path = %target.display(), "nothing to remove");
      return Ok(false);
    }
    Err(e) => return Err(e.into()),
  };

  if metadata.is_dir() {
    fs::remove_dir_all(target)?;
  } else {
    fs::remove_file(target)?;
  }

  debug!(path = %target.display(), "removed");
  Ok(true)
}

/// Copy `src` over `target`.
///
/// Directories are copied recursively, merging into an existing target. With
/// `overwrite` unset, files already present at the destination are kept.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, target: &Path, overwrite: bool) -> Result<usize, ExecuteError> {
  if !src.exists() {
    return Err(ExecuteError::CopySourceMissing(src.to_path_buf()));
  }

  if src.is_file() {
    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent)?;
    }
    return Ok(copy_file(src, target, overwrite)? as usize);
  }

  let mut copied = 0;
  for entry in WalkDir::new(src).follow_links(true) {
    let entry = entry.map_err(io::Error::from)?;
    let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
    let dest = target.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&dest)?;
    } else if copy_file(entry.path(), &dest, overwrite)? {
      copied += 1;
    }
  }

  debug!(src = %src.display(), target = %target.display(), files = copied, "copied");
  Ok(copied)
}

fn copy_file(src: &Path, dest: &Path, overwrite: bool) -> Result<bool, ExecuteError> {
  if !overwrite && dest.exists() {
    return Ok(false);
  }
  fs::copy(src, dest)?;
  Ok(true)
}
