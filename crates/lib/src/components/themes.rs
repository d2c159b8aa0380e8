//! Staging theme sources into the themes output tree.

use std::path::{Path, PathBuf};

use crate::consts::{THEME_SOURCE_DIR, THEMES_OUTPUT, THEMES_SOURCE};
use crate::manifest::{Action, Task};

use super::scanner::scan;
use super::types::{PlanError, validate_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemesOptions {
  /// Theme checkouts, relative to the work directory.
  pub source_root: PathBuf,
  /// Staging tree for themes, relative to the work directory.
  pub output_root: PathBuf,
}

impl Default for ThemesOptions {
  fn default() -> Self {
    Self {
      source_root: PathBuf::from(THEMES_SOURCE),
      output_root: PathBuf::from(THEMES_OUTPUT),
    }
  }
}

#[derive(Debug, Clone)]
pub struct ThemesPlanner {
  options: ThemesOptions,
  themes: Vec<String>,
}

impl ThemesPlanner {
  /// Scan the theme sources under `root`.
  pub fn new(options: ThemesOptions, root: &Path) -> Self {
    let themes = scan(&root.join(&options.source_root));
    Self { options, themes }
  }

  pub fn themes(&self) -> &[String] {
    &self.themes
  }

  /// `remove(output/t)` then copy the theme's `src` directory into it.
  pub fn plan_copy(&self, theme: &str, safe: bool) -> Result<Option<Task>, PlanError> {
    validate_name(theme)?;
    if !safe && !self.themes.iter().any(|t| t == theme) {
      return Ok(None);
    }

    let target = self.options.output_root.join(theme);
    Ok(Some(Task::new(
      format!("copy-theme_{theme}"),
      vec![
        Action::remove(&target),
        Action::copy(self.options.source_root.join(theme).join(THEME_SOURCE_DIR), target),
      ],
    )))
  }

  pub fn plan_copy_all(&self) -> Result<Vec<Task>, PlanError> {
    let mut tasks = Vec::with_capacity(self.themes.len());
    for theme in &self.themes {
      tasks.extend(self.plan_copy(theme, true)?);
    }
    Ok(tasks)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn planner(root: &Path) -> ThemesPlanner {
    ThemesPlanner::new(
      ThemesOptions {
        source_root: PathBuf::from("themes-src"),
        output_root: PathBuf::from("themes"),
      },
      root,
    )
  }

  #[test]
  fn copy_stages_theme_sources() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("themes-src/light/src")).unwrap();

    let task = planner(temp_dir.path()).plan_copy("light", false).unwrap().unwrap();

    assert_eq!(task.name, "copy-theme_light");
    assert_eq!(
      task.actions,
      vec![
        Action::remove("themes/light"),
        Action::copy("themes-src/light/src", "themes/light"),
      ]
    );
  }

  #[test]
  fn unknown_theme_is_none() {
    let temp_dir = TempDir::new().unwrap();

    assert_eq!(planner(temp_dir.path()).plan_copy("dark", false), Ok(None));
  }

  #[test]
  fn copy_all_follows_scan_order() {
    let temp_dir = TempDir::new().unwrap();
    for theme in ["light", "dark"] {
      std::fs::create_dir_all(temp_dir.path().join("themes-src").join(theme)).unwrap();
    }

    let tasks = planner(temp_dir.path()).plan_copy_all().unwrap();

    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["copy-theme_dark", "copy-theme_light"]);
  }

  #[test]
  fn default_locations() {
    let options = ThemesOptions::default();
    assert_eq!(options.source_root, PathBuf::from("./dev/cardinal/themes"));
    assert_eq!(options.output_root, PathBuf::from("./themes"));
  }
}
