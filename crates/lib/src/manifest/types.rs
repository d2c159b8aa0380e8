//! Manifest types for octopus.
//!
//! The manifest is the persisted description of everything a run does: a base
//! directory and one or more ordered task lists. Each task is a named sequence of
//! primitive actions.
//!
//! # Format
//!
//! ```json
//! {
//!     "workDir": ".",
//!     "dependencies": [
//!         {
//!             "name": "privatesky",
//!             "src": "http://github.com/privatesky/privatesky.git",
//!             "actions": [
//!                 { "type": "smartClone", "target": ".", "collectLog": false },
//!                 { "type": "execute", "cmd": "cd privatesky && npm install" }
//!             ]
//!         }
//!     ]
//! }
//! ```
//!
//! Any other top-level key holding an array is read as a named task list next
//! to `dependencies`. Keys holding anything else (a `"comment"` string, say) are
//! carried through untouched and written back unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_TASK_LIST;

fn is_false(value: &bool) -> bool {
  !*value
}

fn default_overwrite() -> bool {
  true
}

/// The root persisted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawManifest", into = "RawManifest")]
pub struct Manifest {
  /// Base directory every relative action path resolves against.
  pub work_dir: PathBuf,
  /// The default task list.
  pub dependencies: Vec<Task>,
  /// Additional named task lists.
  pub task_lists: BTreeMap<String, Vec<Task>>,
  /// Top-level keys that are not task lists.
  pub extra: BTreeMap<String, serde_json::Value>,
}

/// On-disk shape of [`Manifest`] before extra keys are sorted into task lists.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
  work_dir: PathBuf,
  #[serde(default)]
  dependencies: Vec<Task>,
  #[serde(flatten)]
  rest: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<RawManifest> for Manifest {
  type Error = String;

  fn try_from(raw: RawManifest) -> Result<Self, Self::Error> {
    let mut task_lists = BTreeMap::new();
    let mut extra = BTreeMap::new();
    for (key, value) in raw.rest {
      if value.is_array() {
        let tasks = serde_json::from_value(value).map_err(|e| format!("task list '{key}': {e}"))?;
        task_lists.insert(key, tasks);
      } else {
        extra.insert(key, value);
      }
    }
    Ok(Self {
      work_dir: raw.work_dir,
      dependencies: raw.dependencies,
      task_lists,
      extra,
    })
  }
}

impl From<Manifest> for RawManifest {
  fn from(manifest: Manifest) -> Self {
    let mut rest = manifest.extra;
    for (key, tasks) in manifest.task_lists {
      // a list of tasks always serializes
      if let Ok(value) = serde_json::to_value(tasks) {
        rest.insert(key, value);
      }
    }
    Self {
      work_dir: manifest.work_dir,
      dependencies: manifest.dependencies,
      rest,
    }
  }
}

impl Manifest {
  /// Create a manifest rooted at `work_dir` with the given dependencies.
  pub fn new(work_dir: impl Into<PathBuf>, dependencies: Vec<Task>) -> Self {
    Self {
      work_dir: work_dir.into(),
      dependencies,
      task_lists: BTreeMap::new(),
      extra: BTreeMap::new(),
    }
  }

  /// Look up a task list by name. `dependencies` is always present.
  pub fn task_list(&self, name: &str) -> Option<&[Task]> {
    if name == DEFAULT_TASK_LIST {
      return Some(&self.dependencies);
    }
    self.task_lists.get(name).map(Vec::as_slice)
  }

  pub fn task_list_mut(&mut self, name: &str) -> Option<&mut Vec<Task>> {
    if name == DEFAULT_TASK_LIST {
      return Some(&mut self.dependencies);
    }
    self.task_lists.get_mut(name)
  }

  /// Names of every task list, `dependencies` first.
  pub fn task_list_names(&self) -> Vec<&str> {
    std::iter::once(DEFAULT_TASK_LIST)
      .chain(self.task_lists.keys().map(String::as_str))
      .collect()
  }
}

/// A named, ordered list of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub name: String,
  /// Remote source consumed by `smartClone` actions.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub src: Option<String>,
  pub actions: Vec<Action>,
  /// A barrier runs alone: earlier tasks finish before it starts and later
  /// tasks wait for it to succeed.
  #[serde(default, skip_serializing_if = "is_false")]
  pub barrier: bool,
}

impl Task {
  pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Self {
    Self {
      name: name.into(),
      src: None,
      actions,
      barrier: false,
    }
  }

  pub fn with_src(mut self, src: impl Into<String>) -> Self {
    self.src = Some(src.into());
    self
  }

  pub fn as_barrier(mut self) -> Self {
    self.barrier = true;
    self
  }
}

/// Options accepted by `copy` actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOptions {
  /// Replace files that already exist at the destination.
  #[serde(default = "default_overwrite")]
  pub overwrite: bool,
}

impl Default for CopyOptions {
  fn default() -> Self {
    Self { overwrite: true }
  }
}

/// One primitive effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
  /// Delete `target` recursively. Succeeds when the target is already gone.
  #[serde(rename = "remove")]
  Remove { target: PathBuf },

  /// Run a shell command in the work directory.
  #[serde(rename = "execute")]
  Execute { cmd: String },

  /// Copy `src` over `target`.
  #[serde(rename = "copy")]
  Copy {
    src: PathBuf,
    target: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<CopyOptions>,
  },

  /// Clone or update the owning task's `src` into `target/<task name>`.
  #[serde(rename = "smartClone")]
  SmartClone {
    target: PathBuf,
    #[serde(rename = "collectLog", default)]
    collect_log: bool,
    /// Pinned revision. Absent means "float to latest".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    commit: Option<String>,
  },
}

impl Action {
  pub fn remove(target: impl Into<PathBuf>) -> Self {
    Action::Remove { target: target.into() }
  }

  pub fn execute(cmd: impl Into<String>) -> Self {
    Action::Execute { cmd: cmd.into() }
  }

  pub fn copy(src: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
    Action::Copy {
      src: src.into(),
      target: target.into(),
      options: None,
    }
  }

  pub fn smart_clone(target: impl Into<PathBuf>) -> Self {
    Action::SmartClone {
      target: target.into(),
      collect_log: false,
      commit: None,
    }
  }

  /// The `type` tag this action serializes with.
  pub fn kind(&self) -> &'static str {
    match self {
      Action::Remove { .. } => "remove",
      Action::Execute { .. } => "execute",
      Action::Copy { .. } => "copy",
      Action::SmartClone { .. } => "smartClone",
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Action::Remove { target } => write!(f, "remove {}", target.display()),
      Action::Execute { cmd } => write!(f, "execute `{cmd}`"),
      Action::Copy { src, target, .. } => write!(f, "copy {} -> {}", src.display(), target.display()),
      Action::SmartClone { target, commit, .. } => match commit {
        Some(commit) => write!(f, "smartClone into {} @ {commit}", target.display()),
        None => write!(f, "smartClone into {}", target.display()),
      },
    }
  }
}

/// Copy action staging an app's seed into a solution's web server tree.
pub fn bind_app_action(solution: &str, app: &str) -> Action {
  Action::Copy {
    src: PathBuf::from(format!("./{app}/seed")),
    target: PathBuf::from(format!("./web-server/{solution}/apps/{app}/seed")),
    options: Some(CopyOptions { overwrite: true }),
  }
}

/// Copy action staging a wallet's seed as the solution's wallet template.
pub fn bind_wallet_action(solution: &str, wallet: &str) -> Action {
  Action::Copy {
    src: PathBuf::from(format!("./{wallet}/seed")),
    target: PathBuf::from(format!("./web-server/{solution}/wallet-template/seed")),
    options: Some(CopyOptions { overwrite: true }),
  }
}
