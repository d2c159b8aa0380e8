//! Shared helpers for library integration tests.

use std::fs;
use std::path::Path;
use std::process::Command;

use octopus_lib::execute::ExecuteConfig;

/// Run git in `dir`, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
  let output = Command::new("git")
    .args(["-c", "user.name=octopus", "-c", "user.email=octopus@localhost"])
    .args(["-c", "init.defaultBranch=master", "-c", "commit.gpgsign=false"])
    .args(args)
    .current_dir(dir)
    .output()
    .expect("failed to spawn git");
  assert!(
    output.status.success(),
    "git {:?} failed: {}",
    args,
    String::from_utf8_lossy(&output.stderr)
  );
  String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a repository with one commit; returns its id.
pub fn init_repo(dir: &Path) -> String {
  fs::create_dir_all(dir).unwrap();
  git(dir, &["init", "--quiet"]);
  commit_file(dir, "README.md", "initial\n", "initial commit")
}

pub fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> String {
  fs::write(dir.join(name), content).unwrap();
  git(dir, &["add", name]);
  git(dir, &["commit", "--quiet", "-m", message]);
  git(dir, &["rev-parse", "HEAD"])
}

pub fn write_package(dir: &Path, name: &str, dependencies: &[&str]) {
  fs::create_dir_all(dir).unwrap();
  let deps: serde_json::Map<String, serde_json::Value> = dependencies
    .iter()
    .map(|d| (d.to_string(), serde_json::Value::String("*".to_string())))
    .collect();
  let package = serde_json::json!({ "name": name, "dependencies": deps });
  fs::write(dir.join("package.json"), package.to_string()).unwrap();
}

/// Sequential execution rooted at `root`.
pub fn config_in(root: &Path) -> ExecuteConfig {
  ExecuteConfig {
    root: Some(root.to_path_buf()),
    ..ExecuteConfig::default()
  }
}
