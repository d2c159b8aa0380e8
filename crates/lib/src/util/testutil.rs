//! Test utilities for octopus-lib.
//!
//! Helpers that build local git repositories and component source trees so
//! tests never touch the network.

use std::fs;
use std::path::Path;
use std::process::Command;

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

/// Create a repository at `dir` with a single commit. Returns the commit id.
pub fn init_repo(dir: &Path) -> String {
  fs::create_dir_all(dir).unwrap();
  git(dir, &["init", "--quiet"]);
  commit_file(dir, "README.md", "initial\n", "initial commit")
}

/// Write `name` in the repository at `dir` and commit it. Returns the new commit id.
pub fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> String {
  fs::write(dir.join(name), content).unwrap();
  git(dir, &["add", name]);
  git(dir, &["commit", "--quiet", "-m", message]);
  git(dir, &["rev-parse", "HEAD"])
}

/// Write a `package.json` declaring `name` and its dependencies under `dir`.
pub fn write_package(dir: &Path, name: &str, dependencies: &[&str], dev_dependencies: &[&str]) {
  fs::create_dir_all(dir).unwrap();
  let deps = |names: &[&str]| -> serde_json::Value {
    names
      .iter()
      .map(|n| (n.to_string(), serde_json::Value::String("*".to_string())))
      .collect::<serde_json::Map<_, _>>()
      .into()
  };
  let package = serde_json::json!({
    "name": name,
    "version": "0.0.0",
    "dependencies": deps(dependencies),
    "devDependencies": deps(dev_dependencies),
  });
  fs::write(dir.join("package.json"), serde_json::to_string_pretty(&package).unwrap()).unwrap();
}
