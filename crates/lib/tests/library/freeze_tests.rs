use octopus_lib::config::{ConfigStore, Environment};
use octopus_lib::execute::execute_manifest;
use octopus_lib::freeze::{GitRevisions, freeze_workflow};
use octopus_lib::manifest::{Action, Manifest, Task};
use tempfile::TempDir;

use super::common::{config_in, init_repo};

#[tokio::test]
async fn freeze_pins_cloned_dependencies_into_stable_manifest() {
  let temp_dir = TempDir::new().unwrap();
  let root = temp_dir.path();
  let upstream = root.join("upstream");
  let rev = init_repo(&upstream);
  let work = root.join("work");
  std::fs::create_dir_all(&work).unwrap();

  let floating_path = Environment::Floating.manifest_path(root);
  let stable_path = Environment::Stable.manifest_path(root);
  let manifest = Manifest::new(
    &work,
    vec![
      Task::new("lib", vec![Action::smart_clone(".")]).with_src(upstream.to_str().unwrap()),
      Task::new("never-cloned", vec![Action::smart_clone(".")]).with_src("https://example.invalid/x.git"),
    ],
  );
  ConfigStore::new(&floating_path).write(&manifest).unwrap();

  let clone_only = Manifest::new(&work, vec![manifest.dependencies[0].clone()]);
  assert!(execute_manifest(&clone_only, &config_in(root)).await.unwrap().is_success());

  let mut store = ConfigStore::new(&floating_path);
  let outcome = freeze_workflow(&mut store, &floating_path, &stable_path, &[], None, &GitRevisions).unwrap();

  assert_eq!(store.current_path(), floating_path.as_path());
  assert_eq!(outcome.pinned.len(), 1);
  assert_eq!(outcome.unpinned[0].task, "never-cloned");

  let stable = ConfigStore::new(&stable_path).read().unwrap();
  assert_eq!(
    stable.dependencies[0].actions[0],
    Action::SmartClone {
      target: ".".into(),
      collect_log: false,
      commit: Some(rev),
    }
  );
  assert_eq!(stable.dependencies[1].actions[0], Action::smart_clone("."));
}

#[tokio::test]
async fn relative_work_dir_matches_where_run_cloned() {
  let temp_dir = TempDir::new().unwrap();
  let upstream = temp_dir.path().join("upstream");
  let rev = init_repo(&upstream);
  let project = temp_dir.path().join("project");
  std::fs::create_dir_all(&project).unwrap();

  let floating_path = Environment::Floating.manifest_path(&project);
  let stable_path = Environment::Stable.manifest_path(&project);
  let manifest = Manifest::new(
    ".",
    vec![Task::new("lib", vec![Action::smart_clone(".")]).with_src(upstream.to_str().unwrap())],
  );
  ConfigStore::new(&floating_path).write(&manifest).unwrap();
  assert!(execute_manifest(&manifest, &config_in(&project)).await.unwrap().is_success());
  assert!(project.join("lib/README.md").exists());

  let mut store = ConfigStore::new(&floating_path);
  let root = Some(project.as_path());
  let first = freeze_workflow(&mut store, &floating_path, &stable_path, &[], root, &GitRevisions).unwrap();
  let second = freeze_workflow(&mut store, &floating_path, &stable_path, &[], root, &GitRevisions).unwrap();

  assert!(first.unpinned.is_empty());
  assert_eq!(first.pinned[0].commit, rev);
  assert_eq!(first.pinned, second.pinned);
  let stable = ConfigStore::new(&stable_path).read().unwrap();
  assert_eq!(
    stable.dependencies[0].actions[0],
    Action::SmartClone {
      target: ".".into(),
      collect_log: false,
      commit: Some(rev),
    }
  );
}
