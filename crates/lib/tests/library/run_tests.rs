use std::fs;

use octopus_lib::config::ConfigStore;
use octopus_lib::execute::{TaskStatus, execute_manifest, execute_task_list};
use octopus_lib::manifest::{Action, Manifest, Task, bind_app_action};
use tempfile::TempDir;

use super::common::{commit_file, config_in, init_repo};

#[tokio::test]
async fn persisted_manifest_runs_every_action_kind() {
  let temp_dir = TempDir::new().unwrap();
  let root = temp_dir.path();
  fs::create_dir_all(root.join("ssapp/seed")).unwrap();
  fs::write(root.join("ssapp/seed/index.html"), "<html/>").unwrap();
  fs::create_dir_all(root.join("stale")).unwrap();

  let manifest = Manifest::new(
    ".",
    vec![
      Task::new("prepare", vec![Action::execute("echo built > built.txt"), Action::remove("stale")]),
      Task::new("bind", vec![bind_app_action("demo", "ssapp")]),
    ],
  );
  let store = ConfigStore::new(root.join("octopus.json"));
  store.write(&manifest).unwrap();

  let summary = execute_manifest(&store.read().unwrap(), &config_in(root)).await.unwrap();

  assert!(summary.is_success());
  assert!(root.join("built.txt").exists());
  assert!(!root.join("stale").exists());
  assert_eq!(
    fs::read_to_string(root.join("web-server/demo/apps/ssapp/seed/index.html")).unwrap(),
    "<html/>"
  );
}

#[tokio::test]
async fn failing_task_does_not_stop_siblings() {
  let temp_dir = TempDir::new().unwrap();
  let manifest = Manifest::new(
    ".",
    vec![
      Task::new("broken", vec![Action::copy("does-not-exist", "anywhere")]),
      Task::new("fine", vec![Action::execute("echo ok > ok.txt")]),
    ],
  );

  let summary = execute_manifest(&manifest, &config_in(temp_dir.path())).await.unwrap();

  assert_eq!(summary.failed(), 1);
  assert!(matches!(
    summary.get("broken").unwrap().status,
    TaskStatus::Failed { action_index: 0, .. }
  ));
  assert!(temp_dir.path().join("ok.txt").exists());
}

#[tokio::test]
async fn smart_clone_floats_then_stays_pinned() {
  let temp_dir = TempDir::new().unwrap();
  let upstream = temp_dir.path().join("upstream");
  let first = init_repo(&upstream);
  let work = temp_dir.path().join("work");
  fs::create_dir_all(&work).unwrap();

  let clone = |commit: Option<String>| {
    Task::new(
      "lib",
      vec![Action::SmartClone {
        target: ".".into(),
        collect_log: false,
        commit,
      }],
    )
    .with_src(upstream.to_str().unwrap())
  };

  let floating = Manifest::new(".", vec![clone(None)]);
  let summary = execute_manifest(&floating, &config_in(&work)).await.unwrap();
  assert!(summary.is_success());
  assert!(work.join("lib/README.md").exists());

  let second = commit_file(&upstream, "feature.js", "1\n", "feature");
  let summary = execute_manifest(&floating, &config_in(&work)).await.unwrap();
  match &summary.get("lib").unwrap().status {
    TaskStatus::Succeeded { actions } => assert_eq!(actions[0].output, second),
    other => panic!("unexpected status {other:?}"),
  }

  let pinned = Manifest::new(".", vec![clone(Some(first.clone()))]);
  execute_manifest(&pinned, &config_in(&work)).await.unwrap();
  commit_file(&upstream, "later.js", "2\n", "later");
  let summary = execute_manifest(&pinned, &config_in(&work)).await.unwrap();

  match &summary.get("lib").unwrap().status {
    TaskStatus::Succeeded { actions } => assert_eq!(actions[0].output, first),
    other => panic!("unexpected status {other:?}"),
  }
  assert!(!work.join("lib/feature.js").exists());
}

#[tokio::test]
async fn named_task_list_runs_alone() {
  let temp_dir = TempDir::new().unwrap();
  let mut manifest = Manifest::new(".", vec![Task::new("dep", vec![Action::execute("echo > dep.txt")])]);
  manifest.task_lists.insert(
    "release".to_string(),
    vec![Task::new("pack", vec![Action::execute("echo > pack.txt")])],
  );

  let summary = execute_task_list(&manifest, "release", &config_in(temp_dir.path()))
    .await
    .unwrap();

  assert!(summary.is_success());
  assert!(temp_dir.path().join("pack.txt").exists());
  assert!(!temp_dir.path().join("dep.txt").exists());
}
