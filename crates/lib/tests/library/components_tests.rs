#![cfg(unix)]

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use octopus_lib::components::{
  BuilderOptions, ComponentOptions, ComponentsBuilder, CoreIdentities, MergeOutcome,
};
use octopus_lib::execute::ExecuteConfig;
use tempfile::TempDir;

use super::common::write_package;

/// Stands in for the package manager: `<pm> run <script>` produces the
/// artifacts a real build would, recording which script ran.
fn fake_package_manager(root: &Path) -> String {
  let script = root.join("fake-pm.sh");
  fs::write(
    &script,
    "#!/bin/sh\n\
     mkdir -p build/dist/webcardinal\n\
     echo \"$2\" > build/dist/webcardinal/mode.txt\n\
     touch build/dist/webcardinal/webcardinal.esm.js build/dist/webcardinal/webcardinal.css\n",
  )
  .unwrap();
  format!("sh {}", script.display())
}

/// Like [`fake_package_manager`], but any component other than `core` fails
/// unless the core artifacts already exist. The core build is slow so that a
/// component started alongside it would see them missing.
fn core_gated_package_manager(root: &Path) -> String {
  let script = root.join("gated-pm.sh");
  fs::write(
    &script,
    "#!/bin/sh\n\
     if [ \"$(basename \"$PWD\")\" = core ]; then\n\
       sleep 0.3\n\
     elif [ ! -f ../core/build/dist/webcardinal/webcardinal.esm.js ]; then\n\
       echo 'core artifacts missing' >&2\n\
       exit 1\n\
     fi\n\
     mkdir -p build/dist/webcardinal\n\
     echo \"$2\" > build/dist/webcardinal/mode.txt\n\
     touch build/dist/webcardinal/webcardinal.esm.js build/dist/webcardinal/webcardinal.css\n",
  )
  .unwrap();
  format!("sh {}", script.display())
}

fn options(root: &Path, development: bool, targets: Option<&[&str]>) -> BuilderOptions {
  BuilderOptions {
    source_root: PathBuf::from(".dev/components"),
    output_root: PathBuf::from("public/components"),
    package_manager: fake_package_manager(root),
    identities: CoreIdentities {
      primary: "core".to_string(),
      secondary: "legacy-core".to_string(),
    },
    components: ComponentOptions {
      development,
      target_components: targets.map(|t| t.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>()),
    },
  }
}

fn seed(root: &Path) {
  let src = root.join(".dev/components");
  write_package(&src.join("core"), "core", &[]);
  fs::create_dir_all(src.join("core/base")).unwrap();
  write_package(&src.join("legacy-core"), "legacy-core", &[]);
  write_package(&src.join("widgets"), "widgets", &["core"]);
  write_package(&src.join("zzz"), "zzz", &["core"]);
}

fn mode_of(root: &Path, component: &str) -> String {
  fs::read_to_string(root.join("public/components").join(component).join("mode.txt"))
    .unwrap()
    .trim()
    .to_string()
}

#[tokio::test]
async fn development_build_orders_cores_and_rebuilds_legacy_last() {
  let temp_dir = TempDir::new().unwrap();
  let root = temp_dir.path();
  seed(root);

  let report = ComponentsBuilder::new(options(root, true, None), root)
    .run(&ExecuteConfig::default())
    .await
    .unwrap();

  assert!(report.is_success());
  let names: Vec<&str> = report.build.tasks.iter().map(|t| t.name.as_str()).collect();
  assert_eq!(
    names,
    vec![
      "build-component_core",
      "build-component_legacy-core",
      "build-component_widgets",
      "build-component_zzz",
      "rebuild-component_legacy-core",
    ]
  );
  assert_eq!(mode_of(root, "core"), "dev");
  assert_eq!(mode_of(root, "legacy-core"), "build");
  assert_eq!(mode_of(root, "widgets"), "dev");
  assert!(root.join("public/base").is_dir());

  let script = fs::read_to_string(root.join("public/webcardinal.js")).unwrap();
  let first = script.lines().next().unwrap();
  assert_eq!(first, "import './components/core/webcardinal.esm.js';");
  assert_eq!(script.lines().count(), 4);
  assert!(matches!(report.merge, Some(MergeOutcome::Written { components: 4, .. })));
}

#[tokio::test]
async fn parallel_build_finishes_core_before_dependents_start() {
  let temp_dir = TempDir::new().unwrap();
  let root = temp_dir.path();
  seed(root);
  let mut options = options(root, false, None);
  options.package_manager = core_gated_package_manager(root);
  let config = ExecuteConfig {
    parallelism: 4,
    ..ExecuteConfig::default()
  };

  let report = ComponentsBuilder::new(options, root).run(&config).await.unwrap();

  assert_eq!(report.build.failed(), 0);
  assert!(report.is_success());
  assert_eq!(report.build.tasks[0].name, "build-component_core");
  for component in ["core", "legacy-core", "widgets", "zzz"] {
    assert_eq!(mode_of(root, component), "build");
  }
}

#[tokio::test]
async fn targeted_build_touches_only_selected_components() {
  let temp_dir = TempDir::new().unwrap();
  let root = temp_dir.path();
  seed(root);

  let report = ComponentsBuilder::new(options(root, true, Some(&["widgets"])), root)
    .run(&ExecuteConfig::default())
    .await
    .unwrap();

  assert!(report.is_success());
  assert_eq!(mode_of(root, "widgets"), "dev");
  assert!(!root.join("public/components/core").exists());
  assert!(report.merge.is_none());
}
