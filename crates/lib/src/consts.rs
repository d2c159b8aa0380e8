//! Well-known names shared across the crate.

/// Manifest used for stable (pinned) runs.
pub const STABLE_MANIFEST: &str = "octopus.json";

/// Manifest used for development (floating) runs.
pub const FLOATING_MANIFEST: &str = "octopus-dev.json";

/// Environment variable selecting the floating manifest when set to `true`.
pub const DEV_ENV_VAR: &str = "DEV";

/// Environment variable overriding the bootstrap repository name.
pub const BOOTSTRAP_REPO_ENV_VAR: &str = "PRIVATESKY_REPO_NAME";

/// Name of the bootstrap dependency created for a fresh manifest.
pub const BOOTSTRAP_TASK: &str = "privatesky";

/// Repository cloned by the bootstrap dependency unless overridden.
pub const BOOTSTRAP_REPO: &str = "privatesky";

/// Task list used when the caller does not name one.
pub const DEFAULT_TASK_LIST: &str = "dependencies";

/// Package identity of the primary core component.
pub const PRIMARY_CORE: &str = "@webcardinal/core";

/// Package identity of the legacy core component.
pub const SECONDARY_CORE: &str = "@cardinal/core";

/// Per-component metadata file.
pub const PACKAGE_FILE: &str = "package.json";

/// Build output of a component, relative to its source directory.
pub const ARTIFACT_DIR: &str = "build/dist/webcardinal";

/// Base runtime files shipped by the core component.
pub const BASE_DIR: &str = "base";

/// Optional per-component extension directory.
pub const EXTENDED_DIR: &str = "extended";

/// Stem of the aggregate entry files and of each component's entry file.
pub const BUNDLE_NAME: &str = "webcardinal";

/// Length of a full git object id in hex.
pub const REVISION_LEN: usize = 40;

/// Where component sources are checked out, relative to the work directory.
pub const COMPONENTS_SOURCE: &str = "./.dev/webcardinal/components";

/// Where built components are staged, relative to the work directory.
pub const COMPONENTS_OUTPUT: &str = "./webcardinal/components";

/// Where theme sources live, relative to the work directory.
pub const THEMES_SOURCE: &str = "./dev/cardinal/themes";

/// Where themes are staged, relative to the work directory.
pub const THEMES_OUTPUT: &str = "./themes";

/// Sources of a theme, relative to its directory.
pub const THEME_SOURCE_DIR: &str = "src";

pub const PACKAGE_MANAGER: &str = "npm";
