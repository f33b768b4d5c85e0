use std::{
  path::{Component, Path, PathBuf},
  sync::Arc,
};

use serde::Deserialize;
use swc_core::common::SourceMapper;

use crate::error::WorkletError;

/// Version tag emitted in place of the real one when `REANIMATED_JEST_SHOULD_MOCK_VERSION` is set.
pub const MOCK_VERSION: &str = "x.y.z";

/// Runtime version embedded in init data unless the `version` option names another one.
pub const RUNTIME_VERSION: &str = "3.7.0";

/// Source map payload emitted when `REANIMATED_JEST_SHOULD_MOCK_SOURCE_MAP` is set.
pub const MOCK_SOURCE_MAP: &str = "mock source map";

/// Options read from the plugin's JSON configuration.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginOptions {
  /// Extract worklets nested inside other worklets before the outer one.
  pub process_nested_worklets: bool,
  /// Skip emitting `__initData`.
  pub omit_native_only_data: bool,
  /// Rewrite `location` and source map file names relative to the working directory.
  pub relative_source_location: bool,
  pub disable_inline_styles_warning: bool,
  /// Replace `isWeb()` and `shouldBeUseWeb()` with `true`.
  pub substitute_web_platform_checks: bool,
  /// Extra names treated as globals for this pass.
  pub globals: Vec<String>,
  /// Version of the runtime the worklets are built for, embedded in init data.
  pub version: Option<String>,
}

impl PluginOptions {
  /// Parses the configuration handed over by the host. An absent or blank config means defaults.
  pub fn from_json(config: Option<&str>) -> Result<PluginOptions, WorkletError> {
    match config.map(str::trim) {
      None | Some("") => Ok(PluginOptions::default()),
      Some(json) => {
        serde_json::from_str(json).map_err(|err| WorkletError::InvalidOptions(err.to_string()))
      }
    }
  }
}

/// Mode flags derived from the build environment. Read by the packager, never mutated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
  pub release: bool,
  pub mock_version: bool,
  pub mock_source_map: bool,
  pub cwd: Option<PathBuf>,
}

impl BuildEnvironment {
  /// Reads `BABEL_ENV`, `NODE_ENV` and the mock switches from the process environment.
  ///
  /// `env_name` is the environment name reported by the host, if any. `cwd` falls back to the
  /// process working directory.
  pub fn from_process(env_name: Option<&str>, cwd: Option<&str>) -> BuildEnvironment {
    let var = |key: &str| std::env::var(key).ok();

    let release = [var("BABEL_ENV"), var("NODE_ENV"), env_name.map(String::from)]
      .iter()
      .flatten()
      .any(|value| is_release_env(value));

    BuildEnvironment {
      release,
      mock_version: var("REANIMATED_JEST_SHOULD_MOCK_VERSION").as_deref() == Some("1"),
      mock_source_map: var("REANIMATED_JEST_SHOULD_MOCK_SOURCE_MAP").as_deref() == Some("1"),
      cwd: cwd
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok()),
    }
  }

  /// The version tag of init data: `configured`, the runtime default, or the mock.
  pub fn version<'a>(&self, configured: Option<&'a str>) -> &'a str {
    if self.mock_version {
      MOCK_VERSION
    } else {
      configured.unwrap_or(RUNTIME_VERSION)
    }
  }
}

/// Matches `prod`, `release`, `stage` or `stagi` anywhere in `value`, ignoring case.
pub fn is_release_env(value: &str) -> bool {
  let value = value.to_ascii_lowercase();

  ["prod", "release", "stage", "stagi"]
    .iter()
    .any(|pattern| value.contains(pattern))
}

/// Per-file state handed to one compilation pass.
#[derive(Clone, Default)]
pub struct FileContext {
  pub filename: Option<String>,
  /// Resolves spans of the file back to lines and columns. Without it no source map is built.
  pub source_map: Option<Arc<dyn SourceMapper>>,
}

impl FileContext {
  pub fn new(filename: impl Into<String>) -> FileContext {
    FileContext {
      filename: Some(filename.into()),
      source_map: None,
    }
  }

  pub fn with_source_map(mut self, source_map: Arc<dyn SourceMapper>) -> FileContext {
    self.source_map = Some(source_map);
    self
  }
}

impl std::fmt::Debug for FileContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FileContext")
      .field("filename", &self.filename)
      .field("source_map", &self.source_map.is_some())
      .finish()
  }
}

/// Expresses `path` relative to `base` using `/` separators, walking up with `..` where needed.
pub fn relative_to(path: &Path, base: &Path) -> String {
  let path: Vec<Component> = path.components().collect();
  let base: Vec<Component> = base.components().collect();

  let common = path
    .iter()
    .zip(base.iter())
    .take_while(|(a, b)| a == b)
    .count();

  let parts: Vec<String> = std::iter::repeat("..".to_string())
    .take(base.len() - common)
    .chain(
      path[common..]
        .iter()
        .map(|component| component.as_os_str().to_string_lossy().into_owned()),
    )
    .collect();

  parts.join("/")
}
