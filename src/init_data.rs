use swc_core::ecma::ast::*;

use crate::js_util::{key_value, object, str};

/// Everything the worklet runtime needs to rebuild a worklet on another thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkletArtifact {
  /// Compact source text of `function <name>(...) {...}`.
  pub code: String,
  pub hash: u64,
  /// Captured names in discovery order.
  pub closure: Vec<String>,
  pub location: Option<String>,
  /// JSON text of the source map.
  pub source_map: Option<String>,
  pub version: Option<String>,
}

impl WorkletArtifact {
  /**
   * ```ts
   * { code: "function foo(){...}", location: "/app/foo.js", sourceMap: "{...}", version: "x.y.z" }
   * ```
   */
  pub fn to_init_data(&self) -> ObjectLit {
    let mut props = vec![key_value("code", str(&self.code))];

    if let Some(location) = &self.location {
      props.push(key_value("location", str(location)));
    }
    if let Some(source_map) = &self.source_map {
      props.push(key_value("sourceMap", str(source_map)));
    }
    if let Some(version) = &self.version {
      props.push(key_value("version", str(version)));
    }

    object(props)
  }
}

/// `_worklet_<hash>_init_data`
pub fn init_data_name(hash: u64) -> String {
  format!("_worklet_{hash}_init_data")
}
