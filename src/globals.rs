use im::HashSet;

/// Names that are available on every worklet runtime and are never captured into a closure.
pub const DEFAULT_GLOBALS: &[&str] = &[
  // ECMAScript
  "globalThis",
  "Infinity",
  "NaN",
  "undefined",
  "eval",
  "isFinite",
  "isNaN",
  "parseFloat",
  "parseInt",
  "decodeURI",
  "decodeURIComponent",
  "encodeURI",
  "encodeURIComponent",
  "escape",
  "unescape",
  "Object",
  "Function",
  "Boolean",
  "Symbol",
  "Error",
  "AggregateError",
  "EvalError",
  "RangeError",
  "ReferenceError",
  "SyntaxError",
  "TypeError",
  "URIError",
  "InternalError",
  "Number",
  "BigInt",
  "Math",
  "Date",
  "String",
  "RegExp",
  "Array",
  "Int8Array",
  "Uint8Array",
  "Uint8ClampedArray",
  "Int16Array",
  "Uint16Array",
  "Int32Array",
  "Uint32Array",
  "BigInt64Array",
  "BigUint64Array",
  "Float32Array",
  "Float64Array",
  "Map",
  "Set",
  "WeakMap",
  "WeakSet",
  "ArrayBuffer",
  "SharedArrayBuffer",
  "DataView",
  "Atomics",
  "JSON",
  "WeakRef",
  "FinalizationRegistry",
  "Iterator",
  "AsyncIterator",
  "Promise",
  "GeneratorFunction",
  "AsyncGeneratorFunction",
  "Generator",
  "AsyncGenerator",
  "AsyncFunction",
  "Reflect",
  "Proxy",
  "Intl",
  "null",
  "this",
  "global",
  // runtime host
  "console",
  "performance",
  "queueMicrotask",
  "requestAnimationFrame",
  "setImmediate",
  "arguments",
  "HermesInternal",
  // worklet runtime primitives
  "_WORKLET",
  "_IS_FABRIC",
  "_log",
  "_toString",
  "_scheduleOnJS",
  "_scheduleOnRuntime",
  "_makeShareableClone",
  "_updatePropsPaper",
  "_updatePropsFabric",
  "_removeFromPropsRegistry",
  "_measurePaper",
  "_measureFabric",
  "_scrollToPaper",
  "_dispatchCommandPaper",
  "_dispatchCommandFabric",
  "_setGestureState",
  "_notifyAboutProgress",
  "_notifyAboutEnd",
  "_runOnUIQueue",
  "_getAnimationTimestamp",
];

/// The allow-list of global names for one compilation pass.
///
/// Each pass builds its own value from [DEFAULT_GLOBALS] plus the configured extras, so a failed
/// pass can never leak names into the next one.
#[derive(Clone, Debug)]
pub struct KnownGlobals {
  names: HashSet<String>,
}

impl Default for KnownGlobals {
  fn default() -> Self {
    KnownGlobals::new(&[])
  }
}

impl KnownGlobals {
  pub fn new(extra: &[String]) -> KnownGlobals {
    let names = DEFAULT_GLOBALS
      .iter()
      .map(|name| name.to_string())
      .chain(extra.iter().cloned())
      .collect();

    KnownGlobals { names }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.names.contains(name)
  }
}
