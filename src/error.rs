use thiserror::Error;

/// Failures raised while extracting a single worklet.
///
/// Every message carries the `[Worklets]` prefix so tooling can tell them apart from errors raised
/// by other transforms in the same pipeline.
#[derive(Debug, Error)]
pub enum WorkletError {
  #[error("[Worklets] the file name of the compilation unit is undefined")]
  MissingFilename,

  #[error("[Worklets] worklet function `{0}` has no body")]
  MissingBody(String),

  #[error("[Worklets] worklet factory received a {0} where a function expression is required")]
  UnexpectedExpression(&'static str),

  #[error("[Worklets] generated worklet code is not a single function declaration: {0}")]
  Unparsable(String),

  #[error("[Worklets] failed to generate worklet code: {0}")]
  Codegen(#[from] std::io::Error),

  #[error("[Worklets] '{0}' as to-be workletized argument is not supported for object hooks")]
  UnsupportedObjectHookProperty(&'static str),

  #[error("[Worklets] invalid plugin options: {0}")]
  InvalidOptions(String),
}

/// The error surfaced by a compilation pass over one file.
#[derive(Debug, Error)]
#[error("[Worklets] plugin exception: {0}")]
pub struct PluginException(#[from] pub WorkletError);
