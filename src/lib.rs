use std::sync::Arc;

use swc_core::{
  common::errors::HANDLER,
  ecma::{ast::Program, visit::VisitMutWith},
  plugin::{
    metadata::TransformPluginMetadataContextKind, plugin_transform,
    proxies::TransformPluginProgramMetadata,
  },
};

mod callees;
mod codegen;
mod downlevel;
mod error;
mod factory;
mod free_variables;
mod gesture_handler;
mod globals;
mod hash;
mod init_data;
mod inline_styles;
mod js_util;
mod layout_animation;
mod lexical_scope;
mod options;
mod source_map;
mod strip_types;
#[cfg(test)]
mod test_util;
mod web_platform;
mod worklet_function;
mod worklet_transform;

pub use error::{PluginException, WorkletError};
pub use free_variables::{Closure, ClosureBinding};
pub use hash::worklet_hash;
pub use init_data::WorkletArtifact;
pub use options::{BuildEnvironment, FileContext, PluginOptions, MOCK_SOURCE_MAP, MOCK_VERSION};
pub use worklet_function::Eligibility;
pub use worklet_transform::WorkletTransform;

#[plugin_transform]
pub fn process_transform(program: Program, metadata: TransformPluginProgramMetadata) -> Program {
  let context = |kind: TransformPluginMetadataContextKind| metadata.get_context(&kind);

  let env = BuildEnvironment::from_process(
    context(TransformPluginMetadataContextKind::Env).as_deref(),
    context(TransformPluginMetadataContextKind::Cwd).as_deref(),
  );
  let file = FileContext {
    filename: context(TransformPluginMetadataContextKind::Filename),
    source_map: None,
  }
  .with_source_map(Arc::new(metadata.source_map.clone()));

  let result = PluginOptions::from_json(metadata.get_transform_plugin_config().as_deref())
    .map_err(PluginException::from)
    .and_then(|options| {
      let mut transformed = program.clone();
      process_program(&mut transformed, &options, &env, file).map(|_| transformed)
    });

  match result {
    Ok(transformed) => transformed,
    Err(err) => {
      HANDLER.with(|handler| handler.err(&err.to_string()));
      program
    }
  }
}

/// Runs one compilation pass over `program`, replacing its worklets with factories.
pub fn process_program(
  program: &mut Program,
  options: &PluginOptions,
  env: &BuildEnvironment,
  file: FileContext,
) -> Result<(), PluginException> {
  let mut transform = worklets(options.clone(), env.clone(), file);
  program.visit_mut_with(&mut transform);
  transform.finish()?;

  Ok(())
}

pub fn worklets(options: PluginOptions, env: BuildEnvironment, file: FileContext) -> WorkletTransform {
  WorkletTransform::new(options, env, file)
}
