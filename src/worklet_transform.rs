use std::path::Path;

use im::HashSet;
use log::{debug, trace};
use swc_core::common::util::take::Take;
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::{
  callees::{callee_name, CallSite, ObjectHook},
  codegen::{prepend_prelude, print_worklet, GeneratedCode},
  downlevel::downlevel,
  error::WorkletError,
  factory::WorkletFactory,
  free_variables::{attach_first_use_spans, discover_free_variables},
  gesture_handler::is_gesture_callback,
  globals::KnownGlobals,
  hash::worklet_hash,
  init_data::{init_data_name, WorkletArtifact},
  inline_styles::process_inline_styles_warning,
  js_util::{binding, const_stmt, ident, unwrap_parens_mut, used_names, var_decl},
  layout_animation::is_layout_animation_callback,
  options::{relative_to, BuildEnvironment, FileContext, PluginOptions, MOCK_SOURCE_MAP},
  source_map::WorkletSourceMap,
  strip_types::StripTypes,
  web_platform::substitute_web_platform_check,
  worklet_function::{
    accessor_to_method, has_worklet_directive, is_function_like, Eligibility, WorkletFunction,
  },
};

/**
 * Replaces every worklet of a file with a factory call that rebuilds it on the UI runtime.
 *
 * A function is a worklet when its body starts with a `'worklet'` directive, when it is passed
 * to a known API such as `runOnUI`, or when it is a gesture or layout animation callback.
 * The init data of each worklet is declared right before the top-level statement containing it.
 */
pub struct WorkletTransform {
  options: PluginOptions,
  env: BuildEnvironment,
  file: FileContext,
  globals: KnownGlobals,
  /// Identifiers of the file and the init-data names generated so far.
  used_names: HashSet<String>,
  /// Init-data declarations waiting to be inserted before the current top-level statement.
  hoisted: Vec<Stmt>,
  /// Only functions with an explicit directive are extracted, used inside a worklet that is
  /// about to be extracted itself.
  directive_only: bool,
  error: Option<WorkletError>,
}

impl WorkletTransform {
  pub fn new(options: PluginOptions, env: BuildEnvironment, file: FileContext) -> WorkletTransform {
    WorkletTransform {
      globals: KnownGlobals::new(&options.globals),
      options,
      env,
      file,
      used_names: HashSet::new(),
      hoisted: vec![],
      directive_only: false,
      error: None,
    }
  }

  /// The first error met during the pass. Once an error is recorded, the pass stops extracting.
  pub fn finish(self) -> Result<(), WorkletError> {
    match self.error {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }

  fn fail(&mut self, err: WorkletError) {
    debug!("worklet extraction failed: {err}");
    if self.error.is_none() {
      self.error = Some(err);
    }
  }

  fn failed(&self) -> bool {
    self.error.is_some()
  }

  /// Replaces a function expression with its factory call. Other expressions are left as they are.
  fn substitute_expr(&mut self, expr: &mut Expr, at_known_call_site: bool) {
    let mut function = match expr.take() {
      Expr::Fn(fn_expr) => WorkletFunction::Expr(fn_expr),
      Expr::Arrow(arrow) => WorkletFunction::Arrow(arrow),
      other => {
        *expr = other;
        return;
      }
    };

    let eligibility = function.classify(at_known_call_site);
    match self.process_worklet(&mut function, eligibility) {
      Ok(factory) => *expr = factory,
      Err(err) => {
        *expr = function.into_js_expr();
        self.fail(err);
      }
    }
  }

  /// `const foo = <factory>` in place of `function foo() { 'worklet'; }`.
  fn substitute_fn_decl(&mut self, decl: &mut Decl) {
    let Decl::Fn(fn_decl) = decl else {
      return;
    };

    let name = fn_decl.ident.clone();
    let mut function = WorkletFunction::Decl(fn_decl.clone());
    match self.process_worklet(&mut function, Eligibility::ExplicitDirective) {
      Ok(factory) => {
        *decl = Decl::Var(Box::new(var_decl(
          VarDeclKind::Const,
          vec![(binding(name), Some(factory))],
        )))
      }
      Err(err) => self.fail(err),
    }
  }

  /// `foo: <factory>` in place of `foo() { ... }`.
  fn substitute_method(&mut self, prop: &mut Prop, at_known_call_site: bool) {
    let Prop::Method(method) = prop else {
      return;
    };

    let key = method.key.clone();
    let mut function = WorkletFunction::Method(method.clone());
    let eligibility = function.classify(at_known_call_site);
    match self.process_worklet(&mut function, eligibility) {
      Ok(factory) => {
        *prop = Prop::KeyValue(KeyValueProp {
          key,
          value: Box::new(factory),
        })
      }
      Err(err) => self.fail(err),
    }
  }

  /**
   * Extracts one worklet: its code, closure and metadata, then builds the factory replacing it.
   *
   * `function` loses its directive. With `processNestedWorklets`, the worklets inside it are
   * extracted first and end up in its code as factories.
   */
  fn process_worklet(
    &mut self,
    function: &mut WorkletFunction,
    eligibility: Eligibility,
  ) -> Result<Expr, WorkletError> {
    let filename = self
      .file
      .filename
      .clone()
      .ok_or(WorkletError::MissingFilename)?;

    if self.options.process_nested_worklets {
      let outer = std::mem::replace(&mut self.directive_only, true);
      function.visit_mut_children_with(self);
      self.directive_only = outer;
      if let Some(err) = self.error.take() {
        return Err(err);
      }
    }

    function.remove_worklet_directive();
    let name = function.name().to_string();

    let mut code = function.to_function()?;
    code.visit_mut_with(&mut StripTypes);
    downlevel(&mut code);

    let mut closure = discover_free_variables(&code, function.self_name(), &self.globals);
    attach_first_use_spans(&mut closure, function);
    prepend_prelude(&mut code, function.self_name(), &closure);

    let generated = print_worklet(&name, code)?;
    let hash = worklet_hash(&generated.code);
    let artifact = self.package(&filename, generated, hash, closure.names());

    debug!(
      "extracted worklet {name} ({eligibility}): hash {hash}, closure {:?}",
      artifact.closure
    );

    let init_data = if self.options.omit_native_only_data {
      None
    } else {
      Some(self.hoist_init_data(&artifact))
    };

    WorkletFactory {
      name: &name,
      closure: &closure,
      hash,
      init_data,
      stack_details: !self.env.release,
    }
    .build(function.clone().into_js_expr(), function.span())
  }

  fn package(
    &self,
    filename: &str,
    generated: GeneratedCode,
    hash: u64,
    closure: Vec<String>,
  ) -> WorkletArtifact {
    if self.env.release {
      return WorkletArtifact {
        code: generated.code,
        hash,
        closure,
        location: None,
        source_map: None,
        version: None,
      };
    }

    let location = match (&self.env.cwd, self.options.relative_source_location) {
      (Some(cwd), true) => relative_to(Path::new(filename), cwd),
      _ => filename.to_string(),
    };

    let source_map = if self.env.mock_source_map {
      Some(format!("\"{MOCK_SOURCE_MAP}\""))
    } else {
      self.file.source_map.as_ref().map(|mapper| {
        WorkletSourceMap::new(&location, &generated.mappings, mapper.as_ref()).to_json()
      })
    };

    WorkletArtifact {
      code: generated.code,
      hash,
      closure,
      location: Some(location),
      source_map,
      version: Some(
        self
          .env
          .version(self.options.version.as_deref())
          .to_string(),
      ),
    }
  }

  /// Declares `const _worklet_<hash>_init_data = {...}` and returns its name.
  fn hoist_init_data(&mut self, artifact: &WorkletArtifact) -> Ident {
    let base = init_data_name(artifact.hash);
    let mut name = base.clone();
    let mut n = 1;
    while self.used_names.contains(&name) {
      n += 1;
      name = format!("{base}{n}");
    }
    self.used_names.insert(name.clone());

    debug!("hoisting {name}");
    let id = ident(&name);
    self.hoisted.push(const_stmt(
      binding(id.clone()),
      Expr::Object(artifact.to_init_data()),
    ));
    id
  }

  /// Extracts the function arguments a recognized call wants to run on the UI thread.
  fn process_call_site(&mut self, call: &mut CallExpr) -> Result<(), WorkletError> {
    if is_gesture_callback(&call.callee) || is_layout_animation_callback(&call.callee) {
      trace!("callback chain ending in {:?}", callee_name(&call.callee));
      for arg in call.args.iter_mut().filter(|arg| arg.spread.is_none()) {
        self.substitute_if_function(&mut arg.expr);
      }
      return Ok(());
    }

    let Some(site) = callee_name(&call.callee).and_then(CallSite::from_name) else {
      return Ok(());
    };
    trace!("call site {site:?}");

    match site {
      CallSite::Arguments(callee) => {
        for index in callee.worklet_args() {
          if let Some(arg) = call.args.get_mut(*index).filter(|arg| arg.spread.is_none()) {
            self.substitute_if_function(&mut arg.expr);
          }
        }
      }
      CallSite::ObjectHook(hook) => {
        let Some(arg) = call.args.first_mut().filter(|arg| arg.spread.is_none()) else {
          return Ok(());
        };
        match unwrap_parens_mut(&mut arg.expr) {
          Expr::Object(object) => self.process_object_hook(object)?,
          expr if hook == ObjectHook::UseAnimatedScrollHandler => {
            self.substitute_if_function(expr)
          }
          _ => {}
        }
      }
    }

    Ok(())
  }

  fn process_object_hook(&mut self, object: &mut ObjectLit) -> Result<(), WorkletError> {
    for prop in object.props.iter_mut() {
      let prop = match prop {
        PropOrSpread::Prop(prop) => prop,
        PropOrSpread::Spread(_) => {
          return Err(WorkletError::UnsupportedObjectHookProperty("SpreadElement"))
        }
      };

      // get onStart() {} is extracted like onStart() {}
      if let Some(method) = accessor_to_method(prop) {
        **prop = Prop::Method(method);
      }

      if matches!(**prop, Prop::Method(_)) {
        self.substitute_method(prop, true);
        continue;
      }

      if let Prop::KeyValue(KeyValueProp { value, .. }) = &mut **prop {
        self.substitute_if_function(value);
      }
    }

    Ok(())
  }

  fn substitute_if_function(&mut self, expr: &mut Expr) {
    let expr = unwrap_parens_mut(expr);
    if is_function_like(expr) {
      self.substitute_expr(expr, true);
    }
  }

  /// Visits `items`, inserting pending init-data declarations before the item that needed them.
  fn visit_mut_top_level<T, F>(&mut self, items: &mut Vec<T>, wrap: F)
  where
    T: VisitMutWith<Self>,
    F: Fn(Stmt) -> T,
  {
    let mut out = Vec::with_capacity(items.len());
    for mut item in items.drain(..) {
      item.visit_mut_with(self);
      out.extend(self.hoisted.drain(..).map(&wrap));
      out.push(item);
    }
    *items = out;
  }
}

impl VisitMut for WorkletTransform {
  fn visit_mut_module(&mut self, module: &mut Module) {
    self.used_names = used_names(&*module);
    self.visit_mut_top_level(&mut module.body, ModuleItem::Stmt);
  }

  fn visit_mut_script(&mut self, script: &mut Script) {
    self.used_names = used_names(&*script);
    self.visit_mut_top_level(&mut script.body, |stmt| stmt);
  }

  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    if self.failed() {
      return;
    }

    if self.options.substitute_web_platform_checks
      && !self.directive_only
      && substitute_web_platform_check(expr)
    {
      return;
    }

    if expr_has_worklet_directive(expr) {
      self.substitute_expr(expr, false);
    }

    expr.visit_mut_children_with(self);
  }

  fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
    if self.failed() {
      return;
    }

    if !self.directive_only {
      if let Err(err) = self.process_call_site(call) {
        self.fail(err);
        return;
      }
    }

    call.visit_mut_children_with(self);
  }

  fn visit_mut_decl(&mut self, decl: &mut Decl) {
    if self.failed() {
      return;
    }

    if let Decl::Fn(fn_decl) = decl {
      if fn_has_worklet_directive(&fn_decl.function) {
        self.substitute_fn_decl(decl);
      }
    }

    decl.visit_mut_children_with(self);
  }

  fn visit_mut_module_decl(&mut self, module_decl: &mut ModuleDecl) {
    if self.failed() {
      return;
    }

    // export default function foo() { 'worklet'; }
    if let ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
      span,
      decl: DefaultDecl::Fn(fn_expr),
    }) = module_decl
    {
      if fn_has_worklet_directive(&fn_expr.function) {
        let span = *span;
        let mut expr = Expr::Fn(fn_expr.clone());
        self.substitute_expr(&mut expr, false);
        if !self.failed() {
          *module_decl = ModuleDecl::ExportDefaultExpr(ExportDefaultExpr {
            span,
            expr: Box::new(expr),
          });
        }
      }
    }

    module_decl.visit_mut_children_with(self);
  }

  fn visit_mut_prop(&mut self, prop: &mut Prop) {
    if self.failed() {
      return;
    }

    if let Prop::Method(method) = prop {
      if fn_has_worklet_directive(&method.function) {
        self.substitute_method(prop, false);
      }
    }

    prop.visit_mut_children_with(self);
  }

  fn visit_mut_jsx_attr(&mut self, attr: &mut JSXAttr) {
    if self.failed() {
      return;
    }

    if !self.directive_only && !self.env.release && !self.options.disable_inline_styles_warning {
      process_inline_styles_warning(attr);
    }

    attr.visit_mut_children_with(self);
  }
}

fn fn_has_worklet_directive(function: &Function) -> bool {
  function
    .body
    .as_ref()
    .map(|body| has_worklet_directive(&body.stmts))
    .unwrap_or(false)
}

fn expr_has_worklet_directive(expr: &Expr) -> bool {
  match expr {
    Expr::Fn(fn_expr) => fn_has_worklet_directive(&fn_expr.function),
    Expr::Arrow(arrow) => match &*arrow.body {
      BlockStmtOrExpr::BlockStmt(body) => has_worklet_directive(&body.stmts),
      BlockStmtOrExpr::Expr(_) => false,
    },
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::{parse, print, squash};

  fn env() -> BuildEnvironment {
    BuildEnvironment {
      mock_version: true,
      mock_source_map: true,
      ..Default::default()
    }
  }

  fn transform_with(src: &str, options: PluginOptions, env: BuildEnvironment) -> String {
    let mut module = parse(src);
    let mut transform = WorkletTransform::new(options, env, FileContext::new("/app/src/App.js"));
    module.visit_mut_with(&mut transform);
    transform.finish().unwrap();
    squash(&print(&module))
      .replace('\'', "\"")
      .replace(";}", "}")
  }

  fn transform(src: &str) -> String {
    transform_with(src, PluginOptions::default(), env())
  }

  #[test]
  fn extracts_directive_functions() {
    let code = transform("const outer = 1; const f = (x) => { 'worklet'; return x + outer; };");

    assert!(code.contains("code:\"functionanonymous(x){const{outer}=this.__closure;returnx+outer"), "{code}");
    assert!(code.contains("anonymous.__closure={outer}"), "{code}");
    assert!(code.contains("location:\"/app/src/App.js\""), "{code}");
    assert!(code.contains("version:\"x.y.z\""), "{code}");
    assert!(!code.contains("\"worklet\""), "{code}");
  }

  #[test]
  fn init_data_precedes_the_statement_using_it() {
    let code = transform("foo(); function w() { 'worklet'; return 1; }");

    let init = code.find("const_worklet_").unwrap();
    let worklet = code.find("constw=(function").unwrap();
    assert!(code.find("foo()").unwrap() < init, "{code}");
    assert!(init < worklet, "{code}");
  }

  #[test]
  fn function_declarations_become_constants() {
    let code = transform("export function w() { 'worklet'; } export default function d() { 'worklet'; }");

    assert!(code.contains("exportconstw=(function(){"), "{code}");
    assert!(code.contains("exportdefault(function(){"), "{code}");
  }

  #[test]
  fn object_methods_become_properties() {
    let code = transform("const o = { m() { 'worklet'; return 1; } };");

    assert!(code.contains("m:(function(){"), "{code}");
    assert!(code.contains("code:\"functionm(){return1"), "{code}");
  }

  #[test]
  fn auto_workletizes_known_call_sites() {
    let code = transform("runOnUI(() => { go(); })(); runOnUI(fn);");

    assert!(code.contains("runOnUI((function(){"), "{code}");
    assert!(code.contains("runOnUI(fn)"), "{code}");
  }

  #[test]
  fn auto_workletizes_object_hooks() {
    let code = transform(
      "useAnimatedGestureHandler({ onStart: (e) => {}, onEnd(e) {}, other: 1 });",
    );

    assert!(code.contains("onStart:(function(){"), "{code}");
    assert!(code.contains("onEnd:(function(){"), "{code}");
    assert!(code.contains("other:1"), "{code}");
  }

  #[test]
  fn methods_capture_outer_bindings_named_like_their_key() {
    let code = transform("const foo = () => 1; const o = { foo() { 'worklet'; return foo() + 1; } };");

    assert!(
      code.contains(r#"code:"functionfoo(){const{foo}=this.__closure;returnfoo()+1""#),
      "{code}"
    );
    assert!(code.contains("const_foo=function(){returnfoo()+1}"), "{code}");
    assert!(code.contains("_foo.__closure={foo}"), "{code}");
    assert!(!code.contains("__recur"), "{code}");
  }

  #[test]
  fn captured_variables_are_not_shadowed_by_the_stack_capture() {
    let code = transform("const _e = 5; const f = () => { 'worklet'; return _e; };");

    assert!(code.contains("const__e=[newglobal.Error"), "{code}");
    assert!(code.contains("anonymous.__closure={_e}"), "{code}");
    assert!(code.contains("anonymous.__stackDetails=__e"), "{code}");
  }

  #[test]
  fn object_hooks_extract_accessors() {
    let code = transform(
      "useAnimatedGestureHandler({ get onStart() { return 1; }, set onEnd(e) { go(e); } });",
    );

    assert!(code.contains("onStart:(function(){"), "{code}");
    assert!(code.contains(r#"code:"functiononStart(){return1""#), "{code}");
    assert!(code.contains("onEnd:(function(){"), "{code}");
    assert!(
      code.contains(r#"code:"functiononEnd(e){const{go}=this.__closure;go(e)""#),
      "{code}"
    );
    assert!(!code.contains("getonStart"), "{code}");
    assert!(!code.contains("setonEnd"), "{code}");
  }

  #[test]
  fn object_hooks_reject_spreads() {
    let mut module = parse("useAnimatedGestureHandler({ ...handlers });");
    let mut transform = WorkletTransform::new(PluginOptions::default(), env(), FileContext::new("a.js"));
    module.visit_mut_with(&mut transform);

    assert!(matches!(
      transform.finish(),
      Err(WorkletError::UnsupportedObjectHookProperty("SpreadElement"))
    ));
  }

  #[test]
  fn auto_workletizes_builder_callbacks() {
    let code = transform(
      "Gesture.Tap().onEnd(() => {}); FadeIn.duration(100).withCallback((done) => {});",
    );

    assert!(code.contains(".onEnd((function(){"), "{code}");
    assert!(code.contains(".withCallback((function(){"), "{code}");
  }

  #[test]
  fn release_builds_strip_debug_data() {
    let code = transform_with(
      "const f = () => { 'worklet'; };",
      PluginOptions::default(),
      BuildEnvironment {
        release: true,
        ..env()
      },
    );

    assert!(!code.contains("location:"), "{code}");
    assert!(!code.contains("sourceMap:"), "{code}");
    assert!(!code.contains("version:"), "{code}");
    assert!(!code.contains("__stackDetails"), "{code}");
  }

  #[test]
  fn omits_init_data_on_request() {
    let code = transform_with(
      "const f = () => { 'worklet'; };",
      PluginOptions {
        omit_native_only_data: true,
        ..Default::default()
      },
      env(),
    );

    assert!(!code.contains("_init_data"), "{code}");
    assert!(code.contains("__workletHash"), "{code}");
  }

  #[test]
  fn missing_filename_is_an_error() {
    let mut module = parse("const f = () => { 'worklet'; };");
    let mut transform =
      WorkletTransform::new(PluginOptions::default(), env(), FileContext::default());
    module.visit_mut_with(&mut transform);

    assert!(matches!(transform.finish(), Err(WorkletError::MissingFilename)));
  }

  #[test]
  fn nested_worklets_are_extracted_first_when_enabled() {
    let src = "const f = () => { 'worklet'; const g = () => { 'worklet'; return 1; }; return g(); };";

    let flat = transform(src);
    let nested = transform_with(
      src,
      PluginOptions {
        process_nested_worklets: true,
        ..Default::default()
      },
      env(),
    );

    // without nesting the inner worklet stays a plain function in the outer worklet's code
    assert!(flat.contains(r#"constg=function(){"worklet";return1}"#), "{flat}");
    assert!(!nested.contains(r#""worklet""#), "{nested}");
  }

  #[test]
  fn web_platform_checks_are_substituted_on_request() {
    let options = PluginOptions {
      substitute_web_platform_checks: true,
      ..Default::default()
    };

    assert!(transform_with("if (isWeb()) {}", options, env()).contains("if(true)"));
    assert!(transform("if (isWeb()) {}").contains("if(isWeb())"));
  }

  #[test]
  fn init_data_names_are_unique() {
    let code = transform(
      "const a = () => { 'worklet'; return 1; }; const b = () => { 'worklet'; return 1; };",
    );

    let names: Vec<&str> = code
      .split("const_worklet_")
      .skip(1)
      .filter_map(|rest| rest.split('=').next())
      .collect();
    assert_eq!(names.len(), 2, "{code}");
    assert_eq!(names[1], format!("{}2", names[0]));
  }
}
