use swc_core::common::{sync::Lrc, BytePos, SourceMap, DUMMY_SP};
use swc_core::ecma::ast::*;
use swc_core::ecma::codegen::{text_writer::JsWriter, Config, Emitter};
use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax};

use crate::{
  error::WorkletError,
  free_variables::Closure,
  js_util::{binding, const_stmt, ident, member_expr, object_pat, this_expr},
  worklet_function::directive_count,
};

/// A position in the original file and the place it was printed at in the generated text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mapping {
  pub original: BytePos,
  pub line: u32,
  pub col: u32,
}

/// Compact worklet source text together with the positions recorded while printing it.
#[derive(Clone, Debug)]
pub struct GeneratedCode {
  pub code: String,
  pub mappings: Vec<Mapping>,
}

/**
 * Makes a worklet read its captured variables from the object it is called on.
 *
 * ```ts
 * function foo() { return foo(a + b); }
 * // becomes
 * function foo() { const foo = this.__recur; const { a, b } = this.__closure; return foo(a + b); }
 * ```
 */
pub fn prepend_prelude(function: &mut Function, self_name: Option<&str>, closure: &Closure) {
  let Some(body) = &mut function.body else {
    return;
  };

  let mut prelude = vec![];
  if let Some(name) = self_name.filter(|_| closure.is_recursive) {
    prelude.push(const_stmt(
      binding(ident(name)),
      member_expr(this_expr(), "__recur"),
    ));
  }
  if !closure.is_empty() {
    prelude.push(const_stmt(
      object_pat(&closure.names()),
      member_expr(this_expr(), "__closure"),
    ));
  }

  let at = directive_count(&body.stmts);
  body.stmts.splice(at..at, prelude);
}

/// Prints `function <name>(...) {...}` without comments or optional whitespace and checks that the
/// result parses back as that single declaration.
pub fn print_worklet(name: &str, function: Function) -> Result<GeneratedCode, WorkletError> {
  let module = Module {
    span: DUMMY_SP,
    body: vec![ModuleItem::Stmt(Stmt::Decl(Decl::Fn(FnDecl {
      ident: ident(name),
      declare: false,
      function: Box::new(function),
    })))],
    shebang: None,
  };

  let generated = print_module(&module)?;
  validate_worklet_code(&generated.code)?;

  Ok(generated)
}

pub fn print_module(module: &Module) -> Result<GeneratedCode, WorkletError> {
  // spans still point into the original file, so positions are recorded but never resolved here
  let cm: Lrc<SourceMap> = Default::default();
  let mut buf = vec![];
  let mut raw_mappings = vec![];

  {
    let mut emitter = Emitter {
      cfg: Config::default().with_minify(true),
      cm: cm.clone(),
      comments: None,
      wr: JsWriter::new(cm, "\n", &mut buf, Some(&mut raw_mappings)),
    };
    emitter.emit_module(module)?;
  }

  let mappings = raw_mappings
    .into_iter()
    .filter(|(pos, _)| !pos.is_dummy())
    .map(|(original, at)| Mapping {
      original,
      line: at.line,
      col: at.col,
    })
    .collect();

  Ok(GeneratedCode {
    code: String::from_utf8_lossy(&buf).into_owned(),
    mappings,
  })
}

/// Parses standalone JavaScript source text.
pub fn parse_module(src: &str) -> Result<Module, String> {
  let input = StringInput::new(src, BytePos(1), BytePos(1 + src.len() as u32));
  let mut parser = Parser::new(
    Syntax::Es(EsSyntax {
      jsx: true,
      ..Default::default()
    }),
    input,
    None,
  );

  let module = parser
    .parse_module()
    .map_err(|err| format!("{:?}", err.kind()))?;

  match parser.take_errors().into_iter().next() {
    Some(err) => Err(format!("{:?}", err.kind())),
    None => Ok(module),
  }
}

fn validate_worklet_code(code: &str) -> Result<(), WorkletError> {
  let module = parse_module(code).map_err(WorkletError::Unparsable)?;

  match module.body.as_slice() {
    [ModuleItem::Stmt(Stmt::Decl(Decl::Fn(_)))] => Ok(()),
    items => Err(WorkletError::Unparsable(format!(
      "expected one function declaration, found {} items",
      items.len()
    ))),
  }
}
