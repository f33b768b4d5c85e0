use swc_core::common::{Span, SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::*;

use crate::{
  error::WorkletError,
  free_variables::Closure,
  js_util::{
    array, assign_member_stmt, binding, block, call, const_stmt, ident, ident_expr, member_expr,
    num, object, paren, return_stmt,
  },
};

/// Preferred name of the stack capture declared by debug factories.
const STACK_DETAILS: &str = "_e";

/// Column offset the runtime applies to `__stackDetails`.
const STACK_COLUMN_OFFSET: f64 = -27.0;

/**
 * The metadata attached to a worklet's JS-side function value.
 *
 * ```ts
 * (function () {
 *   const _e = [new global.Error(), -2, -27];
 *   const foo = function foo(x) { return x + outer; };
 *   foo.__closure = { outer };
 *   foo.__workletHash = 7588482228964;
 *   foo.__initData = _worklet_7588482228964_init_data;
 *   foo.__stackDetails = _e;
 *   return foo;
 * })()
 * ```
 */
pub struct WorkletFactory<'a> {
  pub name: &'a str,
  pub closure: &'a Closure,
  pub hash: u64,
  /// The hoisted init-data declaration, `None` when init data is omitted.
  pub init_data: Option<Ident>,
  /// Debug builds capture the stack where the worklet was created.
  pub stack_details: bool,
}

impl WorkletFactory<'_> {
  /// Wraps `function` in an immediately invoked factory placed at `span`, the original function.
  pub fn build(self, function: Expr, span: Span) -> Result<Expr, WorkletError> {
    match &function {
      Expr::Fn(_) | Expr::Arrow(_) => {}
      Expr::Class(_) => return Err(WorkletError::UnexpectedExpression("class expression")),
      _ => return Err(WorkletError::UnexpectedExpression("non-function expression")),
    }

    let local_name = self.local_name();
    let stack_name = self.stack_name(&local_name);
    let local = ident(&local_name);
    let mut stmts = vec![];

    if self.stack_details {
      stmts.push(const_stmt(
        binding(ident(&stack_name)),
        array(vec![
          Expr::New(NewExpr {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            callee: Box::new(member_expr(ident_expr("global"), "Error")),
            args: Some(vec![]),
            type_args: None,
          }),
          num(self.line_offset()),
          num(STACK_COLUMN_OFFSET),
        ]),
      ));
    }

    stmts.push(const_stmt(binding(local.clone()), function));
    stmts.push(assign_member_stmt(
      &local,
      "__closure",
      Expr::Object(self.closure_object()),
    ));
    stmts.push(assign_member_stmt(
      &local,
      "__workletHash",
      num(self.hash as f64),
    ));
    if let Some(init_data) = self.init_data {
      stmts.push(assign_member_stmt(
        &local,
        "__initData",
        Expr::Ident(init_data),
      ));
    }
    if self.stack_details {
      stmts.push(assign_member_stmt(
        &local,
        "__stackDetails",
        ident_expr(&stack_name),
      ));
    }
    stmts.push(return_stmt(Expr::Ident(local)));

    let factory = Expr::Fn(FnExpr {
      ident: None,
      function: Box::new(Function {
        params: vec![],
        decorators: vec![],
        // stack traces of the factory point at the start of the original function
        span: Span::new(span.lo, span.lo),
        ctxt: SyntaxContext::empty(),
        body: Some(block(stmts)),
        is_generator: false,
        is_async: false,
        type_params: None,
        return_type: None,
      }),
    });

    let mut invocation = call(paren(factory), vec![]);
    if let Expr::Call(call) = &mut invocation {
      call.span = span;
    }
    Ok(invocation)
  }

  /// The worklet's name unless a captured variable or the stack capture already uses it.
  fn local_name(&self) -> String {
    let mut name = self.name.to_string();
    while name == STACK_DETAILS || self.closure.contains(&name) {
      name.insert(0, '_');
    }
    name
  }

  /// `_e` unless a captured variable or the local already uses it.
  fn stack_name(&self, local_name: &str) -> String {
    let mut name = STACK_DETAILS.to_string();
    while name == local_name || self.closure.contains(&name) {
      name.insert(0, '_');
    }
    name
  }

  /// Lines the runtime skips to reach the user's code: the closure destructuring adds some.
  fn line_offset(&self) -> f64 {
    if self.closure.is_empty() {
      1.0
    } else {
      1.0 - (self.closure.len() as f64 + 2.0)
    }
  }

  /// `{ a, b }` holding the current values of the captured variables.
  fn closure_object(&self) -> ObjectLit {
    object(
      self
        .closure
        .bindings
        .iter()
        .map(|binding| {
          PropOrSpread::Prop(Box::new(Prop::Shorthand(Ident {
            span: binding.span,
            ..binding.ident.clone()
          })))
        })
        .collect(),
    )
  }
}
