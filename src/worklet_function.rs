use swc_core::common::{Span, Spanned, SyntaxContext};
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::{
  error::WorkletError,
  js_util::{block, params_from_pats, return_stmt},
};

pub const WORKLET_DIRECTIVE: &str = "worklet";

/// Name given to worklets without a name of their own.
pub const ANONYMOUS: &str = "anonymous";

/// How a function came to be extracted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Eligibility {
  /// Its body starts with a `'worklet'` directive.
  ExplicitDirective,
  /// It is passed to a known API or a recognized builder callback.
  CallSiteImplied,
  NotAWorklet,
}

/// A function-like node that can be turned into a worklet.
#[derive(Clone, Debug)]
pub enum WorkletFunction {
  Decl(FnDecl),
  Expr(FnExpr),
  Arrow(ArrowExpr),
  Method(MethodProp),
}

impl WorkletFunction {
  /**
   * The name the function can refer to itself by.
   *
   * ```ts
   * function foo() {}      // foo
   * (function bar() {});   // bar
   * ({ baz() {} });        // none, a method key binds nothing
   * () => {};              // none
   * ```
   */
  pub fn self_name(&self) -> Option<&str> {
    match self {
      WorkletFunction::Decl(decl) => Some(&*decl.ident.sym),
      WorkletFunction::Expr(expr) => expr.ident.as_ref().map(|ident| &*ident.sym),
      WorkletFunction::Method(_) | WorkletFunction::Arrow(_) => None,
    }
  }

  /// The name printed in the worklet code: the method key or the binding name.
  pub fn name(&self) -> &str {
    match self {
      WorkletFunction::Method(MethodProp {
        key: PropName::Ident(key),
        ..
      }) => &key.sym,
      _ => self.self_name().unwrap_or(ANONYMOUS),
    }
  }

  pub fn span(&self) -> Span {
    match self {
      WorkletFunction::Decl(FnDecl { function, .. })
      | WorkletFunction::Expr(FnExpr { function, .. })
      | WorkletFunction::Method(MethodProp { function, .. }) => function.span,
      WorkletFunction::Arrow(arrow) => arrow.span,
    }
  }

  fn body(&self) -> Option<&BlockStmt> {
    match self {
      WorkletFunction::Decl(FnDecl { function, .. })
      | WorkletFunction::Expr(FnExpr { function, .. })
      | WorkletFunction::Method(MethodProp { function, .. }) => function.body.as_ref(),
      WorkletFunction::Arrow(arrow) => match &*arrow.body {
        BlockStmtOrExpr::BlockStmt(block) => Some(block),
        BlockStmtOrExpr::Expr(_) => None,
      },
    }
  }

  fn body_mut(&mut self) -> Option<&mut BlockStmt> {
    match self {
      WorkletFunction::Decl(FnDecl { function, .. })
      | WorkletFunction::Expr(FnExpr { function, .. })
      | WorkletFunction::Method(MethodProp { function, .. }) => function.body.as_mut(),
      WorkletFunction::Arrow(arrow) => match &mut *arrow.body {
        BlockStmtOrExpr::BlockStmt(block) => Some(block),
        BlockStmtOrExpr::Expr(_) => None,
      },
    }
  }

  pub fn has_worklet_directive(&self) -> bool {
    self
      .body()
      .map(|body| has_worklet_directive(&body.stmts))
      .unwrap_or(false)
  }

  pub fn classify(&self, at_known_call_site: bool) -> Eligibility {
    if self.has_worklet_directive() {
      Eligibility::ExplicitDirective
    } else if at_known_call_site {
      Eligibility::CallSiteImplied
    } else {
      Eligibility::NotAWorklet
    }
  }

  /// Drops the function's own `'worklet'` directives. Directives of nested functions stay.
  pub fn remove_worklet_directive(&mut self) {
    if let Some(body) = self.body_mut() {
      let directives = directive_count(&body.stmts);
      let mut index = 0;
      body.stmts.retain(|stmt| {
        index += 1;
        index > directives || !is_worklet_directive(stmt)
      });
    }
  }

  /**
   * A plain [Function] with the same parameters and body, ready to be printed as worklet code.
   *
   * ```ts
   * (a) => a + 1
   * // becomes
   * function (a) { return a + 1; }
   * ```
   */
  pub fn to_function(&self) -> Result<Function, WorkletError> {
    let function = match self {
      WorkletFunction::Decl(FnDecl { function, .. })
      | WorkletFunction::Expr(FnExpr { function, .. })
      | WorkletFunction::Method(MethodProp { function, .. }) => (**function).clone(),
      WorkletFunction::Arrow(arrow) => Function {
        params: params_from_pats(arrow.params.clone()),
        decorators: vec![],
        span: arrow.span,
        ctxt: arrow.ctxt,
        body: Some(match &*arrow.body {
          BlockStmtOrExpr::BlockStmt(block) => block.clone(),
          BlockStmtOrExpr::Expr(expr) => {
            let mut body = block(vec![return_stmt(*expr.clone())]);
            body.span = expr.span();
            body
          }
        }),
        is_generator: arrow.is_generator,
        is_async: arrow.is_async,
        type_params: arrow.type_params.clone(),
        return_type: arrow.return_type.clone(),
      },
    };

    if function.body.is_none() {
      return Err(WorkletError::MissingBody(self.name().to_string()));
    }
    Ok(function)
  }

  /**
   * The value stored inside the worklet factory.
   *
   * Declarations and methods become function expressions, arrows stay arrows.
   */
  pub fn into_js_expr(self) -> Expr {
    match self {
      WorkletFunction::Decl(decl) => Expr::Fn(FnExpr {
        ident: Some(decl.ident),
        function: decl.function,
      }),
      WorkletFunction::Expr(expr) => Expr::Fn(expr),
      WorkletFunction::Arrow(arrow) => Expr::Arrow(arrow),
      WorkletFunction::Method(method) => Expr::Fn(FnExpr {
        ident: None,
        function: method.function,
      }),
    }
  }

  /// Visits the parameters and body without treating the function itself as a candidate.
  pub fn visit_mut_children_with<V: VisitMut>(&mut self, visitor: &mut V) {
    match self {
      WorkletFunction::Decl(FnDecl { function, .. })
      | WorkletFunction::Expr(FnExpr { function, .. })
      | WorkletFunction::Method(MethodProp { function, .. }) => {
        (**function).visit_mut_children_with(visitor)
      }
      WorkletFunction::Arrow(arrow) => arrow.visit_mut_children_with(visitor),
    }
  }
}

/// A getter or setter as the method with the same key, parameter and body.
pub fn accessor_to_method(prop: &Prop) -> Option<MethodProp> {
  let (key, params, body, span) = match prop {
    Prop::Getter(getter) => (getter.key.clone(), vec![], getter.body.clone(), getter.span),
    Prop::Setter(setter) => (
      setter.key.clone(),
      params_from_pats(vec![(*setter.param).clone()]),
      setter.body.clone(),
      setter.span,
    ),
    _ => return None,
  };

  Some(MethodProp {
    key,
    function: Box::new(Function {
      params,
      decorators: vec![],
      span,
      ctxt: SyntaxContext::empty(),
      body,
      is_generator: false,
      is_async: false,
      type_params: None,
      return_type: None,
    }),
  })
}

/// Whether an expression is a function that may become a worklet.
pub fn is_function_like(expr: &Expr) -> bool {
  matches!(expr, Expr::Fn(_) | Expr::Arrow(_))
}

/// Number of leading string-literal statements, the directive prologue of a body.
pub(crate) fn directive_count(stmts: &[Stmt]) -> usize {
  stmts
    .iter()
    .take_while(|stmt| {
      matches!(
        stmt,
        Stmt::Expr(ExprStmt { expr, .. }) if matches!(&**expr, Expr::Lit(Lit::Str(_)))
      )
    })
    .count()
}

fn is_worklet_directive(stmt: &Stmt) -> bool {
  match stmt {
    Stmt::Expr(ExprStmt { expr, .. }) => match &**expr {
      Expr::Lit(Lit::Str(lit)) => &*lit.value == WORKLET_DIRECTIVE,
      _ => false,
    },
    _ => false,
  }
}

pub fn has_worklet_directive(stmts: &[Stmt]) -> bool {
  stmts[..directive_count(stmts)]
    .iter()
    .any(is_worklet_directive)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::{parse_expr, print_expr, squash};

  fn arrow(src: &str) -> WorkletFunction {
    match parse_expr(src) {
      Expr::Arrow(arrow) => WorkletFunction::Arrow(arrow),
      Expr::Fn(expr) => WorkletFunction::Expr(expr),
      other => panic!("not a function: {other:?}"),
    }
  }

  #[test]
  fn detects_only_prologue_directives() {
    assert!(arrow("() => { 'worklet'; return 1; }").has_worklet_directive());
    assert!(arrow("() => { 'use strict'; \"worklet\"; }").has_worklet_directive());
    assert!(!arrow("() => { foo(); 'worklet'; }").has_worklet_directive());
    assert!(!arrow("() => 'worklet'").has_worklet_directive());
    assert!(!arrow("() => { const f = () => { 'worklet'; }; }").has_worklet_directive());
  }

  #[test]
  fn classifies_functions() {
    assert_eq!(
      arrow("() => { 'worklet'; }").classify(false),
      Eligibility::ExplicitDirective
    );
    assert_eq!(arrow("() => {}").classify(true), Eligibility::CallSiteImplied);
    assert_eq!(arrow("() => {}").classify(false), Eligibility::NotAWorklet);
  }

  #[test]
  fn removes_own_directive_but_keeps_nested_ones() {
    let mut function = arrow("() => { 'worklet'; return function () { 'worklet'; }; }");
    function.remove_worklet_directive();

    assert!(!function.has_worklet_directive());
    let printed = squash(&print_expr(&function.into_js_expr()));
    assert_eq!(printed.matches("worklet").count(), 1, "{printed}");
  }

  #[test]
  fn names_worklets() {
    assert_eq!(arrow("function foo() {}").name(), "foo");
    assert_eq!(arrow("function () {}").name(), ANONYMOUS);
    assert_eq!(arrow("() => {}").self_name(), None);
  }

  #[test]
  fn method_keys_name_the_worklet_without_binding_it() {
    let Expr::Object(object) = parse_expr("({ foo() { return foo(); } })") else {
      panic!("not an object");
    };
    let PropOrSpread::Prop(prop) = &object.props[0] else {
      panic!("not a property");
    };
    let Prop::Method(method) = &**prop else {
      panic!("not a method");
    };
    let function = WorkletFunction::Method(method.clone());

    assert_eq!(function.name(), "foo");
    assert_eq!(function.self_name(), None);
  }

  #[test]
  fn arrow_expression_bodies_become_returns() {
    let function = arrow("(a) => a + 1").to_function().unwrap();
    let body = function.body.unwrap();

    assert!(matches!(body.stmts.as_slice(), [Stmt::Return(_)]));
    assert_eq!(function.params.len(), 1);
  }
}
