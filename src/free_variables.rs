use std::collections::{HashMap, HashSet};

use swc_core::common::Span;
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::{globals::KnownGlobals, lexical_scope::LexicalScope, worklet_function::WorkletFunction};

/// An identifier a worklet reads from outside of its own body.
#[derive(Clone, Debug)]
pub struct ClosureBinding {
  /// The first reference found, keeping its syntax context so the factory refers to the same binding.
  pub ident: Ident,
  /// First use in the function as written, before any down-leveling.
  pub span: Span,
}

impl ClosureBinding {
  pub fn name(&self) -> &str {
    &self.ident.sym
  }
}

#[derive(Clone, Debug, Default)]
pub struct Closure {
  /// Captured names in discovery order.
  pub bindings: Vec<ClosureBinding>,
  /// The function refers to itself by name.
  pub is_recursive: bool,
}

impl Closure {
  pub fn names(&self) -> Vec<String> {
    self
      .bindings
      .iter()
      .map(|binding| binding.name().to_string())
      .collect()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.bindings.iter().any(|binding| binding.name() == name)
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.is_empty()
  }

  pub fn len(&self) -> usize {
    self.bindings.len()
  }
}

/**
 * Computes the closure of a (down-leveled) worklet function.
 *
 * An identifier is captured when it is read, is not bound anywhere between its use and the
 * worklet's own parameters, is not the worklet's own name and is not a known global.
 *
 * ```ts
 * const outer = 1;
 * function w(x) {
 *   const y = 2;
 *   console.log(x, y, outer, obj.prop); // captures outer and obj
 * }
 * ```
 */
pub fn discover_free_variables(
  function: &Function,
  self_name: Option<&str>,
  globals: &KnownGlobals,
) -> Closure {
  let mut visitor = FreeVariables {
    scope: LexicalScope::new(),
    globals,
    self_name,
    seen: HashSet::new(),
    closure: Closure::default(),
  };

  function.visit_with(&mut visitor);

  visitor.closure
}

/**
 * Points every binding at its first use in the function as it was written.
 *
 * Down-leveling rewrites and reorders code, so the reference found while resolving is not
 * necessarily the one a developer would expect an error to point at.
 */
pub fn attach_first_use_spans(closure: &mut Closure, original: &WorkletFunction) {
  let mut visitor = FirstUse {
    wanted: closure.bindings.iter().map(|b| b.name().to_string()).collect(),
    found: HashMap::new(),
  };

  match original {
    WorkletFunction::Decl(FnDecl { function, .. })
    | WorkletFunction::Expr(FnExpr { function, .. })
    | WorkletFunction::Method(MethodProp { function, .. }) => (**function).visit_with(&mut visitor),
    WorkletFunction::Arrow(arrow) => arrow.visit_with(&mut visitor),
  }

  for binding in closure.bindings.iter_mut() {
    if let Some(span) = visitor.found.get(binding.name()) {
      binding.span = *span;
    }
  }
}

struct FreeVariables<'a> {
  scope: LexicalScope,
  globals: &'a KnownGlobals,
  self_name: Option<&'a str>,
  seen: HashSet<String>,
  closure: Closure,
}

impl FreeVariables<'_> {
  fn reference(&mut self, ident: &Ident) {
    let name: &str = &ident.sym;

    if self.scope.is_bound(name) {
      return;
    }
    if self.self_name == Some(name) {
      self.closure.is_recursive = true;
      return;
    }
    if self.globals.contains(name) {
      return;
    }
    if self.seen.insert(name.to_string()) {
      self.closure.bindings.push(ClosureBinding {
        ident: ident.clone(),
        span: ident.span,
      });
    }
  }

  fn scoped<F: FnOnce(&mut Self)>(&mut self, f: F) {
    self.scope.enter();
    f(self);
    self.scope.exit();
  }
}

impl Visit for FreeVariables<'_> {
  fn visit_expr(&mut self, expr: &Expr) {
    if let Expr::Ident(ident) = expr {
      self.reference(ident);
    }
    expr.visit_children_with(self);
  }

  fn visit_prop(&mut self, prop: &Prop) {
    // { a } reads a, { a: b } only reads b
    if let Prop::Shorthand(ident) = prop {
      self.reference(ident);
    }
    prop.visit_children_with(self);
  }

  fn visit_function(&mut self, function: &Function) {
    self.scoped(|this| {
      this.scope.bind_params(&function.params);
      if let Some(body) = &function.body {
        this.scope.bind_hoisted_vars(&body.stmts);
      }
      function.visit_children_with(this);
    });
  }

  fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
    self.scoped(|this| {
      arrow.params.iter().for_each(|pat| this.scope.bind_pat(pat));
      if let BlockStmtOrExpr::BlockStmt(body) = &*arrow.body {
        this.scope.bind_hoisted_vars(&body.stmts);
      }
      arrow.visit_children_with(this);
    });
  }

  fn visit_fn_expr(&mut self, fn_expr: &FnExpr) {
    self.scoped(|this| {
      if let Some(ident) = &fn_expr.ident {
        this.scope.bind_ident(ident);
      }
      fn_expr.visit_children_with(this);
    });
  }

  fn visit_class_expr(&mut self, class_expr: &ClassExpr) {
    self.scoped(|this| {
      if let Some(ident) = &class_expr.ident {
        this.scope.bind_ident(ident);
      }
      class_expr.visit_children_with(this);
    });
  }

  fn visit_constructor(&mut self, constructor: &Constructor) {
    self.scoped(|this| {
      for param in constructor.params.iter() {
        match param {
          ParamOrTsParamProp::Param(param) => this.scope.bind_pat(&param.pat),
          ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
            TsParamPropParam::Ident(ident) => this.scope.bind_ident(&ident.id),
            TsParamPropParam::Assign(assign) => this.scope.bind_pat(&assign.left),
          },
        }
      }
      if let Some(body) = &constructor.body {
        this.scope.bind_hoisted_vars(&body.stmts);
      }
      constructor.visit_children_with(this);
    });
  }

  fn visit_getter_prop(&mut self, getter: &GetterProp) {
    self.scoped(|this| {
      if let Some(body) = &getter.body {
        this.scope.bind_hoisted_vars(&body.stmts);
      }
      getter.visit_children_with(this);
    });
  }

  fn visit_setter_prop(&mut self, setter: &SetterProp) {
    self.scoped(|this| {
      this.scope.bind_pat(&setter.param);
      if let Some(body) = &setter.body {
        this.scope.bind_hoisted_vars(&body.stmts);
      }
      setter.visit_children_with(this);
    });
  }

  fn visit_block_stmt(&mut self, block: &BlockStmt) {
    self.scoped(|this| {
      this.scope.bind_block_decls(&block.stmts);
      block.visit_children_with(this);
    });
  }

  fn visit_for_stmt(&mut self, for_stmt: &ForStmt) {
    self.scoped(|this| {
      if let Some(VarDeclOrExpr::VarDecl(var)) = &for_stmt.init {
        this.scope.bind_var_decl(var);
      }
      for_stmt.visit_children_with(this);
    });
  }

  fn visit_for_in_stmt(&mut self, for_in: &ForInStmt) {
    self.scoped(|this| {
      if let ForHead::VarDecl(var) = &for_in.left {
        this.scope.bind_var_decl(var);
      }
      for_in.visit_children_with(this);
    });
  }

  fn visit_for_of_stmt(&mut self, for_of: &ForOfStmt) {
    self.scoped(|this| {
      if let ForHead::VarDecl(var) = &for_of.left {
        this.scope.bind_var_decl(var);
      }
      for_of.visit_children_with(this);
    });
  }

  fn visit_catch_clause(&mut self, catch: &CatchClause) {
    self.scoped(|this| {
      if let Some(param) = &catch.param {
        this.scope.bind_pat(param);
      }
      catch.visit_children_with(this);
    });
  }

  fn visit_switch_stmt(&mut self, switch: &SwitchStmt) {
    switch.discriminant.visit_with(self);
    self.scoped(|this| {
      for case in switch.cases.iter() {
        this.scope.bind_block_decls(&case.cons);
      }
      switch.cases.visit_with(this);
    });
  }
}

struct FirstUse {
  wanted: HashSet<String>,
  found: HashMap<String, Span>,
}

impl FirstUse {
  fn reference(&mut self, ident: &Ident) {
    let name: &str = &ident.sym;
    if self.wanted.contains(name) && !self.found.contains_key(name) {
      self.found.insert(name.to_string(), ident.span);
    }
  }
}

impl Visit for FirstUse {
  fn visit_expr(&mut self, expr: &Expr) {
    if let Expr::Ident(ident) = expr {
      self.reference(ident);
    }
    expr.visit_children_with(self);
  }

  fn visit_prop(&mut self, prop: &Prop) {
    if let Prop::Shorthand(ident) = prop {
      self.reference(ident);
    }
    prop.visit_children_with(self);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::{parse_expr, parse_function};

  fn closure_of(src: &str) -> Closure {
    let function = parse_function(src);
    discover_free_variables(&function, Some("w"), &KnownGlobals::default())
  }

  #[test]
  fn captures_only_outer_names() {
    let closure = closure_of("function w(x) { const y = 1; console.log(x, y, outer); }");

    assert_eq!(closure.names(), vec!["outer"]);
    assert!(!closure.is_recursive);
  }

  #[test]
  fn member_properties_are_not_references() {
    let closure = closure_of("function w() { return a.b + c[d]; }");

    assert_eq!(closure.names(), vec!["a", "c", "d"]);
  }

  #[test]
  fn object_keys_are_not_references_but_shorthands_are() {
    let closure = closure_of("function w() { return { key: value, short }; }");

    assert_eq!(closure.names(), vec!["value", "short"]);
  }

  #[test]
  fn destructured_and_rest_params_stay_local() {
    let closure = closure_of(
      "function w({ a, b: [c] }, ...rest) { const { d, ...e } = a; return [a, c, rest, d, e, f]; }",
    );

    assert_eq!(closure.names(), vec!["f"]);
  }

  #[test]
  fn respects_nested_scopes() {
    let closure = closure_of(
      "function w() {
        if (x) { var hoisted = 1; }
        for (let i = 0; i < n; i++) { try { g(i); } catch (err) { h(err); } }
        const inner = function named() { return named; };
        return [hoisted, i];
      }",
    );

    assert_eq!(closure.names(), vec!["x", "n", "g", "h", "i"]);
  }

  #[test]
  fn names_are_deduplicated_in_discovery_order() {
    let closure = closure_of("function w() { b(); a(); b(); }");

    assert_eq!(closure.names(), vec!["b", "a"]);
  }

  #[test]
  fn recursive_self_reference_is_excluded() {
    let closure = closure_of("function w(n) { return n > 0 ? w(n - 1) : base; }");

    assert_eq!(closure.names(), vec!["base"]);
    assert!(closure.is_recursive);
  }

  #[test]
  fn assignment_targets_are_not_references() {
    let closure = closure_of("function w() { x = 1; y.z = 2; }");

    assert_eq!(closure.names(), vec!["y"]);
  }

  #[test]
  fn custom_globals_are_excluded() {
    let function = parse_function("function w() { return helper(other); }");
    let globals = KnownGlobals::new(&["helper".to_string()]);

    let closure = discover_free_variables(&function, None, &globals);

    assert_eq!(closure.names(), vec!["other"]);
  }

  #[test]
  fn first_use_points_at_the_original_code() {
    let original = match parse_expr("() => { return `${a}` + a; }") {
      Expr::Arrow(arrow) => WorkletFunction::Arrow(arrow),
      _ => unreachable!(),
    };
    let function = original.to_function().unwrap();
    let mut closure = discover_free_variables(&function, None, &KnownGlobals::default());
    let resolved_span = closure.bindings[0].span;

    attach_first_use_spans(&mut closure, &original);

    assert_eq!(closure.names(), vec!["a"]);
    assert_eq!(closure.bindings[0].span, resolved_span);
    assert!(!closure.bindings[0].span.is_dummy());
  }
}
