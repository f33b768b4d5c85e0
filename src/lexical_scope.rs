use im::HashSet;
use swc_core::ecma::ast::*;

/**
 * The set of names declared at some point of a worklet body.
 */
pub type Names = HashSet<String>;

/**
 * A stack of the names visible inside a worklet, from its own parameters down to the innermost
 * block being visited.
 *
 * Every frame starts as a copy of its parent, so a lookup only ever inspects the top of the stack.
 * Cloning an immutable set is O(1) and the frames share their data.
 */
#[derive(Clone, Debug)]
pub struct LexicalScope {
  stack: Vec<Names>,
}

impl Default for LexicalScope {
  fn default() -> Self {
    LexicalScope::new()
  }
}

impl LexicalScope {
  pub fn new() -> LexicalScope {
    LexicalScope {
      stack: vec![Names::new()],
    }
  }

  pub fn is_bound(&self, name: &str) -> bool {
    self
      .stack
      .last()
      .map(|names| names.contains(name))
      .unwrap_or(false)
  }

  /**
   * Push a frame that inherits every name of its parent.
   */
  pub fn enter(&mut self) {
    let names = self.stack.last().cloned().unwrap_or_default();
    self.stack.push(names);
  }

  pub fn exit(&mut self) {
    // the root frame is never popped
    if self.stack.len() > 1 {
      self.stack.pop();
    }
  }

  pub fn bind_name(&mut self, name: &str) {
    if let Some(names) = self.stack.last_mut() {
      names.insert(name.to_string());
    }
  }

  pub fn bind_ident(&mut self, ident: &Ident) {
    self.bind_name(&ident.sym);
  }

  /**
   * Binds the names produced by a [binding pattern](Pat).
   *
   * ```ts
   * // patterns:
   * a
   * {b}
   * {d: c}
   * [d, ...e];
   * ```
   */
  pub fn bind_pat(&mut self, pat: &Pat) {
    match pat {
      Pat::Ident(ident) => self.bind_ident(&ident.id),
      Pat::Object(object) => {
        for prop in object.props.iter() {
          match prop {
            ObjectPatProp::Assign(assign) => self.bind_ident(&assign.key.id),
            ObjectPatProp::KeyValue(kv) => self.bind_pat(&kv.value),
            ObjectPatProp::Rest(rest) => self.bind_pat(&rest.arg),
          }
        }
      }
      Pat::Array(array) => array
        .elems
        .iter()
        .flatten()
        .for_each(|element| self.bind_pat(element)),
      // (a = value) => {}
      Pat::Assign(assign) => self.bind_pat(&assign.left),
      Pat::Rest(rest) => self.bind_pat(&rest.arg),
      Pat::Expr(_) | Pat::Invalid(_) => {}
    }
  }

  pub fn bind_params(&mut self, params: &[Param]) {
    params.iter().for_each(|param| self.bind_pat(&param.pat));
  }

  pub fn bind_var_decl(&mut self, var: &VarDecl) {
    var.decls.iter().for_each(|decl| self.bind_pat(&decl.name));
  }

  /**
   * Binds the declarations that are scoped to the block holding `stmts`: `let`, `const`, classes
   * and function declarations.
   */
  pub fn bind_block_decls(&mut self, stmts: &[Stmt]) {
    for stmt in stmts {
      match stmt {
        Stmt::Decl(Decl::Var(var)) if var.kind != VarDeclKind::Var => self.bind_var_decl(var),
        Stmt::Decl(Decl::Fn(func)) => self.bind_ident(&func.ident),
        Stmt::Decl(Decl::Class(class)) => self.bind_ident(&class.ident),
        _ => {}
      }
    }
  }

  /**
   * Hoists every `var` declared anywhere in `stmts` without descending into nested functions.
   *
   * ```ts
   * function foo() {
   *   if (a) {
   *     var x = 1; // visible in all of foo
   *   }
   * }
   * ```
   */
  pub fn bind_hoisted_vars(&mut self, stmts: &[Stmt]) {
    stmts.iter().for_each(|stmt| self.bind_hoisted_vars_in(stmt));
  }

  fn bind_hoisted_vars_in(&mut self, stmt: &Stmt) {
    match stmt {
      Stmt::Decl(Decl::Var(var)) if var.kind == VarDeclKind::Var => self.bind_var_decl(var),
      Stmt::Block(block) => self.bind_hoisted_vars(&block.stmts),
      Stmt::If(if_stmt) => {
        self.bind_hoisted_vars_in(&if_stmt.cons);
        if let Some(alt) = &if_stmt.alt {
          self.bind_hoisted_vars_in(alt);
        }
      }
      Stmt::For(for_stmt) => {
        if let Some(VarDeclOrExpr::VarDecl(var)) = &for_stmt.init {
          if var.kind == VarDeclKind::Var {
            self.bind_var_decl(var);
          }
        }
        self.bind_hoisted_vars_in(&for_stmt.body);
      }
      Stmt::ForIn(ForInStmt { left, body, .. }) | Stmt::ForOf(ForOfStmt { left, body, .. }) => {
        if let ForHead::VarDecl(var) = left {
          if var.kind == VarDeclKind::Var {
            self.bind_var_decl(var);
          }
        }
        self.bind_hoisted_vars_in(body);
      }
      Stmt::While(WhileStmt { body, .. })
      | Stmt::DoWhile(DoWhileStmt { body, .. })
      | Stmt::Labeled(LabeledStmt { body, .. })
      | Stmt::With(WithStmt { body, .. }) => self.bind_hoisted_vars_in(body),
      Stmt::Try(try_stmt) => {
        self.bind_hoisted_vars(&try_stmt.block.stmts);
        if let Some(handler) = &try_stmt.handler {
          self.bind_hoisted_vars(&handler.body.stmts);
        }
        if let Some(finalizer) = &try_stmt.finalizer {
          self.bind_hoisted_vars(&finalizer.stmts);
        }
      }
      Stmt::Switch(switch) => switch
        .cases
        .iter()
        .for_each(|case| self.bind_hoisted_vars(&case.cons)),
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::parse_function;

  #[test]
  fn frames_inherit_and_forget_names() {
    let mut scope = LexicalScope::new();
    scope.bind_name("a");
    scope.enter();
    scope.bind_name("b");

    assert!(scope.is_bound("a"));
    assert!(scope.is_bound("b"));

    scope.exit();
    assert!(scope.is_bound("a"));
    assert!(!scope.is_bound("b"));

    // the root frame survives extra exits
    scope.exit();
    scope.exit();
    assert!(scope.is_bound("a"));
  }

  #[test]
  fn binds_destructured_params() {
    let function = parse_function("function f({ a, b: [c, ...d] }, e = 1, ...rest) {}");
    let mut scope = LexicalScope::new();
    scope.bind_params(&function.params);

    for name in ["a", "c", "d", "e", "rest"] {
      assert!(scope.is_bound(name), "{name}");
    }
    assert!(!scope.is_bound("b"));
  }

  #[test]
  fn hoists_nested_vars_but_not_block_scoped_names() {
    let function = parse_function(
      "function f() { if (x) { var a = 1; let b = 2; } for (var i = 0;;) {} function g() { var h; } }",
    );
    let stmts = &function.body.as_ref().unwrap().stmts;
    let mut scope = LexicalScope::new();
    scope.bind_hoisted_vars(stmts);

    assert!(scope.is_bound("a"));
    assert!(scope.is_bound("i"));
    assert!(!scope.is_bound("b"));
    assert!(!scope.is_bound("h"));

    scope.bind_block_decls(stmts);
    assert!(scope.is_bound("g"));
  }
}
