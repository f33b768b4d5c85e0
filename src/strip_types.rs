use swc_core::common::util::take::Take;
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

/**
 * Removes TypeScript syntax from worklet code, which runs on a plain JavaScript engine.
 *
 * ```ts
 * function (a: number, b?: string): void { return (a as any)!; }
 * // becomes
 * function (a, b) { return a; }
 * ```
 */
pub struct StripTypes;

impl VisitMut for StripTypes {
  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    loop {
      let inner = match expr {
        Expr::TsAs(TsAsExpr { expr: inner, .. })
        | Expr::TsSatisfies(TsSatisfiesExpr { expr: inner, .. })
        | Expr::TsNonNull(TsNonNullExpr { expr: inner, .. })
        | Expr::TsTypeAssertion(TsTypeAssertion { expr: inner, .. })
        | Expr::TsConstAssertion(TsConstAssertion { expr: inner, .. })
        | Expr::TsInstantiation(TsInstantiation { expr: inner, .. }) => (**inner).take(),
        Expr::Paren(ParenExpr { expr: inner, .. }) if is_parenthesized_assertion(inner) => {
          (**inner).take()
        }
        _ => break,
      };
      *expr = inner;
    }

    expr.visit_mut_children_with(self);
  }

  fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
    stmts.retain(|stmt| !is_type_only(stmt));
    stmts.visit_mut_children_with(self);
  }

  fn visit_mut_params(&mut self, params: &mut Vec<Param>) {
    // function (this: Foo) {}
    params.retain(|param| match &param.pat {
      Pat::Ident(ident) => &*ident.id.sym != "this",
      _ => true,
    });
    params.visit_mut_children_with(self);
  }

  fn visit_mut_binding_ident(&mut self, ident: &mut BindingIdent) {
    ident.type_ann = None;
    ident.id.optional = false;
  }

  fn visit_mut_array_pat(&mut self, pat: &mut ArrayPat) {
    pat.type_ann = None;
    pat.optional = false;
    pat.visit_mut_children_with(self);
  }

  fn visit_mut_object_pat(&mut self, pat: &mut ObjectPat) {
    pat.type_ann = None;
    pat.optional = false;
    pat.visit_mut_children_with(self);
  }

  fn visit_mut_rest_pat(&mut self, pat: &mut RestPat) {
    pat.type_ann = None;
    pat.visit_mut_children_with(self);
  }

  fn visit_mut_function(&mut self, function: &mut Function) {
    function.type_params = None;
    function.return_type = None;
    function.visit_mut_children_with(self);
  }

  fn visit_mut_arrow_expr(&mut self, arrow: &mut ArrowExpr) {
    arrow.type_params = None;
    arrow.return_type = None;
    arrow.visit_mut_children_with(self);
  }

  fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
    call.type_args = None;
    call.visit_mut_children_with(self);
  }

  fn visit_mut_new_expr(&mut self, new: &mut NewExpr) {
    new.type_args = None;
    new.visit_mut_children_with(self);
  }

  fn visit_mut_opt_call(&mut self, call: &mut OptCall) {
    call.type_args = None;
    call.visit_mut_children_with(self);
  }

  fn visit_mut_tagged_tpl(&mut self, tpl: &mut TaggedTpl) {
    tpl.type_params = None;
    tpl.visit_mut_children_with(self);
  }

  fn visit_mut_class(&mut self, class: &mut Class) {
    class.type_params = None;
    class.super_type_params = None;
    class.implements.clear();
    class.is_abstract = false;
    class
      .body
      .retain(|member| !matches!(member, ClassMember::TsIndexSignature(_)));
    class.visit_mut_children_with(self);
  }

  fn visit_mut_class_prop(&mut self, prop: &mut ClassProp) {
    prop.type_ann = None;
    prop.accessibility = None;
    prop.definite = false;
    prop.readonly = false;
    prop.is_optional = false;
    prop.visit_mut_children_with(self);
  }

  fn visit_mut_class_method(&mut self, method: &mut ClassMethod) {
    method.accessibility = None;
    method.is_optional = false;
    method.visit_mut_children_with(self);
  }
}

/// `a as T` or `(a)!` inside parentheses that are not needed once the assertion is gone.
fn is_parenthesized_assertion(expr: &Expr) -> bool {
  let mut expr = expr;
  let mut asserted = false;
  loop {
    match expr {
      Expr::TsAs(TsAsExpr { expr: inner, .. })
      | Expr::TsSatisfies(TsSatisfiesExpr { expr: inner, .. })
      | Expr::TsNonNull(TsNonNullExpr { expr: inner, .. })
      | Expr::TsTypeAssertion(TsTypeAssertion { expr: inner, .. })
      | Expr::TsConstAssertion(TsConstAssertion { expr: inner, .. })
      | Expr::TsInstantiation(TsInstantiation { expr: inner, .. }) => {
        asserted = true;
        expr = inner;
      }
      Expr::Paren(ParenExpr { expr: inner, .. }) => expr = inner,
      Expr::Ident(_)
      | Expr::Lit(_)
      | Expr::This(_)
      | Expr::Member(_)
      | Expr::Call(_)
      | Expr::Array(_) => return asserted,
      _ => return false,
    }
  }
}

fn is_type_only(stmt: &Stmt) -> bool {
  match stmt {
    Stmt::Decl(Decl::TsInterface(_)) | Stmt::Decl(Decl::TsTypeAlias(_)) => true,
    Stmt::Decl(Decl::Var(var)) => var.declare,
    Stmt::Decl(Decl::Fn(func)) => func.declare || func.function.body.is_none(),
    Stmt::Decl(Decl::Class(class)) => class.declare,
    _ => false,
  }
}
