use im::HashSet;
use swc_core::common::{SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{Visit, VisitWith};

pub fn ident(name: &str) -> Ident {
  Ident {
    span: DUMMY_SP,
    ctxt: SyntaxContext::empty(),
    sym: name.into(),
    optional: false,
  }
}

pub fn ident_name(name: &str) -> IdentName {
  IdentName {
    span: DUMMY_SP,
    sym: name.into(),
  }
}

pub fn ident_expr(name: &str) -> Expr {
  Expr::Ident(ident(name))
}

pub fn str(value: &str) -> Expr {
  Expr::Lit(Lit::Str(Str {
    span: DUMMY_SP,
    value: value.into(),
    raw: None,
  }))
}

/**
 * A numeric literal. Negative values are written as a unary minus applied to their magnitude.
 */
pub fn num(value: f64) -> Expr {
  let literal = |value| {
    Expr::Lit(Lit::Num(Number {
      span: DUMMY_SP,
      value,
      raw: None,
    }))
  };

  if value < 0.0 {
    Expr::Unary(UnaryExpr {
      span: DUMMY_SP,
      op: UnaryOp::Minus,
      arg: Box::new(literal(-value)),
    })
  } else {
    literal(value)
  }
}

pub fn null_expr() -> Expr {
  Expr::Lit(Lit::Null(Null { span: DUMMY_SP }))
}

/**
 * `void 0`
 */
pub fn undefined_expr() -> Expr {
  Expr::Unary(UnaryExpr {
    span: DUMMY_SP,
    op: UnaryOp::Void,
    arg: Box::new(num(0.0)),
  })
}

pub fn this_expr() -> Expr {
  Expr::This(ThisExpr { span: DUMMY_SP })
}

pub fn paren(expr: Expr) -> Expr {
  Expr::Paren(ParenExpr {
    span: DUMMY_SP,
    expr: Box::new(expr),
  })
}

/**
 * `obj.prop`
 */
pub fn member(obj: Expr, prop: &str) -> MemberExpr {
  MemberExpr {
    span: DUMMY_SP,
    obj: Box::new(obj),
    prop: MemberProp::Ident(ident_name(prop)),
  }
}

pub fn member_expr(obj: Expr, prop: &str) -> Expr {
  Expr::Member(member(obj, prop))
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
  Expr::Call(CallExpr {
    span: DUMMY_SP,
    ctxt: SyntaxContext::empty(),
    callee: Callee::Expr(Box::new(callee)),
    args: args.into_iter().map(arg).collect(),
    type_args: None,
  })
}

pub fn arg(expr: Expr) -> ExprOrSpread {
  ExprOrSpread {
    spread: None,
    expr: Box::new(expr),
  }
}

pub fn bin(left: Expr, op: BinaryOp, right: Expr) -> Expr {
  Expr::Bin(BinExpr {
    span: DUMMY_SP,
    op,
    left: Box::new(left),
    right: Box::new(right),
  })
}

pub fn cond(test: Expr, cons: Expr, alt: Expr) -> Expr {
  Expr::Cond(CondExpr {
    span: DUMMY_SP,
    test: Box::new(test),
    cons: Box::new(cons),
    alt: Box::new(alt),
  })
}

/**
 * `(name = value)`
 */
pub fn assign_ident(name: &str, value: Expr) -> Expr {
  paren(Expr::Assign(AssignExpr {
    span: DUMMY_SP,
    op: AssignOp::Assign,
    left: AssignTarget::Simple(SimpleAssignTarget::Ident(BindingIdent::from(ident(name)))),
    right: Box::new(value),
  }))
}

/**
 * `obj.prop = value;`
 */
pub fn assign_member_stmt(obj: &Ident, prop: &str, value: Expr) -> Stmt {
  expr_stmt(Expr::Assign(AssignExpr {
    span: DUMMY_SP,
    op: AssignOp::Assign,
    left: AssignTarget::Simple(SimpleAssignTarget::Member(member(
      Expr::Ident(obj.clone()),
      prop,
    ))),
    right: Box::new(value),
  }))
}

pub fn expr_stmt(expr: Expr) -> Stmt {
  Stmt::Expr(ExprStmt {
    span: DUMMY_SP,
    expr: Box::new(expr),
  })
}

pub fn return_stmt(expr: Expr) -> Stmt {
  Stmt::Return(ReturnStmt {
    span: DUMMY_SP,
    arg: Some(Box::new(expr)),
  })
}

pub fn block(stmts: Vec<Stmt>) -> BlockStmt {
  BlockStmt {
    span: DUMMY_SP,
    ctxt: SyntaxContext::empty(),
    stmts,
  }
}

pub fn var_decl(kind: VarDeclKind, decls: Vec<(Pat, Option<Expr>)>) -> VarDecl {
  VarDecl {
    span: DUMMY_SP,
    ctxt: SyntaxContext::empty(),
    kind,
    declare: false,
    decls: decls
      .into_iter()
      .map(|(name, init)| VarDeclarator {
        span: DUMMY_SP,
        name,
        init: init.map(Box::new),
        definite: false,
      })
      .collect(),
  }
}

/**
 * `const name = init;`
 */
pub fn const_stmt(name: Pat, init: Expr) -> Stmt {
  Stmt::Decl(Decl::Var(Box::new(var_decl(
    VarDeclKind::Const,
    vec![(name, Some(init))],
  ))))
}

pub fn binding(ident: Ident) -> Pat {
  Pat::Ident(BindingIdent::from(ident))
}

/**
 * `{ a, b }` as a destructuring pattern.
 */
pub fn object_pat(names: &[String]) -> Pat {
  Pat::Object(ObjectPat {
    span: DUMMY_SP,
    props: names
      .iter()
      .map(|name| {
        ObjectPatProp::Assign(AssignPatProp {
          span: DUMMY_SP,
          key: BindingIdent::from(ident(name)),
          value: None,
        })
      })
      .collect(),
    optional: false,
    type_ann: None,
  })
}

pub fn key_value(key: &str, value: Expr) -> PropOrSpread {
  PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
    key: PropName::Ident(ident_name(key)),
    value: Box::new(value),
  })))
}

pub fn object(props: Vec<PropOrSpread>) -> ObjectLit {
  ObjectLit {
    span: DUMMY_SP,
    props,
  }
}

pub fn array(elems: Vec<Expr>) -> Expr {
  Expr::Array(ArrayLit {
    span: DUMMY_SP,
    elems: elems.into_iter().map(|elem| Some(arg(elem))).collect(),
  })
}

/**
 * Turns the parameter list of an arrow function into that of a regular function.
 */
pub fn params_from_pats(pats: Vec<Pat>) -> Vec<Param> {
  pats
    .into_iter()
    .map(|pat| Param {
      span: DUMMY_SP,
      decorators: vec![],
      pat,
    })
    .collect()
}

/**
 * Expressions that can be an operand of `+` or the test of a conditional without parentheses.
 */
pub fn is_primary(expr: &Expr) -> bool {
  matches!(
    expr,
    Expr::Ident(_)
      | Expr::Lit(_)
      | Expr::This(_)
      | Expr::Member(_)
      | Expr::SuperProp(_)
      | Expr::Call(_)
      | Expr::Paren(_)
      | Expr::Array(_)
      | Expr::Tpl(_)
      | Expr::TaggedTpl(_)
      | Expr::MetaProp(_)
      | Expr::Unary(_)
      | Expr::Update(_)
      | Expr::Await(_)
  )
}

pub fn paren_if_needed(expr: Expr) -> Expr {
  if is_primary(&expr) {
    expr
  } else {
    paren(expr)
  }
}

/**
 * Strips any number of wrapping parentheses.
 */
pub fn unwrap_parens_mut(expr: &mut Expr) -> &mut Expr {
  match expr {
    Expr::Paren(paren) => unwrap_parens_mut(&mut paren.expr),
    _ => expr,
  }
}

pub fn unwrap_parens(expr: &Expr) -> &Expr {
  match expr {
    Expr::Paren(paren) => unwrap_parens(&paren.expr),
    _ => expr,
  }
}

/// Every identifier name appearing in `node`.
pub fn used_names<N: VisitWith<UsedNames>>(node: &N) -> HashSet<String> {
  let mut visitor = UsedNames::default();
  node.visit_with(&mut visitor);
  visitor.0
}

#[derive(Default)]
pub struct UsedNames(HashSet<String>);

impl Visit for UsedNames {
  fn visit_ident(&mut self, ident: &Ident) {
    self.0.insert(ident.sym.to_string());
  }
}
