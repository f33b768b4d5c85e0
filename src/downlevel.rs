use im::HashSet;
use swc_core::common::{util::take::Take, Span, SyntaxContext};
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::{
  js_util::{
    assign_ident, bin, binding, block, cond, ident, ident_expr, member_expr, null_expr,
    params_from_pats, paren, paren_if_needed, return_stmt, str, this_expr, undefined_expr,
    used_names, var_decl,
  },
  worklet_function::directive_count,
};

/**
 * Rewrites the syntax the worklet runtime's parser does not understand into older equivalents.
 *
 * - template literals become string concatenation
 * - arrow functions become function expressions, with `this` read from a `_this` alias
 * - shorthand properties and object methods become `key: value` properties
 * - optional chaining and nullish coalescing become explicit `null`/`void 0` checks
 *
 * Temporaries are declared with a single `var` at the top of the function that needs them.
 */
pub fn downlevel(function: &mut Function) {
  let used = used_names(&*function);

  function.visit_mut_with(&mut Downlevel {
    used,
    frames: vec![],
  });
}

#[derive(Default)]
struct Frame {
  is_arrow: bool,
  this_alias: Option<String>,
  temps: Vec<String>,
}

impl Frame {
  /// `var _this = this, _ref, _ref2;` after the directive prologue of `stmts`.
  fn declare_in(self, stmts: &mut Vec<Stmt>) {
    let mut decls = vec![];
    if let Some(alias) = &self.this_alias {
      decls.push((binding(ident(alias)), Some(this_expr())));
    }
    decls.extend(self.temps.iter().map(|temp| (binding(ident(temp)), None)));

    if !decls.is_empty() {
      let at = directive_count(stmts);
      stmts.insert(
        at,
        Stmt::Decl(Decl::Var(Box::new(var_decl(VarDeclKind::Var, decls)))),
      );
    }
  }
}

struct Downlevel {
  used: HashSet<String>,
  frames: Vec<Frame>,
}

enum Link {
  Member { span: Span, prop: MemberProp },
  Call { span: Span, args: Vec<ExprOrSpread> },
}

impl Downlevel {
  fn enter(&mut self, is_arrow: bool) {
    self.frames.push(Frame {
      is_arrow,
      ..Default::default()
    });
  }

  fn exit(&mut self) -> Frame {
    self.frames.pop().unwrap_or_default()
  }

  /// `_base`, `_base2`, `_base3`, ... whichever is not used yet.
  fn fresh(&mut self, base: &str) -> String {
    let mut n = 1;
    loop {
      let name = match n {
        1 => format!("_{base}"),
        n => format!("_{base}{n}"),
      };
      if !self.used.contains(&name) {
        self.used.insert(name.clone());
        return name;
      }
      n += 1;
    }
  }

  fn temp(&mut self) -> String {
    let name = self.fresh("ref");
    if let Some(frame) = self.frames.last_mut() {
      frame.temps.push(name.clone());
    }
    name
  }

  /// The alias of the `this` an arrow function sees, if we are inside one.
  fn arrow_this_alias(&mut self) -> Option<String> {
    if !self.frames.last()?.is_arrow {
      return None;
    }
    let owner = self.frames.iter().rposition(|frame| !frame.is_arrow)?;
    if let Some(alias) = &self.frames[owner].this_alias {
      return Some(alias.clone());
    }

    let alias = self.fresh("this");
    self.frames[owner].this_alias = Some(alias.clone());
    Some(alias)
  }

  /**
   * Splits an expression into the value it tests and the value it can be reused as.
   *
   * Identifiers and `this` are read twice as they are, anything else is stored in a temporary.
   */
  fn memoize(&mut self, expr: Expr) -> (Expr, Expr) {
    match expr {
      Expr::Ident(_) | Expr::This(_) => (expr.clone(), expr),
      expr => {
        let temp = self.temp();
        (assign_ident(&temp, expr), ident_expr(&temp))
      }
    }
  }

  /**
   * ```ts
   * a?.b.c(d)
   * // becomes
   * (a === null || a === void 0 ? void 0 : a.b.c(d))
   * ```
   */
  fn lower_optional_chain(&mut self, expr: Expr) -> Expr {
    match self.lower_chain_links(expr) {
      (Some(test), value) => paren(cond(test, undefined_expr(), value)),
      (None, value) => value,
    }
  }

  /**
   * ```ts
   * delete a?.b
   * // becomes
   * (a === null || a === void 0 ? true : delete a.b)
   * ```
   */
  fn lower_optional_delete(&mut self, span: Span, arg: Expr) -> Expr {
    let (test, value) = self.lower_chain_links(arg);
    let delete = Expr::Unary(UnaryExpr {
      span,
      op: UnaryOp::Delete,
      arg: Box::new(value),
    });

    match test {
      Some(test) => paren(cond(test, Expr::Lit(Lit::Bool(true.into())), delete)),
      None => delete,
    }
  }

  /// The combined nullish test of the optional links and the chain with every link made plain.
  fn lower_chain_links(&mut self, expr: Expr) -> (Option<Expr>, Expr) {
    let (root, links) = flatten_chain(expr);
    let mut checks = vec![];
    let mut current = root;

    for (optional, link) in links {
      let mut receiver = None;

      if optional {
        // a.b?.() must still call b with a as this
        if let (Link::Call { .. }, Expr::Member(member)) = (&link, &mut current) {
          let (tested, value) = self.memoize(member.obj.as_mut().take());
          member.obj = Box::new(tested);
          receiver = Some(value);
        }

        let (tested, value) = self.memoize(current);
        checks.push(bin(
          bin(tested, BinaryOp::EqEqEq, null_expr()),
          BinaryOp::LogicalOr,
          bin(value.clone(), BinaryOp::EqEqEq, undefined_expr()),
        ));
        current = value;
      }

      current = match link {
        Link::Member { span, prop } => Expr::Member(MemberExpr {
          span,
          obj: Box::new(current),
          prop,
        }),
        Link::Call { span, mut args } => match receiver {
          Some(receiver) => {
            args.insert(
              0,
              ExprOrSpread {
                spread: None,
                expr: Box::new(receiver),
              },
            );
            Expr::Call(CallExpr {
              span,
              ctxt: SyntaxContext::empty(),
              callee: Callee::Expr(Box::new(member_expr(current, "call"))),
              args,
              type_args: None,
            })
          }
          None => Expr::Call(CallExpr {
            span,
            ctxt: SyntaxContext::empty(),
            callee: Callee::Expr(Box::new(current)),
            args,
            type_args: None,
          }),
        },
      };
    }

    let test = checks
      .into_iter()
      .reduce(|left, right| bin(left, BinaryOp::LogicalOr, right));
    (test, current)
  }

  /**
   * ```ts
   * a ?? b
   * // becomes
   * (a !== null && a !== void 0 ? a : b)
   * ```
   */
  fn lower_nullish(&mut self, left: Expr, right: Expr) -> Expr {
    let (tested, value) = self.memoize(left);
    paren(cond(
      bin(
        bin(tested, BinaryOp::NotEqEq, null_expr()),
        BinaryOp::LogicalAnd,
        bin(value.clone(), BinaryOp::NotEqEq, undefined_expr()),
      ),
      value,
      right,
    ))
  }
}

impl VisitMut for Downlevel {
  fn visit_mut_function(&mut self, function: &mut Function) {
    self.enter(false);
    function.visit_mut_children_with(self);
    let frame = self.exit();
    if let Some(body) = &mut function.body {
      frame.declare_in(&mut body.stmts);
    }
  }

  fn visit_mut_constructor(&mut self, constructor: &mut Constructor) {
    self.enter(false);
    constructor.visit_mut_children_with(self);
    let frame = self.exit();
    if let Some(body) = &mut constructor.body {
      frame.declare_in(&mut body.stmts);
    }
  }

  fn visit_mut_getter_prop(&mut self, getter: &mut GetterProp) {
    self.enter(false);
    getter.visit_mut_children_with(self);
    let frame = self.exit();
    if let Some(body) = &mut getter.body {
      frame.declare_in(&mut body.stmts);
    }
  }

  fn visit_mut_setter_prop(&mut self, setter: &mut SetterProp) {
    self.enter(false);
    setter.visit_mut_children_with(self);
    let frame = self.exit();
    if let Some(body) = &mut setter.body {
      frame.declare_in(&mut body.stmts);
    }
  }

  fn visit_mut_arrow_expr(&mut self, arrow: &mut ArrowExpr) {
    self.enter(true);
    arrow.visit_mut_children_with(self);
    let frame = self.exit();

    if frame.temps.is_empty() {
      return;
    }
    if let BlockStmtOrExpr::Expr(expr) = &mut *arrow.body {
      let returned = return_stmt(expr.as_mut().take());
      *arrow.body = BlockStmtOrExpr::BlockStmt(block(vec![returned]));
    }
    if let BlockStmtOrExpr::BlockStmt(body) = &mut *arrow.body {
      frame.declare_in(&mut body.stmts);
    }
  }

  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    if let Expr::This(this) = expr {
      let span = this.span;
      if let Some(alias) = self.arrow_this_alias() {
        *expr = Expr::Ident(Ident {
          span,
          ..ident(&alias)
        });
      }
      return;
    }

    if let Expr::Unary(UnaryExpr {
      op: UnaryOp::Delete,
      arg,
      span,
    }) = expr
    {
      if is_optional_chain(arg) {
        let span = *span;
        let arg = arg.as_mut().take();
        *expr = self.lower_optional_delete(span, arg);
      }
    } else if is_optional_chain(expr) {
      *expr = self.lower_optional_chain(expr.take());
    }

    expr.visit_mut_children_with(self);

    *expr = match expr.take() {
      Expr::Tpl(tpl) => concat_template(tpl),
      Expr::Arrow(arrow) => Expr::Fn(arrow_to_function(arrow)),
      Expr::Bin(BinExpr {
        op: BinaryOp::NullishCoalescing,
        left,
        right,
        ..
      }) => self.lower_nullish(*left, *right),
      other => other,
    };
  }

  fn visit_mut_prop(&mut self, prop: &mut Prop) {
    prop.visit_mut_children_with(self);

    let replacement = match prop {
      Prop::Shorthand(ident) => Prop::KeyValue(KeyValueProp {
        key: PropName::Ident(IdentName {
          span: ident.span,
          sym: ident.sym.clone(),
        }),
        value: Box::new(Expr::Ident(ident.clone())),
      }),
      Prop::Method(method) => Prop::KeyValue(KeyValueProp {
        key: method.key.clone(),
        value: Box::new(Expr::Fn(FnExpr {
          ident: None,
          function: method.function.clone(),
        })),
      }),
      _ => return,
    };
    *prop = replacement;
  }
}

fn is_optional_chain(expr: &Expr) -> bool {
  match expr {
    Expr::OptChain(_) => true,
    Expr::Member(member) => spine_has_optional_chain(&member.obj),
    Expr::Call(CallExpr {
      callee: Callee::Expr(callee),
      ..
    }) => spine_has_optional_chain(callee),
    _ => false,
  }
}

fn spine_has_optional_chain(expr: &Expr) -> bool {
  match expr {
    Expr::OptChain(_) => true,
    Expr::Member(member) => spine_has_optional_chain(&member.obj),
    Expr::Call(CallExpr {
      callee: Callee::Expr(callee),
      ..
    }) => spine_has_optional_chain(callee),
    _ => false,
  }
}

/// The object a chain starts at, followed by its member accesses and calls in evaluation order.
fn flatten_chain(expr: Expr) -> (Expr, Vec<(bool, Link)>) {
  let mut links = vec![];
  let mut current = expr;

  loop {
    current = match current {
      Expr::OptChain(chain) => match *chain.base {
        OptChainBase::Member(member) => {
          links.push((
            chain.optional,
            Link::Member {
              span: member.span,
              prop: member.prop,
            },
          ));
          *member.obj
        }
        OptChainBase::Call(call) => {
          links.push((
            chain.optional,
            Link::Call {
              span: call.span,
              args: call.args,
            },
          ));
          *call.callee
        }
      },
      Expr::Member(member) if spine_has_optional_chain(&member.obj) => {
        links.push((
          false,
          Link::Member {
            span: member.span,
            prop: member.prop,
          },
        ));
        *member.obj
      }
      Expr::Call(CallExpr {
        span,
        callee: Callee::Expr(callee),
        args,
        ..
      }) if spine_has_optional_chain(&callee) => {
        links.push((false, Link::Call { span, args }));
        *callee
      }
      root => {
        links.reverse();
        return (root, links);
      }
    };
  }
}

/**
 * ```ts
 * `a${b}c${d + 1}`
 * // becomes
 * ("a" + b + "c" + (d + 1))
 * ```
 */
fn concat_template(tpl: Tpl) -> Expr {
  let mut nodes = vec![];
  let mut exprs = tpl.exprs.into_iter();

  for quasi in tpl.quasis {
    if let Some(cooked) = quasi.cooked.filter(|cooked| !cooked.is_empty()) {
      nodes.push(str(&cooked));
    }
    if let Some(expr) = exprs.next() {
      nodes.push(paren_if_needed(*expr));
    }
  }

  let is_string = |node: Option<&Expr>| matches!(node, Some(Expr::Lit(Lit::Str(_))));
  if !is_string(nodes.first()) && !is_string(nodes.get(1)) {
    nodes.insert(0, str(""));
  }

  let count = nodes.len();
  let mut nodes = nodes.into_iter();
  let first = nodes.next().unwrap_or_else(|| str(""));
  let joined = nodes.fold(first, |left, right| bin(left, BinaryOp::Add, right));

  if count > 1 {
    paren(joined)
  } else {
    joined
  }
}

fn arrow_to_function(arrow: ArrowExpr) -> FnExpr {
  let body = match *arrow.body {
    BlockStmtOrExpr::BlockStmt(body) => body,
    BlockStmtOrExpr::Expr(expr) => block(vec![return_stmt(*expr)]),
  };

  FnExpr {
    ident: None,
    function: Box::new(Function {
      params: params_from_pats(arrow.params),
      decorators: vec![],
      span: arrow.span,
      ctxt: arrow.ctxt,
      body: Some(body),
      is_generator: arrow.is_generator,
      is_async: arrow.is_async,
      type_params: None,
      return_type: None,
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    codegen::print_worklet,
    test_util::{parse_function, squash},
  };

  fn lower(src: &str) -> String {
    let mut function = parse_function(src);
    downlevel(&mut function);
    squash(&print_worklet("f", function).unwrap().code)
      .replace(";}", "}")
      .replace('\'', "\"")
  }

  #[test]
  fn templates_become_concatenation() {
    assert_eq!(
      lower("function f(a, b) { return `x${a}y${b + 1}`; }"),
      r#"functionf(a,b){return("x"+a+"y"+(b+1))}"#
    );
    assert_eq!(
      lower("function f(a, b) { return `${a}${b}`; }"),
      r#"functionf(a,b){return(""+a+b)}"#
    );
    assert_eq!(
      lower("function f() { return tag`x${1}`; }"),
      r#"functionf(){returntag`x${1}`}"#
    );
  }

  #[test]
  fn arrows_become_functions_reading_this_from_an_alias() {
    assert_eq!(
      lower("function f() { return () => this.x; }"),
      "functionf(){var_this=this;returnfunction(){return_this.x}}"
    );
    assert_eq!(
      lower("function f() { return function () { return this; }; }"),
      "functionf(){returnfunction(){returnthis}}"
    );
  }

  #[test]
  fn shorthand_properties_and_methods_are_expanded() {
    assert_eq!(
      lower("function f(a) { return { a, m() { return 1; } }; }"),
      "functionf(a){return{a:a,m:function(){return1}}}"
    );
  }

  #[test]
  fn optional_chaining_becomes_null_checks() {
    assert_eq!(
      lower("function f(a) { return a?.b; }"),
      "functionf(a){return(a===null||a===void0?void0:a.b)}"
    );
    assert_eq!(
      lower("function f() { return g()?.b.c; }"),
      "functionf(){var_ref;return((_ref=g())===null||_ref===void0?void0:_ref.b.c)}"
    );
  }

  #[test]
  fn optional_calls_keep_their_receiver() {
    assert_eq!(
      lower("function f(a) { return a.b?.(1); }"),
      "functionf(a){var_ref;return((_ref=a.b)===null||_ref===void0?void0:_ref.call(a,1))}"
    );
  }

  #[test]
  fn optional_deletes_delete_the_plain_member() {
    assert_eq!(
      lower("function f(a) { return delete a?.b; }"),
      "functionf(a){return(a===null||a===void0?true:deletea.b)}"
    );
  }

  #[test]
  fn nullish_coalescing_becomes_null_checks() {
    assert_eq!(
      lower("function f(a) { return a ?? 1; }"),
      "functionf(a){return(a!==null&&a!==void0?a:1)}"
    );
    assert_eq!(
      lower("function f() { return g() ?? 1; }"),
      "functionf(){var_ref;return((_ref=g())!==null&&_ref!==void0?_ref:1)}"
    );
  }

  #[test]
  fn temporaries_avoid_names_in_use() {
    let code = lower("function f(_ref) { return g()?.x ?? _ref; }");

    assert!(code.contains("var_ref2"), "{code}");
    assert!(code.contains("(_ref2=g())"), "{code}");
  }
}
