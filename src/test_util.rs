use swc_core::common::{BytePos, DUMMY_SP};
use swc_core::ecma::ast::*;
use swc_core::ecma::parser::{Parser, StringInput, Syntax, TsSyntax};

use crate::codegen::print_module;

pub fn parse(src: &str) -> Module {
  let input = StringInput::new(src, BytePos(1), BytePos(1 + src.len() as u32));
  let mut parser = Parser::new(
    Syntax::Typescript(TsSyntax {
      tsx: true,
      ..Default::default()
    }),
    input,
    None,
  );

  parser.parse_module().expect("test input should parse")
}

/// The first function declaration of `src`.
pub fn parse_function(src: &str) -> Function {
  parse(src)
    .body
    .into_iter()
    .find_map(|item| match item {
      ModuleItem::Stmt(Stmt::Decl(Decl::Fn(decl))) => Some(*decl.function),
      _ => None,
    })
    .expect("test input should declare a function")
}

pub fn parse_expr(src: &str) -> Expr {
  parse(&format!("({src});"))
    .body
    .into_iter()
    .find_map(|item| match item {
      ModuleItem::Stmt(Stmt::Expr(stmt)) => match *stmt.expr {
        Expr::Paren(paren) => Some(*paren.expr),
        other => Some(other),
      },
      _ => None,
    })
    .expect("test input should be an expression")
}

pub fn print(module: &Module) -> String {
  print_module(module).expect("printing should succeed").code
}

pub fn print_expr(expr: &Expr) -> String {
  let module = Module {
    span: DUMMY_SP,
    body: vec![ModuleItem::Stmt(Stmt::Expr(ExprStmt {
      span: DUMMY_SP,
      expr: Box::new(expr.clone()),
    }))],
    shebang: None,
  };

  print(&module).trim_end_matches(';').to_string()
}

/// Removes all whitespace, for comparing printed code with hand-written expectations.
pub fn squash(code: &str) -> String {
  code.chars().filter(|c| !c.is_whitespace()).collect()
}
