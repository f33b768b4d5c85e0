use std::str::FromStr;

use strum_macros::EnumString;
use swc_core::ecma::ast::*;

/// Platform checks that are known to be `true` when building for the web.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum WebPlatformCheck {
  IsWeb,
  ShouldBeUseWeb,
}

/**
 * Replaces `isWeb()` and `shouldBeUseWeb()` with `true`. Returns whether `expr` was replaced.
 *
 * Only direct calls are substituted, `Platform.isWeb()` is left alone.
 */
pub fn substitute_web_platform_check(expr: &mut Expr) -> bool {
  let span = match expr {
    Expr::Call(CallExpr {
      span,
      callee: Callee::Expr(callee),
      ..
    }) if is_web_platform_check(callee) => *span,
    _ => return false,
  };

  *expr = Expr::Lit(Lit::Bool(Bool { span, value: true }));
  true
}

fn is_web_platform_check(callee: &Expr) -> bool {
  matches!(callee, Expr::Ident(ident) if WebPlatformCheck::from_str(&ident.sym).is_ok())
}
