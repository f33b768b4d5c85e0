use std::str::FromStr;

use strum_macros::{AsRefStr, EnumString};
use swc_core::ecma::ast::*;

use crate::js_util::unwrap_parens;

/// APIs whose function arguments are always worklets, whether or not they say so.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum AutoworkletizedCallee {
  UseFrameCallback,
  UseAnimatedStyle,
  UseAnimatedProps,
  CreateAnimatedPropAdapter,
  UseDerivedValue,
  UseAnimatedScrollHandler,
  UseAnimatedReaction,
  UseWorkletCallback,
  WithTiming,
  WithSpring,
  WithDecay,
  WithRepeat,
  #[strum(serialize = "runOnUI")]
  RunOnUi,
  #[strum(serialize = "executeOnUIRuntimeSync")]
  ExecuteOnUiRuntimeSync,
}

impl AutoworkletizedCallee {
  /// Positions of the arguments that are extracted when they are functions.
  pub fn worklet_args(self) -> &'static [usize] {
    match self {
      AutoworkletizedCallee::UseAnimatedReaction => &[0, 1],
      AutoworkletizedCallee::WithTiming | AutoworkletizedCallee::WithSpring => &[2],
      AutoworkletizedCallee::WithDecay => &[1],
      AutoworkletizedCallee::WithRepeat => &[3],
      _ => &[0],
    }
  }
}

/// Hooks taking an object whose every function property is a worklet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ObjectHook {
  UseAnimatedGestureHandler,
  /// Also accepts a single function.
  UseAnimatedScrollHandler,
}

/// What a recognized call wants extracted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallSite {
  Arguments(AutoworkletizedCallee),
  ObjectHook(ObjectHook),
}

impl CallSite {
  /// Object hooks take precedence over the argument table.
  pub fn from_name(name: &str) -> Option<CallSite> {
    ObjectHook::from_str(name)
      .map(CallSite::ObjectHook)
      .or_else(|_| AutoworkletizedCallee::from_str(name).map(CallSite::Arguments))
      .ok()
  }
}

/**
 * The name a call is known by.
 *
 * ```ts
 * runOnUI(fn);             // runOnUI
 * Animated.withTiming();   // withTiming
 * (0, module.withSpring)() // withSpring
 * obj['withDecay']()       // none
 * ```
 */
pub fn callee_name(callee: &Callee) -> Option<&str> {
  let Callee::Expr(expr) = callee else {
    return None;
  };

  let expr = match unwrap_parens(expr) {
    Expr::Seq(seq) => unwrap_parens(seq.exprs.last()?),
    expr => expr,
  };

  match expr {
    Expr::Ident(ident) => Some(&*ident.sym),
    Expr::Member(MemberExpr {
      prop: MemberProp::Ident(prop),
      ..
    }) => Some(&*prop.sym),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::parse_expr;

  fn name_of(src: &str) -> Option<String> {
    match parse_expr(src) {
      Expr::Call(call) => callee_name(&call.callee).map(String::from),
      other => panic!("not a call: {other:?}"),
    }
  }

  #[test]
  fn resolves_callee_names() {
    assert_eq!(name_of("runOnUI(f)").as_deref(), Some("runOnUI"));
    assert_eq!(name_of("Animated.withTiming(1)").as_deref(), Some("withTiming"));
    assert_eq!(name_of("(0, module.withSpring)(1)").as_deref(), Some("withSpring"));
    assert_eq!(name_of("obj['withDecay']()"), None);
    assert_eq!(name_of("f()()"), None);
  }

  #[test]
  fn maps_apis_to_argument_positions() {
    let args = |name: &str| match CallSite::from_name(name) {
      Some(CallSite::Arguments(callee)) => callee.worklet_args().to_vec(),
      _ => vec![],
    };

    assert_eq!(args("runOnUI"), vec![0]);
    assert_eq!(args("executeOnUIRuntimeSync"), vec![0]);
    assert_eq!(args("useAnimatedReaction"), vec![0, 1]);
    assert_eq!(args("withTiming"), vec![2]);
    assert_eq!(args("withDecay"), vec![1]);
    assert_eq!(args("withRepeat"), vec![3]);
    assert_eq!(args("useAnimatedStyle"), vec![0]);
    assert_eq!(args("runOnJS"), Vec::<usize>::new());
  }

  #[test]
  fn object_hooks_take_precedence() {
    assert_eq!(
      CallSite::from_name("useAnimatedScrollHandler"),
      Some(CallSite::ObjectHook(ObjectHook::UseAnimatedScrollHandler))
    );
    assert_eq!(
      CallSite::from_name("useAnimatedGestureHandler"),
      Some(CallSite::ObjectHook(ObjectHook::UseAnimatedGestureHandler))
    );
    assert_eq!(CallSite::from_name("RunOnUI"), None);
  }
}
