use std::str::FromStr;

use strum_macros::EnumString;
use swc_core::ecma::ast::*;

/// Objects created by `Gesture.<Object>()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
pub enum GestureObject {
  Tap,
  Pan,
  Pinch,
  Rotation,
  Fling,
  LongPress,
  ForceTouch,
  Native,
  Manual,
  Race,
  Simultaneous,
  Exclusive,
  Hover,
}

/// Builder methods whose callback runs on the UI thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum GestureCallback {
  OnBegin,
  OnStart,
  OnEnd,
  OnFinalize,
  OnUpdate,
  OnChange,
  OnTouchesDown,
  OnTouchesMove,
  OnTouchesUp,
  OnTouchesCancelled,
}

/**
 * Whether arguments of a call to `callee` are gesture callbacks.
 *
 * ```ts
 * Gesture.Tap().numberOfTaps(2).onEnd(callback);
 * ```
 */
pub fn is_gesture_callback(callee: &Callee) -> bool {
  match callee {
    Callee::Expr(expr) => match &**expr {
      Expr::Member(MemberExpr {
        obj,
        prop: MemberProp::Ident(prop),
        ..
      }) => GestureCallback::from_str(&prop.sym).is_ok() && contains_gesture_object(obj),
      _ => false,
    },
    _ => false,
  }
}

/// `Gesture.Pan()`, possibly followed by any chain of method calls.
fn contains_gesture_object(expr: &Expr) -> bool {
  if is_gesture_object(expr) {
    return true;
  }

  match expr {
    Expr::Call(CallExpr {
      callee: Callee::Expr(callee),
      ..
    }) => match &**callee {
      Expr::Member(member) => contains_gesture_object(&member.obj),
      _ => false,
    },
    _ => false,
  }
}

fn is_gesture_object(expr: &Expr) -> bool {
  let Expr::Call(CallExpr {
    callee: Callee::Expr(callee),
    ..
  }) = expr
  else {
    return false;
  };

  match &**callee {
    Expr::Member(MemberExpr {
      obj,
      prop: MemberProp::Ident(prop),
      ..
    }) => {
      matches!(&**obj, Expr::Ident(ident) if &*ident.sym == "Gesture")
        && GestureObject::from_str(&prop.sym).is_ok()
    }
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::parse_expr;

  fn is_callback_call(src: &str) -> bool {
    match parse_expr(src) {
      Expr::Call(call) => is_gesture_callback(&call.callee),
      other => panic!("not a call: {other:?}"),
    }
  }

  #[test]
  fn recognizes_builder_chains() {
    assert!(is_callback_call("Gesture.Tap().onEnd(f)"));
    assert!(is_callback_call("Gesture.Pan().minDistance(2).enabled(true).onUpdate(f)"));
    assert!(is_callback_call("Gesture.Tap().onStart(f).onTouchesCancelled(g)"));
  }

  #[test]
  fn ignores_other_chains() {
    assert!(!is_callback_call("Gesture.Tap().numberOfTaps(f)"));
    assert!(!is_callback_call("Gesture.Swipe().onEnd(f)"));
    assert!(!is_callback_call("Gestures.Tap().onEnd(f)"));
    assert!(!is_callback_call("tap.onEnd(f)"));
    assert!(!is_callback_call("onEnd(f)"));
  }
}
