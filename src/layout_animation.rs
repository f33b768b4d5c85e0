use std::str::FromStr;

use strum_macros::EnumString;
use swc_core::ecma::ast::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
pub enum EntryExitAnimation {
  BounceIn,
  BounceInDown,
  BounceInLeft,
  BounceInRight,
  BounceInUp,
  BounceOut,
  BounceOutDown,
  BounceOutLeft,
  BounceOutRight,
  BounceOutUp,
  FadeIn,
  FadeInDown,
  FadeInLeft,
  FadeInRight,
  FadeInUp,
  FadeOut,
  FadeOutDown,
  FadeOutLeft,
  FadeOutRight,
  FadeOutUp,
  FlipInEasyX,
  FlipInEasyY,
  FlipInXDown,
  FlipInXUp,
  FlipInYLeft,
  FlipInYRight,
  FlipOutEasyX,
  FlipOutEasyY,
  FlipOutXDown,
  FlipOutXUp,
  FlipOutYLeft,
  FlipOutYRight,
  LightSpeedInLeft,
  LightSpeedInRight,
  LightSpeedOutLeft,
  LightSpeedOutRight,
  PinwheelIn,
  PinwheelOut,
  RollInLeft,
  RollInRight,
  RollOutLeft,
  RollOutRight,
  RotateInDownLeft,
  RotateInDownRight,
  RotateInUpLeft,
  RotateInUpRight,
  RotateOutDownLeft,
  RotateOutDownRight,
  RotateOutUpLeft,
  RotateOutUpRight,
  SlideInDown,
  SlideInLeft,
  SlideInRight,
  SlideInUp,
  SlideOutDown,
  SlideOutLeft,
  SlideOutRight,
  SlideOutUp,
  StretchInX,
  StretchInY,
  StretchOutX,
  StretchOutY,
  ZoomIn,
  ZoomInDown,
  ZoomInEasyDown,
  ZoomInEasyUp,
  ZoomInLeft,
  ZoomInRight,
  ZoomInRotate,
  ZoomInUp,
  ZoomOut,
  ZoomOutDown,
  ZoomOutEasyDown,
  ZoomOutEasyUp,
  ZoomOutLeft,
  ZoomOutRight,
  ZoomOutRotate,
  ZoomOutUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
pub enum LayoutTransition {
  Layout,
  LinearTransition,
  SequencedTransition,
  FadingTransition,
  JumpingTransition,
  CurvedTransition,
  EntryExitTransition,
}

/// Methods every animation builder has.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum BaseAnimationMethod {
  Build,
  Duration,
  Delay,
  GetDuration,
  RandomDelay,
  GetDelay,
  GetDelayFunction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum ComplexAnimationMethod {
  Easing,
  Rotate,
  Springify,
  Damping,
  Mass,
  Stiffness,
  OvershootClamping,
  RestDisplacementThreshold,
  RestSpeedThreshold,
  WithInitialValues,
  GetAnimationAndConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum DefaultTransitionMethod {
  EasingX,
  EasingY,
  EasingWidth,
  EasingHeight,
  Entering,
  Exiting,
  Reverse,
}

/// Builder methods whose callback runs on the UI thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum LayoutAnimationCallback {
  WithCallback,
}

fn is_layout_animation(name: &str) -> bool {
  EntryExitAnimation::from_str(name).is_ok() || LayoutTransition::from_str(name).is_ok()
}

fn is_chainable_method(name: &str) -> bool {
  BaseAnimationMethod::from_str(name).is_ok()
    || ComplexAnimationMethod::from_str(name).is_ok()
    || DefaultTransitionMethod::from_str(name).is_ok()
}

/**
 * Whether arguments of a call to `callee` are layout animation callbacks.
 *
 * ```ts
 * FadeIn.duration(300).withCallback(callback);
 * new Layout().springify().withCallback(callback);
 * ```
 */
pub fn is_layout_animation_callback(callee: &Callee) -> bool {
  match callee {
    Callee::Expr(expr) => match &**expr {
      Expr::Member(MemberExpr {
        obj,
        prop: MemberProp::Ident(prop),
        ..
      }) => {
        LayoutAnimationCallback::from_str(&prop.sym).is_ok() && is_animation_builder(obj)
      }
      _ => false,
    },
    _ => false,
  }
}

/// `Name`, `new Name(...)` or either followed by chainable method calls.
fn is_animation_builder(expr: &Expr) -> bool {
  match expr {
    Expr::Ident(ident) => is_layout_animation(&ident.sym),
    Expr::New(NewExpr { callee, .. }) => {
      matches!(&**callee, Expr::Ident(ident) if is_layout_animation(&ident.sym))
    }
    Expr::Call(CallExpr {
      callee: Callee::Expr(callee),
      ..
    }) => match &**callee {
      Expr::Member(MemberExpr {
        obj,
        prop: MemberProp::Ident(prop),
        ..
      }) => is_chainable_method(&prop.sym) && is_animation_builder(obj),
      _ => false,
    },
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::parse_expr;

  fn is_callback_call(src: &str) -> bool {
    match parse_expr(src) {
      Expr::Call(call) => is_layout_animation_callback(&call.callee),
      other => panic!("not a call: {other:?}"),
    }
  }

  #[test]
  fn recognizes_builders() {
    assert!(is_callback_call("FadeIn.withCallback(f)"));
    assert!(is_callback_call("new Layout().withCallback(f)"));
    assert!(is_callback_call("ZoomOutRotate.duration(300).springify().reverse().withCallback(f)"));
    assert!(is_callback_call("new LinearTransition(1).easingX(e).withCallback(f)"));
  }

  #[test]
  fn ignores_unknown_names_and_methods() {
    assert!(!is_callback_call("FadeAway.withCallback(f)"));
    assert!(!is_callback_call("FadeIn.unknown().withCallback(f)"));
    assert!(!is_callback_call("FadeIn.duration(f)"));
    assert!(!is_callback_call("withCallback(f)"));
  }
}
