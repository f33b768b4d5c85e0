use swc_core::common::{util::take::Take, SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::*;

use crate::js_util::{block, call, expr_stmt, ident_expr, member_expr, paren, return_stmt, str};

/**
 * Warns at runtime when a shared value is read inside an inline style.
 *
 * ```tsx
 * <View style={{ width: width.value, transform: [{ scale: scale.value }] }} />
 * // `width.value` and `scale.value` become
 * (() => { console.warn(require("react-native-reanimated").getUseOfValueInStyleWarning()); return width.value; })()
 * ```
 */
pub fn process_inline_styles_warning(attr: &mut JSXAttr) {
  if !matches!(&attr.name, JSXAttrName::Ident(name) if &*name.sym == "style") {
    return;
  }

  let Some(JSXAttrValue::JSXExprContainer(JSXExprContainer {
    expr: JSXExpr::Expr(expr),
    ..
  })) = &mut attr.value
  else {
    return;
  };

  match &mut **expr {
    Expr::Array(array) => process_style_array(array),
    Expr::Object(object) => process_style_object(object),
    _ => {}
  }
}

fn process_style_array(array: &mut ArrayLit) {
  for element in array.elems.iter_mut().flatten() {
    if let Expr::Object(object) = &mut *element.expr {
      process_style_object(object);
    }
  }
}

fn process_style_object(object: &mut ObjectLit) {
  for prop in object.props.iter_mut() {
    let PropOrSpread::Prop(prop) = prop else {
      continue;
    };
    let Prop::KeyValue(KeyValueProp { key, value }) = &mut **prop else {
      continue;
    };

    match (key, &mut **value) {
      (PropName::Ident(key), Expr::Array(transform)) if &*key.sym == "transform" => {
        process_style_array(transform)
      }
      (PropName::Ident(key), _) if &*key.sym == "transform" => {}
      (_, value) => warn_if_shared_value(value),
    }
  }
}

fn warn_if_shared_value(value: &mut Expr) {
  let is_shared_value = matches!(
    value,
    Expr::Member(MemberExpr { prop: MemberProp::Ident(prop), .. }) if &*prop.sym == "value"
  );

  if is_shared_value {
    *value = inline_styles_warning(value.take());
  }
}

fn inline_styles_warning(read: Expr) -> Expr {
  let warning = call(
    member_expr(
      call(ident_expr("require"), vec![str("react-native-reanimated")]),
      "getUseOfValueInStyleWarning",
    ),
    vec![],
  );

  let arrow = Expr::Arrow(ArrowExpr {
    span: DUMMY_SP,
    ctxt: SyntaxContext::empty(),
    params: vec![],
    body: Box::new(BlockStmtOrExpr::BlockStmt(block(vec![
      expr_stmt(call(member_expr(ident_expr("console"), "warn"), vec![warning])),
      return_stmt(read),
    ]))),
    is_async: false,
    is_generator: false,
    type_params: None,
    return_type: None,
  });

  call(paren(arrow), vec![])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_util::{parse, print, squash};
  use swc_core::ecma::visit::{VisitMut, VisitMutWith};

  struct InlineStyles;

  impl VisitMut for InlineStyles {
    fn visit_mut_jsx_attr(&mut self, attr: &mut JSXAttr) {
      process_inline_styles_warning(attr);
    }
  }

  fn transform(src: &str) -> String {
    let mut module = parse(src);
    module.visit_mut_with(&mut InlineStyles);
    squash(&print(&module)).replace('\'', "\"")
  }

  const WARNING: &str =
    r#"(()=>{console.warn(require("react-native-reanimated").getUseOfValueInStyleWarning());return"#;

  #[test]
  fn wraps_shared_value_reads() {
    let code = transform("<View style={{ width: width.value, height: 10 }} />;");

    assert!(code.contains(&format!("width:{WARNING}width.value")), "{code}");
    assert!(code.contains("height:10"), "{code}");
  }

  #[test]
  fn wraps_reads_inside_arrays_and_transforms() {
    let code = transform(
      "<View style={[styles.box, { opacity: o.value, transform: [{ scale: s.value }] }]} />;",
    );

    assert!(code.contains(&format!("opacity:{WARNING}o.value")), "{code}");
    assert!(code.contains(&format!("scale:{WARNING}s.value")), "{code}");
    assert!(code.contains("styles.box"), "{code}");
  }

  #[test]
  fn ignores_other_attributes() {
    let code = transform("<View contentStyle={{ width: width.value }} />;");

    assert!(!code.contains("console.warn"), "{code}");
  }
}
