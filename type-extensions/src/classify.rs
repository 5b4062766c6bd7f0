//! Syntactic recognition of expressions whose runtime type is certain.

use swc_ecma_ast::Expr;
use swc_ecma_ast::Lit;
use swc_ecma_ast::UnaryOp;

/// Strips parentheses and TypeScript-only wrappers, which have no runtime effect.
pub fn unwrap_transparent(mut expr: &Expr) -> &Expr {
  loop {
    expr = match expr {
      Expr::Paren(paren) => &paren.expr,
      Expr::TsAs(e) => &e.expr,
      Expr::TsSatisfies(e) => &e.expr,
      Expr::TsConstAssertion(e) => &e.expr,
      Expr::TsNonNull(e) => &e.expr,
      Expr::TsTypeAssertion(e) => &e.expr,
      Expr::TsInstantiation(e) => &e.expr,
      _ => return expr,
    };
  }
}

/// Whether `expr` is statically a value of the type tagged `type_tag`: a literal of that type, or
/// a call or construction of the global named by the tag. Bindings are not resolved, so a local
/// that shadows the global still matches.
pub fn matches_extension_type(expr: &Expr, type_tag: &str) -> bool {
  let expr = unwrap_transparent(expr);
  match expr {
    Expr::Lit(lit) => matches!(
      (lit, type_tag),
      (Lit::Bool(_), "Boolean")
        | (Lit::Num(_), "Number")
        | (Lit::BigInt(_), "BigInt")
        | (Lit::Str(_), "String")
        | (Lit::Regex(_), "RegExp")
    ),
    Expr::Unary(unary) if matches!(unary.op, UnaryOp::Minus | UnaryOp::Plus) => {
      match (unwrap_transparent(&unary.arg), unary.op) {
        (Expr::Lit(Lit::Num(_)), _) => type_tag == "Number",
        (Expr::Lit(Lit::BigInt(_)), UnaryOp::Minus) => type_tag == "BigInt",
        _ => false,
      }
    }
    // Untagged templates always evaluate to a string.
    Expr::Tpl(_) => type_tag == "String",
    Expr::Array(_) => type_tag == "Array",
    Expr::Object(_) => type_tag == "Object",
    Expr::Call(call) => {
      // `Date()` returns a string rather than a date.
      type_tag != "Date"
        && call
          .callee
          .as_expr()
          .is_some_and(|callee| is_global(callee, type_tag))
    }
    // `BigInt` and `Symbol` cannot be constructed.
    Expr::New(new) => !matches!(type_tag, "BigInt" | "Symbol") && is_global(&new.callee, type_tag),
    _ => false,
  }
}

fn is_global(callee: &Expr, name: &str) -> bool {
  matches!(unwrap_transparent(callee), Expr::Ident(ident) if &*ident.sym == name)
}
