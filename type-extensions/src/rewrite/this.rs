//! `this` inside extension methods.
//!
//! An extension method may run against a raw value (a detached member called through
//! `apply`/`call`) as well as against an instance of its class. Each instance method of a
//! configured extension class therefore starts with
//!
//! ```text
//! const self_1a2b3c4d = getThisValue(this, NumberExtensions);
//! ```
//!
//! and every `this` in its body that refers to the method's own receiver reads the alias instead.
//! Ordinary functions and classes nested in the body bind their own `this` and are left alone;
//! arrow functions are rewritten with the method.

use super::call;
use super::var_stmt;
use super::Rewriter;
use crate::alias::generate_alias;
use crate::alias::AliasAnchor;
use crate::registry::prop_name_text;
use crate::registry::RuntimeName;
use swc_common::DUMMY_SP;
use swc_ecma_ast::ClassMethod;
use swc_ecma_ast::Decl;
use swc_ecma_ast::Expr;
use swc_ecma_ast::Ident;
use swc_ecma_ast::Pat;
use swc_ecma_ast::Stmt;
use swc_ecma_ast::ThisExpr;
use swc_ecma_ast::VarDeclKind;
use swc_ecma_ast::VarDeclarator;
use swc_ecma_visit::VisitMutWith;

pub(super) struct SelfBinding {
  pub alias: Ident,
  pub class_name: String,
}

impl SelfBinding {
  /// The alias depends only on the class and member name, so a re-transformed method finds its
  /// existing prologue.
  fn new(class_name: &str, member: &str) -> SelfBinding {
    let alias = generate_alias("self", AliasAnchor::Text(&format!("{class_name}.{member}")));
    SelfBinding {
      alias: Ident::new_no_ctxt(alias.into(), DUMMY_SP),
      class_name: class_name.to_string(),
    }
  }

  /// Whether `stmt` is a previously inserted prologue declaring this alias.
  pub fn is_prologue(&self, stmt: Option<&Stmt>) -> bool {
    let Some(Stmt::Decl(Decl::Var(var))) = stmt else {
      return false;
    };
    matches!(
      var.decls.as_slice(),
      [VarDeclarator { name: Pat::Ident(binding), .. }] if binding.id.sym == self.alias.sym
    )
  }
}

impl Rewriter<'_, '_> {
  pub(super) fn self_prologue(&mut self, binding: &SelfBinding) -> Stmt {
    let get_this_value = self.cx.runtime_ident(RuntimeName::GetThisValue, DUMMY_SP);
    let class = Ident::new_no_ctxt(binding.class_name.as_str().into(), DUMMY_SP);
    var_stmt(
      VarDeclKind::Const,
      vec![VarDeclarator {
        span: DUMMY_SP,
        name: Pat::Ident(binding.alias.clone().into()),
        init: Some(Box::new(call(
          get_this_value,
          vec![Expr::This(ThisExpr { span: DUMMY_SP }), Expr::Ident(class)],
        ))),
        definite: false,
      }],
    )
  }

  pub(super) fn visit_class_method(&mut self, method: &mut ClassMethod) {
    let class_name = match &self.extension_class {
      Some(class_name) if !method.is_static && method.function.body.is_some() => {
        class_name.clone()
      }
      _ => {
        method.visit_mut_children_with(self);
        return;
      }
    };
    method.key.visit_mut_with(self);
    let member = prop_name_text(&method.key).unwrap_or_else(|| "[computed]".to_string());
    let binding = SelfBinding::new(&class_name, &member);

    let this_binding = self.this_binding.take();
    self.visit_function(&mut method.function, Some(&binding));
    self.this_binding = this_binding;
  }
}
