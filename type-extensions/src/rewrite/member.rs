use super::call;
use super::str_array;
use super::str_lit;
use super::Rewriter;
use crate::classify::matches_extension_type;
use crate::classify::unwrap_transparent;
use crate::registry::RuntimeName;
use swc_common::util::take::Take;
use swc_common::Spanned;
use swc_ecma_ast::Expr;
use swc_ecma_ast::Lit;
use swc_ecma_ast::MemberExpr;
use swc_ecma_ast::MemberProp;
use tracing::trace;

/// The statically known property name of an access: `x.name` or `x["name"]`.
pub(super) fn member_key(prop: &MemberProp) -> Option<String> {
  match prop {
    MemberProp::Ident(ident) => Some(ident.sym.to_string()),
    MemberProp::Computed(computed) => match unwrap_transparent(&computed.expr) {
      Expr::Lit(Lit::Str(s)) => s.value.as_atom().map(|atom| atom.to_string()),
      _ => None,
    },
    MemberProp::PrivateName(_) => None,
  }
}

impl Rewriter<'_, '_> {
  /// Points `member` at an extension when its property is an extension member. Returns whether
  /// the access was rewritten.
  ///
  /// - `Tag.member` for a static member of the extension tagged `Tag` reads the member from the
  ///   implementation class.
  /// - A receiver that is a literal of exactly one candidate extension is wrapped directly.
  /// - Any other receiver is probed at runtime against every candidate, in declaration order.
  pub(super) fn rewrite_member(&mut self, member: &mut MemberExpr) -> bool {
    let Some(name) = member_key(&member.prop) else {
      return false;
    };
    let registry = self.cx.registry;
    let extensions = registry.extensions();

    if let Expr::Ident(global) = &*member.obj {
      if let Some(idx) = extensions.static_binding(&global.sym, &name) {
        let span = global.span;
        member.obj = Box::new(Expr::Ident(self.cx.class_ident(idx, span)));
        trace!(member = %name, extension = %extensions.get(idx).id, "rewrote static access");
        return true;
      }
    }

    let candidates = extensions.with_instance_member(&name);
    if candidates.is_empty() || self.is_runtime_receiver(&member.obj) {
      return false;
    }
    let span = member.obj.span();
    let literal: Vec<usize> = candidates
      .iter()
      .copied()
      .filter(|&idx| matches_extension_type(&member.obj, &extensions.get(idx).id))
      .collect();
    let obj = *member.obj.take();
    let rewritten = match literal.as_slice() {
      [idx] => {
        let wrap = self.cx.runtime_ident(RuntimeName::Wrap, span);
        let id = extensions.get(*idx).id.as_str();
        trace!(member = %name, extension = %id, "wrapped literal receiver");
        call(wrap, vec![obj, str_lit(id), str_lit(&name)])
      }
      _ => {
        let proxy = self.cx.runtime_ident(RuntimeName::Proxy, span);
        trace!(member = %name, candidates = candidates.len(), "proxied receiver");
        let ids = candidates.iter().map(|&idx| extensions.get(idx).id.as_str());
        call(proxy, vec![obj, str_array(ids), str_lit(&name)])
      }
    };
    member.obj = Box::new(rewritten);
    true
  }
}
