//! Destructuring patterns.
//!
//! An object pattern whose keys name extension members gets its initializer routed through
//! `merge` (or `proxy` with the merge flag), so the members can be destructured like own
//! properties. Nested patterns cannot share their parent's initializer, so any element that needs
//! its own routing is bound to a raw alias first and destructured by a follow-up declarator:
//!
//! ```text
//! const { one: { bigInt: one }, two = one } = value;
//! // becomes
//! const { one: oneRaw_1a2b3c4d, two: twoRaw_5e6f7a8b } = value,
//!   { bigInt: one } = proxy(oneRaw_1a2b3c4d, ["Number", "String"], true),
//!   two = twoRaw_5e6f7a8b === void 0 ? one : twoRaw_5e6f7a8b;
//! ```
//!
//! Once a binding is deferred this way, every later default that refers to it is deferred too
//! (with its default moved into the follow-up), so defaults still observe the bindings they did
//! in the original pattern.

use super::call;
use super::prepend_stmt;
use super::scope::bound_names;
use super::scope::pattern_references_any;
use super::scope::prop_name_references_any;
use super::scope::references_any;
use super::str_array;
use super::str_lit;
use super::var_stmt;
use super::Rewriter;
use crate::alias::generate_alias;
use crate::classify::matches_extension_type;
use crate::registry::prop_name_text;
use crate::registry::RuntimeName;
use ahash::AHashSet;
use itertools::Itertools;
use swc_atoms::Atom;
use swc_common::util::take::Take;
use swc_common::Span;
use swc_common::Spanned;
use swc_common::DUMMY_SP;
use swc_ecma_ast::AssignExpr;
use swc_ecma_ast::AssignOp;
use swc_ecma_ast::AssignPat;
use swc_ecma_ast::AssignTarget;
use swc_ecma_ast::AssignTargetPat;
use swc_ecma_ast::BinExpr;
use swc_ecma_ast::BinaryOp;
use swc_ecma_ast::BindingIdent;
use swc_ecma_ast::Bool;
use swc_ecma_ast::CatchClause;
use swc_ecma_ast::CondExpr;
use swc_ecma_ast::Expr;
use swc_ecma_ast::ForHead;
use swc_ecma_ast::Ident;
use swc_ecma_ast::KeyValuePatProp;
use swc_ecma_ast::ObjectPat;
use swc_ecma_ast::ObjectPatProp;
use swc_ecma_ast::Pat;
use swc_ecma_ast::PropName;
use swc_ecma_ast::Stmt;
use swc_ecma_ast::TsTypeAnn;
use swc_ecma_ast::UnaryExpr;
use swc_ecma_ast::UnaryOp;
use swc_ecma_ast::VarDecl;
use swc_ecma_ast::VarDeclKind;
use swc_ecma_ast::VarDeclarator;
use swc_ecma_visit::VisitMutWith;
use tracing::trace;

/// Bindings moved out of a pattern, in the order their follow-ups must run.
#[derive(Default)]
struct Extraction {
  deferred: AHashSet<Atom>,
  followups: Vec<(Pat, Box<Expr>)>,
}

impl Rewriter<'_, '_> {
  /// Extensions whose instance members are destructured by `object`, in declaration order. A rest
  /// element may receive any member, so it makes every extension a candidate.
  fn object_candidates(&self, object: &ObjectPat) -> Vec<usize> {
    let extensions = self.cx.registry.extensions();
    let mut candidates = Vec::new();
    let mut has_rest = false;
    for prop in &object.props {
      let key = match prop {
        ObjectPatProp::KeyValue(kv) => prop_name_text(&kv.key),
        ObjectPatProp::Assign(assign) => Some(assign.key.id.sym.to_string()),
        ObjectPatProp::Rest(_) => {
          has_rest = true;
          None
        }
      };
      if let Some(key) = key {
        candidates.extend_from_slice(extensions.with_instance_member(&key));
      }
    }
    if candidates.is_empty() && has_rest {
      return (0..extensions.len()).collect();
    }
    candidates.into_iter().sorted_unstable().dedup().collect()
  }

  /// Whether binding `pat` involves extension routing anywhere.
  pub(super) fn pattern_needs_work(&self, pat: &Pat) -> bool {
    match pat {
      Pat::Object(object) => {
        !self.object_candidates(object).is_empty()
          || object.props.iter().any(|prop| match prop {
            ObjectPatProp::KeyValue(kv) => self.pattern_needs_work(&kv.value),
            ObjectPatProp::Rest(rest) => self.pattern_needs_work(&rest.arg),
            ObjectPatProp::Assign(_) => false,
          })
      }
      Pat::Array(array) => array
        .elems
        .iter()
        .flatten()
        .any(|elem| self.pattern_needs_work(elem)),
      Pat::Assign(assign) => self.pattern_needs_work(&assign.left),
      Pat::Rest(rest) => self.pattern_needs_work(&rest.arg),
      Pat::Ident(_) | Pat::Expr(_) | Pat::Invalid(_) => false,
    }
  }

  /// Routes the initializer of an object pattern through the runtime when the pattern
  /// destructures extension members.
  fn route_init(&mut self, object: &ObjectPat, init: Box<Expr>) -> Box<Expr> {
    let candidates = self.object_candidates(object);
    if candidates.is_empty() || self.is_runtime_receiver(&init) {
      return init;
    }
    let registry = self.cx.registry;
    let extensions = registry.extensions();
    let span = init.span();
    let literal: Vec<usize> = candidates
      .iter()
      .copied()
      .filter(|&idx| matches_extension_type(&init, &extensions.get(idx).id))
      .collect();
    let routed = match literal.as_slice() {
      [idx] => {
        let merge = self.cx.runtime_ident(RuntimeName::Merge, span);
        call(merge, vec![*init, str_lit(&extensions.get(*idx).id)])
      }
      _ => {
        let proxy = self.cx.runtime_ident(RuntimeName::Proxy, span);
        let ids = candidates.iter().map(|&idx| extensions.get(idx).id.as_str());
        call(
          proxy,
          vec![*init, str_array(ids), Expr::from(Bool::from(true))],
        )
      }
    };
    trace!(candidates = candidates.len(), "routed destructuring initializer");
    Box::new(routed)
  }

  fn raw_alias(&self, hint: &str, span: Span) -> Ident {
    let alias = generate_alias(&format!("{hint}Raw"), self.cx.anchor(span));
    Ident::new_no_ctxt(alias.into(), DUMMY_SP)
  }

  /// Binds `elem` (a pattern, possibly with a default or behind `...`) through a raw alias when
  /// it needs routing of its own or refers to a deferred binding. The original target is queued
  /// as a follow-up bound from the alias.
  fn extract_element(&mut self, elem: &mut Pat, hint: &str, ex: &mut Extraction) {
    let (target, default) = match &*elem {
      Pat::Assign(assign) => (&*assign.left, Some(&*assign.right)),
      Pat::Rest(rest) => (&*rest.arg, None),
      other => (other, None),
    };
    if matches!(target, Pat::Expr(_) | Pat::Invalid(_)) {
      return;
    }
    let default_dependent = default.is_some_and(|d| references_any(d, &ex.deferred));
    if !default_dependent
      && !pattern_references_any(target, &ex.deferred)
      && !self.pattern_needs_work(target)
    {
      return;
    }

    let raw = self.raw_alias(hint, target.span());
    let (original, init) = match elem {
      Pat::Assign(assign) if default_dependent => {
        let mut original = *assign.left.take();
        let default = assign.right.take();
        let type_ann = take_type_ann(&mut original);
        *elem = raw_binding(&raw, type_ann);
        (original, default_or_raw(&raw, default))
      }
      Pat::Assign(assign) => {
        let type_ann = take_type_ann(&mut assign.left);
        let original = std::mem::replace(&mut *assign.left, raw_binding(&raw, type_ann));
        (original, Box::new(Expr::Ident(raw)))
      }
      Pat::Rest(rest) => {
        let type_ann = take_type_ann(&mut rest.arg);
        let original = std::mem::replace(&mut *rest.arg, raw_binding(&raw, type_ann));
        (original, Box::new(Expr::Ident(raw)))
      }
      other => {
        let type_ann = take_type_ann(other);
        let original = std::mem::replace(other, raw_binding(&raw, type_ann));
        (original, Box::new(Expr::Ident(raw)))
      }
    };
    let mut names = Vec::new();
    bound_names(&original, &mut names);
    ex.deferred.extend(names);
    ex.followups.push((original, init));
  }

  fn extract_object(&mut self, object: &mut ObjectPat, ex: &mut Extraction) {
    for prop in &mut object.props {
      match prop {
        ObjectPatProp::KeyValue(kv) => {
          // A computed key is evaluated in place and cannot wait for a deferred binding.
          if prop_name_references_any(&kv.key, &ex.deferred) {
            self.fail_unresolvable(&kv.value);
            return;
          }
          let hint = prop_name_text(&kv.key).unwrap_or_else(|| "value".to_string());
          self.extract_element(&mut kv.value, &hint, ex);
        }
        ObjectPatProp::Assign(assign) => {
          let dependent = assign
            .value
            .as_deref()
            .is_some_and(|value| references_any(value, &ex.deferred));
          if !dependent {
            continue;
          }
          let Some(default) = assign.value.take() else {
            continue;
          };
          let key = assign.key.clone();
          let mut value = Pat::Assign(AssignPat {
            span: assign.span,
            left: Box::new(Pat::Ident(key.clone())),
            right: default,
          });
          self.extract_element(&mut value, &key.id.sym, ex);
          *prop = ObjectPatProp::KeyValue(KeyValuePatProp {
            key: PropName::Ident(key.id.into()),
            value: Box::new(value),
          });
        }
        ObjectPatProp::Rest(_) => {}
      }
    }
  }

  /// Lowers `name = init` into `out`: the main declarator, then the follow-up declarators of
  /// everything extracted from it, each lowered the same way.
  fn lower_binding(
    &mut self,
    span: Span,
    mut name: Pat,
    init: Box<Expr>,
    out: &mut Vec<VarDeclarator>,
  ) {
    let mut ex = Extraction::default();
    let init = match &mut name {
      Pat::Object(object) => {
        self.extract_object(object, &mut ex);
        self.route_init(object, init)
      }
      Pat::Array(array) => {
        for elem in array.elems.iter_mut().flatten() {
          self.extract_element(elem, "element", &mut ex);
        }
        init
      }
      _ => init,
    };
    out.push(VarDeclarator {
      span,
      name,
      init: Some(init),
      definite: false,
    });
    for (target, init) in ex.followups {
      self.lower_binding(DUMMY_SP, target, init, out);
    }
  }

  pub(super) fn lower_var_decl(&mut self, decl: &mut VarDecl) {
    let mut decls = Vec::with_capacity(decl.decls.len());
    for declarator in decl.decls.drain(..) {
      match declarator.init {
        Some(init) if !matches!(declarator.name, Pat::Ident(_)) => {
          self.lower_binding(declarator.span, declarator.name, init, &mut decls);
        }
        init => decls.push(VarDeclarator {
          init,
          ..declarator
        }),
      }
    }
    decl.decls = decls;
  }

  /// Visits `params` and replaces those needing routing (or depending on a replaced one) with
  /// raw aliases. Returns the declarators that rebind them at the top of the body.
  pub(super) fn lower_params(&mut self, mut params: Vec<&mut Pat>) -> Vec<VarDeclarator> {
    for param in params.iter_mut() {
      param.visit_mut_with(self);
    }
    let mut ex = Extraction::default();
    for param in params {
      self.extract_element(param, "param", &mut ex);
    }
    let mut out = Vec::new();
    for (target, init) in ex.followups {
      self.lower_binding(DUMMY_SP, target, init, &mut out);
    }
    out
  }

  /// `for (const { member } of values)` binds each value through a raw alias and destructures it
  /// at the top of the loop body.
  pub(super) fn lower_loop_head(&mut self, head: &mut ForHead, body: &mut Box<Stmt>) {
    let var = match head {
      ForHead::VarDecl(var) => var,
      ForHead::Pat(pat) => {
        // Assignment targets have no declaration the extracted bindings could join.
        if self.pattern_needs_work(pat) {
          self.fail_unresolvable(pat);
        }
        return;
      }
      ForHead::UsingDecl(_) => return,
    };
    let [declarator] = var.decls.as_mut_slice() else {
      return;
    };
    if declarator.init.is_some() || !self.pattern_needs_work(&declarator.name) {
      return;
    }
    let raw = self.raw_alias("item", declarator.name.span());
    let type_ann = take_type_ann(&mut declarator.name);
    let target = std::mem::replace(&mut declarator.name, raw_binding(&raw, type_ann));
    let mut decls = Vec::new();
    self.lower_binding(DUMMY_SP, target, Box::new(Expr::Ident(raw)), &mut decls);
    prepend_stmt(body, var_stmt(var.kind, decls));
  }

  pub(super) fn lower_catch_param(&mut self, clause: &mut CatchClause) {
    let Some(param) = &mut clause.param else {
      return;
    };
    if !self.pattern_needs_work(param) {
      return;
    }
    let raw = self.raw_alias("error", param.span());
    let type_ann = take_type_ann(param);
    let target = std::mem::replace(param, raw_binding(&raw, type_ann));
    let mut decls = Vec::new();
    self.lower_binding(DUMMY_SP, target, Box::new(Expr::Ident(raw)), &mut decls);
    clause.body.stmts.insert(0, var_stmt(VarDeclKind::Let, decls));
  }

  /// `({ member } = value);` as a statement routes `value` like a declaration would.
  pub(super) fn route_assignment(&mut self, assign: &mut AssignExpr) {
    if assign.op != AssignOp::Assign {
      return;
    }
    let AssignTarget::Pat(AssignTargetPat::Object(object)) = &assign.left else {
      return;
    };
    let init = assign.right.take();
    assign.right = self.route_init(object, init);
  }

  /// Nested patterns of an assignment cannot be split into follow-up declarations, so routing
  /// they would need is reported instead of silently skipped.
  pub(super) fn check_assignment_pattern(&mut self, target: &AssignTargetPat) {
    let offending = match target {
      AssignTargetPat::Object(object) => object.props.iter().find_map(|prop| match prop {
        ObjectPatProp::KeyValue(kv) if self.pattern_needs_work(&kv.value) => Some(&*kv.value),
        _ => None,
      }),
      AssignTargetPat::Array(array) => array
        .elems
        .iter()
        .flatten()
        .find(|elem| self.pattern_needs_work(elem)),
      AssignTargetPat::Invalid(_) => None,
    };
    if let Some(pat) = offending {
      self.fail_unresolvable(pat);
    }
  }
}

fn take_type_ann(pat: &mut Pat) -> Option<Box<TsTypeAnn>> {
  match pat {
    Pat::Ident(binding) => binding.type_ann.take(),
    Pat::Object(object) => object.type_ann.take(),
    Pat::Array(array) => array.type_ann.take(),
    Pat::Rest(rest) => rest.type_ann.take(),
    _ => None,
  }
}

fn raw_binding(raw: &Ident, type_ann: Option<Box<TsTypeAnn>>) -> Pat {
  Pat::Ident(BindingIdent {
    id: raw.clone(),
    type_ann,
  })
}

/// `raw === void 0 ? default : raw`
fn default_or_raw(raw: &Ident, default: Box<Expr>) -> Box<Expr> {
  let undefined = Expr::Unary(UnaryExpr {
    span: DUMMY_SP,
    op: UnaryOp::Void,
    arg: Box::new(Expr::from(0.0)),
  });
  Box::new(Expr::Cond(CondExpr {
    span: DUMMY_SP,
    test: Box::new(Expr::Bin(BinExpr {
      span: DUMMY_SP,
      op: BinaryOp::EqEqEq,
      left: Box::new(Expr::Ident(raw.clone())),
      right: Box::new(undefined),
    })),
    cons: default,
    alt: Box::new(Expr::Ident(raw.clone())),
  }))
}
