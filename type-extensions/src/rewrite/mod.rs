//! The expression rewriter: one mutable traversal over a parsed file that routes extension
//! member accesses and destructuring through the generated runtime.
//!
//! Rewrites happen bottom-up: children are visited before their parent is inspected, so a chain
//! such as `'1234'.bigInt.number` is rewritten from the innermost access outwards and every
//! synthesized call is left alone afterwards.

mod destructure;
mod member;
pub(crate) mod scope;
mod this;

use crate::alias::AliasAnchor;
use crate::err::TransformError;
use crate::imports::ImportTracker;
use crate::registry::Registry;
use crate::registry::RuntimeName;
use scope::bound_names;
use scope::BodyDeclarations;
use std::mem;
use std::path::Path;
use swc_common::util::take::Take;
use swc_common::BytePos;
use swc_common::Span;
use swc_common::Spanned;
use swc_common::DUMMY_SP;
use swc_ecma_ast::ArrayLit;
use swc_ecma_ast::ArrowExpr;
use swc_ecma_ast::ArrowFunctionBody;
use swc_ecma_ast::AssignExpr;
use swc_ecma_ast::AssignTarget;
use swc_ecma_ast::BlockStmt;
use swc_ecma_ast::CallExpr;
use swc_ecma_ast::Callee;
use swc_ecma_ast::CatchClause;
use swc_ecma_ast::Class;
use swc_ecma_ast::ClassDecl;
use swc_ecma_ast::ClassExpr;
use swc_ecma_ast::ClassMethod;
use swc_ecma_ast::Constructor;
use swc_ecma_ast::Decl;
use swc_ecma_ast::ExportDecl;
use swc_ecma_ast::ExportNamedSpecifier;
use swc_ecma_ast::ExportSpecifier;
use swc_ecma_ast::Expr;
use swc_ecma_ast::ExprOrSpread;
use swc_ecma_ast::ExprStmt;
use swc_ecma_ast::ForInStmt;
use swc_ecma_ast::ForOfStmt;
use swc_ecma_ast::Function;
use swc_ecma_ast::FunctionBody;
use swc_ecma_ast::Ident;
use swc_ecma_ast::Lit;
use swc_ecma_ast::Module;
use swc_ecma_ast::ModuleDecl;
use swc_ecma_ast::ModuleExportName;
use swc_ecma_ast::ModuleItem;
use swc_ecma_ast::NamedExport;
use swc_ecma_ast::OptChainBase;
use swc_ecma_ast::OptChainExpr;
use swc_ecma_ast::ParamOrTsParamProp;
use swc_ecma_ast::Pat;
use swc_ecma_ast::ReturnStmt;
use swc_ecma_ast::SimpleAssignTarget;
use swc_ecma_ast::Stmt;
use swc_ecma_ast::Str;
use swc_ecma_ast::UnaryOp;
use swc_ecma_ast::VarDecl;
use swc_ecma_ast::VarDeclKind;
use swc_ecma_ast::VarDeclarator;
use swc_ecma_visit::noop_visit_mut_type;
use swc_ecma_visit::VisitMut;
use swc_ecma_visit::VisitMutWith;
use this::SelfBinding;

/// State for transforming one file. Created by the orchestrator for a single call and dropped
/// with it, so nothing leaks between files.
pub(crate) struct TransformContext<'a> {
  pub registry: &'a Registry,
  pub imports: ImportTracker,
  pub is_extensions_file: bool,
  pub path: &'a Path,
  /// Start of the file in its source map; spans are anchored relative to it.
  pub file_start: BytePos,
}

impl<'a> TransformContext<'a> {
  pub fn anchor(&self, span: Span) -> AliasAnchor<'static> {
    AliasAnchor::span(span, self.file_start)
  }

  /// The local name of a runtime helper, importing it on first use.
  pub fn runtime_ident(&mut self, name: RuntimeName, span: Span) -> Ident {
    let registry = self.registry;
    let anchor = self.anchor(span);
    let local = self.imports.read_import_name(
      registry.runtime_aliases().get(name),
      name.logical_name(),
      anchor,
    );
    Ident::new_no_ctxt(local.into(), DUMMY_SP)
  }

  /// The local name of the implementation class of extension `idx`, importing it on first use.
  pub fn class_ident(&mut self, idx: usize, span: Span) -> Ident {
    let registry = self.registry;
    let anchor = self.anchor(span);
    let desc = registry.extensions().get(idx);
    // Inside the extensions file the class is in scope under its declared name.
    let imported = if self.imports.is_inline() {
      desc.class_name.as_str()
    } else {
      desc.export_name.as_str()
    };
    let local = self.imports.read_import_name(imported, &desc.class_name, anchor);
    Ident::new_no_ctxt(local.into(), DUMMY_SP)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RuntimeBinding {
  Helper,
  Class,
}

pub(crate) struct Rewriter<'c, 'a> {
  cx: &'c mut TransformContext<'a>,
  /// Replaces `this` while inside an extension method body.
  this_binding: Option<Ident>,
  /// The configured extension class whose body is being visited.
  extension_class: Option<String>,
  /// Handed from a class declaration or expression to the class body it names.
  pending_extension_class: Option<String>,
  error: Option<TransformError>,
}

impl<'c, 'a> Rewriter<'c, 'a> {
  pub fn new(cx: &'c mut TransformContext<'a>) -> Self {
    Rewriter {
      cx,
      this_binding: None,
      extension_class: None,
      pending_extension_class: None,
      error: None,
    }
  }

  /// The first error met during the traversal, if any.
  pub fn finish(self) -> Result<(), TransformError> {
    match self.error {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }

  fn fail_unresolvable(&mut self, pat: &Pat) {
    if self.error.is_some() {
      return;
    }
    let mut names = Vec::new();
    bound_names(pat, &mut names);
    let binding = names
      .first()
      .map(|name| name.to_string())
      .unwrap_or_else(|| "<pattern>".to_string());
    self.fail_unresolvable_binding(binding);
  }

  fn fail_unresolvable_binding(&mut self, binding: String) {
    if self.error.is_some() {
      return;
    }
    self.error = Some(TransformError::UnresolvableDefault {
      path: self.cx.path.to_path_buf(),
      binding,
    });
  }

  /// How hoisted parameter bindings are declared in a body. They are normally `let`, but a body
  /// that redeclares a parameter with `var` needs them to be `var` too. A function declaration
  /// of the same name would replace the parameter before the hoisted binding runs, which
  /// cannot be expressed.
  fn hoisted_kind(&mut self, hoisted: &[VarDeclarator], stmts: &[Stmt]) -> VarDeclKind {
    let mut names = Vec::new();
    for decl in hoisted {
      bound_names(&decl.name, &mut names);
    }
    let declared = BodyDeclarations::collect(stmts);
    if let Some(name) = names.iter().find(|name| declared.functions.contains(*name)) {
      self.fail_unresolvable_binding(name.to_string());
    }
    if names.iter().any(|name| declared.vars.contains(name)) {
      VarDeclKind::Var
    } else {
      VarDeclKind::Let
    }
  }

  /// Whether `sym` names a runtime helper or an extension class in this file.
  fn runtime_binding(&self, sym: &str) -> Option<RuntimeBinding> {
    let registry = self.cx.registry;
    if self.cx.imports.is_inline() {
      return if registry.runtime_aliases().lookup(sym).is_some() {
        Some(RuntimeBinding::Helper)
      } else if registry.extensions().by_class_name(sym).is_some() {
        Some(RuntimeBinding::Class)
      } else {
        None
      };
    }
    let imported = self.cx.imports.imported_name(sym)?;
    if registry.runtime_aliases().lookup(imported).is_some() {
      Some(RuntimeBinding::Helper)
    } else if registry.extensions().by_export_name(imported).is_some() {
      Some(RuntimeBinding::Class)
    } else {
      None
    }
  }

  /// Receivers that already are extension instances or runtime results: calls to the helpers,
  /// constructions of extension classes, the classes themselves and the rebound `this`.
  fn is_runtime_receiver(&self, expr: &Expr) -> bool {
    match crate::classify::unwrap_transparent(expr) {
      Expr::Ident(ident) => {
        self
          .this_binding
          .as_ref()
          .is_some_and(|binding| binding.sym == ident.sym)
          || self.runtime_binding(&ident.sym).is_some()
      }
      Expr::Call(call) => call.callee.as_expr().is_some_and(|callee| {
        matches!(&**callee, Expr::Ident(ident)
          if self.runtime_binding(&ident.sym) == Some(RuntimeBinding::Helper))
      }),
      Expr::New(new) => matches!(&*new.callee, Expr::Ident(ident)
        if self.runtime_binding(&ident.sym) == Some(RuntimeBinding::Class)),
      _ => false,
    }
  }

  /// Visits an expression in assignment, update or `delete` position. The access itself stays as
  /// written; only its object and computed key are rewritten.
  fn visit_target(&mut self, expr: &mut Expr) {
    match expr {
      Expr::Member(member) => member.visit_mut_children_with(self),
      Expr::OptChain(chain) if chain.base.is_member() => chain.base.visit_mut_children_with(self),
      Expr::Paren(paren) => self.visit_target(&mut paren.expr),
      Expr::TsAs(e) => self.visit_target(&mut e.expr),
      Expr::TsSatisfies(e) => self.visit_target(&mut e.expr),
      Expr::TsNonNull(e) => self.visit_target(&mut e.expr),
      Expr::TsTypeAssertion(e) => self.visit_target(&mut e.expr),
      _ => expr.visit_mut_with(self),
    }
  }

  /// Visits a function body and inserts, after its directives, the extension method prologue (if
  /// any) followed by the hoisted parameter bindings.
  fn visit_body(
    &mut self,
    body: &mut FunctionBody,
    hoisted: Vec<VarDeclarator>,
    self_binding: Option<&SelfBinding>,
  ) {
    let at = directive_count(&body.stmts);
    let mut prologue = Vec::new();
    let mut skip = 0;
    let saved_this = match self_binding {
      Some(binding) => {
        if binding.is_prologue(body.stmts.get(at)) {
          skip = 1;
        } else {
          prologue.push(self.self_prologue(binding));
        }
        mem::replace(&mut self.this_binding, Some(binding.alias.clone()))
      }
      None => self.this_binding.clone(),
    };
    for stmt in &mut body.stmts[at + skip..] {
      stmt.visit_mut_with(self);
    }
    self.this_binding = saved_this;

    if !hoisted.is_empty() {
      let kind = self.hoisted_kind(&hoisted, &body.stmts);
      prologue.push(var_stmt(kind, hoisted));
    }
    let at = at + skip;
    body.stmts.splice(at..at, prologue);
  }

  pub(super) fn visit_function(&mut self, function: &mut Function, self_binding: Option<&SelfBinding>) {
    function.decorators.visit_mut_with(self);
    for param in &mut function.params {
      param.decorators.visit_mut_with(self);
    }
    // Overload signatures and ambient declarations have no runtime parameters.
    let Some(body) = &mut function.body else {
      return;
    };
    let hoisted = self.lower_params(function.params.iter_mut().map(|p| &mut p.pat).collect());
    self.visit_body(body, hoisted, self_binding);
  }

  fn extension_class_named(&self, name: &str) -> Option<String> {
    (self.cx.is_extensions_file && self.cx.registry.extensions().by_class_name(name).is_some())
      .then(|| name.to_string())
  }
}

impl VisitMut for Rewriter<'_, '_> {
  noop_visit_mut_type!();

  fn visit_mut_module(&mut self, module: &mut Module) {
    let mut body = Vec::with_capacity(module.body.len());
    for mut item in module.body.drain(..) {
      let exported = match &item {
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
          decl: Decl::Var(var),
          ..
        })) => Some(var_bound_names(var)),
        _ => None,
      };
      item.visit_mut_with(self);
      match (item, exported) {
        // Synthesized bindings must not become exports.
        (
          ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
            span,
            decl: Decl::Var(var),
          })),
          Some(names),
        ) if var_bound_names(&var) != names => {
          body.push(ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))));
          body.push(export_names(span, names));
        }
        (item, _) => body.push(item),
      }
    }
    module.body = body;
  }

  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    match expr {
      Expr::This(this) => {
        if let Some(binding) = &self.this_binding {
          let span = this.span;
          *expr = Expr::Ident(Ident::new_no_ctxt(binding.sym.clone(), span));
        }
        return;
      }
      Expr::Unary(unary) if unary.op == UnaryOp::Delete => {
        self.visit_target(&mut unary.arg);
        return;
      }
      Expr::Update(update) => {
        self.visit_target(&mut update.arg);
        return;
      }
      _ => {}
    }

    expr.visit_mut_children_with(self);

    match expr {
      Expr::Member(member) => {
        let in_chain = matches!(&*member.obj, Expr::OptChain(_));
        if self.rewrite_member(member) && in_chain {
          // The object may now be a short-circuited `undefined`; keep the chain's semantics.
          let member = member.take();
          *expr = Expr::OptChain(OptChainExpr {
            span: member.span,
            optional: true,
            base: Box::new(OptChainBase::Member(member)),
          });
        }
      }
      Expr::OptChain(chain) => {
        if let OptChainBase::Member(member) = &mut *chain.base {
          if self.rewrite_member(member) {
            chain.optional = true;
          }
        }
      }
      _ => {}
    }
  }

  fn visit_mut_simple_assign_target(&mut self, target: &mut SimpleAssignTarget) {
    match target {
      SimpleAssignTarget::Paren(paren) => self.visit_target(&mut paren.expr),
      SimpleAssignTarget::TsAs(e) => self.visit_target(&mut e.expr),
      SimpleAssignTarget::TsSatisfies(e) => self.visit_target(&mut e.expr),
      SimpleAssignTarget::TsNonNull(e) => self.visit_target(&mut e.expr),
      SimpleAssignTarget::TsTypeAssertion(e) => self.visit_target(&mut e.expr),
      _ => target.visit_mut_children_with(self),
    }
  }

  fn visit_mut_pat(&mut self, pat: &mut Pat) {
    match pat {
      Pat::Expr(expr) => self.visit_target(expr),
      _ => pat.visit_mut_children_with(self),
    }
  }

  fn visit_mut_expr_stmt(&mut self, stmt: &mut ExprStmt) {
    stmt.visit_mut_children_with(self);
    if let Expr::Assign(assign) = strip_parens_mut(&mut stmt.expr) {
      self.route_assignment(assign);
    }
  }

  fn visit_mut_assign_expr(&mut self, assign: &mut AssignExpr) {
    assign.visit_mut_children_with(self);
    if let AssignTarget::Pat(target) = &assign.left {
      self.check_assignment_pattern(target);
    }
  }

  fn visit_mut_var_decl(&mut self, decl: &mut VarDecl) {
    if decl.declare {
      return;
    }
    decl.visit_mut_children_with(self);
    self.lower_var_decl(decl);
  }

  fn visit_mut_for_of_stmt(&mut self, stmt: &mut ForOfStmt) {
    stmt.right.visit_mut_with(self);
    stmt.left.visit_mut_with(self);
    stmt.body.visit_mut_with(self);
    self.lower_loop_head(&mut stmt.left, &mut stmt.body);
  }

  fn visit_mut_for_in_stmt(&mut self, stmt: &mut ForInStmt) {
    stmt.right.visit_mut_with(self);
    stmt.left.visit_mut_with(self);
    stmt.body.visit_mut_with(self);
    self.lower_loop_head(&mut stmt.left, &mut stmt.body);
  }

  fn visit_mut_catch_clause(&mut self, clause: &mut CatchClause) {
    clause.param.visit_mut_with(self);
    clause.body.visit_mut_with(self);
    self.lower_catch_param(clause);
  }

  fn visit_mut_function(&mut self, function: &mut Function) {
    let this_binding = self.this_binding.take();
    self.visit_function(function, None);
    self.this_binding = this_binding;
  }

  fn visit_mut_arrow_expr(&mut self, arrow: &mut ArrowExpr) {
    let hoisted = self.lower_params(arrow.params.iter_mut().collect());
    match &mut *arrow.body {
      ArrowFunctionBody::FunctionBody(body) => self.visit_body(body, hoisted, None),
      ArrowFunctionBody::Expr(expr) => {
        expr.visit_mut_with(self);
        if !hoisted.is_empty() {
          let span = expr.span();
          let value = expr.take();
          *arrow.body = ArrowFunctionBody::FunctionBody(FunctionBody {
            span: DUMMY_SP,
            stmts: vec![
              var_stmt(VarDeclKind::Let, hoisted),
              Stmt::Return(ReturnStmt {
                span,
                arg: Some(value),
              }),
            ],
          });
        }
      }
    }
  }

  fn visit_mut_constructor(&mut self, ctor: &mut Constructor) {
    let this_binding = self.this_binding.take();
    ctor.key.visit_mut_with(self);
    match &mut ctor.body {
      Some(body) => {
        let mut params = Vec::new();
        for param in &mut ctor.params {
          match param {
            ParamOrTsParamProp::Param(param) => {
              param.decorators.visit_mut_with(self);
              params.push(&mut param.pat);
            }
            ParamOrTsParamProp::TsParamProp(prop) => prop.visit_mut_with(self),
          }
        }
        let hoisted = self.lower_params(params);
        self.visit_body(body, hoisted, None);
      }
      None => {}
    }
    self.this_binding = this_binding;
  }

  fn visit_mut_class_decl(&mut self, decl: &mut ClassDecl) {
    self.pending_extension_class = self.extension_class_named(&decl.ident.sym);
    decl.class.visit_mut_with(self);
  }

  fn visit_mut_class_expr(&mut self, expr: &mut ClassExpr) {
    self.pending_extension_class = expr
      .ident
      .as_ref()
      .and_then(|ident| self.extension_class_named(&ident.sym));
    expr.class.visit_mut_with(self);
  }

  fn visit_mut_class(&mut self, class: &mut Class) {
    let extension_class = mem::replace(
      &mut self.extension_class,
      self.pending_extension_class.take(),
    );
    let this_binding = self.this_binding.take();
    class.visit_mut_children_with(self);
    self.this_binding = this_binding;
    self.extension_class = extension_class;
  }

  fn visit_mut_class_method(&mut self, method: &mut ClassMethod) {
    self.visit_class_method(method);
  }
}

/// Number of leading directive prologue statements such as `"use strict"`.
fn directive_count(stmts: &[Stmt]) -> usize {
  stmts
    .iter()
    .take_while(|stmt| {
      matches!(stmt, Stmt::Expr(ExprStmt { expr, .. }) if matches!(&**expr, Expr::Lit(Lit::Str(_))))
    })
    .count()
}

fn strip_parens_mut(expr: &mut Expr) -> &mut Expr {
  match expr {
    Expr::Paren(paren) => strip_parens_mut(&mut paren.expr),
    other => other,
  }
}

fn var_bound_names(var: &VarDecl) -> Vec<swc_atoms::Atom> {
  let mut names = Vec::new();
  for decl in &var.decls {
    bound_names(&decl.name, &mut names);
  }
  names
}

fn export_names(span: Span, names: Vec<swc_atoms::Atom>) -> ModuleItem {
  ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(NamedExport {
    span,
    specifiers: names
      .into_iter()
      .map(|name| {
        ExportSpecifier::Named(ExportNamedSpecifier {
          span: DUMMY_SP,
          orig: ModuleExportName::Ident(Ident::new_no_ctxt(name, DUMMY_SP)),
          exported: None,
          is_type_only: false,
        })
      })
      .collect(),
    src: None,
    type_only: false,
    with: None,
  }))
}

pub(super) fn var_stmt(kind: VarDeclKind, decls: Vec<VarDeclarator>) -> Stmt {
  Stmt::Decl(Decl::Var(Box::new(VarDecl {
    span: DUMMY_SP,
    ctxt: Default::default(),
    kind,
    declare: false,
    decls,
  })))
}

pub(super) fn call(callee: Ident, args: Vec<Expr>) -> Expr {
  Expr::Call(CallExpr {
    span: DUMMY_SP,
    ctxt: Default::default(),
    callee: Callee::Expr(Box::new(Expr::Ident(callee))),
    args: args.into_iter().map(ExprOrSpread::from).collect(),
    type_args: None,
  })
}

pub(super) fn str_lit(value: &str) -> Expr {
  Expr::from(Str::from(value))
}

pub(super) fn str_array<'s>(values: impl IntoIterator<Item = &'s str>) -> Expr {
  Expr::Array(ArrayLit {
    span: DUMMY_SP,
    elems: values
      .into_iter()
      .map(|value| Some(ExprOrSpread::from(str_lit(value))))
      .collect(),
  })
}

/// Prepends `stmt` to a loop body, turning a single-statement body into a block.
pub(super) fn prepend_stmt(body: &mut Box<Stmt>, stmt: Stmt) {
  match &mut **body {
    Stmt::Block(block) => block.stmts.insert(0, stmt),
    _ => {
      let original = *body.take();
      **body = Stmt::Block(BlockStmt {
        span: DUMMY_SP,
        ctxt: Default::default(),
        stmts: vec![stmt, original],
      });
    }
  }
}
