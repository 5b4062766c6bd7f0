use ahash::AHashSet;
use swc_atoms::Atom;
use swc_ecma_ast::ArrowExpr;
use swc_ecma_ast::BindingIdent;
use swc_ecma_ast::Class;
use swc_ecma_ast::Decl;
use swc_ecma_ast::Expr;
use swc_ecma_ast::FnDecl;
use swc_ecma_ast::Function;
use swc_ecma_ast::Ident;
use swc_ecma_ast::ObjectPatProp;
use swc_ecma_ast::Pat;
use swc_ecma_ast::PropName;
use swc_ecma_ast::Stmt;
use swc_ecma_ast::VarDecl;
use swc_ecma_ast::VarDeclKind;
use swc_ecma_visit::noop_visit_type;
use swc_ecma_visit::Visit;
use swc_ecma_visit::VisitWith;

/// Looks for identifier references to any of `names`. Shadowing is ignored, so a nested
/// function parameter of the same name still counts as a reference.
struct ReferenceFinder<'a> {
  names: &'a AHashSet<Atom>,
  found: bool,
}

impl Visit for ReferenceFinder<'_> {
  noop_visit_type!();

  fn visit_ident(&mut self, ident: &Ident) {
    if !self.found && self.names.contains(&ident.sym) {
      self.found = true;
    }
  }

  // Binding positions are declarations, not references.
  fn visit_binding_ident(&mut self, _: &BindingIdent) {}
}

pub(crate) fn references_any(expr: &Expr, names: &AHashSet<Atom>) -> bool {
  if names.is_empty() {
    return false;
  }
  let mut finder = ReferenceFinder { names, found: false };
  expr.visit_with(&mut finder);
  finder.found
}

/// Whether a default value or computed key anywhere inside `pat` refers to `names`.
pub(crate) fn pattern_references_any(pat: &Pat, names: &AHashSet<Atom>) -> bool {
  if names.is_empty() {
    return false;
  }
  let mut finder = ReferenceFinder { names, found: false };
  pat.visit_with(&mut finder);
  finder.found
}

pub(crate) fn prop_name_references_any(key: &PropName, names: &AHashSet<Atom>) -> bool {
  match key {
    PropName::Computed(computed) => references_any(&computed.expr, names),
    _ => false,
  }
}

/// Every name bound by `pat`, in source order.
pub(crate) fn bound_names(pat: &Pat, out: &mut Vec<Atom>) {
  match pat {
    Pat::Ident(binding) => out.push(binding.id.sym.clone()),
    Pat::Array(array) => {
      for elem in array.elems.iter().flatten() {
        bound_names(elem, out);
      }
    }
    Pat::Object(object) => {
      for prop in &object.props {
        match prop {
          ObjectPatProp::KeyValue(kv) => bound_names(&kv.value, out),
          ObjectPatProp::Assign(assign) => out.push(assign.key.id.sym.clone()),
          ObjectPatProp::Rest(rest) => bound_names(&rest.arg, out),
        }
      }
    }
    Pat::Rest(rest) => bound_names(&rest.arg, out),
    Pat::Assign(assign) => bound_names(&assign.left, out),
    Pat::Expr(_) | Pat::Invalid(_) => {}
  }
}

/// Names a function body declares in its own var scope.
#[derive(Debug, Default)]
pub(crate) struct BodyDeclarations {
  /// `var` bindings anywhere in the body outside nested functions.
  pub vars: AHashSet<Atom>,
  /// Function declarations directly in the body.
  pub functions: AHashSet<Atom>,
}

impl BodyDeclarations {
  pub fn collect(stmts: &[Stmt]) -> BodyDeclarations {
    let mut collector = VarCollector::default();
    for stmt in stmts {
      stmt.visit_with(&mut collector);
    }
    let functions = stmts
      .iter()
      .filter_map(|stmt| match stmt {
        Stmt::Decl(Decl::Fn(decl)) => Some(decl.ident.sym.clone()),
        _ => None,
      })
      .collect();
    BodyDeclarations {
      vars: collector.vars,
      functions,
    }
  }
}

#[derive(Default)]
struct VarCollector {
  vars: AHashSet<Atom>,
}

impl Visit for VarCollector {
  noop_visit_type!();

  fn visit_var_decl(&mut self, decl: &VarDecl) {
    if decl.kind == VarDeclKind::Var {
      let mut names = Vec::new();
      for declarator in &decl.decls {
        bound_names(&declarator.name, &mut names);
      }
      self.vars.extend(names);
    }
    decl.visit_children_with(self);
  }

  fn visit_fn_decl(&mut self, _: &FnDecl) {}

  fn visit_function(&mut self, _: &Function) {}

  fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}

  fn visit_class(&mut self, _: &Class) {}
}
