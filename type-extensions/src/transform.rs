use crate::emit::print_module;
use crate::err::TransformError;
use crate::imports::runtime_module_specifier;
use crate::imports::ImportTracker;
use crate::parse::parse_module;
use crate::parse::ParsedModule;
use crate::registry::Registry;
use crate::rewrite::Rewriter;
use crate::rewrite::TransformContext;
use crate::runtime::generate_runtime;
use crate::runtime::strip_runtime;
use std::path::Path;
use std::path::PathBuf;
use swc_common::comments::Comments;
use swc_ecma_ast::ModuleDecl;
use swc_ecma_ast::ModuleItem;
use swc_ecma_visit::VisitMutWith;
use tracing::debug;
use tracing::debug_span;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformOutput {
  pub code: String,
  /// Source map of the rewrite. Not produced yet; consumers fall back to the untransformed
  /// positions.
  pub map: Option<String>,
}

/// Rewrites one file. Returns `Ok(None)` for files outside the allow-list, which are left for
/// other plugins untouched.
pub fn transform(
  registry: &Registry,
  source: &str,
  path: &Path,
) -> Result<Option<TransformOutput>, TransformError> {
  let path = normalize_path(path);
  if !registry.is_allowed(&path) {
    return Ok(None);
  }
  let span = debug_span!("transform", path = %path.display());
  let _enter = span.enter();

  let ParsedModule {
    cm,
    fm,
    comments,
    mut module,
  } = parse_module(source, &path)?;

  let is_extensions_file = registry.is_extensions_file(&path);
  let imports = if is_extensions_file {
    strip_runtime(&mut module.body, registry.runtime_aliases());
    ImportTracker::inline()
  } else {
    let mut tracker = ImportTracker::new(runtime_module_specifier(
      &path,
      registry.extensions_file(),
    ));
    adopt_runtime_imports(&mut module.body, &mut tracker);
    tracker
  };

  let mut cx = TransformContext {
    registry,
    imports,
    is_extensions_file,
    path: &path,
    file_start: fm.start_pos,
  };
  let mut rewriter = Rewriter::new(&mut cx);
  module.visit_mut_with(&mut rewriter);
  rewriter.finish()?;

  if is_extensions_file {
    let runtime = generate_runtime(&cm, registry)?;
    let at = first_non_import(&module.body);
    module.body.splice(at..at, runtime.prefix);
    module.body.extend(runtime.suffix);
  } else if let Some(import) = cx.imports.to_import_decl() {
    let at = first_non_import(&module.body);
    module
      .body
      .insert(at, ModuleItem::ModuleDecl(ModuleDecl::Import(import)));
  }

  let code = print_module(cm, Some(&comments as &dyn Comments), &module).map_err(|source| {
    TransformError::Emit {
      path: path.clone(),
      source,
    }
  })?;
  debug!(runtime_imports = cx.imports.entries().len(), "transformed");
  Ok(Some(TransformOutput { code, map: None }))
}

/// Canonical form used for allow-list lookups. Paths that do not exist on disk are made absolute
/// without resolving symlinks.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
  path
    .canonicalize()
    .or_else(|_| std::path::absolute(path))
    .unwrap_or_else(|_| path.to_path_buf())
}

/// Moves named bindings of existing runtime imports into `tracker`, so the file ends up with a
/// single merged import. Imports left with no specifiers are dropped; side-effect-only imports
/// are kept.
fn adopt_runtime_imports(body: &mut Vec<ModuleItem>, tracker: &mut ImportTracker) {
  body.retain_mut(|item| {
    let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item else {
      return true;
    };
    let is_runtime = !import.type_only
      && import
        .src
        .value
        .as_atom()
        .is_some_and(|src| tracker.is_runtime_module(src));
    if !is_runtime {
      return true;
    }
    let side_effect_only = import.specifiers.is_empty();
    tracker.seed(import);
    side_effect_only || !import.specifiers.is_empty()
  });
}

fn first_non_import(body: &[ModuleItem]) -> usize {
  body
    .iter()
    .position(|item| !matches!(item, ModuleItem::ModuleDecl(ModuleDecl::Import(_))))
    .unwrap_or(body.len())
}
