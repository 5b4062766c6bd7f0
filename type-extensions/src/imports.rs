//! Per-file bookkeeping of the runtime module's import bindings.

use crate::alias::generate_alias;
use crate::alias::AliasAnchor;
use ahash::AHashMap;
use std::path::Component;
use std::path::Path;
use swc_common::DUMMY_SP;
use swc_ecma_ast::Ident;
use swc_ecma_ast::ImportDecl;
use swc_ecma_ast::ImportNamedSpecifier;
use swc_ecma_ast::ImportPhase;
use swc_ecma_ast::ImportSpecifier;
use swc_ecma_ast::ModuleExportName;
use swc_ecma_ast::Str;

/// Extensions a module specifier may carry while still naming the same module.
const MODULE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedImport {
  /// Name exported by the runtime module.
  pub imported: String,
  /// Binding in the file being rewritten.
  pub local: String,
}

/// Maps names exported by the runtime module to their local bindings in one file. Each name is
/// imported at most once; bindings from an existing import are reused.
#[derive(Clone, Debug)]
pub struct ImportTracker {
  specifier: String,
  entries: Vec<TrackedImport>,
  by_imported: AHashMap<String, usize>,
  by_local: AHashMap<String, usize>,
  inline: bool,
  /// Set once an existing import has decided how the specifier is spelled.
  specifier_adopted: bool,
}

impl ImportTracker {
  pub fn new(specifier: impl Into<String>) -> Self {
    ImportTracker {
      specifier: specifier.into(),
      entries: Vec::new(),
      by_imported: AHashMap::new(),
      by_local: AHashMap::new(),
      inline: false,
      specifier_adopted: false,
    }
  }

  /// For the extensions file itself, where the runtime is declared inline and every name refers
  /// to itself.
  pub fn inline() -> Self {
    ImportTracker {
      inline: true,
      ..ImportTracker::new("")
    }
  }

  pub fn is_inline(&self) -> bool {
    self.inline
  }

  pub fn specifier(&self) -> &str {
    &self.specifier
  }

  /// Whether `src` refers to the runtime module, with or without a file extension.
  pub fn is_runtime_module(&self, src: &str) -> bool {
    if self.inline {
      return false;
    }
    if src == self.specifier {
      return true;
    }
    src
      .strip_prefix(self.specifier.as_str())
      .and_then(|rest| rest.strip_prefix('.'))
      .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext))
  }

  /// Takes over the named and default bindings of an existing import of the runtime module.
  /// Namespace imports cannot be merged into a named import and stay on `decl`. The
  /// first seeded import also fixes the specifier, so `./extensions.js` stays `./extensions.js`.
  pub fn seed(&mut self, decl: &mut ImportDecl) {
    if !self.specifier_adopted {
      if let Some(src) = decl.src.value.as_atom() {
        self.specifier = src.to_string();
        self.specifier_adopted = true;
      }
    }
    let mut rest = Vec::new();
    for specifier in decl.specifiers.drain(..) {
      match specifier {
        ImportSpecifier::Named(named) if !named.is_type_only => {
          let local = named.local.sym.to_string();
          let imported = match &named.imported {
            Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
            Some(ModuleExportName::Str(s)) => match s.value.as_atom() {
              Some(atom) => atom.to_string(),
              None => {
                rest.push(ImportSpecifier::Named(named));
                continue;
              }
            },
            None => local.clone(),
          };
          self.record(imported, local);
        }
        ImportSpecifier::Default(default) => {
          self.record("default".to_string(), default.local.sym.to_string());
        }
        other => rest.push(other),
      }
    }
    decl.specifiers = rest;
  }

  /// The local binding for `imported`, importing it under a fresh alias of `logical_name` if the
  /// file does not have one yet.
  pub fn read_import_name(
    &mut self,
    imported: &str,
    logical_name: &str,
    anchor: AliasAnchor,
  ) -> String {
    if self.inline {
      return imported.to_string();
    }
    if let Some(&idx) = self.by_imported.get(imported) {
      return self.entries[idx].local.clone();
    }
    let local = generate_alias(logical_name, anchor);
    self.record(imported.to_string(), local.clone());
    local
  }

  #[cfg(test)]
  pub fn local_for(&self, imported: &str) -> Option<&str> {
    self
      .by_imported
      .get(imported)
      .map(|&idx| self.entries[idx].local.as_str())
  }

  /// The runtime module export bound to `local`, if `local` is one of its bindings here.
  pub fn imported_name(&self, local: &str) -> Option<&str> {
    self
      .by_local
      .get(local)
      .map(|&idx| self.entries[idx].imported.as_str())
  }

  /// Whether `local` is a binding of the runtime module in this file.
  #[cfg(test)]
  pub fn is_tracked_local(&self, local: &str) -> bool {
    self.by_local.contains_key(local)
  }

  pub fn entries(&self) -> &[TrackedImport] {
    &self.entries
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// `import { imported as local, ... } from "<specifier>"`, or nothing if no binding is needed.
  pub fn to_import_decl(&self) -> Option<ImportDecl> {
    if self.inline || self.entries.is_empty() {
      return None;
    }
    let specifiers = self
      .entries
      .iter()
      .map(|entry| {
        let imported = (entry.imported != entry.local).then(|| {
          ModuleExportName::Ident(Ident::new_no_ctxt(entry.imported.as_str().into(), DUMMY_SP))
        });
        ImportSpecifier::Named(ImportNamedSpecifier {
          span: DUMMY_SP,
          local: Ident::new_no_ctxt(entry.local.as_str().into(), DUMMY_SP),
          imported,
          is_type_only: false,
        })
      })
      .collect();
    Some(ImportDecl {
      span: DUMMY_SP,
      specifiers,
      src: Box::new(Str::from(self.specifier.as_str())),
      type_only: false,
      with: None,
      phase: ImportPhase::Evaluation,
    })
  }

  fn record(&mut self, imported: String, local: String) {
    if self.by_imported.contains_key(&imported) {
      return;
    }
    let idx = self.entries.len();
    self.by_imported.insert(imported.clone(), idx);
    self.by_local.insert(local.clone(), idx);
    self.entries.push(TrackedImport { imported, local });
  }
}

/// Relative specifier from `from_file` to `target_file`, without the target's extension:
/// `./extensions`, `../lib/extensions`.
pub fn runtime_module_specifier(from_file: &Path, target_file: &Path) -> String {
  let from_dir: Vec<Component> = from_file
    .parent()
    .map(|dir| dir.components().collect())
    .unwrap_or_default();
  let target = target_file.with_extension("");
  let to: Vec<Component> = target.components().collect();
  let common = from_dir
    .iter()
    .zip(to.iter())
    .take_while(|(a, b)| a == b)
    .count();

  let mut parts: Vec<String> = Vec::new();
  parts.extend(from_dir[common..].iter().map(|_| "..".to_string()));
  parts.extend(
    to[common..]
      .iter()
      .map(|c| c.as_os_str().to_string_lossy().into_owned()),
  );
  let joined = parts.join("/");
  if joined.starts_with("../") {
    joined
  } else {
    format!("./{joined}")
  }
}
