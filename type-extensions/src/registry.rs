//! The extension registry: which classes extend which runtime types, which files may be
//! rewritten, and the fixed names of the generated runtime helpers.

use crate::alias::generate_alias;
use crate::alias::AliasAnchor;
use crate::config::substitute_type_check;
use crate::config::ExtensionConfig;
use crate::config::PluginConfig;
use crate::err::ConfigError;
use crate::parse::parse_module;
use crate::project::load_project_manifest;
use ahash::AHashMap;
use ahash::AHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use swc_atoms::Atom;
use swc_ecma_ast::Accessibility;
use swc_ecma_ast::Class;
use swc_ecma_ast::ClassExpr;
use swc_ecma_ast::ClassMember;
use swc_ecma_ast::Decl;
use swc_ecma_ast::DefaultDecl;
use swc_ecma_ast::ExportDecl;
use swc_ecma_ast::ExportDefaultDecl;
use swc_ecma_ast::ExportSpecifier;
use swc_ecma_ast::Ident;
use swc_ecma_ast::Key;
use swc_ecma_ast::MethodKind;
use swc_ecma_ast::Module;
use swc_ecma_ast::ModuleDecl;
use swc_ecma_ast::ModuleExportName;
use swc_ecma_ast::ModuleItem;
use swc_ecma_ast::NamedExport;
use swc_ecma_ast::PropName;
use swc_ecma_ast::Stmt;
use tracing::debug;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionMember {
  pub name: String,
  pub is_static: bool,
  /// Accessed as a property (field, getter or setter) rather than called.
  pub is_data_property: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDescriptor {
  /// The type tag. Used as the runtime type id and as the global whose statics are extended.
  pub id: String,
  pub class_name: String,
  /// Name the extensions file exports the class under; `default` for a default export.
  pub export_name: String,
  /// Type-check template, still containing its placeholder.
  pub type_check: String,
  pub members: Vec<ExtensionMember>,
}

impl ExtensionDescriptor {
  #[cfg(test)]
  pub fn has_instance_member(&self, name: &str) -> bool {
    self.members.iter().any(|m| !m.is_static && m.name == name)
  }

  pub fn has_static_member(&self, name: &str) -> bool {
    self.members.iter().any(|m| m.is_static && m.name == name)
  }
}

/// Extension descriptors in declaration order, indexed for the lookups the rewriter performs
/// on every member access.
#[derive(Clone, Debug, Default)]
pub struct ExtensionSet {
  descriptors: Vec<ExtensionDescriptor>,
  by_id: AHashMap<String, usize>,
  by_class_name: AHashMap<String, usize>,
  by_export_name: AHashMap<String, usize>,
  by_instance_member: AHashMap<String, Vec<usize>>,
}

impl ExtensionSet {
  pub fn new(descriptors: Vec<ExtensionDescriptor>) -> Self {
    let mut set = ExtensionSet::default();
    for (idx, desc) in descriptors.iter().enumerate() {
      set.by_id.insert(desc.id.clone(), idx);
      set.by_class_name.insert(desc.class_name.clone(), idx);
      set.by_export_name.insert(desc.export_name.clone(), idx);
      for member in desc.members.iter().filter(|m| !m.is_static) {
        let entry = set.by_instance_member.entry(member.name.clone()).or_default();
        if !entry.contains(&idx) {
          entry.push(idx);
        }
      }
    }
    set.descriptors = descriptors;
    set
  }

  pub fn len(&self) -> usize {
    self.descriptors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.descriptors.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
    self.descriptors.iter()
  }

  pub fn get(&self, idx: usize) -> &ExtensionDescriptor {
    &self.descriptors[idx]
  }

  pub fn by_id(&self, id: &str) -> Option<&ExtensionDescriptor> {
    self.by_id.get(id).map(|&idx| &self.descriptors[idx])
  }

  pub fn by_class_name(&self, class_name: &str) -> Option<&ExtensionDescriptor> {
    self.by_class_name.get(class_name).map(|&idx| &self.descriptors[idx])
  }

  pub fn by_export_name(&self, export_name: &str) -> Option<&ExtensionDescriptor> {
    self
      .by_export_name
      .get(export_name)
      .map(|&idx| &self.descriptors[idx])
  }

  /// Indices of extensions declaring an instance member called `name`, in declaration order.
  pub fn with_instance_member(&self, name: &str) -> &[usize] {
    self
      .by_instance_member
      .get(name)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// The extension whose type tag is `global` and which declares a static `member`.
  pub fn static_binding(&self, global: &str, member: &str) -> Option<usize> {
    self
      .by_id
      .get(global)
      .copied()
      .filter(|&idx| self.descriptors[idx].has_static_member(member))
  }
}

/// Runtime helpers with fixed generated names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuntimeName {
  TypeMap,
  TypeCheckMap,
  ReadSources,
  Wrap,
  Merge,
  Proxy,
  GetThisValue,
}

impl RuntimeName {
  pub const ALL: [RuntimeName; 7] = [
    RuntimeName::TypeMap,
    RuntimeName::TypeCheckMap,
    RuntimeName::ReadSources,
    RuntimeName::Wrap,
    RuntimeName::Merge,
    RuntimeName::Proxy,
    RuntimeName::GetThisValue,
  ];

  pub fn logical_name(self) -> &'static str {
    match self {
      RuntimeName::TypeMap => "typeMap",
      RuntimeName::TypeCheckMap => "typeCheckMap",
      RuntimeName::ReadSources => "readSources",
      RuntimeName::Wrap => "wrap",
      RuntimeName::Merge => "merge",
      RuntimeName::Proxy => "proxy",
      RuntimeName::GetThisValue => "getThisValue",
    }
  }

  /// Exported from the extensions file for rewritten call sites elsewhere.
  pub fn is_exported(self) -> bool {
    matches!(
      self,
      RuntimeName::Wrap | RuntimeName::Merge | RuntimeName::Proxy
    )
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeAliases {
  names: [String; 7],
}

impl RuntimeAliases {
  pub fn get(&self, name: RuntimeName) -> &str {
    &self.names[name as usize]
  }

  /// Which helper, if any, is declared under `ident`.
  pub fn lookup(&self, ident: &str) -> Option<RuntimeName> {
    RuntimeName::ALL
      .into_iter()
      .find(|&name| self.get(name) == ident)
  }

  pub fn iter(&self) -> impl Iterator<Item = (RuntimeName, &str)> {
    RuntimeName::ALL
      .into_iter()
      .map(move |name| (name, self.get(name)))
  }
}

/// Generates the helper names, each hashed against the extensions file path so they cannot be
/// guessed or collide with user code.
pub fn build_runtime_alias_table(extensions_file: &Path) -> RuntimeAliases {
  let anchor = extensions_file.to_string_lossy();
  RuntimeAliases {
    names: RuntimeName::ALL
      .map(|name| generate_alias(name.logical_name(), AliasAnchor::Text(&anchor))),
  }
}

/// Files of the project's own compilation scope, plus the extensions file.
#[derive(Clone, Debug, Default)]
pub struct AllowedFiles {
  pub root_dir: PathBuf,
  pub files: AHashSet<PathBuf>,
}

pub fn resolve_allowed_files(
  project: &Path,
  extensions_file: &Path,
) -> Result<AllowedFiles, ConfigError> {
  let manifest = load_project_manifest(project).map_err(ConfigError::Project)?;
  let mut files: AHashSet<PathBuf> = manifest.files.into_iter().collect();
  files.insert(extensions_file.to_path_buf());
  Ok(AllowedFiles {
    root_dir: manifest.root_dir,
    files,
  })
}

pub fn load_extension_descriptors(
  extensions_file: &Path,
  declared: &BTreeMap<String, ExtensionConfig>,
) -> Result<ExtensionSet, ConfigError> {
  if !extensions_file.is_file() {
    return Err(ConfigError::MissingExtensionsFile(
      extensions_file.to_path_buf(),
    ));
  }
  let source = fs::read_to_string(extensions_file).map_err(|source| ConfigError::Io {
    path: extensions_file.to_path_buf(),
    source,
  })?;
  let parsed = parse_module(&source, extensions_file)?;
  let classes = exported_classes(&parsed.module);

  if let Some(missing) = declared
    .keys()
    .find(|name| !classes.iter().any(|class| &*class.ident.sym == name.as_str()))
  {
    return Err(ConfigError::MissingExtensionClass {
      class: missing.clone(),
      file: extensions_file.to_path_buf(),
    });
  }

  let mut descriptors: Vec<ExtensionDescriptor> = Vec::new();
  for ExportedClass {
    ident,
    export_name,
    class,
  } in classes
  {
    let class_name = ident.sym.to_string();
    let Some(config) = declared.get(&class_name) else {
      continue;
    };
    if let Some(first) = descriptors.iter().find(|d| d.id == config.type_tag) {
      return Err(ConfigError::DuplicateTypeTag {
        tag: config.type_tag.clone(),
        first: first.class_name.clone(),
        second: class_name,
      });
    }
    let template = config
      .resolved_type_check()
      .ok_or_else(|| ConfigError::MissingTypeCheck {
        class: class_name.clone(),
        tag: config.type_tag.clone(),
      })?;
    validate_type_check(&class_name, template)?;
    let members = collect_members(class);
    if members.is_empty() {
      warn!(
        class = %class_name,
        "extension class has no public members; nothing will be rewritten for it"
      );
    }
    descriptors.push(ExtensionDescriptor {
      id: config.type_tag.clone(),
      class_name,
      export_name,
      type_check: template.to_string(),
      members,
    });
  }
  Ok(ExtensionSet::new(descriptors))
}

/// The template must be one complete expression once its placeholder is filled in.
fn validate_type_check(class_name: &str, template: &str) -> Result<(), ConfigError> {
  let source = format!("(value) => ({});\n", substitute_type_check(template, "value"));
  let parsed = parse_module(&source, Path::new("type-check.js")).map_err(|err| {
    ConfigError::InvalidTypeCheck {
      class: class_name.to_string(),
      message: err.message,
    }
  })?;
  if parsed.module.body.len() != 1 {
    return Err(ConfigError::InvalidTypeCheck {
      class: class_name.to_string(),
      message: "expected a single expression".to_string(),
    });
  }
  Ok(())
}

struct ExportedClass<'a> {
  ident: &'a Ident,
  export_name: String,
  class: &'a Class,
}

/// Exported class declarations in source order, whether exported inline, as the default export
/// or through a later `export { Name }` (possibly renamed).
fn exported_classes(module: &Module) -> Vec<ExportedClass<'_>> {
  let mut classes = Vec::new();
  let mut exported_later: AHashMap<Atom, String> = AHashMap::new();
  for item in &module.body {
    match item {
      ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
        decl: Decl::Class(decl),
        ..
      })) => classes.push((&decl.ident, &*decl.class, Some(decl.ident.sym.to_string()))),
      ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
        decl: DefaultDecl::Class(ClassExpr {
          ident: Some(ident),
          class,
          ..
        }),
        ..
      })) => classes.push((ident, &**class, Some("default".to_string()))),
      ModuleItem::Stmt(Stmt::Decl(Decl::Class(decl))) => {
        classes.push((&decl.ident, &*decl.class, None))
      }
      ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(NamedExport {
        src: None,
        specifiers,
        type_only: false,
        ..
      })) => {
        for specifier in specifiers {
          let ExportSpecifier::Named(named) = specifier else {
            continue;
          };
          let ModuleExportName::Ident(orig) = &named.orig else {
            continue;
          };
          let exported = match &named.exported {
            Some(name) => export_name_text(name),
            None => Some(orig.sym.to_string()),
          };
          if let Some(exported) = exported {
            exported_later.entry(orig.sym.clone()).or_insert(exported);
          }
        }
      }
      _ => {}
    }
  }
  classes
    .into_iter()
    .filter_map(|(ident, class, inline_export)| {
      let export_name = inline_export.or_else(|| exported_later.get(&ident.sym).cloned())?;
      Some(ExportedClass {
        ident,
        export_name,
        class,
      })
    })
    .collect()
}

fn export_name_text(name: &ModuleExportName) -> Option<String> {
  match name {
    ModuleExportName::Ident(ident) => Some(ident.sym.to_string()),
    ModuleExportName::Str(s) => s.value.as_atom().map(|atom| atom.to_string()),
  }
}

/// Public members only; `private`/`protected` and `#private` members are implementation details
/// of the extension class.
fn collect_members(class: &Class) -> Vec<ExtensionMember> {
  let mut members: Vec<ExtensionMember> = Vec::new();
  for member in &class.body {
    let (key, is_static, is_data_property, accessibility) = match member {
      ClassMember::Method(method) => {
        // Overload signatures and abstract methods have no runtime presence.
        if method.function.body.is_none() {
          continue;
        }
        (
          &method.key,
          method.is_static,
          method.kind != MethodKind::Method,
          method.accessibility,
        )
      }
      ClassMember::ClassProp(prop) if !prop.declare && !prop.is_abstract => {
        (&prop.key, prop.is_static, true, prop.accessibility)
      }
      ClassMember::AutoAccessor(accessor) => match &accessor.key {
        Key::Public(key) => (key, accessor.is_static, true, accessor.accessibility),
        Key::Private(_) => continue,
      },
      _ => continue,
    };
    if matches!(
      accessibility,
      Some(Accessibility::Private | Accessibility::Protected)
    ) {
      continue;
    }
    let Some(name) = prop_name_text(key) else {
      continue;
    };
    if members
      .iter()
      .any(|m| m.name == name && m.is_static == is_static)
    {
      continue;
    }
    members.push(ExtensionMember {
      name,
      is_static,
      is_data_property,
    });
  }
  members
}

pub(crate) fn prop_name_text(key: &PropName) -> Option<String> {
  match key {
    PropName::Ident(ident) => Some(ident.sym.to_string()),
    PropName::Str(s) => s.value.as_atom().map(|atom| atom.to_string()),
    PropName::Num(n) => Some(n.value.to_string()),
    _ => None,
  }
}

/// Everything the rewriter needs for one build. Immutable; rebuilds produce a new value.
#[derive(Clone, Debug)]
pub struct Registry {
  allowed: AllowedFiles,
  extensions: ExtensionSet,
  runtime_aliases: RuntimeAliases,
  extensions_file: PathBuf,
}

impl Registry {
  pub fn build(config: &PluginConfig) -> Result<Registry, ConfigError> {
    let extensions_file = canonical_extensions_file(&config.extensions_file)?;
    let extensions = load_extension_descriptors(&extensions_file, &config.extensions)?;
    let allowed = resolve_allowed_files(&config.project, &extensions_file)?;
    let runtime_aliases = build_runtime_alias_table(&extensions_file);
    debug!(
      extensions = extensions.len(),
      allowed_files = allowed.files.len(),
      extensions_file = %extensions_file.display(),
      "built extension registry"
    );
    Ok(Registry {
      allowed,
      extensions,
      runtime_aliases,
      extensions_file,
    })
  }

  /// A copy of this registry with freshly loaded extension descriptors.
  pub fn rebuild_extensions(&self, config: &PluginConfig) -> Result<Registry, ConfigError> {
    let extensions = load_extension_descriptors(&self.extensions_file, &config.extensions)?;
    debug!(extensions = extensions.len(), "reloaded extension descriptors");
    Ok(Registry {
      extensions,
      ..self.clone()
    })
  }

  /// A copy of this registry with a freshly resolved allow-list.
  pub fn rebuild_allowed_files(&self, config: &PluginConfig) -> Result<Registry, ConfigError> {
    let allowed = resolve_allowed_files(&config.project, &self.extensions_file)?;
    debug!(allowed_files = allowed.files.len(), "resolved allowed files");
    Ok(Registry {
      allowed,
      ..self.clone()
    })
  }

  /// `path` must already be canonical.
  pub fn is_allowed(&self, path: &Path) -> bool {
    self.allowed.files.contains(path)
  }

  /// Allowed files, sorted.
  pub fn allowed_files(&self) -> Vec<&Path> {
    let mut files: Vec<&Path> = self.allowed.files.iter().map(PathBuf::as_path).collect();
    files.sort();
    files
  }

  pub fn root_dir(&self) -> &Path {
    &self.allowed.root_dir
  }

  pub fn extensions(&self) -> &ExtensionSet {
    &self.extensions
  }

  pub fn runtime_aliases(&self) -> &RuntimeAliases {
    &self.runtime_aliases
  }

  pub fn extensions_file(&self) -> &Path {
    &self.extensions_file
  }

  pub fn is_extensions_file(&self, path: &Path) -> bool {
    self.extensions_file == path
  }

  /// Serializable view of the descriptors, in declaration order.
  pub fn describe(&self) -> Vec<ExtensionDescriptor> {
    self.extensions.iter().cloned().collect()
  }
}

fn canonical_extensions_file(path: &Path) -> Result<PathBuf, ConfigError> {
  path
    .canonicalize()
    .map_err(|_| ConfigError::MissingExtensionsFile(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  const EXTENSIONS: &str = r#"
    export class NumberExtensions extends Number {
      get bigInt(): bigint { return BigInt(this.valueOf()); }
      static sum(a: number, b: number): number { return a + b; }
      add(n: any): any;
      add(n: number): number { return this.valueOf() + n; }
      private secret(): number { return 1; }
      protected internal = 2;
      #hidden = 3;
      label = "number";
    }

    class StringExtensions extends String {
      get bigInt() { return BigInt(this.valueOf()); }
      "kebab-case"() { return this.toLowerCase(); }
    }

    class NotExported {}

    export { StringExtensions as Strings };
    export default class BooleanExtensions extends Boolean {
      get int() { return this.valueOf() ? 1 : 0; }
    }
  "#;

  fn declared(pairs: &[(&str, &str)]) -> BTreeMap<String, ExtensionConfig> {
    pairs
      .iter()
      .map(|(class, tag)| (class.to_string(), ExtensionConfig::new(*tag)))
      .collect()
  }

  fn write_extensions(source: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("extensions.ts");
    fs::write(&path, source).unwrap();
    (dir, path)
  }

  #[test]
  fn collects_public_members_in_declaration_order() {
    let (_dir, path) = write_extensions(EXTENSIONS);
    let set = load_extension_descriptors(
      &path,
      &declared(&[
        ("BooleanExtensions", "Boolean"),
        ("NumberExtensions", "Number"),
        ("StringExtensions", "String"),
      ]),
    )
    .unwrap();

    let ids: Vec<&str> = set.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["Number", "String", "Boolean"]);

    let number = set.by_id("Number").unwrap();
    let names: Vec<(&str, bool, bool)> = number
      .members
      .iter()
      .map(|m| (m.name.as_str(), m.is_static, m.is_data_property))
      .collect();
    assert_eq!(
      names,
      vec![
        ("bigInt", false, true),
        ("sum", true, false),
        ("add", false, false),
        ("label", false, true),
      ]
    );
    assert!(set.by_id("String").unwrap().has_instance_member("kebab-case"));
    assert_eq!(set.with_instance_member("bigInt"), &[0, 1]);
    assert_eq!(set.with_instance_member("sum"), &[] as &[usize]);
    assert_eq!(set.static_binding("Number", "sum"), Some(0));
    assert_eq!(set.static_binding("Number", "bigInt"), None);
    assert_eq!(
      set.by_class_name("BooleanExtensions").map(|d| d.id.as_str()),
      Some("Boolean")
    );
    let exports: Vec<&str> = set.iter().map(|d| d.export_name.as_str()).collect();
    assert_eq!(exports, vec!["NumberExtensions", "Strings", "default"]);
    assert_eq!(
      set.by_export_name("default").map(|d| d.class_name.as_str()),
      Some("BooleanExtensions")
    );
  }

  #[test]
  fn unexported_or_missing_classes_are_config_errors() {
    let (_dir, path) = write_extensions(EXTENSIONS);
    for class in ["NotExported", "Missing"] {
      let err = load_extension_descriptors(&path, &declared(&[(class, "Object")])).unwrap_err();
      assert!(
        matches!(&err, ConfigError::MissingExtensionClass { class: c, .. } if c == class),
        "{err}"
      );
    }
  }

  #[test]
  fn type_checks_are_validated() {
    let (_dir, path) = write_extensions(EXTENSIONS);
    let mut config = declared(&[("NumberExtensions", "Integer")]);
    let err = load_extension_descriptors(&path, &config).unwrap_err();
    assert!(matches!(err, ConfigError::MissingTypeCheck { .. }), "{err}");

    config.insert(
      "NumberExtensions".to_string(),
      ExtensionConfig::new("Integer").with_type_check("Number.isInteger({value}"),
    );
    let err = load_extension_descriptors(&path, &config).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTypeCheck { .. }), "{err}");

    config.insert(
      "NumberExtensions".to_string(),
      ExtensionConfig::new("Integer").with_type_check("Number.isInteger({value})"),
    );
    let set = load_extension_descriptors(&path, &config).unwrap();
    assert_eq!(set.get(0).type_check, "Number.isInteger({value})");
  }

  #[test]
  fn duplicate_type_tags_are_rejected() {
    let (_dir, path) = write_extensions(EXTENSIONS);
    let err = load_extension_descriptors(
      &path,
      &declared(&[("NumberExtensions", "Number"), ("StringExtensions", "Number")]),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateTypeTag { .. }), "{err}");
  }

  #[test]
  fn missing_extensions_file() {
    let dir = tempdir().unwrap();
    let err = load_extension_descriptors(&dir.path().join("nope.ts"), &BTreeMap::new()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingExtensionsFile(_)), "{err}");
  }

  #[test]
  fn runtime_aliases_are_stable_per_extensions_file() {
    let a = build_runtime_alias_table(Path::new("/project/src/extensions.ts"));
    let b = build_runtime_alias_table(Path::new("/project/src/extensions.ts"));
    let c = build_runtime_alias_table(Path::new("/other/src/extensions.ts"));
    assert_eq!(a, b);
    assert_ne!(a.get(RuntimeName::Wrap), c.get(RuntimeName::Wrap));
    assert!(a.get(RuntimeName::Proxy).starts_with("proxy_"));
    assert_eq!(a.lookup(a.get(RuntimeName::Merge)), Some(RuntimeName::Merge));
    assert_eq!(a.lookup("merge"), None);
    let distinct: AHashSet<&str> = a.iter().map(|(_, name)| name).collect();
    assert_eq!(distinct.len(), RuntimeName::ALL.len());
  }

  #[test]
  fn registry_allows_project_files_and_the_extensions_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("lib")).unwrap();
    fs::write(root.join("tsconfig.json"), r#"{ "include": ["src"] }"#).unwrap();
    fs::write(root.join("src/main.ts"), "").unwrap();
    fs::write(root.join("lib/extensions.ts"), EXTENSIONS).unwrap();
    let config = PluginConfig::new(root.join("tsconfig.json"), root.join("lib/extensions.ts"))
      .with_extension("NumberExtensions", ExtensionConfig::new("Number"));

    let registry = Registry::build(&config).unwrap();
    let main = root.join("src/main.ts").canonicalize().unwrap();
    let extensions = root.join("lib/extensions.ts").canonicalize().unwrap();
    assert!(registry.is_allowed(&main));
    assert!(registry.is_allowed(&extensions));
    assert!(registry.is_extensions_file(&extensions));
    assert_eq!(registry.allowed_files().len(), 2);
    assert_eq!(registry.describe().len(), 1);
  }
}
