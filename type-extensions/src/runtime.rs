//! The helpers injected into the extensions file.
//!
//! The prefix declares the helper functions and goes before the file's own statements, the
//! suffix declares the type tables and goes after them, once every extension class exists.
//! Helper names come from [`RuntimeAliases`], so the text differs per extensions file but is
//! otherwise fixed. Stripping previously injected items first makes re-running the transform on
//! its own output a no-op.

use crate::config::substitute_type_check;
use crate::err::ParseError;
use crate::parse::parse_module_in;
use crate::registry::Registry;
use crate::registry::RuntimeAliases;
use crate::registry::RuntimeName;
use std::fmt::Write;
use std::path::Path;
use swc_common::sync::Lrc;
use swc_common::SourceMap;
use swc_ecma_ast::Decl;
use swc_ecma_ast::ExportDecl;
use swc_ecma_ast::ModuleDecl;
use swc_ecma_ast::ModuleItem;
use swc_ecma_ast::Pat;
use swc_ecma_ast::Stmt;
use tracing::debug;

const RUNTIME_FILE_NAME: &str = "type-extensions-runtime.js";

pub(crate) struct RuntimeItems {
  pub prefix: Vec<ModuleItem>,
  pub suffix: Vec<ModuleItem>,
}

/// JavaScript text of the helper functions.
pub fn runtime_prefix_source(aliases: &RuntimeAliases) -> String {
  let type_map = aliases.get(RuntimeName::TypeMap);
  let type_check_map = aliases.get(RuntimeName::TypeCheckMap);
  let read_sources = aliases.get(RuntimeName::ReadSources);
  let wrap = aliases.get(RuntimeName::Wrap);
  let merge = aliases.get(RuntimeName::Merge);
  let proxy = aliases.get(RuntimeName::Proxy);
  let get_this_value = aliases.get(RuntimeName::GetThisValue);
  format!(
    r#"
function {read_sources}(object) {{
  const sources = [];
  for (let proto = Object.getPrototypeOf(object); proto !== null && proto !== Object.prototype; proto = Object.getPrototypeOf(proto)) {{
    sources.unshift(proto);
  }}
  return sources;
}}
function {get_this_value}(self, Type) {{
  return self instanceof Type ? self : new Type(self);
}}
export function {wrap}(value, typeId, key) {{
  if (value === null || value === undefined || value[key] !== undefined) {{
    return value;
  }}
  const Type = {type_map}.get(typeId);
  return new Type(value);
}}
export function {merge}(value, typeId) {{
  const Type = {type_map}.get(typeId);
  const instance = new Type(value);
  const object = Object(value);
  const result = Object.create(Object.getPrototypeOf(object));
  Object.defineProperties(result, Object.getOwnPropertyDescriptors(object));
  const members = new Map();
  for (const source of {read_sources}(instance)) {{
    for (const key of Reflect.ownKeys(source)) {{
      if (key !== "constructor") {{
        members.set(key, Object.getOwnPropertyDescriptor(source, key));
      }}
    }}
  }}
  for (const [key, descriptor] of members) {{
    if (key in result) {{
      continue;
    }}
    const member = {{ ...descriptor, enumerable: true }};
    if (typeof member.get === "function") {{
      member.get = member.get.bind(instance);
    }}
    if (typeof member.set === "function") {{
      member.set = member.set.bind(instance);
    }}
    if (typeof member.value === "function") {{
      member.value = member.value.bind(instance);
    }}
    Object.defineProperty(result, key, member);
  }}
  return result;
}}
export function {proxy}(value, typeIds, keyOrMerge) {{
  if (value === null || value === undefined) {{
    return value;
  }}
  for (const typeId of typeIds) {{
    const check = {type_check_map}.get(typeId);
    if (check !== undefined && check(value)) {{
      return keyOrMerge === true ? {merge}(value, typeId) : {wrap}(value, typeId, keyOrMerge);
    }}
  }}
  return value;
}}
"#
  )
}

/// JavaScript text of the type tables, in declaration order of the extension classes.
pub fn runtime_suffix_source(registry: &Registry) -> String {
  let aliases = registry.runtime_aliases();
  let mut type_map = String::new();
  let mut type_check_map = String::new();
  for desc in registry.extensions().iter() {
    let tag = js_string(&desc.id);
    let _ = writeln!(type_map, "  [{tag}, {}],", desc.class_name);
    let _ = writeln!(
      type_check_map,
      "  [{tag}, (value) => {}],",
      substitute_type_check(&desc.type_check, "value")
    );
  }
  format!(
    "const {} = new Map([\n{type_map}]);\nconst {} = new Map([\n{type_check_map}]);\n",
    aliases.get(RuntimeName::TypeMap),
    aliases.get(RuntimeName::TypeCheckMap),
  )
}

fn js_string(value: &str) -> String {
  serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
}

/// Parses both halves of the runtime into `cm`, next to the file they are injected into.
pub(crate) fn generate_runtime(
  cm: &Lrc<SourceMap>,
  registry: &Registry,
) -> Result<RuntimeItems, ParseError> {
  let path = Path::new(RUNTIME_FILE_NAME);
  let prefix = parse_module_in(
    cm.clone(),
    &runtime_prefix_source(registry.runtime_aliases()),
    path,
  )?;
  let suffix = parse_module_in(cm.clone(), &runtime_suffix_source(registry), path)?;
  Ok(RuntimeItems {
    prefix: prefix.module.body,
    suffix: suffix.module.body,
  })
}

/// Removes helper declarations a previous run injected.
pub(crate) fn strip_runtime(body: &mut Vec<ModuleItem>, aliases: &RuntimeAliases) {
  let before = body.len();
  body.retain(|item| !is_runtime_item(item, aliases));
  if body.len() != before {
    debug!(removed = before - body.len(), "stripped injected runtime");
  }
}

fn is_runtime_item(item: &ModuleItem, aliases: &RuntimeAliases) -> bool {
  match item {
    ModuleItem::Stmt(Stmt::Decl(decl))
    | ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl { decl, .. })) => {
      is_runtime_decl(decl, aliases)
    }
    _ => false,
  }
}

fn is_runtime_decl(decl: &Decl, aliases: &RuntimeAliases) -> bool {
  match decl {
    Decl::Fn(f) => aliases.lookup(&f.ident.sym).is_some(),
    Decl::Var(var) => {
      !var.decls.is_empty()
        && var.decls.iter().all(|d| match &d.name {
          Pat::Ident(binding) => aliases.lookup(&binding.id.sym).is_some(),
          _ => false,
        })
    }
    _ => false,
  }
}
