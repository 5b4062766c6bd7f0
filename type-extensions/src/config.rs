use crate::err::ConfigError;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Substituted with the probed expression in a type-check template.
pub const TYPE_CHECK_PLACEHOLDER: &str = "{value}";

static DEFAULT_TYPE_CHECKS: Lazy<AHashMap<&'static str, &'static str>> = Lazy::new(|| {
  let mut map = AHashMap::new();
  map.insert("Boolean", r#"typeof {value} === "boolean""#);
  map.insert("Number", r#"typeof {value} === "number""#);
  map.insert("BigInt", r#"typeof {value} === "bigint""#);
  map.insert("String", r#"typeof {value} === "string""#);
  map.insert("Symbol", r#"typeof {value} === "symbol""#);
  map.insert("Function", r#"typeof {value} === "function""#);
  map.insert("RegExp", "{value} instanceof RegExp");
  map.insert("Date", "{value} instanceof Date");
  map.insert("Array", "Array.isArray({value})");
  map.insert("Object", r#"typeof {value} === "object" && {value} !== null"#);
  map
});

/// The built-in type check for one of the standard type tags.
pub fn default_type_check(type_tag: &str) -> Option<&'static str> {
  DEFAULT_TYPE_CHECKS.get(type_tag).copied()
}

/// Replaces every placeholder in `template` with `value`.
pub fn substitute_type_check(template: &str, value: &str) -> String {
  template.replace(TYPE_CHECK_PLACEHOLDER, value)
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionConfig {
  /// Runtime type id of the extension, also the global name whose static members it extends
  /// (e.g. `Number`).
  pub type_tag: String,
  /// Predicate template; defaults to the built-in check for standard tags.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub type_check: Option<String>,
}

impl ExtensionConfig {
  pub fn new(type_tag: impl Into<String>) -> Self {
    ExtensionConfig {
      type_tag: type_tag.into(),
      type_check: None,
    }
  }

  pub fn with_type_check(mut self, template: impl Into<String>) -> Self {
    self.type_check = Some(template.into());
    self
  }

  pub fn resolved_type_check(&self) -> Option<&str> {
    self
      .type_check
      .as_deref()
      .or_else(|| default_type_check(&self.type_tag))
  }
}

fn default_project() -> PathBuf {
  PathBuf::from("tsconfig.json")
}

/// Plugin configuration, normally read from a JSON file:
///
/// ```json
/// {
///   "project": "tsconfig.json",
///   "extensionsFile": "src/extensions.ts",
///   "extensions": {
///     "NumberExtensions": { "typeTag": "Number" },
///     "PointExtensions": { "typeTag": "Point", "typeCheck": "{value} instanceof Point" }
///   }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfig {
  /// Project manifest (tsconfig-style) deciding which files may be transformed.
  #[serde(default = "default_project")]
  pub project: PathBuf,
  pub extensions_file: PathBuf,
  /// Extension class name to its type metadata.
  #[serde(default)]
  pub extensions: BTreeMap<String, ExtensionConfig>,
  /// Where this configuration was loaded from, if it came from a file.
  #[serde(skip)]
  pub config_path: Option<PathBuf>,
}

impl PluginConfig {
  pub fn new(project: impl Into<PathBuf>, extensions_file: impl Into<PathBuf>) -> Self {
    PluginConfig {
      project: project.into(),
      extensions_file: extensions_file.into(),
      extensions: BTreeMap::new(),
      config_path: None,
    }
  }

  pub fn with_extension(mut self, class_name: impl Into<String>, extension: ExtensionConfig) -> Self {
    self.extensions.insert(class_name.into(), extension);
    self
  }

  /// Reads a JSON configuration file. Relative paths inside it are resolved against the
  /// file's directory.
  pub fn load(path: &Path) -> Result<PluginConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    let mut config: PluginConfig =
      serde_json::from_str(&text).map_err(|err| ConfigError::InvalidJson {
        path: path.to_path_buf(),
        message: err.to_string(),
      })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    config.project = resolve_path_relative_to(base, &config.project);
    config.extensions_file = resolve_path_relative_to(base, &config.extensions_file);
    config.config_path = Some(path.to_path_buf());
    Ok(config)
  }
}

fn resolve_path_relative_to(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  }
}
