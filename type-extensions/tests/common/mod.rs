#![allow(dead_code)]

use similar::ChangeTag;
use similar::TextDiff;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;
use type_extensions::TypeExtensions;

pub const EXTENSIONS: &str = r#"export class NumberExtensions extends Number {
  get bigInt() {
    return BigInt(this.valueOf());
  }
  add(n) {
    return this.valueOf() + n;
  }
  static sum(a, b) {
    return a + b;
  }
}

export class StringExtensions extends String {
  get bigInt() {
    return BigInt(this.valueOf());
  }
  get number() {
    return Number(this.valueOf());
  }
  shout() {
    return this.toUpperCase() + "!";
  }
}
"#;

pub const CONFIG: &str = r#"{
  "project": "jsconfig.json",
  "extensionsFile": "src/extensions.js",
  "extensions": {
    "NumberExtensions": { "typeTag": "Number" },
    "StringExtensions": { "typeTag": "String" }
  }
}"#;

/// A JavaScript project on disk with the standard extensions file and configuration.
pub struct Project {
  pub dir: TempDir,
}

impl Project {
  pub fn new(files: &[(&str, &str)]) -> Project {
    let dir = tempfile::tempdir().unwrap();
    let project = Project { dir };
    project.write("jsconfig.json", r#"{ "include": ["src"] }"#);
    project.write("type-extensions.json", CONFIG);
    project.write("src/extensions.js", EXTENSIONS);
    for (rel, text) in files {
      project.write(rel, text);
    }
    project
  }

  pub fn path(&self, rel: &str) -> PathBuf {
    self.dir.path().join(rel)
  }

  pub fn write(&self, rel: &str, text: &str) {
    let path = self.path(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
  }

  pub fn config_path(&self) -> PathBuf {
    self.path("type-extensions.json")
  }

  pub fn plugin(&self) -> TypeExtensions {
    TypeExtensions::from_config_file(&self.config_path()).unwrap()
  }
}

/// Transforms `rel` as it is on disk, expecting it to be allowed.
pub fn transform_file(plugin: &TypeExtensions, project: &Project, rel: &str) -> String {
  let path = project.path(rel);
  let source = fs::read_to_string(&path).unwrap();
  transform_source(plugin, &source, &path)
}

pub fn transform_source(plugin: &TypeExtensions, source: &str, path: &Path) -> String {
  plugin
    .transform(source, path)
    .unwrap()
    .unwrap_or_else(|| panic!("{} was skipped", path.display()))
    .code
}

/// `code` without any whitespace, for comparisons that should not depend on layout.
pub fn compact(code: &str) -> String {
  code.split_whitespace().collect()
}

/// The local name `code` imports `imported` under.
pub fn local_binding(code: &str, imported: &str) -> String {
  let marker = format!("{imported} as ");
  let start = code
    .find(&marker)
    .unwrap_or_else(|| panic!("`{imported}` is not imported in:\n{code}"))
    + marker.len();
  code[start..]
    .chars()
    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
    .collect()
}

pub fn assert_same_code(expected: &str, actual: &str) {
  if expected == actual {
    return;
  }
  let mut msg = String::from("outputs differ:\n");
  for change in TextDiff::from_lines(expected, actual).iter_all_changes() {
    let sign = match change.tag() {
      ChangeTag::Delete => "-",
      ChangeTag::Insert => "+",
      ChangeTag::Equal => " ",
    };
    msg.push_str(sign);
    msg.push_str(&change.to_string());
  }
  panic!("{msg}");
}
