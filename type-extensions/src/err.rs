use std::io;
use std::path::PathBuf;

/// Problems with the plugin configuration, the project manifest or the extensions file. These
/// abort a build; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {}: {message}", .path.display())]
  InvalidJson { path: PathBuf, message: String },

  /// The configured extensions file does not exist.
  #[error("extensions file {} does not exist", .0.display())]
  MissingExtensionsFile(PathBuf),

  /// A class named in the configuration is not exported by the extensions file.
  #[error("extension class `{class}` is not exported from {}", .file.display())]
  MissingExtensionClass { class: String, file: PathBuf },

  /// The type tag has neither a configured nor a built-in type check.
  #[error("extension class `{class}` has no type check for type tag `{tag}`")]
  MissingTypeCheck { class: String, tag: String },

  #[error("type check for extension class `{class}` is not a valid expression: {message}")]
  InvalidTypeCheck { class: String, message: String },

  /// Two extension classes claim the same type tag.
  #[error("type tag `{tag}` is used by both `{first}` and `{second}`")]
  DuplicateTypeTag {
    tag: String,
    first: String,
    second: String,
  },

  /// The project manifest could not be resolved into a file list.
  #[error("{0}")]
  Project(String),

  #[error(transparent)]
  Parse(#[from] ParseError),
}

/// A source file that is not syntactically valid. No partial output is ever produced for it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{}:{line}:{column}: {message}", .path.display())]
pub struct ParseError {
  pub path: PathBuf,
  /// 1-based.
  pub line: usize,
  /// 1-based.
  pub column: usize,
  pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
  #[error(transparent)]
  Parse(#[from] ParseError),

  /// Rewritten destructuring could not be given a safe evaluation order.
  #[error("{}: cannot reorder destructured binding `{binding}`", .path.display())]
  UnresolvableDefault { path: PathBuf, binding: String },

  #[error("failed to print {}: {source}", .path.display())]
  Emit {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}
