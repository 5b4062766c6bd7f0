//! Build-time rewriting that lets code call extension members on JavaScript primitives and
//! built-ins, e.g. `(5).add(2)` or `'1234'.bigInt`, without touching any global prototype.
//!
//! Extension classes live in one extensions file. Every other allowed file has its extension
//! member accesses routed through small runtime helpers, which are injected into the extensions
//! file and imported from it.
//!
//! ```no_run
//! use std::path::Path;
//! use type_extensions::TypeExtensions;
//!
//! let plugin = TypeExtensions::from_config_file(Path::new("type-extensions.json"))?;
//! let source = "export const big = '1234'.bigInt;";
//! if let Some(out) = plugin.transform(source, Path::new("src/main.ts"))? {
//!   println!("{}", out.code);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod alias;
pub mod classify;
pub mod config;
mod emit;
pub mod err;
pub mod imports;
mod parse;
pub mod plugin;
pub mod project;
pub mod registry;
mod rewrite;
pub mod runtime;
pub mod transform;

pub use config::ExtensionConfig;
pub use config::PluginConfig;
pub use err::ConfigError;
pub use err::ParseError;
pub use err::TransformError;
pub use plugin::Invalidation;
pub use plugin::TypeExtensions;
pub use registry::Registry;
pub use transform::transform;
pub use transform::TransformOutput;
