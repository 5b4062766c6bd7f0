//! Long-lived plugin state for a bundler or watch-mode host.
//!
//! The host calls [`TypeExtensions::transform`] for every file it loads and
//! [`TypeExtensions::invalidate`] for every file it sees change. Each transform works against
//! one registry snapshot; a rebuild swaps in a new snapshot without disturbing transforms
//! already running.

use crate::config::PluginConfig;
use crate::err::ConfigError;
use crate::err::TransformError;
use crate::project::is_transformable_source;
use crate::registry::Registry;
use crate::transform::normalize_path;
use crate::transform::transform;
use crate::transform::TransformOutput;
use parking_lot::RwLock;
use parking_lot::RwLockUpgradableReadGuard;
use std::path::Path;
use std::sync::Arc;
use tracing::error;
use tracing::info;

/// What a changed file means for the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Invalidation {
  /// The plugin configuration or project manifest changed; everything is rebuilt.
  Config,
  /// The extensions file changed; its descriptors are re-read.
  Extensions,
  /// A source file changed; the allow-list is re-resolved.
  AllowedFiles,
  /// Not a file the registry depends on.
  Unaffected,
}

/// Configuration and the registry built from it, kept under one lock so they always agree.
struct PluginState {
  config: PluginConfig,
  registry: Arc<Registry>,
}

pub struct TypeExtensions {
  state: RwLock<PluginState>,
}

impl TypeExtensions {
  pub fn new(config: PluginConfig) -> Result<TypeExtensions, ConfigError> {
    let registry = Registry::build(&config)?;
    info!(
      extensions = registry.extensions().len(),
      allowed_files = registry.allowed_files().len(),
      "type extensions ready"
    );
    Ok(TypeExtensions {
      state: RwLock::new(PluginState {
        config,
        registry: Arc::new(registry),
      }),
    })
  }

  pub fn from_config_file(path: &Path) -> Result<TypeExtensions, ConfigError> {
    TypeExtensions::new(PluginConfig::load(path)?)
  }

  /// The current snapshot. Later rebuilds do not affect it.
  pub fn registry(&self) -> Arc<Registry> {
    self.state.read().registry.clone()
  }

  pub fn config(&self) -> PluginConfig {
    self.state.read().config.clone()
  }

  pub fn transform(
    &self,
    source: &str,
    path: &Path,
  ) -> Result<Option<TransformOutput>, TransformError> {
    let registry = self.registry();
    transform(&registry, source, path)
  }

  /// Re-reads the configuration file (if there is one) and rebuilds the whole registry.
  pub fn reload_config(&self) -> Result<(), ConfigError> {
    // Only one upgradable guard exists at a time; transforms keep reading meanwhile.
    let state = self.state.upgradable_read();
    let result = match &state.config.config_path {
      Some(path) => PluginConfig::load(path),
      None => Ok(state.config.clone()),
    }
    .and_then(|config| Registry::build(&config).map(|registry| (config, registry)));
    match result {
      Ok((config, registry)) => {
        info!(extensions = registry.extensions().len(), "reloaded configuration");
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.config = config;
        state.registry = Arc::new(registry);
        Ok(())
      }
      Err(err) => {
        error!(%err, "configuration reload failed; keeping previous registry");
        Err(err)
      }
    }
  }

  pub fn rebuild_extensions(&self) -> Result<(), ConfigError> {
    self.rebuild("extensions", Registry::rebuild_extensions)
  }

  pub fn rebuild_allowed_files(&self) -> Result<(), ConfigError> {
    self.rebuild("allowed files", Registry::rebuild_allowed_files)
  }

  /// Derives a new registry from the current one and swaps it in. The guard is held from read
  /// to swap, so concurrent rebuilds each start from the other's result.
  fn rebuild(
    &self,
    what: &str,
    build: impl FnOnce(&Registry, &PluginConfig) -> Result<Registry, ConfigError>,
  ) -> Result<(), ConfigError> {
    let state = self.state.upgradable_read();
    let result = build(state.registry.as_ref(), &state.config);
    match result {
      Ok(registry) => {
        info!(
          extensions = registry.extensions().len(),
          allowed_files = registry.allowed_files().len(),
          "rebuilt {what}"
        );
        RwLockUpgradableReadGuard::upgrade(state).registry = Arc::new(registry);
        Ok(())
      }
      Err(err) => {
        error!(%err, "rebuilding {what} failed; keeping previous registry");
        Err(err)
      }
    }
  }

  pub fn classify_change(&self, path: &Path) -> Invalidation {
    let path = normalize_path(path);
    let state = self.state.read();
    let config = &state.config;
    let registry = &state.registry;
    let is = |other: &Path| normalize_path(other) == path;
    if config.config_path.as_deref().is_some_and(is) || is(&config.project) {
      Invalidation::Config
    } else if registry.is_extensions_file(&path) {
      Invalidation::Extensions
    } else if is_transformable_source(&path, true) && path.starts_with(registry.root_dir()) {
      Invalidation::AllowedFiles
    } else {
      Invalidation::Unaffected
    }
  }

  /// Rebuilds whatever part of the registry depends on `path`.
  pub fn invalidate(&self, path: &Path) -> Result<Invalidation, ConfigError> {
    let invalidation = self.classify_change(path);
    match invalidation {
      Invalidation::Config => self.reload_config()?,
      Invalidation::Extensions => self.rebuild_extensions()?,
      Invalidation::AllowedFiles => self.rebuild_allowed_files()?,
      Invalidation::Unaffected => {}
    }
    Ok(invalidation)
  }
}
