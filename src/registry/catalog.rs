//! Plugin catalog: the compile-time table plugin providers are resolved against.
//!
//! A provider string `module.path:ValidatorName` names a module and one of its exports. Plugins
//! are linked into the binary and registered here at startup; the registry then resolves
//! providers by looking them up instead of importing code at runtime.
//!
//! ```rust
//! use drift_cli::registry::PluginCatalog;
//! use drift_cli::validators::FileExistsValidator;
//!
//! let mut catalog = PluginCatalog::new();
//! catalog.register_validator("acme.checks", "ReadmeValidator", || Box::new(FileExistsValidator));
//! assert!(catalog.has_module("acme.checks"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::DriftError;
use crate::rules::Validator;

/// Creates a fresh validator instance.
pub type ValidatorFactory = Arc<dyn Fn() -> Box<dyn Validator> + Send + Sync>;

/// Something a plugin module exports.
#[derive(Clone)]
pub enum PluginExport {
    /// A validator implementation
    Validator(ValidatorFactory),
    /// Any other item, described by its kind (e.g. "function", "constant")
    Other(String),
}

impl fmt::Debug for PluginExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validator(_) => f.write_str("Validator(..)"),
            Self::Other(kind) => write!(f, "Other({kind})"),
        }
    }
}

/// A registered plugin module.
#[derive(Debug, Default)]
pub struct PluginModule {
    exports: HashMap<String, PluginExport>,
    imports: AtomicUsize,
}

impl PluginModule {
    /// Look up an export by name.
    pub fn export(&self, name: &str) -> Option<&PluginExport> {
        self.exports.get(name)
    }
}

/// Table of plugin modules, keyed by dotted module path.
#[derive(Debug, Default)]
pub struct PluginCatalog {
    modules: HashMap<String, PluginModule>,
}

impl PluginCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator export under `module:name`.
    pub fn register_validator<F>(&mut self, module: &str, name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Validator> + Send + Sync + 'static,
    {
        self.register_export(module, name, PluginExport::Validator(Arc::new(factory)))
    }

    /// Register any export under `module:name`, replacing an earlier one with the same name.
    pub fn register_export(&mut self, module: &str, name: &str, export: PluginExport) -> &mut Self {
        self.modules.entry(module.to_string()).or_default().exports.insert(name.to_string(), export);
        self
    }

    /// Whether `module` is registered.
    pub fn has_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Import `module`, counting the import.
    pub fn import(&self, module: &str) -> Result<&PluginModule, DriftError> {
        let plugin = self.modules.get(module).ok_or_else(|| DriftError::PluginModuleNotFound {
            module: module.to_string(),
        })?;
        plugin.imports.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Imported plugin module '{}'", module);
        Ok(plugin)
    }

    /// How many times `module` has been imported.
    pub fn import_count(&self, module: &str) -> usize {
        self.modules.get(module).map_or(0, |m| m.imports.load(Ordering::SeqCst))
    }
}
