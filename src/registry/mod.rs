//! Validator registry: maps `namespace:type` keys to validator instances.
//!
//! Built-in validators are registered under the `core` namespace when the registry is
//! constructed. Any other namespace is served by plugins: the rule names a provider
//! (`module.path:ValidatorName`), the registry resolves it against its [`PluginCatalog`], checks
//! the result, and caches the instance under its rule type. Later lookups reuse the cached
//! instance without touching the catalog.
//!
//! Each key is served by exactly one validator: a registered one, or the first provider that
//! loaded for it. A rule naming a different provider for a key that is already served fails with
//! [`DriftError::DuplicateValidator`].
//!
//! The instance cache is a [`DashMap`]. A plugin is loaded while holding the entry for its key,
//! so concurrent resolutions of the same provider import the module once.
//!
//! # Examples
//!
//! ```rust
//! use drift_cli::registry::ValidatorRegistry;
//!
//! let registry = ValidatorRegistry::new();
//! let validator = registry.resolve("core:circular_dependencies", None).unwrap();
//! assert_eq!(validator.name(), "CircularDependencyValidator");
//!
//! let err = registry.resolve("custom:naming", None).unwrap_err();
//! assert!(err.to_string().contains("specify a provider"));
//! ```

pub mod catalog;

use anyhow::Result;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::bundle::DocumentBundle;
use crate::constants::CORE_NAMESPACE;
use crate::core::DriftError;
use crate::rules::{DocumentRule, ValidationRule, Validator};
use crate::validators::{
    CircularDependencyValidator, DependencyDuplicateValidator, FileExistsValidator, FileSizeValidator,
    MaxDependencyDepthValidator,
};

pub use catalog::{PluginCatalog, PluginExport, PluginModule, ValidatorFactory};

const RULE_TYPE_PATTERN: &str = r"^[a-z][a-z0-9_]*:[a-z][a-z0-9_]*$";

fn rule_type_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(RULE_TYPE_PATTERN).ok()).as_ref()
}

/// A validated `namespace:type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTypeKey<'a> {
    /// Part before the colon
    pub namespace: &'a str,
    /// Part after the colon
    pub name: &'a str,
}

impl<'a> RuleTypeKey<'a> {
    /// Parse and validate a rule type string.
    pub fn parse(rule_type: &'a str) -> Result<Self, DriftError> {
        let invalid = || DriftError::InvalidRuleType {
            rule_type: rule_type.to_string(),
        };
        if !rule_type_pattern().is_some_and(|re| re.is_match(rule_type)) {
            return Err(invalid());
        }
        let (namespace, name) = rule_type.split_once(':').ok_or_else(invalid)?;
        Ok(Self { namespace, name })
    }

    /// Whether the key is in the built-in namespace.
    pub fn is_core(&self) -> bool {
        self.namespace == CORE_NAMESPACE
    }
}

fn builtin<V: Validator + Default + 'static>() -> ValidatorFactory {
    Arc::new(|| -> Box<dyn Validator> { Box::new(V::default()) })
}

struct Registration {
    name: String,
    factory: ValidatorFactory,
}

struct LoadedPlugin {
    provider: String,
    validator: Arc<dyn Validator>,
}

/// Registry of built-in validators plus a cache of loaded plugin instances.
pub struct ValidatorRegistry {
    registered: BTreeMap<String, Registration>,
    catalog: PluginCatalog,
    instances: DashMap<String, LoadedPlugin>,
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("registered", &self.registered.keys().collect::<Vec<_>>())
            .field("catalog", &self.catalog)
            .field("cached_plugins", &self.instances.len())
            .finish()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorRegistry {
    /// A registry with the built-in validators and an empty plugin catalog.
    pub fn new() -> Self {
        Self::with_catalog(PluginCatalog::new())
    }

    /// A registry with the built-in validators, resolving plugins against `catalog`.
    pub fn with_catalog(catalog: PluginCatalog) -> Self {
        let mut registry = Self {
            registered: BTreeMap::new(),
            catalog,
            instances: DashMap::new(),
        };

        let builtins = [
            builtin::<CircularDependencyValidator>(),
            builtin::<DependencyDuplicateValidator>(),
            builtin::<MaxDependencyDepthValidator>(),
            builtin::<FileExistsValidator>(),
            builtin::<FileSizeValidator>(),
        ];
        for factory in builtins {
            let probe = factory();
            registry.registered.insert(
                probe.rule_type().to_string(),
                Registration {
                    name: probe.name().to_string(),
                    factory,
                },
            );
        }
        registry
    }

    /// Register a validator under the rule type it reports.
    ///
    /// Fails with [`DriftError::DuplicateValidator`] if the key is already claimed by a registered
    /// validator or a loaded plugin, and with [`DriftError::InvalidRuleType`] if the reported key
    /// is malformed.
    pub fn register<F>(&mut self, factory: F) -> Result<(), DriftError>
    where
        F: Fn() -> Box<dyn Validator> + Send + Sync + 'static,
    {
        let probe = factory();
        let rule_type = probe.rule_type().to_string();
        RuleTypeKey::parse(&rule_type)?;

        if let Some(existing) = self.registered.get(&rule_type) {
            return Err(DriftError::DuplicateValidator {
                rule_type,
                existing: existing.name.clone(),
            });
        }
        if let Some(loaded) = self.instances.get(&rule_type) {
            return Err(DriftError::DuplicateValidator {
                existing: loaded.provider.clone(),
                rule_type,
            });
        }

        tracing::debug!("Registered validator '{}' as {}", probe.name(), rule_type);
        self.registered.insert(
            rule_type,
            Registration {
                name: probe.name().to_string(),
                factory: Arc::new(factory),
            },
        );
        Ok(())
    }

    /// Registered rule types, sorted.
    pub fn rule_types(&self) -> Vec<&str> {
        self.registered.keys().map(String::as_str).collect()
    }

    /// The plugin catalog providers are resolved against.
    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// Resolve the validator for a rule type and optional provider.
    ///
    /// `core:*` types are always served by registered validators and must not carry a provider.
    /// Other types need a provider unless a validator was registered for them directly.
    pub fn resolve(&self, rule_type: &str, provider: Option<&str>) -> Result<Arc<dyn Validator>, DriftError> {
        let key = RuleTypeKey::parse(rule_type)?;

        match provider {
            Some(provider) if key.is_core() => Err(DriftError::ProviderNotAllowed {
                rule_type: rule_type.to_string(),
                provider: provider.to_string(),
            }),
            Some(provider) => self.resolve_plugin(rule_type, provider),
            None => match self.registered.get(rule_type) {
                Some(registration) => Ok(Arc::from((registration.factory)())),
                None if key.is_core() => Err(DriftError::UnknownRuleType {
                    rule_type: rule_type.to_string(),
                }),
                None => Err(DriftError::UnsupportedRuleType {
                    rule_type: rule_type.to_string(),
                }),
            },
        }
    }

    /// Resolve the validator for `rule`.
    pub fn resolve_rule(&self, rule: &ValidationRule) -> Result<Arc<dyn Validator>, DriftError> {
        self.resolve(&rule.rule_type, rule.provider.as_deref())
    }

    /// Resolve the validator for `rule` and run it. Validator errors are returned, not caught.
    pub fn execute_rule(
        &self,
        rule: &ValidationRule,
        bundle: &DocumentBundle,
        all_bundles: Option<&[DocumentBundle]>,
    ) -> Result<Option<DocumentRule>> {
        let validator = self.resolve_rule(rule)?;
        validator.validate(rule, bundle, all_bundles)
    }

    /// Resolve every rule up front, failing on the first configuration error.
    pub fn preflight(&self, rules: &[ValidationRule]) -> Result<(), DriftError> {
        for rule in rules {
            self.resolve_rule(rule)?;
        }
        Ok(())
    }

    fn resolve_plugin(&self, rule_type: &str, provider: &str) -> Result<Arc<dyn Validator>, DriftError> {
        if let Some(existing) = self.registered.get(rule_type) {
            return Err(DriftError::DuplicateValidator {
                rule_type: rule_type.to_string(),
                existing: existing.name.clone(),
            });
        }

        match self.instances.entry(rule_type.to_string()) {
            Entry::Occupied(entry) if entry.get().provider == provider => Ok(Arc::clone(&entry.get().validator)),
            Entry::Occupied(entry) => Err(DriftError::DuplicateValidator {
                rule_type: rule_type.to_string(),
                existing: entry.get().provider.clone(),
            }),
            Entry::Vacant(entry) => {
                let validator = self.load_plugin(rule_type, provider)?;
                entry.insert(LoadedPlugin {
                    provider: provider.to_string(),
                    validator: Arc::clone(&validator),
                });
                Ok(validator)
            }
        }
    }

    fn load_plugin(&self, rule_type: &str, provider: &str) -> Result<Arc<dyn Validator>, DriftError> {
        let malformed = || DriftError::MalformedProvider {
            provider: provider.to_string(),
        };
        let (module, class) = provider.rsplit_once(':').ok_or_else(malformed)?;
        if module.is_empty() || class.is_empty() {
            return Err(malformed());
        }

        let plugin = self.catalog.import(module)?;
        let factory = match plugin.export(class) {
            Some(PluginExport::Validator(factory)) => factory,
            Some(PluginExport::Other(kind)) => {
                tracing::debug!("'{}:{}' is a {}, not a validator", module, class, kind);
                return Err(DriftError::PluginNotAValidator {
                    module: module.to_string(),
                    class: class.to_string(),
                });
            }
            None => {
                return Err(DriftError::PluginClassNotFound {
                    module: module.to_string(),
                    class: class.to_string(),
                });
            }
        };

        let validator: Arc<dyn Validator> = Arc::from(factory());
        if validator.rule_type() != rule_type {
            return Err(DriftError::PluginTypeMismatch {
                provider: provider.to_string(),
                expected: rule_type.to_string(),
                actual: validator.rule_type().to_string(),
            });
        }

        tracing::debug!("Loaded plugin '{}' for rule type '{}'", provider, rule_type);
        Ok(validator)
    }
}
