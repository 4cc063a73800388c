//! Project configuration (`.drift.toml`).
//!
//! One file in the project root declares the rules to run and how to run them:
//!
//! ```toml
//! [parallel_execution]
//! enabled = true
//!
//! [cache]
//! enabled = true
//! directory = ".drift/cache"
//! default_ttl = 604800
//!
//! [[rules]]
//! description = "No circular skill dependencies"
//! type = "core:circular_dependencies"
//! [rules.params]
//! resource_dirs = [".claude/skills", ".claude/commands", ".claude/agents"]
//! ```
//!
//! Every section is optional. A missing file means no rules, sequential execution and an
//! enabled cache under `.drift/cache`. There is no global or layered configuration.

pub mod parser;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::ResponseCache;
use crate::constants::{CONFIG_FILE_NAME, DEFAULT_CACHE_DIR, DEFAULT_CACHE_TTL_SECS};
use crate::rules::ValidationRule;

pub use parser::parse_config;

/// Parsed `.drift.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Rule execution settings
    #[serde(default)]
    pub parallel_execution: ParallelExecutionConfig,
    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Rules to run, in order
    #[serde(default)]
    pub rules: Vec<ValidationRule>,
}

/// `[parallel_execution]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelExecutionConfig {
    /// Run multi-rule batches concurrently
    #[serde(default)]
    pub enabled: bool,
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether responses are cached
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory, relative to the project root unless absolute
    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,
    /// TTL in seconds for entries written without one
    #[serde(default = "default_ttl")]
    pub default_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_cache_dir(),
            default_ttl: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

const fn default_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl DriftConfig {
    /// Load `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config: Self = parse_config(path)?;
        tracing::debug!("Loaded {} rules from {}", config.rules.len(), path.display());
        Ok(config)
    }

    /// Load the project's config: `explicit` if given, else `.drift.toml` in `project_root`.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load_for_project(project_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                let path = project_root.join(path);
                if !path.exists() {
                    return Err(crate::core::DriftError::ConfigError {
                        message: format!("config file not found: {}", path.display()),
                    }
                    .into());
                }
                Self::load(&path)
            }
            None => Self::load(&project_root.join(CONFIG_FILE_NAME)),
        }
    }

    /// Every `resource_dirs` entry named by any rule, first occurrence first.
    ///
    /// Rules with a missing or malformed `resource_dirs` contribute nothing here; they are
    /// reported when the rule runs.
    pub fn resource_dirs(&self) -> Vec<String> {
        let mut dirs: Vec<String> = Vec::new();
        for dir in self.rules.iter().filter_map(|rule| rule.resource_dirs().ok()).flatten() {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Open the response cache described by `[cache]`.
    pub fn open_cache(&self, project_root: &Path) -> Result<ResponseCache> {
        let cache = ResponseCache::new(project_root.join(&self.cache.directory), self.cache.enabled)?;
        Ok(cache.with_default_ttl(Duration::from_secs(self.cache.default_ttl)))
    }
}
