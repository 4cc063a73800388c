//! Constants used across the drift codebase.

/// File name that marks a directory-style skill (`<dir>/<name>/SKILL.md`).
pub const SKILL_FILE_NAME: &str = "SKILL.md";

/// Separator used when rendering dependency paths and cycles.
pub const PATH_SEPARATOR: &str = " → ";

/// Maximum dependency depth when a rule does not set `max_depth`.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Namespace reserved for built-in validators.
pub const CORE_NAMESPACE: &str = "core";

/// Default configuration file name, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = ".drift.toml";

/// Project-local state directory.
pub const DRIFT_DIR: &str = ".drift";

/// Default response cache directory, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = ".drift/cache";

/// Default time-to-live for cached responses (7 days, in seconds).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
