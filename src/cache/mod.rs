//! Response cache for expensive (LLM-backed) validator calls.
//!
//! Each entry is one JSON file, `<sanitized key>.json`, inside the cache directory:
//!
//! ```json
//! {
//!   "content_hash": "<sha256 of the validated content>",
//!   "prompt_hash": "<optional sha256 of the prompt>",
//!   "response_content": "...",
//!   "ttl": 604800,
//!   "timestamp": "2025-01-01T00:00:00+00:00"
//! }
//! ```
//!
//! A lookup only hits when the stored content hash matches the caller's, the prompt hashes are
//! compatible, and the entry is younger than its TTL. Anything else (including a file that does
//! not parse) is a miss, and the stale file is removed so the next `set` starts clean.
//!
//! A disabled cache never touches the filesystem: `get` misses and `set` does nothing.
//!
//! # Examples
//!
//! ```rust,no_run
//! use drift_cli::cache::ResponseCache;
//!
//! # fn example() -> anyhow::Result<()> {
//! let cache = ResponseCache::new(".drift/cache", true)?;
//! let hash = ResponseCache::compute_content_hash("# My skill");
//!
//! if cache.get("skill:my-skill", &hash, None, None).is_none() {
//!     cache.set("skill:my-skill", &hash, "looks good", None, None)?;
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_CACHE_TTL_SECS, DRIFT_DIR};
use crate::utils::fs::{atomic_write, ensure_dir, safe_write};

/// On-disk form of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheRecord {
    content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt_hash: Option<String>,
    response_content: String,
    /// Time to live in seconds
    ttl: u64,
    /// RFC 3339 write time
    timestamp: String,
}

/// File-backed cache of validator responses.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache_dir: PathBuf,
    enabled: bool,
    default_ttl: Duration,
}

impl ResponseCache {
    /// Open a cache rooted at `cache_dir`.
    ///
    /// When enabled, the directory is created, and if it lives inside a `.drift/` directory a
    /// `.drift/.gitignore` ignoring it is written unless one already exists.
    pub fn new(cache_dir: impl Into<PathBuf>, enabled: bool) -> Result<Self> {
        let cache = Self {
            cache_dir: cache_dir.into(),
            enabled,
            default_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        };

        if enabled {
            ensure_dir(&cache.cache_dir)?;
            cache.ensure_gitignore()?;
        }
        Ok(cache)
    }

    /// Override the TTL used when `set` is called without one.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Whether the cache reads and writes entries.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Directory entries are stored in.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// SHA-256 of `content` as lowercase hex.
    pub fn compute_content_hash(content: &str) -> String {
        hex::encode(Sha256::digest(content.as_bytes()))
    }

    /// Look up `key`.
    ///
    /// `ttl` overrides the TTL stored with the entry. A stored prompt hash matches a caller that
    /// passes none or the same hash; an entry stored without one only matches a caller that
    /// passes none.
    pub fn get(
        &self,
        key: &str,
        content_hash: &str,
        ttl: Option<Duration>,
        prompt_hash: Option<&str>,
    ) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;

        let record: CacheRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Discarding corrupt cache entry {}: {}", path.display(), e);
                remove_entry(&path);
                return None;
            }
        };

        if let Err(reason) = check_record(&record, content_hash, ttl, prompt_hash) {
            tracing::debug!("Cache miss for '{}': {}", key, reason);
            remove_entry(&path);
            return None;
        }

        tracing::debug!("Cache hit for '{}'", key);
        Some(record.response_content)
    }

    /// Store `response` under `key`, replacing any existing entry.
    ///
    /// The TTL is stored in whole seconds, rounded up; anything shorter than one second is stored
    /// as one second.
    pub fn set(
        &self,
        key: &str,
        content_hash: &str,
        response: &str,
        ttl: Option<Duration>,
        prompt_hash: Option<&str>,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let record = CacheRecord {
            content_hash: content_hash.to_string(),
            prompt_hash: prompt_hash.map(str::to_string),
            response_content: response.to_string(),
            ttl: stored_ttl_secs(ttl.unwrap_or(self.default_ttl)),
            timestamp: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_vec_pretty(&record).context("Failed to serialize cache entry")?;

        let path = self.entry_path(key);
        atomic_write(&path, &json).with_context(|| format!("Failed to write cache entry for '{key}'"))?;
        tracing::debug!("Cached response for '{}' at {}", key, path.display());
        Ok(())
    }

    /// Remove the entry for `key` if there is one.
    pub fn invalidate(&self, key: &str) {
        if self.enabled {
            remove_entry(&self.entry_path(key));
        }
    }

    /// Remove every entry and return how many were removed.
    ///
    /// Files that cannot be removed are logged and skipped.
    pub fn clear_all(&self) -> Result<usize> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(&self.cache_dir)
            .with_context(|| format!("Failed to read cache directory: {}", self.cache_dir.display()))?;

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") || !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove cache entry {}: {}", path.display(), e),
            }
        }

        tracing::debug!("Cleared {} cache entries from {}", removed, self.cache_dir.display());
        Ok(removed)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", sanitize_key(key)))
    }

    fn ensure_gitignore(&self) -> Result<()> {
        let Some(drift_dir) = self.cache_dir.ancestors().find(|p| p.file_name().is_some_and(|n| n == DRIFT_DIR))
        else {
            return Ok(());
        };

        let gitignore = drift_dir.join(".gitignore");
        if gitignore.exists() {
            return Ok(());
        }

        let relative = self.cache_dir.strip_prefix(drift_dir).unwrap_or(&self.cache_dir);
        let pattern = relative.to_string_lossy().replace('\\', "/");
        let content = format!("# drift response cache\n{}/\n", pattern.trim_end_matches('/'));
        safe_write(&gitignore, &content)
            .with_context(|| format!("Failed to write {}", gitignore.display()))?;
        tracing::debug!("Created {}", gitignore.display());
        Ok(())
    }
}

fn check_record(
    record: &CacheRecord,
    content_hash: &str,
    ttl: Option<Duration>,
    prompt_hash: Option<&str>,
) -> Result<(), String> {
    if record.content_hash != content_hash {
        return Err("content changed".to_string());
    }

    match (record.prompt_hash.as_deref(), prompt_hash) {
        (_, None) => {}
        (Some(stored), Some(requested)) if stored == requested => {}
        (None, Some(_)) => return Err("entry has no prompt hash".to_string()),
        (Some(_), Some(_)) => return Err("prompt changed".to_string()),
    }

    let written = DateTime::parse_from_rfc3339(&record.timestamp)
        .map_err(|e| format!("bad timestamp '{}': {e}", record.timestamp))?
        .with_timezone(&Utc);
    let ttl = ttl.unwrap_or(Duration::from_secs(record.ttl));
    let age = Utc::now().signed_duration_since(written);
    let limit = chrono::Duration::from_std(ttl).map_err(|e| format!("bad ttl: {e}"))?;
    if age >= limit {
        return Err(format!("expired after {}s", age.num_seconds()));
    }
    Ok(())
}

fn stored_ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

fn remove_entry(path: &Path) {
    if let Err(e) = fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!("Failed to remove cache entry {}: {}", path.display(), e);
    }
}

/// Turn a cache key into a safe file stem.
///
/// Path separators, characters reserved on Windows, control characters and leading dots
/// become `_`.
fn sanitize_key(key: &str) -> String {
    let mut leading = true;
    let sanitized: String = key
        .chars()
        .map(|c| {
            let replace = matches!(c, '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*')
                || c.is_control()
                || (leading && c == '.');
            leading &= c == '.';
            if replace { '_' } else { c }
        })
        .collect();

    if sanitized.is_empty() { "_".to_string() } else { sanitized }
}
