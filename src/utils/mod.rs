//! Filesystem helpers shared by the cache and the CLI.
//!
//! - [`fs`] - directory creation and atomic writes

pub mod fs;

pub use fs::{atomic_write, ensure_dir, safe_write};
