//! Test utilities shared by unit and integration tests.
//!
//! - [`TestProject`] - a scratch project directory with helpers to write resources and config
//! - [`ConfigFixture`] - ready-made `.drift.toml` contents
//! - [`init_test_logging`] - once-only tracing setup for tests

pub mod fixtures;

pub use fixtures::{ConfigFixture, TestProject};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` if given, else `RUST_LOG` if set; otherwise logging stays off. Safe to call from
/// every test.
///
/// ```rust,no_run
/// use tracing::Level;
///
/// drift_cli::test_utils::init_test_logging(Some(Level::DEBUG));
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
