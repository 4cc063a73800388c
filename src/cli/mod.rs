//! Command-line interface for drift.
//!
//! ```text
//! drift check [--project DIR] [--config FILE] [--format text|json]
//! drift cache clear [--project DIR] [--config FILE]
//! ```
//!
//! `--verbose` and `--quiet` are global. Logging goes to stderr through `tracing-subscriber`;
//! `RUST_LOG` overrides the default filter unless one of those flags is given.

pub mod cache;
pub mod check;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Top-level parser.
#[derive(Parser)]
#[command(
    name = "drift",
    about = "Validate skill, command and agent documents against configurable rules",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress logging and non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured rules against every discovered bundle
    Check(check::CheckCommand),

    /// Manage the response cache
    Cache(cache::CacheCommand),
}

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter directive; `None` disables logging
    pub log_level: Option<String>,
    /// Suppress non-essential output
    pub quiet: bool,
}

impl Cli {
    /// Install logging and run the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(&config);

        match self.command {
            Commands::Check(cmd) => cmd.execute(config.quiet).await,
            Commands::Cache(cmd) => cmd.execute(config.quiet),
        }
    }

    /// Map global flags to a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        };

        CliConfig {
            log_level,
            quiet: self.quiet,
        }
    }
}

fn init_logging(config: &CliConfig) {
    let Some(level) = &config.log_level else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_build_config_levels() {
        // SAFETY: serialized with the other tests touching RUST_LOG
        unsafe { std::env::remove_var("RUST_LOG") };

        let cli = Cli::parse_from(["drift", "--verbose", "check"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

        let cli = Cli::parse_from(["drift", "check", "--quiet"]);
        let config = cli.build_config();
        assert_eq!(config.log_level, None);
        assert!(config.quiet);

        let cli = Cli::parse_from(["drift", "cache", "clear"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("warn"));
    }

    #[test]
    #[serial]
    fn test_rust_log_is_respected() {
        // SAFETY: serialized with the other tests touching RUST_LOG
        unsafe { std::env::set_var("RUST_LOG", "drift_cli=trace") };
        let cli = Cli::parse_from(["drift", "check"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("drift_cli=trace"));
        unsafe { std::env::remove_var("RUST_LOG") };
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["drift", "-v", "-q", "check"]).is_err());
    }
}
