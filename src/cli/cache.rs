//! `drift cache` subcommands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::cache::ResponseCache;
use crate::config::DriftConfig;

/// Manage the response cache.
#[derive(Args)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Subcommand)]
enum CacheSubcommand {
    /// Remove every cached response
    Clear {
        /// Project root
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Config file, relative to the project root (default: .drift.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl CacheCommand {
    /// Run the subcommand.
    pub fn execute(self, quiet: bool) -> Result<()> {
        match self.command {
            CacheSubcommand::Clear {
                project,
                config,
            } => {
                let removed = clear(&project, config.as_deref())?;
                if !quiet {
                    println!("{} Removed {} cached responses", "✓".green(), removed);
                }
                Ok(())
            }
        }
    }
}

/// Clear the project's cache directory, whether or not caching is enabled.
fn clear(project: &std::path::Path, config: Option<&std::path::Path>) -> Result<usize> {
    let config = DriftConfig::load_for_project(project, config)?;
    let cache = ResponseCache::new(project.join(&config.cache.directory), false)?;
    cache.clear_all()
}
