//! `drift check`: run the configured rules against every bundle in the project.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bundle::{DocumentBundle, discover_bundles};
use crate::config::DriftConfig;
use crate::dispatch::{DispatchOutcome, RuleDispatcher, RuleStatus};
use crate::registry::ValidatorRegistry;

/// Run the configured rules.
#[derive(Args)]
pub struct CheckCommand {
    /// Project root
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Config file, relative to the project root (default: .drift.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// How results are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// One JSON document on stdout
    Json,
}

/// Results of one bundle.
#[derive(Debug, Serialize)]
pub struct BundleReport {
    /// Bundle checked
    pub bundle_id: String,
    /// What the rules found
    #[serde(flatten)]
    pub outcome: DispatchOutcome,
}

/// Results of a whole run.
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    /// Rules configured
    pub rules: usize,
    /// Per-bundle results, in discovery order
    pub bundles: Vec<BundleReport>,
}

impl CheckReport {
    /// Total rule executions that ended with `status`.
    pub fn count(&self, status: RuleStatus) -> usize {
        self.bundles.iter().map(|b| b.outcome.count(status)).sum()
    }
}

impl CheckCommand {
    /// Run the check and print the report. Fails if any rule failed or errored.
    pub async fn execute(self, quiet: bool) -> Result<()> {
        let config = DriftConfig::load_for_project(&self.project, self.config.as_deref())?;
        let report = run_check(&self.project, &config).await?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_text(&report, quiet),
        }

        let failed = report.count(RuleStatus::Failed);
        let errored = report.count(RuleStatus::Errored);
        if failed + errored > 0 {
            bail!("Check failed: {failed} rule failures, {errored} rule errors");
        }
        Ok(())
    }
}

/// Preflight the rules, discover bundles, and dispatch the rules on each.
pub async fn run_check(project: &Path, config: &DriftConfig) -> Result<CheckReport> {
    let registry = Arc::new(ValidatorRegistry::new());
    registry.preflight(&config.rules)?;

    let bundles: Vec<DocumentBundle> = discover_bundles(project, &config.resource_dirs())?;
    tracing::debug!("Discovered {} bundles under {}", bundles.len(), project.display());

    let dispatcher = RuleDispatcher::new(registry, config.parallel_execution.enabled);
    let mut report = CheckReport {
        rules: config.rules.len(),
        bundles: Vec::with_capacity(bundles.len()),
    };
    for bundle in &bundles {
        let outcome = dispatcher.dispatch(&config.rules, bundle, Some(&bundles)).await;
        report.bundles.push(BundleReport {
            bundle_id: bundle.bundle_id.clone(),
            outcome,
        });
    }
    Ok(report)
}

fn print_text(report: &CheckReport, quiet: bool) {
    for bundle in &report.bundles {
        for failure in &bundle.outcome.failures {
            println!("{} {}: {}", "✗".red(), bundle.bundle_id.bold(), failure.observed_issue);
            if !quiet {
                println!("    expected: {}", failure.expected_quality);
            }
        }
        for detail in &bundle.outcome.execution_details {
            if detail.status == RuleStatus::Errored {
                println!(
                    "{} {}: rule '{}' errored: {}",
                    "⚠".yellow(),
                    bundle.bundle_id.bold(),
                    detail.rule_description,
                    detail.error_message.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    if quiet {
        return;
    }
    if report.rules == 0 {
        println!("No rules configured");
        return;
    }

    let summary = format!(
        "Checked {} bundles against {} rules: {} passed, {} failed, {} errored",
        report.bundles.len(),
        report.rules,
        report.count(RuleStatus::Passed),
        report.count(RuleStatus::Failed),
        report.count(RuleStatus::Errored)
    );
    if report.count(RuleStatus::Failed) + report.count(RuleStatus::Errored) == 0 {
        println!("{} {}", "✓".green(), summary);
    } else {
        println!("{summary}");
    }
}
