//! Plugin validators resolved through the registry and run by the dispatcher.

use anyhow::{Result, bail};
use std::sync::Arc;

use drift_cli::bundle::DocumentBundle;
use drift_cli::dispatch::{RuleDispatcher, RuleStatus};
use drift_cli::registry::{PluginCatalog, ValidatorRegistry};
use drift_cli::rules::{DocumentRule, FailureDetails, ValidationRule, Validator};
use drift_cli::test_utils::TestProject;

/// Fails bundles whose id is not kebab-case.
struct KebabCaseValidator;

impl Validator for KebabCaseValidator {
    fn rule_type(&self) -> &str {
        "acme:kebab_case"
    }

    fn name(&self) -> &str {
        "KebabCaseValidator"
    }

    fn default_failure_message(&self) -> &str {
        "'{bundle_id}' is not kebab-case"
    }

    fn default_expected_behavior(&self) -> &str {
        "Resource names use lowercase words joined by '-'"
    }

    fn validate(
        &self,
        rule: &ValidationRule,
        bundle: &DocumentBundle,
        _all_bundles: Option<&[DocumentBundle]>,
    ) -> Result<Option<DocumentRule>> {
        let valid = bundle.bundle_id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if valid {
            return Ok(None);
        }
        let mut details = FailureDetails::new();
        details.insert("bundle_id".to_string(), bundle.bundle_id.clone().into());
        Ok(Some(DocumentRule::from_details(rule, self, bundle, bundle.file_paths(), details)))
    }
}

/// Always errors.
struct BrokenValidator;

impl Validator for BrokenValidator {
    fn rule_type(&self) -> &str {
        "acme:broken"
    }

    fn name(&self) -> &str {
        "BrokenValidator"
    }

    fn default_failure_message(&self) -> &str {
        ""
    }

    fn default_expected_behavior(&self) -> &str {
        ""
    }

    fn validate(
        &self,
        _rule: &ValidationRule,
        _bundle: &DocumentBundle,
        _all_bundles: Option<&[DocumentBundle]>,
    ) -> Result<Option<DocumentRule>> {
        bail!("upstream service unavailable")
    }
}

fn registry() -> Arc<ValidatorRegistry> {
    let mut catalog = PluginCatalog::new();
    catalog
        .register_validator("acme.checks", "KebabCaseValidator", || Box::new(KebabCaseValidator))
        .register_validator("acme.checks", "BrokenValidator", || Box::new(BrokenValidator));
    Arc::new(ValidatorRegistry::with_catalog(catalog))
}

fn rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule::new("acme:kebab_case", "kebab case").with_provider("acme.checks:KebabCaseValidator"),
        ValidationRule::new("acme:broken", "broken").with_provider("acme.checks:BrokenValidator"),
        ValidationRule::new("core:file_exists", "readme").with_param("file_path", "README.md"),
    ]
}

#[tokio::test]
async fn test_batch_isolates_errors_in_both_modes() {
    let project = TestProject::new().unwrap();
    project.add_skill("Bad_Name", &[]).unwrap();
    project.write_file("README.md", "# project").unwrap();
    let (bundle, all) = project.bundle("Bad_Name").unwrap();

    for parallel in [false, true] {
        let registry = registry();
        let dispatcher = RuleDispatcher::new(Arc::clone(&registry), parallel);
        let outcome = dispatcher.dispatch(&rules(), &bundle, Some(&all)).await;

        let statuses: Vec<RuleStatus> = outcome.execution_details.iter().map(|d| d.status).collect();
        assert_eq!(statuses, vec![RuleStatus::Failed, RuleStatus::Errored, RuleStatus::Passed]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].observed_issue, "'Bad_Name' is not kebab-case");
        assert!(
            outcome.execution_details[1]
                .error_message
                .as_deref()
                .unwrap()
                .contains("upstream service unavailable")
        );
        assert_eq!(registry.catalog().import_count("acme.checks"), 2);
    }
}

#[tokio::test]
async fn test_plugin_imported_once_across_bundles() {
    let project = TestProject::new().unwrap();
    for id in ["alpha", "beta", "gamma"] {
        project.add_skill(id, &[]).unwrap();
    }
    let bundles = project.bundles().unwrap();

    let registry = registry();
    let dispatcher = RuleDispatcher::new(Arc::clone(&registry), true);
    let rules = vec![
        ValidationRule::new("acme:kebab_case", "kebab").with_provider("acme.checks:KebabCaseValidator"),
        ValidationRule::new("acme:kebab_case", "kebab again").with_provider("acme.checks:KebabCaseValidator"),
    ];
    for bundle in &bundles {
        let outcome = dispatcher.dispatch(&rules, bundle, Some(&bundles)).await;
        assert!(!outcome.has_problems());
    }
    assert_eq!(registry.catalog().import_count("acme.checks"), 1);
}

#[test]
fn test_preflight_catches_misconfigured_plugin() {
    let registry = registry();
    let rules = vec![ValidationRule::new("acme:kebab_case", "kebab").with_provider("acme.missing:KebabCaseValidator")];

    let err = registry.preflight(&rules).unwrap_err();
    assert!(err.to_string().contains("acme.missing"));
}
