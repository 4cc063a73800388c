//! `core:dependency_duplicate`: flags direct dependencies that another direct dependency
//! already provides transitively.

use anyhow::Result;
use serde_json::{Value, json};

use super::{GraphScope, dedup_in_order};
use crate::bundle::DocumentBundle;
use crate::graph::redundancy::find_redundant_dependencies;
use crate::rules::{DocumentRule, FailureDetails, ValidationRule, Validator};

/// Detects transitively redundant dependency declarations.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyDuplicateValidator;

impl DependencyDuplicateValidator {
    /// Key this validator is registered under.
    pub const RULE_TYPE: &'static str = "core:dependency_duplicate";
}

impl Validator for DependencyDuplicateValidator {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    fn name(&self) -> &str {
        "DependencyDuplicateValidator"
    }

    fn default_failure_message(&self) -> &str {
        "Redundant dependency: '{duplicate_resource}' is already provided through '{declared_by}'"
    }

    fn default_expected_behavior(&self) -> &str {
        "Declare only dependencies that are not already available through other dependencies"
    }

    fn validate(
        &self,
        rule: &ValidationRule,
        bundle: &DocumentBundle,
        all_bundles: Option<&[DocumentBundle]>,
    ) -> Result<Option<DocumentRule>> {
        let Some(scope) = GraphScope::build(rule, bundle, all_bundles)? else {
            return Ok(None);
        };
        let graph = &scope.graph;

        let mut findings: Vec<(String, String, String)> = Vec::new();
        for &target in &scope.targets {
            let file = scope.target_file(target, bundle);
            for redundancy in find_redundant_dependencies(graph, target) {
                findings.push((
                    file.clone(),
                    graph.id(redundancy.duplicate).to_string(),
                    graph.id(redundancy.declared_by).to_string(),
                ));
            }
        }

        let Some((_, first_duplicate, first_declared_by)) = findings.first().cloned() else {
            return Ok(None);
        };
        let duplicate_count = findings.len();
        tracing::debug!(
            "Bundle '{}' declares {} redundant dependencies",
            bundle.bundle_id,
            duplicate_count
        );

        let file_paths = dedup_in_order(findings.iter().map(|(file, _, _)| file.clone()));
        let mut details = FailureDetails::new();
        details.insert("duplicate_resource".to_string(), Value::String(first_duplicate));
        details.insert("declared_by".to_string(), Value::String(first_declared_by));
        details.insert("duplicate_count".to_string(), json!(duplicate_count));
        details.insert(
            "all_duplicates".to_string(),
            Value::Array(
                findings
                    .into_iter()
                    .map(|(file, duplicate, declared_by)| {
                        json!({"file": file, "duplicate_resource": duplicate, "declared_by": declared_by})
                    })
                    .collect(),
            ),
        );

        let mut failure = DocumentRule::from_details(rule, self, bundle, file_paths, details);
        if duplicate_count > 1 {
            failure
                .observed_issue
                .push_str(&format!(" ({duplicate_count} redundant dependencies found)"));
        }
        Ok(Some(failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::test_support::{bundles_for, dirs, write_skill};
    use tempfile::TempDir;

    fn rule() -> ValidationRule {
        ValidationRule::new(DependencyDuplicateValidator::RULE_TYPE, "no redundant deps")
            .with_param("resource_dirs", dirs())
    }

    #[test]
    fn test_redundant_dependency_is_reported() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["b", "c"]);
        write_skill(temp.path(), "b", &["c"]);
        write_skill(temp.path(), "c", &[]);
        let (target, all) = bundles_for(temp.path(), "a");

        let failure = DependencyDuplicateValidator.validate(&rule(), &target, Some(&all)).unwrap().unwrap();
        assert_eq!(failure.failure_details["duplicate_resource"], "c");
        assert_eq!(failure.failure_details["declared_by"], "b");
        assert_eq!(failure.failure_details["duplicate_count"], 1);
        assert_eq!(
            failure.observed_issue,
            "Redundant dependency: 'c' is already provided through 'b'"
        );
        let all_duplicates = failure.failure_details["all_duplicates"].as_array().unwrap();
        assert!(all_duplicates[0]["file"].as_str().unwrap().ends_with("a.md"));
    }

    #[test]
    fn test_no_redundancy_passes() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["b"]);
        write_skill(temp.path(), "b", &["c"]);
        write_skill(temp.path(), "c", &[]);
        let (target, all) = bundles_for(temp.path(), "a");

        assert!(DependencyDuplicateValidator.validate(&rule(), &target, Some(&all)).unwrap().is_none());
    }

    #[test]
    fn test_multiple_findings_noted_in_message() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["hub", "x", "y"]);
        write_skill(temp.path(), "hub", &["x", "y"]);
        write_skill(temp.path(), "x", &[]);
        write_skill(temp.path(), "y", &[]);
        let (target, all) = bundles_for(temp.path(), "a");

        let failure = DependencyDuplicateValidator.validate(&rule(), &target, Some(&all)).unwrap().unwrap();
        assert_eq!(failure.failure_details["duplicate_count"], 2);
        assert!(failure.observed_issue.ends_with("(2 redundant dependencies found)"));
    }

    #[test]
    fn test_without_all_bundles_passes() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["b", "c"]);
        write_skill(temp.path(), "b", &["c"]);
        let (target, _) = bundles_for(temp.path(), "a");

        assert!(DependencyDuplicateValidator.validate(&rule(), &target, None).unwrap().is_none());
    }
}
