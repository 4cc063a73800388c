//! `core:circular_dependencies`: flags dependency cycles reachable from a bundle's resources.

use anyhow::Result;
use serde_json::{Value, json};
use std::collections::HashSet;

use super::{GraphScope, dedup_in_order};
use crate::bundle::DocumentBundle;
use crate::graph::cycles::{Cycle, find_cycles_from};
use crate::rules::{DocumentRule, FailureDetails, ValidationRule, Validator};

/// Detects circular dependencies.
///
/// Every distinct cycle reachable from the bundle's resources is listed in `all_cycles`. The
/// headline `circular_path` is the first discovered cycle that passes through a bundle resource,
/// rotated to start there; if no cycle does, it is the first discovered cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct CircularDependencyValidator;

impl CircularDependencyValidator {
    /// Key this validator is registered under.
    pub const RULE_TYPE: &'static str = "core:circular_dependencies";
}

impl Validator for CircularDependencyValidator {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    fn name(&self) -> &str {
        "CircularDependencyValidator"
    }

    fn default_failure_message(&self) -> &str {
        "Circular dependency detected: {circular_path}"
    }

    fn default_expected_behavior(&self) -> &str {
        "Resource dependencies should form a tree without cycles"
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

        let mut headline: Option<Cycle> = None;
        let mut fallback: Option<Cycle> = None;
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut all_cycles: Vec<(String, String)> = Vec::new();

        for &target in &scope.targets {
            let file = scope.target_file(target, bundle);
            for cycle in find_cycles_from(graph, target) {
                let rotated = cycle.starting_at(target);
                if headline.is_none() && cycle.contains(target) {
                    headline = Some(rotated.clone());
                }
                if fallback.is_none() {
                    fallback = Some(cycle.clone());
                }

                if !seen.insert(cycle.canonical_key(graph)) {
                    continue;
                }
                all_cycles.push((file.clone(), graph.render_path(&rotated.nodes)));
            }
        }

        let Some(headline) = headline.or(fallback) else {
            return Ok(None);
        };

        let circular_path = graph.render_path(&headline.nodes);
        let cycle_count = all_cycles.len();
        tracing::debug!(
            "Bundle '{}' has {} circular dependencies, first: {}",
            bundle.bundle_id,
            cycle_count,
            circular_path
        );

        let file_paths = dedup_in_order(all_cycles.iter().map(|(file, _)| file.clone()));
        let mut details = FailureDetails::new();
        details.insert("circular_path".to_string(), Value::String(circular_path));
        details.insert("cycle_count".to_string(), json!(cycle_count));
        details.insert(
            "all_cycles".to_string(),
            Value::Array(
                all_cycles
                    .into_iter()
                    .map(|(file, cycle_path)| json!({"file": file, "cycle_path": cycle_path}))
                    .collect(),
            ),
        );

        let mut failure = DocumentRule::from_details(rule, self, bundle, file_paths, details);
        if cycle_count > 1 {
            failure.observed_issue.push_str(&format!(" ({cycle_count} circular dependencies found)"));
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
        ValidationRule::new(CircularDependencyValidator::RULE_TYPE, "no cycles")
            .with_param("resource_dirs", dirs())
    }

    #[test]
    fn test_two_skill_cycle() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "skill-a", &["skill-b"]);
        write_skill(temp.path(), "skill-b", &["skill-a"]);
        let (target, all) = bundles_for(temp.path(), "skill-a");

        let failure = CircularDependencyValidator.validate(&rule(), &target, Some(&all)).unwrap().unwrap();
        assert_eq!(failure.failure_details["circular_path"], "skill-a → skill-b → skill-a");
        assert_eq!(failure.failure_details["cycle_count"], 1);
        assert!(failure.observed_issue.contains("skill-a → skill-b → skill-a"));
        assert!(!failure.observed_issue.contains("circular dependencies found"));
        assert_eq!(failure.bundle_id, "skill-a");
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "loop", &["loop"]);
        let (target, all) = bundles_for(temp.path(), "loop");

        let failure = CircularDependencyValidator.validate(&rule(), &target, Some(&all)).unwrap().unwrap();
        let path = failure.failure_details["circular_path"].as_str().unwrap();
        assert_eq!(path.matches("loop").count(), 2);
        assert!(failure.failure_details["cycle_count"].as_u64().unwrap() >= 1);
    }

    #[test]
    fn test_multiple_cycles_are_counted_in_message() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["b", "c"]);
        write_skill(temp.path(), "b", &["a"]);
        write_skill(temp.path(), "c", &["a"]);
        let (target, all) = bundles_for(temp.path(), "a");

        let failure = CircularDependencyValidator.validate(&rule(), &target, Some(&all)).unwrap().unwrap();
        assert_eq!(failure.failure_details["cycle_count"], 2);
        assert!(failure.observed_issue.contains("2 circular dependencies found"));
        let cycles = failure.failure_details["all_cycles"].as_array().unwrap();
        assert_eq!(cycles[0]["cycle_path"], "a → b → a");
        assert_eq!(cycles[1]["cycle_path"], "a → c → a");
    }

    #[test]
    fn test_cycles_sharing_a_node_are_counted_separately() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["b", "c"]);
        write_skill(temp.path(), "b", &["c"]);
        write_skill(temp.path(), "c", &["a"]);
        let (target, all) = bundles_for(temp.path(), "a");

        let failure = CircularDependencyValidator.validate(&rule(), &target, Some(&all)).unwrap().unwrap();
        assert_eq!(failure.failure_details["circular_path"], "a → b → c → a");
        assert_eq!(failure.failure_details["cycle_count"], 2);
        assert!(failure.observed_issue.contains("2 circular dependencies found"));
        let cycles = failure.failure_details["all_cycles"].as_array().unwrap();
        assert_eq!(cycles[0]["cycle_path"], "a → b → c → a");
        assert_eq!(cycles[1]["cycle_path"], "a → c → a");
    }

    #[test]
    fn test_acyclic_passes() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["b"]);
        write_skill(temp.path(), "b", &["missing"]);
        let (target, all) = bundles_for(temp.path(), "a");

        assert!(CircularDependencyValidator.validate(&rule(), &target, Some(&all)).unwrap().is_none());
    }

    #[test]
    fn test_without_all_bundles_passes() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["a"]);
        let (target, _) = bundles_for(temp.path(), "a");

        assert!(CircularDependencyValidator.validate(&rule(), &target, None).unwrap().is_none());
    }

    #[test]
    fn test_missing_resource_dirs_is_an_error() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &[]);
        let (target, all) = bundles_for(temp.path(), "a");
        let rule = ValidationRule::new(CircularDependencyValidator::RULE_TYPE, "no cycles");

        let err = CircularDependencyValidator.validate(&rule, &target, Some(&all)).unwrap_err();
        assert!(err.to_string().contains("resource_dirs"));
    }

    #[test]
    fn test_custom_message_template() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["b"]);
        write_skill(temp.path(), "b", &["a"]);
        let (target, all) = bundles_for(temp.path(), "a");
        let rule = rule().with_failure_message("Loop: {circular_path} ({cycle_count})");

        let failure = CircularDependencyValidator.validate(&rule, &target, Some(&all)).unwrap().unwrap();
        assert_eq!(failure.observed_issue, "Loop: a → b → a (1)");
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "a", &["b", "c"]);
        write_skill(temp.path(), "b", &["c", "a"]);
        write_skill(temp.path(), "c", &["a", "b"]);
        let (target, all) = bundles_for(temp.path(), "a");

        let first = CircularDependencyValidator.validate(&rule(), &target, Some(&all)).unwrap().unwrap();
        let second = CircularDependencyValidator.validate(&rule(), &target, Some(&all)).unwrap().unwrap();
        assert_eq!(first.failure_details, second.failure_details);
    }
}
