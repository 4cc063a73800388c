//! `core:max_dependency_depth`: flags resources whose dependency chains are too deep.

use anyhow::Result;
use serde_json::json;

use super::GraphScope;
use crate::bundle::DocumentBundle;
use crate::graph::depth::{DepthReport, longest_chain};
use crate::rules::{DocumentRule, FailureDetails, ValidationRule, Validator};

/// Checks the longest dependency chain of each bundle resource against `max_depth`.
///
/// The reported depth and chain belong to the deepest violating resource; `violation_count`
/// counts every violating resource in the bundle.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaxDependencyDepthValidator;

impl MaxDependencyDepthValidator {
    /// Key this validator is registered under.
    pub const RULE_TYPE: &'static str = "core:max_dependency_depth";
}

impl Validator for MaxDependencyDepthValidator {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    fn name(&self) -> &str {
        "MaxDependencyDepthValidator"
    }

    fn default_failure_message(&self) -> &str {
        "Dependency depth {actual_depth} exceeds the maximum of {max_depth}: {dependency_chain}"
    }

    fn default_expected_behavior(&self) -> &str {
        "Dependency chains should be at most {max_depth} levels deep"
    }

    fn validate(
        &self,
        rule: &ValidationRule,
        bundle: &DocumentBundle,
        all_bundles: Option<&[DocumentBundle]>,
    ) -> Result<Option<DocumentRule>> {
        let max_depth = rule.max_depth()?;
        let Some(scope) = GraphScope::build(rule, bundle, all_bundles)? else {
            return Ok(None);
        };
        let graph = &scope.graph;

        let violations: Vec<(String, DepthReport)> = scope
            .targets
            .iter()
            .map(|&target| (scope.target_file(target, bundle), longest_chain(graph, target)))
            .filter(|(_, report)| report.depth > max_depth)
            .collect();

        let Some((file, deepest)) = violations
            .iter()
            .fold(None::<&(String, DepthReport)>, |best, candidate| match best {
                Some(current) if current.1.depth >= candidate.1.depth => Some(current),
                _ => Some(candidate),
            })
        else {
            return Ok(None);
        };

        let dependency_chain = graph.render_path(&deepest.chain);
        tracing::debug!(
            "Bundle '{}' exceeds max depth {}: {}",
            bundle.bundle_id,
            max_depth,
            dependency_chain
        );

        let mut details = FailureDetails::new();
        details.insert("actual_depth".to_string(), json!(deepest.depth));
        details.insert("max_depth".to_string(), json!(max_depth));
        details.insert("dependency_chain".to_string(), json!(dependency_chain));
        details.insert("violation_count".to_string(), json!(violations.len()));

        Ok(Some(DocumentRule::from_details(rule, self, bundle, vec![file.clone()], details)))
    }
}
