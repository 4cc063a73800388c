//! Rule execution dispatcher.
//!
//! Runs a batch of rules against one bundle and records, per rule, whether it passed, failed or
//! errored. A rule that errors (the validator returned an error, panicked, or could not be
//! resolved) never stops the batch; its message is recorded and the remaining rules still run.
//!
//! A single rule always runs inline. Larger batches run in parallel when enabled, one blocking
//! task per rule, each resolving its own validator from the shared registry. Results come back
//! in input order either way.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use drift_cli::dispatch::RuleDispatcher;
//! use drift_cli::registry::ValidatorRegistry;
//! # use drift_cli::bundle::DocumentBundle;
//! # use drift_cli::rules::ValidationRule;
//!
//! # async fn example(rules: Vec<ValidationRule>, bundle: DocumentBundle, all: Vec<DocumentBundle>) {
//! let dispatcher = RuleDispatcher::new(Arc::new(ValidatorRegistry::new()), true);
//! let outcome = dispatcher.dispatch(&rules, &bundle, Some(&all)).await;
//! for detail in &outcome.execution_details {
//!     println!("{}: {:?}", detail.rule_description, detail.status);
//! }
//! # }
//! ```

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::bundle::DocumentBundle;
use crate::registry::ValidatorRegistry;
use crate::rules::{DocumentRule, ValidationRule};

/// How a rule ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// The bundle satisfied the rule
    Passed,
    /// The rule found a problem; a [`DocumentRule`] was collected
    Failed,
    /// The rule could not be evaluated
    Errored,
}

/// Execution record for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDetail {
    /// The rule's description, or its type if it has none
    pub rule_description: String,
    /// Outcome
    pub status: RuleStatus,
    /// Why the rule errored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Everything a dispatch produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Failure records, in rule order
    pub failures: Vec<DocumentRule>,
    /// One entry per rule, in rule order
    pub execution_details: Vec<ExecutionDetail>,
}

impl DispatchOutcome {
    /// Number of rules that ended with `status`.
    pub fn count(&self, status: RuleStatus) -> usize {
        self.execution_details.iter().filter(|d| d.status == status).count()
    }

    /// Whether any rule failed or errored.
    pub fn has_problems(&self) -> bool {
        self.execution_details.iter().any(|d| d.status != RuleStatus::Passed)
    }

    fn push(&mut self, (detail, failure): RuleResult) {
        self.execution_details.push(detail);
        self.failures.extend(failure);
    }
}

type RuleResult = (ExecutionDetail, Option<DocumentRule>);

/// Runs rules against bundles through a shared [`ValidatorRegistry`].
#[derive(Debug, Clone)]
pub struct RuleDispatcher {
    registry: Arc<ValidatorRegistry>,
    parallel: bool,
}

impl RuleDispatcher {
    /// Create a dispatcher. `parallel` enables concurrent execution of multi-rule batches.
    pub fn new(registry: Arc<ValidatorRegistry>, parallel: bool) -> Self {
        Self { registry, parallel }
    }

    /// The registry rules are resolved against.
    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }

    /// Run `rules` against `bundle`.
    pub async fn dispatch(
        &self,
        rules: &[ValidationRule],
        bundle: &DocumentBundle,
        all_bundles: Option<&[DocumentBundle]>,
    ) -> DispatchOutcome {
        if self.parallel && rules.len() > 1 {
            tracing::debug!("Running {} rules in parallel on '{}'", rules.len(), bundle.bundle_id);
            self.dispatch_parallel(rules, bundle, all_bundles).await
        } else {
            tracing::debug!("Running {} rules sequentially on '{}'", rules.len(), bundle.bundle_id);
            self.dispatch_sequential(rules, bundle, all_bundles)
        }
    }

    fn dispatch_sequential(
        &self,
        rules: &[ValidationRule],
        bundle: &DocumentBundle,
        all_bundles: Option<&[DocumentBundle]>,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for rule in rules {
            outcome.push(run_rule(&self.registry, rule, bundle, all_bundles));
        }
        outcome
    }

    async fn dispatch_parallel(
        &self,
        rules: &[ValidationRule],
        bundle: &DocumentBundle,
        all_bundles: Option<&[DocumentBundle]>,
    ) -> DispatchOutcome {
        let bundle = Arc::new(bundle.clone());
        let all_bundles: Option<Arc<[DocumentBundle]>> = all_bundles.map(Arc::from);

        let tasks = rules.iter().map(|rule| {
            let registry = Arc::clone(&self.registry);
            let rule = rule.clone();
            let bundle = Arc::clone(&bundle);
            let all_bundles = all_bundles.clone();
            tokio::task::spawn_blocking(move || run_rule(&registry, &rule, &bundle, all_bundles.as_deref()))
        });
        let results = join_all(tasks).await;

        let mut outcome = DispatchOutcome::default();
        for (rule, result) in rules.iter().zip(results) {
            match result {
                Ok(rule_result) => outcome.push(rule_result),
                Err(join_error) => {
                    tracing::error!("Rule '{}' task failed: {}", rule.display_name(), join_error);
                    outcome.push(errored(rule, format!("Rule task failed: {join_error}")));
                }
            }
        }
        outcome
    }
}

fn run_rule(
    registry: &ValidatorRegistry,
    rule: &ValidationRule,
    bundle: &DocumentBundle,
    all_bundles: Option<&[DocumentBundle]>,
) -> RuleResult {
    let validator = match registry.resolve_rule(rule) {
        Ok(validator) => validator,
        Err(e) => {
            tracing::error!("Rule '{}' could not be resolved: {}", rule.display_name(), e);
            return errored(rule, e.to_string());
        }
    };

    match catch_unwind(AssertUnwindSafe(|| validator.validate(rule, bundle, all_bundles))) {
        Ok(Ok(None)) => (detail(rule, RuleStatus::Passed, None), None),
        Ok(Ok(Some(failure))) => (detail(rule, RuleStatus::Failed, None), Some(failure)),
        Ok(Err(e)) => {
            tracing::warn!("Rule '{}' errored on '{}': {:#}", rule.display_name(), bundle.bundle_id, e);
            errored(rule, format!("{e:#}"))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!("Rule '{}' panicked on '{}': {}", rule.display_name(), bundle.bundle_id, message);
            errored(rule, format!("Validator panicked: {message}"))
        }
    }
}

fn detail(rule: &ValidationRule, status: RuleStatus, error_message: Option<String>) -> ExecutionDetail {
    ExecutionDetail {
        rule_description: rule.display_name().to_string(),
        status,
        error_message,
    }
}

fn errored(rule: &ValidationRule, message: String) -> RuleResult {
    (detail(rule, RuleStatus::Errored, Some(message)), None)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResourceType;
    use crate::rules::{FailureDetails, Validator};
    use anyhow::{Result, bail};
    use std::path::PathBuf;

    /// Behaves as the rule's `outcome` parameter says.
    struct ScriptedValidator;

    impl Validator for ScriptedValidator {
        fn rule_type(&self) -> &str {
            "test:scripted"
        }

        fn name(&self) -> &str {
            "ScriptedValidator"
        }

        fn default_failure_message(&self) -> &str {
            "Scripted failure"
        }

        fn default_expected_behavior(&self) -> &str {
            "Scripted pass"
        }

        fn validate(
            &self,
            rule: &ValidationRule,
            bundle: &DocumentBundle,
            _all_bundles: Option<&[DocumentBundle]>,
        ) -> Result<Option<DocumentRule>> {
            match rule.params.get("outcome").and_then(|v| v.as_str()) {
                Some("fail") => Ok(Some(DocumentRule::from_details(
                    rule,
                    self,
                    bundle,
                    bundle.file_paths(),
                    FailureDetails::new(),
                ))),
                Some("error") => bail!("validator exploded"),
                Some("panic") => panic!("validator panicked hard"),
                _ => Ok(None),
            }
        }
    }

    fn dispatcher(parallel: bool) -> RuleDispatcher {
        let mut registry = ValidatorRegistry::new();
        registry.register(|| Box::new(ScriptedValidator)).unwrap();
        RuleDispatcher::new(Arc::new(registry), parallel)
    }

    fn bundle() -> DocumentBundle {
        DocumentBundle {
            bundle_id: "demo".to_string(),
            bundle_type: ResourceType::Skill,
            files: Vec::new(),
            project_path: PathBuf::from("."),
        }
    }

    fn scripted(description: &str, outcome: &str) -> ValidationRule {
        ValidationRule::new("test:scripted", description).with_param("outcome", outcome)
    }

    fn statuses(outcome: &DispatchOutcome) -> Vec<RuleStatus> {
        outcome.execution_details.iter().map(|d| d.status).collect()
    }

    #[tokio::test]
    async fn test_failing_rule_is_isolated_in_both_modes() {
        let rules = vec![scripted("first", "pass"), scripted("second", "error"), scripted("third", "fail")];

        for parallel in [false, true] {
            let outcome = dispatcher(parallel).dispatch(&rules, &bundle(), None).await;
            assert_eq!(
                statuses(&outcome),
                vec![RuleStatus::Passed, RuleStatus::Errored, RuleStatus::Failed],
                "parallel = {parallel}"
            );
            assert_eq!(outcome.count(RuleStatus::Errored), 1);
            assert_eq!(outcome.failures.len(), 1);
            assert_eq!(outcome.execution_details[1].rule_description, "second");
            assert!(outcome.execution_details[1].error_message.as_deref().unwrap().contains("validator exploded"));
        }
    }

    #[tokio::test]
    async fn test_panicking_rule_is_isolated() {
        let rules = vec![scripted("a", "pass"), scripted("b", "panic"), scripted("c", "pass")];

        for parallel in [false, true] {
            let outcome = dispatcher(parallel).dispatch(&rules, &bundle(), None).await;
            assert_eq!(statuses(&outcome), vec![RuleStatus::Passed, RuleStatus::Errored, RuleStatus::Passed]);
            assert!(outcome.execution_details[1].error_message.as_deref().unwrap().contains("panicked hard"));
        }
    }

    #[tokio::test]
    async fn test_unresolvable_rule_is_errored() {
        let rules = vec![ValidationRule::new("custom:missing", "no provider"), scripted("ok", "pass")];

        let outcome = dispatcher(true).dispatch(&rules, &bundle(), None).await;
        assert_eq!(statuses(&outcome), vec![RuleStatus::Errored, RuleStatus::Passed]);
        assert!(outcome.execution_details[0].error_message.as_deref().unwrap().contains("specify a provider"));
        assert!(outcome.has_problems());
    }

    #[tokio::test]
    async fn test_single_rule_and_empty_batch() {
        let outcome = dispatcher(true).dispatch(&[scripted("only", "fail")], &bundle(), None).await;
        assert_eq!(statuses(&outcome), vec![RuleStatus::Failed]);
        assert_eq!(outcome.failures[0].observed_issue, "Scripted failure");

        let empty = dispatcher(true).dispatch(&[], &bundle(), None).await;
        assert!(empty.execution_details.is_empty());
        assert!(!empty.has_problems());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let detail = ExecutionDetail {
            rule_description: "r".to_string(),
            status: RuleStatus::Errored,
            error_message: Some("boom".to_string()),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["status"], "errored");
        assert_eq!(json["error_message"], "boom");
    }
}
