//! Rules, failure records, and the [`Validator`] interface.
//!
//! A [`ValidationRule`] names a validator by its `namespace:type` key and carries the parameters
//! and message templates for one check. Running it against a bundle produces either nothing
//! (the bundle passed) or a [`DocumentRule`] describing what was observed.
//!
//! # Message templates
//!
//! `failure_message` and `expected_behavior` may reference any key of the failure details with
//! `{key}` placeholders:
//!
//! ```rust
//! use drift_cli::rules::render_template;
//! use serde_json::json;
//!
//! let details = json!({"circular_path": "a → b → a", "cycle_count": 1});
//! let message = render_template("Cycle: {circular_path}", details.as_object().unwrap());
//! assert_eq!(message, "Cycle: a → b → a");
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bundle::DocumentBundle;
use crate::constants::DEFAULT_MAX_DEPTH;
use crate::core::{DriftError, ResourceType};

/// Failure details attached to a [`DocumentRule`]. The shape is validator-specific.
pub type FailureDetails = Map<String, Value>;

/// A configured check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Human-readable description, used in execution reports
    #[serde(default)]
    pub description: String,
    /// Validator key, `namespace:type`
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Plugin provider, `module.path:ValidatorName`; only for non-core types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Validator parameters
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Template overriding the validator's default failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    /// Template overriding the validator's default expected behavior
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_behavior: Option<String>,
}

impl ValidationRule {
    /// Create a rule with no parameters or templates.
    pub fn new(rule_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            rule_type: rule_type.into(),
            provider: None,
            params: Map::new(),
            failure_message: None,
            expected_behavior: None,
        }
    }

    /// Builder-style parameter setter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Builder-style provider setter.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Builder-style failure message template setter.
    #[must_use]
    pub fn with_failure_message(mut self, template: impl Into<String>) -> Self {
        self.failure_message = Some(template.into());
        self
    }

    /// Text identifying the rule in reports: its description, or its type if undescribed.
    pub fn display_name(&self) -> &str {
        if self.description.is_empty() { &self.rule_type } else { &self.description }
    }

    /// The `resource_dirs` parameter. Required by graph validators.
    pub fn resource_dirs(&self) -> Result<Vec<String>, DriftError> {
        let value = self.params.get("resource_dirs").ok_or_else(|| DriftError::MissingRuleParameter {
            rule_type: self.rule_type.clone(),
            parameter: "resource_dirs".to_string(),
        })?;

        let invalid = |reason: &str| DriftError::InvalidRuleParameter {
            rule_type: self.rule_type.clone(),
            parameter: "resource_dirs".to_string(),
            reason: reason.to_string(),
        };

        let dirs = value.as_array().ok_or_else(|| invalid("expected a list of directories"))?;
        dirs.iter()
            .map(|dir| dir.as_str().map(str::to_string).ok_or_else(|| invalid("every entry must be a string")))
            .collect()
    }

    /// The `max_depth` parameter, defaulting to [`DEFAULT_MAX_DEPTH`].
    pub fn max_depth(&self) -> Result<usize, DriftError> {
        match self.params.get("max_depth") {
            None | Some(Value::Null) => Ok(DEFAULT_MAX_DEPTH),
            Some(value) => value.as_u64().map(|depth| depth as usize).ok_or_else(|| {
                DriftError::InvalidRuleParameter {
                    rule_type: self.rule_type.clone(),
                    parameter: "max_depth".to_string(),
                    reason: format!("expected a non-negative integer, got {value}"),
                }
            }),
        }
    }

    /// A required string parameter.
    pub fn string_param(&self, name: &str) -> Result<&str, DriftError> {
        match self.params.get(name) {
            Some(Value::String(value)) => Ok(value),
            Some(other) => Err(DriftError::InvalidRuleParameter {
                rule_type: self.rule_type.clone(),
                parameter: name.to_string(),
                reason: format!("expected a string, got {other}"),
            }),
            None => Err(DriftError::MissingRuleParameter {
                rule_type: self.rule_type.clone(),
                parameter: name.to_string(),
            }),
        }
    }
}

/// A failure record: what a rule observed in a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRule {
    /// Bundle the failure was found in
    pub bundle_id: String,
    /// Type of that bundle
    pub bundle_type: ResourceType,
    /// Files involved
    pub file_paths: Vec<String>,
    /// Rendered failure message
    pub observed_issue: String,
    /// Rendered expected behavior
    pub expected_quality: String,
    /// Validator-specific details
    pub failure_details: FailureDetails,
}

impl DocumentRule {
    /// Build a failure record, rendering the rule's templates (or the validator defaults)
    /// against `details`.
    pub fn from_details(
        rule: &ValidationRule,
        validator: &dyn Validator,
        bundle: &DocumentBundle,
        file_paths: Vec<String>,
        details: FailureDetails,
    ) -> Self {
        let message_template =
            rule.failure_message.as_deref().unwrap_or_else(|| validator.default_failure_message());
        let expected_template =
            rule.expected_behavior.as_deref().unwrap_or_else(|| validator.default_expected_behavior());

        Self {
            bundle_id: bundle.bundle_id.clone(),
            bundle_type: bundle.bundle_type,
            file_paths,
            observed_issue: render_template(message_template, &details),
            expected_quality: render_template(expected_template, &details),
            failure_details: details,
        }
    }
}

/// How a validator computes its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputationType {
    /// Pure computation or local I/O
    Programmatic,
    /// Backed by a language model; results go through the response cache
    Llm,
}

/// One named check against a bundle.
///
/// Implementations must be shareable across threads: the dispatcher may run several rules at
/// once, and plugin instances are cached and reused. `validate` takes `&self`, so validators keep
/// no mutable per-call state.
pub trait Validator: Send + Sync {
    /// The `namespace:type` key this validator answers to.
    fn rule_type(&self) -> &str;

    /// Name of the implementation, used in error messages.
    fn name(&self) -> &str;

    /// How the validator computes its result.
    fn computation_type(&self) -> ComputationType {
        ComputationType::Programmatic
    }

    /// Failure message template used when the rule does not set one.
    fn default_failure_message(&self) -> &str;

    /// Expected behavior template used when the rule does not set one.
    fn default_expected_behavior(&self) -> &str;

    /// Check `bundle`. `all_bundles` is every bundle in the project, when the caller has them.
    ///
    /// Returns `Ok(None)` when the bundle passes and `Ok(Some(_))` describing the failure
    /// otherwise. `Err` means the rule could not be evaluated.
    fn validate(
        &self,
        rule: &ValidationRule,
        bundle: &DocumentBundle,
        all_bundles: Option<&[DocumentBundle]>,
    ) -> Result<Option<DocumentRule>>;
}

impl std::fmt::Debug for dyn Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("rule_type", &self.rule_type())
            .field("name", &self.name())
            .finish()
    }
}

/// Replace `{key}` placeholders with values from `details`.
///
/// Strings are inserted verbatim, other values in their JSON form. Unknown placeholders are left
/// untouched.
pub fn render_template(template: &str, details: &FailureDetails) -> String {
    let mut rendered = template.to_string();
    for (key, value) in details {
        let placeholder = format!("{{{key}}}");
        if !rendered.contains(&placeholder) {
            continue;
        }
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        rendered = rendered.replace(&placeholder, &text);
    }
    rendered
}
