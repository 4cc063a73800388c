//! `core:max_file_size`: flags bundle files larger than `max_size` bytes.

use anyhow::Result;
use serde_json::{Value, json};

use crate::bundle::DocumentBundle;
use crate::core::DriftError;
use crate::rules::{DocumentRule, FailureDetails, ValidationRule, Validator};

/// Checks the size of every file in the bundle.
///
/// Sizes are measured on the bundled content, so unsaved edits count.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSizeValidator;

impl FileSizeValidator {
    /// Key this validator is registered under.
    pub const RULE_TYPE: &'static str = "core:max_file_size";
}

fn max_size(rule: &ValidationRule) -> Result<u64, DriftError> {
    match rule.params.get("max_size") {
        None => Err(DriftError::MissingRuleParameter {
            rule_type: rule.rule_type.clone(),
            parameter: "max_size".to_string(),
        }),
        Some(value) => value.as_u64().ok_or_else(|| DriftError::InvalidRuleParameter {
            rule_type: rule.rule_type.clone(),
            parameter: "max_size".to_string(),
            reason: format!("expected a size in bytes, got {value}"),
        }),
    }
}

impl Validator for FileSizeValidator {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    fn name(&self) -> &str {
        "FileSizeValidator"
    }

    fn default_failure_message(&self) -> &str {
        "File '{file}' is {actual_size} bytes, over the limit of {max_size}"
    }

    fn default_expected_behavior(&self) -> &str {
        "Files should be at most {max_size} bytes"
    }

    fn validate(
        &self,
        rule: &ValidationRule,
        bundle: &DocumentBundle,
        _all_bundles: Option<&[DocumentBundle]>,
    ) -> Result<Option<DocumentRule>> {
        let max_size = max_size(rule)?;

        let oversized: Vec<(String, u64)> = bundle
            .files
            .iter()
            .map(|f| (f.file_path.display().to_string(), f.content.len() as u64))
            .filter(|(_, size)| *size > max_size)
            .collect();

        let Some((file, actual_size)) = oversized.first().cloned() else {
            return Ok(None);
        };

        let mut details = FailureDetails::new();
        details.insert("file".to_string(), Value::String(file));
        details.insert("actual_size".to_string(), json!(actual_size));
        details.insert("max_size".to_string(), json!(max_size));
        details.insert("oversized_count".to_string(), json!(oversized.len()));

        let file_paths = oversized.into_iter().map(|(path, _)| path).collect();
        Ok(Some(DocumentRule::from_details(rule, self, bundle, file_paths, details)))
    }
}
