//! `core:file_exists`: checks that a required file is present in the project.

use anyhow::Result;
use serde_json::Value;

use crate::bundle::DocumentBundle;
use crate::rules::{DocumentRule, FailureDetails, ValidationRule, Validator};

/// Fails when `file_path` (relative to the bundle's project root) does not exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileExistsValidator;

impl FileExistsValidator {
    /// Key this validator is registered under.
    pub const RULE_TYPE: &'static str = "core:file_exists";
}

impl Validator for FileExistsValidator {
    fn rule_type(&self) -> &str {
        Self::RULE_TYPE
    }

    fn name(&self) -> &str {
        "FileExistsValidator"
    }

    fn default_failure_message(&self) -> &str {
        "Required file '{file_path}' does not exist"
    }

    fn default_expected_behavior(&self) -> &str {
        "File '{file_path}' should exist"
    }

    fn validate(
        &self,
        rule: &ValidationRule,
        bundle: &DocumentBundle,
        _all_bundles: Option<&[DocumentBundle]>,
    ) -> Result<Option<DocumentRule>> {
        let file_path = rule.string_param("file_path")?;
        let full_path = bundle.project_path.join(file_path);
        if full_path.exists() {
            return Ok(None);
        }

        tracing::debug!("Required file missing: {}", full_path.display());
        let mut details = FailureDetails::new();
        details.insert("file_path".to_string(), Value::String(file_path.to_string()));
        Ok(Some(DocumentRule::from_details(
            rule,
            self,
            bundle,
            vec![full_path.display().to_string()],
            details,
        )))
    }
}
