//! Error handling for drift
//!
//! Two layers, mirroring how failures surface to users:
//! - [`DriftError`] - typed errors for configuration, registry, and plugin failures
//! - [`ErrorContext`] - wrapper that adds details and an actionable suggestion for the CLI
//!
//! Validation findings are never errors. A rule that finds a problem returns a
//! [`DocumentRule`](crate::rules::DocumentRule); a `DriftError` means the rule could not be
//! evaluated at all, usually because of a bad setting.
//!
//! # Examples
//!
//! ```rust,no_run
//! use drift_cli::core::{DriftError, ErrorContext, user_friendly_error};
//!
//! let error = DriftError::MissingRuleParameter {
//!     rule_type: "core:circular_dependencies".to_string(),
//!     parameter: "resource_dirs".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for drift operations.
///
/// Every variant except [`DriftError::IoError`] describes a configuration or setup problem and is
/// fatal for the rule that triggered it. The message of each variant names the setting at fault.
#[derive(Error, Debug)]
pub enum DriftError {
    /// A rule type string is not of the form `namespace:type`.
    #[error(
        "Invalid rule type '{rule_type}': expected 'namespace:type' using lowercase letters, digits and underscores"
    )]
    InvalidRuleType {
        /// The offending rule type string
        rule_type: String,
    },

    /// A rule needs a parameter that the configuration does not supply.
    #[error("Rule '{rule_type}' requires the '{parameter}' parameter")]
    MissingRuleParameter {
        /// Rule type that needs the parameter
        rule_type: String,
        /// Name of the missing parameter
        parameter: String,
    },

    /// A rule parameter is present but has the wrong shape.
    #[error("Rule '{rule_type}' has an invalid '{parameter}' parameter: {reason}")]
    InvalidRuleParameter {
        /// Rule type that owns the parameter
        rule_type: String,
        /// Name of the parameter
        parameter: String,
        /// What was wrong with the value
        reason: String,
    },

    /// Two validators tried to claim the same `namespace:type` key.
    #[error("Validator type '{rule_type}' is already registered by {existing}")]
    DuplicateValidator {
        /// The contested key
        rule_type: String,
        /// Name of the validator that holds the key
        existing: String,
    },

    /// A non-core rule type was requested without a provider.
    #[error(
        "Unsupported rule type '{rule_type}': specify a provider ('module.path:ValidatorName') for custom rule types"
    )]
    UnsupportedRuleType {
        /// The requested rule type
        rule_type: String,
    },

    /// A rule type in a built-in namespace that no validator claims.
    #[error("No validator is registered for rule type '{rule_type}'")]
    UnknownRuleType {
        /// The requested rule type
        rule_type: String,
    },

    /// A `core:*` rule carried a provider.
    #[error("Built-in rule type '{rule_type}' must not specify a provider (got '{provider}')")]
    ProviderNotAllowed {
        /// The built-in rule type
        rule_type: String,
        /// The provider that was supplied
        provider: String,
    },

    /// A provider string is not of the form `module.path:ValidatorName`.
    #[error("Invalid provider '{provider}': expected 'module.path:ValidatorName'")]
    MalformedProvider {
        /// The offending provider string
        provider: String,
    },

    /// The plugin module named by a provider is not registered.
    #[error(
        "Plugin module '{module}' not found. Add the crate that provides it to your build and register it in the plugin catalog"
    )]
    PluginModuleNotFound {
        /// Module path from the provider string
        module: String,
    },

    /// The module exists but exports nothing under the requested name.
    #[error("Plugin module '{module}' has no export named '{class}'")]
    PluginClassNotFound {
        /// Module path from the provider string
        module: String,
        /// Export name from the provider string
        class: String,
    },

    /// The export exists but is not a validator.
    #[error("'{module}:{class}' does not implement the Validator interface")]
    PluginNotAValidator {
        /// Module path from the provider string
        module: String,
        /// Export name from the provider string
        class: String,
    },

    /// A plugin reported a different rule type than the one it was loaded for.
    #[error("Plugin '{provider}' reports type '{actual}' but was loaded for '{expected}'")]
    PluginTypeMismatch {
        /// Provider string
        provider: String,
        /// The rule type requested by configuration
        expected: String,
        /// The rule type reported by the plugin
        actual: String,
    },

    /// Configuration file problems.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// Standard I/O errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DriftError {
    /// Whether this error is a configuration error that must abort the rule before it runs.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::IoError(_))
    }
}

/// Error wrapper with user-facing details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error message
    pub error: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no details or suggestion.
    #[must_use]
    pub fn new(error: impl fmt::Display) -> Self {
        Self {
            error: error.to_string(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with suggestions where the cause is recognized.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(drift_error) = error.downcast_ref::<DriftError>() {
        return create_error_context(drift_error);
    }

    if error.downcast_ref::<toml::de::Error>().is_some() {
        return ErrorContext::new(format!("{error:#}"))
            .with_suggestion("Check the TOML syntax of your .drift.toml file")
            .with_details("Rules are declared as [[rules]] tables with a 'type' and optional [rules.params]");
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(format!("{error:#}"))
                    .with_suggestion("Check file ownership and permissions");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(format!("{error:#}"))
                    .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    ErrorContext::new(format!("{error:#}"))
}

fn create_error_context(error: &DriftError) -> ErrorContext {
    let ctx = ErrorContext::new(error);
    match error {
        DriftError::InvalidRuleType { .. } => ctx
            .with_suggestion("Use a namespaced rule type such as 'core:circular_dependencies'"),
        DriftError::MissingRuleParameter { parameter, .. } => ctx
            .with_suggestion(format!("Add '{parameter}' under [rules.params] for this rule"))
            .with_details("Graph rules need resource_dirs to know where skills, commands and agents live"),
        DriftError::InvalidRuleParameter { .. } => {
            ctx.with_suggestion("Check the parameter type in your configuration")
        }
        DriftError::DuplicateValidator { .. } => ctx
            .with_details("Each 'namespace:type' key can be claimed by exactly one validator")
            .with_suggestion("Pick a different namespace for the custom validator"),
        DriftError::UnsupportedRuleType { .. } => ctx.with_suggestion(
            "Set 'provider = \"module.path:ValidatorName\"' on the rule, or use a core rule type",
        ),
        DriftError::UnknownRuleType { .. } => ctx.with_suggestion(
            "Built-in types are circular_dependencies, dependency_duplicate, max_dependency_depth, file_exists and max_file_size",
        ),
        DriftError::ProviderNotAllowed { .. } => {
            ctx.with_suggestion("Remove the 'provider' key from the core rule")
        }
        DriftError::MalformedProvider { .. } => {
            ctx.with_suggestion("Providers look like 'acme.checks:NamingValidator'")
        }
        DriftError::PluginModuleNotFound { .. } => ctx
            .with_details("Plugins are compiled in and registered in the PluginCatalog at startup"),
        DriftError::PluginClassNotFound { .. } | DriftError::PluginNotAValidator { .. } => {
            ctx.with_suggestion("Check the validator name after ':' in the provider string")
        }
        DriftError::PluginTypeMismatch { .. } => {
            ctx.with_suggestion("Make the rule 'type' match the type the plugin declares")
        }
        DriftError::ConfigError { .. } => ctx,
        DriftError::IoError(_) => ctx,
    }
}
