//! Frontmatter parsing for resource files.
//!
//! Resource files start with a `---`-delimited YAML block. drift reads two fields from it:
//! `name` (the resource id) and `skills` (the declared dependency ids). Everything else in the
//! block is ignored.
//!
//! Parsing never fails. A missing, unclosed, or malformed block yields an empty
//! [`ResourceHeader`], so a single broken file cannot abort a directory scan.
//!
//! ```rust
//! use drift_cli::markdown::frontmatter::parse_resource_header;
//! use std::path::Path;
//!
//! let content = "---\nname: reviewer\nskills:\n  - lint\n  - testing\n---\n# Reviewer\n";
//! let header = parse_resource_header(content, Path::new("reviewer.md"));
//! assert_eq!(header.name.as_deref(), Some("reviewer"));
//! assert_eq!(header.dependencies, vec!["lint", "testing"]);
//! ```

use gray_matter::{Matter, Pod, engine::Engine};
use serde::Deserialize;
use std::path::Path;

/// Custom gray_matter engine that returns raw frontmatter text without parsing.
///
/// YAML parsing happens separately with `serde_yaml` so a syntax error can be logged and
/// downgraded to "no metadata" instead of failing the whole parse.
struct RawFrontmatter;

impl Engine for RawFrontmatter {
    fn parse(content: &str) -> Result<Pod, gray_matter::Error> {
        Ok(Pod::String(content.to_string()))
    }
}

/// `skills:` accepts a YAML list or an inline comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencyField {
    List(Vec<String>),
    Inline(String),
}

#[derive(Debug, Default, Deserialize)]
struct ResourceFrontmatter {
    name: Option<String>,
    skills: Option<DependencyField>,
}

/// The fields drift reads from a resource's frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceHeader {
    /// The `name` field, if present and non-empty
    pub name: Option<String>,
    /// Declared dependency ids in declaration order, trimmed, without blanks
    pub dependencies: Vec<String>,
}

/// Check that content opens with a `---` line and closes the block with another `---` line.
fn has_closed_frontmatter(content: &str) -> bool {
    let mut lines = content.trim_start_matches('\u{feff}').lines();
    match lines.next() {
        Some(first) if first.trim_end() == "---" => lines.any(|line| line.trim_end() == "---"),
        _ => false,
    }
}

/// Extract the raw frontmatter text, or `None` when the block is absent or unclosed.
pub fn extract_raw_frontmatter(content: &str) -> Option<String> {
    if !has_closed_frontmatter(content) {
        return None;
    }

    let matter: Matter<RawFrontmatter> = Matter::new();
    match matter.parse::<String>(content) {
        Ok(result) => result.data.filter(|text| !text.trim().is_empty()),
        Err(_) => None,
    }
}

/// Parse the resource header from a file's content.
///
/// `file_path` is only used for log messages.
pub fn parse_resource_header(content: &str, file_path: &Path) -> ResourceHeader {
    let Some(raw) = extract_raw_frontmatter(content) else {
        if content.trim_start().starts_with("---") {
            tracing::warn!(
                "Unclosed frontmatter in '{}'; treating resource as having no dependencies",
                file_path.display()
            );
        }
        return ResourceHeader::default();
    };

    let frontmatter = match serde_yaml::from_str::<ResourceFrontmatter>(&raw) {
        Ok(frontmatter) => frontmatter,
        Err(e) => {
            tracing::warn!(
                "Unable to parse YAML frontmatter in '{}': {}. Dependencies will be ignored",
                file_path.display(),
                e
            );
            return ResourceHeader::default();
        }
    };

    let dependencies = match frontmatter.skills {
        Some(DependencyField::List(ids)) => ids,
        Some(DependencyField::Inline(text)) => text.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };

    ResourceHeader {
        name: frontmatter.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        dependencies: dependencies
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(content: &str) -> ResourceHeader {
        parse_resource_header(content, Path::new("test.md"))
    }

    #[test]
    fn test_list_dependencies() {
        let parsed = header("---\nname: a\nskills:\n  - b\n  - c\n---\nbody\n");
        assert_eq!(parsed.name.as_deref(), Some("a"));
        assert_eq!(parsed.dependencies, vec!["b", "c"]);
    }

    #[test]
    fn test_inline_dependencies() {
        let parsed = header("---\nname: a\nskills: b, c ,\n---\n");
        assert_eq!(parsed.dependencies, vec!["b", "c"]);
    }

    #[test]
    fn test_no_frontmatter() {
        assert_eq!(header("# Just markdown\n"), ResourceHeader::default());
    }

    #[test]
    fn test_unclosed_frontmatter_is_empty() {
        let parsed = header("---\nname: a\nskills:\n  - b\n# never closed\n");
        assert_eq!(parsed, ResourceHeader::default());
    }

    #[test]
    fn test_malformed_yaml_is_empty() {
        let parsed = header("---\nname: [unterminated\nskills: {\n---\n");
        assert_eq!(parsed, ResourceHeader::default());
    }

    #[test]
    fn test_other_fields_are_ignored() {
        let parsed = header("---\ndescription: helper\nallowed-tools: [Read]\n---\n");
        assert_eq!(parsed.name, None);
        assert!(parsed.dependencies.is_empty());
    }

    #[test]
    fn test_blank_name_is_none() {
        let parsed = header("---\nname: \"  \"\nskills: []\n---\n");
        assert_eq!(parsed.name, None);
    }
}
