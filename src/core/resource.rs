//! Resource types validated by drift.
//!
//! Coding agents load three kinds of declarative resources from a project. All of them are
//! Markdown files with YAML frontmatter, and all of them declare their dependencies through the
//! same `skills:` field.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::SKILL_FILE_NAME;

/// Kind of declarative resource.
///
/// ```rust
/// use drift_cli::core::ResourceType;
///
/// let json = serde_json::to_string(&ResourceType::Skill).unwrap();
/// assert_eq!(json, "\"skill\"");
/// assert_eq!("agents".parse::<ResourceType>().unwrap(), ResourceType::Agent);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Reusable capability, either `<dir>/<name>.md` or `<dir>/<name>/SKILL.md`
    Skill,
    /// Slash command, `<dir>/<name>.md`
    Command,
    /// Sub-agent definition, `<dir>/<name>.md`
    Agent,
}

impl ResourceType {
    /// All resource types, in a stable order.
    pub const ALL: [ResourceType; 3] = [ResourceType::Skill, ResourceType::Command, ResourceType::Agent];

    /// Infer the resource type of a resource directory from its final path component.
    ///
    /// `.claude/skills` is a skill directory, `.claude/agents` an agent directory, and so on.
    /// Returns `None` when the directory name is not recognized.
    pub fn from_directory(dir: &Path) -> Option<Self> {
        let name = dir.file_name()?.to_str()?;
        name.parse().ok()
    }

    /// Derive a resource id from a file that matches this type's layout under `dir`.
    ///
    /// Returns `None` if `file` does not follow the layout:
    /// - skills: `<dir>/<name>.md` or `<dir>/<name>/SKILL.md`
    /// - commands and agents: `<dir>/<name>.md`
    pub fn fallback_id(&self, dir: &Path, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(dir).ok()?;
        let components: Vec<&str> =
            relative.components().filter_map(|c| c.as_os_str().to_str()).collect();

        match components.as_slice() {
            [file_name] => file_name.strip_suffix(".md").filter(|s| !s.is_empty()).map(String::from),
            [skill_dir, file_name] if *self == ResourceType::Skill && *file_name == SKILL_FILE_NAME => {
                Some((*skill_dir).to_string())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Skill => write!(f, "skill"),
            ResourceType::Command => write!(f, "command"),
            ResourceType::Agent => write!(f, "agent"),
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = crate::core::DriftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skill" | "skills" => Ok(ResourceType::Skill),
            "command" | "commands" => Ok(ResourceType::Command),
            "agent" | "agents" => Ok(ResourceType::Agent),
            _ => Err(crate::core::DriftError::ConfigError {
                message: format!("Unknown resource type '{s}'"),
            }),
        }
    }
}
