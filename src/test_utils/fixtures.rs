//! Scratch projects and config fixtures.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::bundle::{DocumentBundle, discover_bundles};
use crate::constants::CONFIG_FILE_NAME;

/// Default resource directories used by fixtures.
pub const RESOURCE_DIRS: &[&str] = &[".claude/skills", ".claude/commands", ".claude/agents"];

/// A temporary project directory.
///
/// The directory is removed when the value is dropped.
pub struct TestProject {
    temp: TempDir,
}

impl TestProject {
    /// Create an empty project.
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: TempDir::new().context("Failed to create temp project")?,
        })
    }

    /// Project root.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `<project>/<relative>`, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a single-file skill `.claude/skills/<id>.md` depending on `deps`.
    pub fn add_skill(&self, id: &str, deps: &[&str]) -> Result<PathBuf> {
        self.write_file(&format!(".claude/skills/{id}.md"), &resource_markdown(id, deps))
    }

    /// Write a directory skill `.claude/skills/<id>/SKILL.md` depending on `deps`.
    pub fn add_skill_dir(&self, id: &str, deps: &[&str]) -> Result<PathBuf> {
        self.write_file(&format!(".claude/skills/{id}/SKILL.md"), &resource_markdown(id, deps))
    }

    /// Write a command `.claude/commands/<id>.md` depending on `deps`.
    pub fn add_command(&self, id: &str, deps: &[&str]) -> Result<PathBuf> {
        self.write_file(&format!(".claude/commands/{id}.md"), &resource_markdown(id, deps))
    }

    /// Write an agent `.claude/agents/<id>.md` depending on `deps`.
    pub fn add_agent(&self, id: &str, deps: &[&str]) -> Result<PathBuf> {
        self.write_file(&format!(".claude/agents/{id}.md"), &resource_markdown(id, deps))
    }

    /// Write `.drift.toml`.
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        self.write_file(CONFIG_FILE_NAME, content)
    }

    /// Discover every bundle under [`RESOURCE_DIRS`].
    pub fn bundles(&self) -> Result<Vec<DocumentBundle>> {
        let dirs: Vec<String> = RESOURCE_DIRS.iter().map(|d| (*d).to_string()).collect();
        discover_bundles(self.path(), &dirs)
    }

    /// The bundle named `id`, together with all bundles.
    pub fn bundle(&self, id: &str) -> Result<(DocumentBundle, Vec<DocumentBundle>)> {
        let all = self.bundles()?;
        let bundle = all
            .iter()
            .find(|b| b.bundle_id == id)
            .cloned()
            .with_context(|| format!("No bundle named '{id}'"))?;
        Ok((bundle, all))
    }
}

/// Markdown for a resource with `name` and `skills` frontmatter.
pub fn resource_markdown(id: &str, deps: &[&str]) -> String {
    let skills = if deps.is_empty() {
        "skills: []\n".to_string()
    } else {
        let list: String = deps.iter().map(|d| format!("  - {d}\n")).collect();
        format!("skills:\n{list}")
    };
    format!("---\nname: {id}\n{skills}---\n# {id}\n")
}

/// Ready-made `.drift.toml` contents.
#[derive(Clone, Debug)]
pub struct ConfigFixture {
    /// Fixture name
    pub name: String,
    /// TOML content
    pub content: String,
}

impl ConfigFixture {
    /// The three graph rules over every resource directory.
    pub fn graph_rules(parallel: bool) -> Self {
        Self {
            name: "graph_rules".to_string(),
            content: format!(
                r#"
[parallel_execution]
enabled = {parallel}

[[rules]]
description = "No circular dependencies"
type = "core:circular_dependencies"
[rules.params]
resource_dirs = {dirs}

[[rules]]
description = "No redundant dependencies"
type = "core:dependency_duplicate"
[rules.params]
resource_dirs = {dirs}

[[rules]]
description = "Shallow dependency chains"
type = "core:max_dependency_depth"
[rules.params]
resource_dirs = {dirs}
max_depth = 3
"#,
                dirs = toml_dirs()
            )
            .trim()
            .to_string(),
        }
    }

    /// Only the cycle rule.
    pub fn cycles_only() -> Self {
        Self {
            name: "cycles_only".to_string(),
            content: format!(
                r#"
[[rules]]
description = "No circular dependencies"
type = "core:circular_dependencies"
[rules.params]
resource_dirs = {dirs}
"#,
                dirs = toml_dirs()
            )
            .trim()
            .to_string(),
        }
    }

    /// A custom rule type with no provider.
    pub fn missing_provider() -> Self {
        Self {
            name: "missing_provider".to_string(),
            content: r#"
[[rules]]
description = "Naming conventions"
type = "acme:naming"
"#
            .trim()
            .to_string(),
        }
    }

    /// Broken TOML.
    pub fn invalid_syntax() -> Self {
        Self {
            name: "invalid_syntax".to_string(),
            content: "[[rules]\ntype = \"core:file_exists\"".to_string(),
        }
    }

    /// Write this fixture as the project's `.drift.toml`.
    pub fn write_to(&self, project: &TestProject) -> Result<PathBuf> {
        project.write_config(&self.content)
    }
}

fn toml_dirs() -> String {
    let quoted: Vec<String> = RESOURCE_DIRS.iter().map(|d| format!("\"{d}\"")).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriftConfig;

    #[test]
    fn test_fixtures_parse() {
        let project = TestProject::new().unwrap();
        for fixture in [
            ConfigFixture::graph_rules(true),
            ConfigFixture::cycles_only(),
            ConfigFixture::missing_provider(),
        ] {
            fixture.write_to(&project).unwrap();
            assert!(
                DriftConfig::load_for_project(project.path(), None).is_ok(),
                "fixture {} should parse",
                fixture.name
            );
        }

        ConfigFixture::invalid_syntax().write_to(&project).unwrap();
        assert!(DriftConfig::load_for_project(project.path(), None).is_err());
    }

    #[test]
    fn test_project_bundles() {
        let project = TestProject::new().unwrap();
        project.add_skill("a", &["b"]).unwrap();
        project.add_skill_dir("b", &[]).unwrap();
        project.add_command("deploy", &["a"]).unwrap();
        project.add_agent("reviewer", &[]).unwrap();

        let bundles = project.bundles().unwrap();
        assert_eq!(bundles.len(), 4);
        let (bundle, _) = project.bundle("deploy").unwrap();
        assert_eq!(bundle.files.len(), 1);
    }
}
