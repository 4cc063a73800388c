//! Document bundles: the unit a rule is evaluated against.
//!
//! A bundle groups the files of one resource. Commands and agents are single files; a
//! directory-style skill bundles `SKILL.md` together with every other file in its directory.
//! Bundles are read-only input to validators. The full set of project bundles is passed
//! alongside the target bundle so graph validators can see "the rest of the graph".

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::SKILL_FILE_NAME;
use crate::core::ResourceType;
use crate::markdown::parse_resource_header;

/// One file inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleFile {
    /// Path relative to the bundle's resource directory
    pub relative_path: String,
    /// File content as read at discovery time
    pub content: String,
    /// Absolute (or project-rooted) path to the file on disk
    pub file_path: PathBuf,
}

/// A group of files validated as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentBundle {
    /// Bundle identifier, normally the resource id
    pub bundle_id: String,
    /// Resource type of the bundle
    pub bundle_type: ResourceType,
    /// Files in the bundle; the resource's main file comes first
    pub files: Vec<BundleFile>,
    /// Project root the bundle was discovered under
    pub project_path: PathBuf,
}

impl DocumentBundle {
    /// Paths of every file in the bundle, as strings.
    pub fn file_paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.file_path.display().to_string()).collect()
    }
}

/// Discover one bundle per resource under the given resource directories.
///
/// Directories are resolved against `project_root` and their resource type is inferred from the
/// directory name. Unknown or missing directories are skipped. Bundles are returned sorted by
/// type and then by main file path, so discovery is deterministic.
pub fn discover_bundles(project_root: &Path, resource_dirs: &[String]) -> Result<Vec<DocumentBundle>> {
    let mut bundles: BTreeMap<(ResourceType, PathBuf), DocumentBundle> = BTreeMap::new();

    for dir in resource_dirs {
        let dir_path = project_root.join(dir);
        let Some(resource_type) = ResourceType::from_directory(&dir_path) else {
            tracing::warn!("Skipping '{}': cannot infer resource type from directory name", dir);
            continue;
        };
        if !dir_path.is_dir() {
            tracing::debug!("Resource directory '{}' does not exist", dir_path.display());
            continue;
        }

        for entry in WalkDir::new(&dir_path)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
        {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(fallback_id) = resource_type.fallback_id(&dir_path, path) else {
                continue;
            };

            let key = (resource_type, path.to_path_buf());
            if bundles.contains_key(&key) {
                continue;
            }

            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping unreadable resource '{}': {}", path.display(), e);
                    continue;
                }
            };
            let bundle_id = parse_resource_header(&content, path).name.unwrap_or(fallback_id);

            let mut files = vec![BundleFile {
                relative_path: relative_to(&dir_path, path),
                content,
                file_path: path.to_path_buf(),
            }];

            let is_skill_dir = path.file_name().is_some_and(|name| name == SKILL_FILE_NAME);
            if is_skill_dir && let Some(skill_dir) = path.parent() {
                files.extend(read_supporting_files(&dir_path, skill_dir, path)?);
            }

            bundles.insert(
                key,
                DocumentBundle {
                    bundle_id,
                    bundle_type: resource_type,
                    files,
                    project_path: project_root.to_path_buf(),
                },
            );
        }
    }

    Ok(bundles.into_values().collect())
}

/// Read every other file of a directory-style skill.
fn read_supporting_files(dir_path: &Path, skill_dir: &Path, main_file: &Path) -> Result<Vec<BundleFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(skill_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk skill directory {}", skill_dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path == main_file {
            continue;
        }
        // Supporting files may be binary; only text files become bundle content.
        match std::fs::read_to_string(path) {
            Ok(content) => files.push(BundleFile {
                relative_path: relative_to(dir_path, path),
                content,
                file_path: path.to_path_buf(),
            }),
            Err(e) => tracing::debug!("Not bundling '{}': {}", path.display(), e),
        }
    }
    Ok(files)
}

fn relative_to(base: &Path, path: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).to_string_lossy().replace('\\', "/")
}
