//! Builds a [`DependencyGraph`] from resource directories and in-memory bundles.
//!
//! Each directory's resource type comes from its name (`skills`, `commands`, `agents`). Files are
//! matched against the type's layout; anything else in the directory is ignored. Files that
//! cannot be read are excluded with a warning, and files whose frontmatter cannot be parsed still
//! become resources, just without dependencies.
//!
//! Bundle content wins over disk content for the same file, so a validator sees what the caller
//! handed it even if the file changed on disk since.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{DependencyGraph, Resource};
use crate::bundle::DocumentBundle;
use crate::core::ResourceType;
use crate::markdown::parse_resource_header;

/// A file matched to a resource directory, waiting to be parsed.
struct Candidate {
    resource_type: ResourceType,
    fallback_id: String,
    content: Option<String>,
}

/// Resource directories resolved against a project root.
struct ResourceDir {
    path: PathBuf,
    resource_type: ResourceType,
}

/// Build the dependency graph for one validator invocation.
///
/// `resource_dirs` are resolved against `project_root`. `bundles` contribute their files when
/// those files match a resource layout under one of the directories.
pub fn build_graph(project_root: &Path, resource_dirs: &[String], bundles: &[DocumentBundle]) -> DependencyGraph {
    let dirs: Vec<ResourceDir> = resource_dirs
        .iter()
        .filter_map(|dir| {
            let path = project_root.join(dir);
            match ResourceType::from_directory(&path) {
                Some(resource_type) => Some(ResourceDir { path, resource_type }),
                None => {
                    tracing::warn!("Skipping resource directory '{}': unknown resource type", dir);
                    None
                }
            }
        })
        .collect();

    let mut order: Vec<PathBuf> = Vec::new();
    let mut candidates: HashMap<PathBuf, Candidate> = HashMap::new();

    for dir in &dirs {
        scan_directory(dir, &mut order, &mut candidates);
    }

    for bundle in bundles {
        for file in &bundle.files {
            let path = if file.file_path.is_absolute() {
                file.file_path.clone()
            } else {
                bundle.project_path.join(&file.file_path)
            };
            let Some((resource_type, fallback_id)) = classify(&dirs, &path) else {
                continue;
            };
            match candidates.get_mut(&path) {
                Some(candidate) => candidate.content = Some(file.content.clone()),
                None => {
                    order.push(path.clone());
                    candidates.insert(
                        path,
                        Candidate {
                            resource_type,
                            fallback_id,
                            content: Some(file.content.clone()),
                        },
                    );
                }
            }
        }
    }

    let resources = order.into_iter().filter_map(|path| {
        let candidate = candidates.remove(&path)?;
        let content = candidate.content?;
        let header = parse_resource_header(&content, &path);
        Some(Resource {
            id: header.name.unwrap_or(candidate.fallback_id),
            resource_type: candidate.resource_type,
            file_path: path,
            declared_dependencies: header.dependencies,
        })
    });

    let graph = DependencyGraph::from_resources(resources);
    tracing::debug!(
        "Built dependency graph with {} resources from {} directories",
        graph.resource_count(),
        dirs.len()
    );
    graph
}

/// Find the directory and layout a path belongs to.
fn classify(dirs: &[ResourceDir], path: &Path) -> Option<(ResourceType, String)> {
    dirs.iter().find_map(|dir| {
        dir.resource_type.fallback_id(&dir.path, path).map(|id| (dir.resource_type, id))
    })
}

fn scan_directory(dir: &ResourceDir, order: &mut Vec<PathBuf>, candidates: &mut HashMap<PathBuf, Candidate>) {
    if !dir.path.is_dir() {
        tracing::debug!("Resource directory '{}' does not exist", dir.path.display());
        return;
    }

    for entry in WalkDir::new(&dir.path).min_depth(1).max_depth(2).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error while scanning '{}': {}", dir.path.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(fallback_id) = dir.resource_type.fallback_id(&dir.path, path) else {
            continue;
        };
        if candidates.contains_key(path) {
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!("Excluding unreadable resource '{}': {}", path.display(), e);
                None
            }
        };

        order.push(path.to_path_buf());
        candidates.insert(
            path.to_path_buf(),
            Candidate {
                resource_type: dir.resource_type,
                fallback_id,
                content,
            },
        );
    }
}
