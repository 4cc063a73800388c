//! Built-in validators, registered under the `core` namespace.
//!
//! - `core:circular_dependencies` - [`CircularDependencyValidator`]
//! - `core:dependency_duplicate` - [`DependencyDuplicateValidator`]
//! - `core:max_dependency_depth` - [`MaxDependencyDepthValidator`]
//! - `core:file_exists` - [`FileExistsValidator`]
//! - `core:max_file_size` - [`FileSizeValidator`]
//!
//! The three graph validators share [`GraphScope`]: they rebuild the dependency graph from the
//! rule's `resource_dirs` and the project's bundles on every call, then analyze it from the
//! resources in the target bundle.

pub mod circular;
pub mod depth;
pub mod duplicate;
pub mod file_exists;
pub mod file_size;

use anyhow::Result;
use petgraph::graph::NodeIndex;

use crate::bundle::DocumentBundle;
use crate::graph::{DependencyGraph, build_graph};
use crate::rules::ValidationRule;

pub use circular::CircularDependencyValidator;
pub use depth::MaxDependencyDepthValidator;
pub use duplicate::DependencyDuplicateValidator;
pub use file_exists::FileExistsValidator;
pub use file_size::FileSizeValidator;

/// The graph and the nodes a graph validator should analyze for one bundle.
pub(crate) struct GraphScope {
    pub graph: DependencyGraph,
    pub targets: Vec<NodeIndex>,
}

impl GraphScope {
    /// Build the scope for `bundle`.
    ///
    /// Fails if the rule has no usable `resource_dirs`, before touching the filesystem. Returns
    /// `Ok(None)` without `all_bundles`: a single bundle cannot describe a graph.
    pub fn build(
        rule: &ValidationRule,
        bundle: &DocumentBundle,
        all_bundles: Option<&[DocumentBundle]>,
    ) -> Result<Option<Self>> {
        let resource_dirs = rule.resource_dirs()?;
        let Some(all_bundles) = all_bundles else {
            tracing::debug!(
                "Skipping '{}' for bundle '{}': no project bundles supplied",
                rule.rule_type,
                bundle.bundle_id
            );
            return Ok(None);
        };

        let mut bundles: Vec<DocumentBundle> = all_bundles.to_vec();
        if !bundles.iter().any(|b| b.bundle_id == bundle.bundle_id && b.files == bundle.files) {
            bundles.push(bundle.clone());
        }

        let graph = build_graph(&bundle.project_path, &resource_dirs, &bundles);
        let targets = graph.targets_for(bundle);
        if targets.is_empty() {
            tracing::debug!("Bundle '{}' has no resources in the dependency graph", bundle.bundle_id);
        }
        Ok(Some(Self { graph, targets }))
    }

    /// Reported file for a target node.
    pub fn target_file(&self, target: NodeIndex, bundle: &DocumentBundle) -> String {
        let fallback = bundle.file_paths().into_iter().next().unwrap_or_default();
        self.graph.file_of(target, &fallback)
    }
}

/// Collect distinct strings, keeping first-seen order.
pub(crate) fn dedup_in_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
