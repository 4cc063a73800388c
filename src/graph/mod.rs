//! Dependency graph over declaratively-linked resources.
//!
//! The graph is rebuilt for every validator invocation from a fresh directory scan plus the
//! caller-supplied bundles (see [`builder`]). Once built it is never mutated, so the analyses in
//! [`cycles`], [`redundancy`] and [`depth`] are pure functions over it.
//!
//! # Representation
//!
//! Nodes live in a `petgraph` arena and are addressed by [`NodeIndex`]. A string index maps
//! resource ids to nodes. The data graph may contain cycles, but ownership never does: nodes hold
//! no references to each other.
//!
//! A dependency on an id that no scanned resource declares is still an edge. Its target is a
//! dangling node with no [`Resource`] attached, which every analysis treats as a leaf.
//!
//! Edge weights record declaration order, so traversals visit dependencies in the order the
//! frontmatter lists them and every analysis is deterministic.

pub mod builder;
pub mod cycles;
pub mod depth;
pub mod redundancy;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::bundle::DocumentBundle;
use crate::constants::PATH_SEPARATOR;
use crate::core::ResourceType;

pub use builder::build_graph;

/// A resource parsed from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// Resource id: frontmatter `name`, else file stem or skill directory name
    pub id: String,
    /// Resource type, from the directory it was found in
    pub resource_type: ResourceType,
    /// File the resource was parsed from
    pub file_path: PathBuf,
    /// Dependency ids in declaration order
    pub declared_dependencies: Vec<String>,
}

/// A node in the arena: either a parsed resource or an id that nothing declares.
#[derive(Debug, Clone)]
enum GraphNode {
    Resource(Resource),
    Dangling(String),
}

impl GraphNode {
    fn id(&self) -> &str {
        match self {
            GraphNode::Resource(resource) => &resource.id,
            GraphNode::Dangling(id) => id,
        }
    }
}

/// Immutable id → resource graph.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, usize>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build a graph from parsed resources.
    ///
    /// Ids are unique within a graph: when two resources share an id, the first one wins and the
    /// later one is logged and ignored. Repeated dependency ids collapse into one edge.
    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();
        let mut order = Vec::new();

        for resource in resources {
            if let Some(&existing) = node_map.get(&resource.id) {
                if let GraphNode::Resource(kept) = &graph[existing] {
                    tracing::warn!(
                        "Duplicate resource id '{}' in '{}'; keeping '{}'",
                        resource.id,
                        resource.file_path.display(),
                        kept.file_path.display()
                    );
                }
                continue;
            }
            let id = resource.id.clone();
            let index = graph.add_node(GraphNode::Resource(resource));
            node_map.insert(id, index);
            order.push(index);
        }

        for from in order {
            let dependencies = match &graph[from] {
                GraphNode::Resource(resource) => resource.declared_dependencies.clone(),
                GraphNode::Dangling(_) => continue,
            };
            for (position, dependency) in dependencies.into_iter().enumerate() {
                let to = match node_map.get(&dependency) {
                    Some(&index) => index,
                    None => {
                        let index = graph.add_node(GraphNode::Dangling(dependency.clone()));
                        node_map.insert(dependency, index);
                        index
                    }
                };
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, position);
                }
            }
        }

        Self { graph, node_map }
    }

    /// Number of parsed resources (dangling ids excluded).
    pub fn resource_count(&self) -> usize {
        self.graph.node_weights().filter(|n| matches!(n, GraphNode::Resource(_))).count()
    }

    /// Look up a node by id. Dangling ids have nodes too.
    pub fn node(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// The resource parsed for `id`, if any.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.node(id).and_then(|index| self.resource_at(index))
    }

    /// The resource at a node, or `None` for dangling nodes.
    pub fn resource_at(&self, index: NodeIndex) -> Option<&Resource> {
        match &self.graph[index] {
            GraphNode::Resource(resource) => Some(resource),
            GraphNode::Dangling(_) => None,
        }
    }

    /// Id of the node.
    pub fn id(&self, index: NodeIndex) -> &str {
        self.graph[index].id()
    }

    /// Direct dependencies of a node, in declaration order.
    pub fn dependencies(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        edges.sort_by_key(|(position, _)| *position);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Whether the whole graph is free of cycles.
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Render a node path as `a → b → c`.
    pub fn render_path(&self, path: &[NodeIndex]) -> String {
        path.iter().map(|&index| self.id(index)).collect::<Vec<_>>().join(PATH_SEPARATOR)
    }

    /// Nodes a bundle should be analyzed from.
    ///
    /// Every bundle file that was parsed into the graph is a target, in bundle file order. A
    /// bundle whose files are not in the graph falls back to the node named by its bundle id.
    pub fn targets_for(&self, bundle: &DocumentBundle) -> Vec<NodeIndex> {
        let mut targets: Vec<NodeIndex> = Vec::new();
        for file in &bundle.files {
            let path = if file.file_path.is_absolute() {
                file.file_path.clone()
            } else {
                bundle.project_path.join(&file.file_path)
            };
            let found = self.graph.node_indices().find(|&index| {
                self.resource_at(index).is_some_and(|r| r.file_path == path || r.file_path == file.file_path)
            });
            if let Some(index) = found
                && !targets.contains(&index)
            {
                targets.push(index);
            }
        }

        if targets.is_empty()
            && let Some(index) = self.node(&bundle.bundle_id)
            && self.resource_at(index).is_some()
        {
            targets.push(index);
        }

        targets
    }

    /// File path to report for a node: its own file, or `fallback` for dangling nodes.
    pub fn file_of(&self, index: NodeIndex, fallback: &str) -> String {
        self.resource_at(index)
            .map(|r| r.file_path.display().to_string())
            .unwrap_or_else(|| fallback.to_string())
    }
}
