//! Transitive redundancy detection.
//!
//! A resource that declares both `A` and `D`, where `A` already depends on `D` (directly or
//! further down), declares `D` redundantly. Only the resource's own direct dependencies are
//! examined; redundancy deeper in the graph belongs to the resources that declare it.

use petgraph::graph::NodeIndex;
use std::collections::HashSet;

use super::DependencyGraph;

/// A direct dependency already provided by another direct dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redundancy {
    /// The redundantly declared dependency
    pub duplicate: NodeIndex,
    /// The first sibling dependency, in declaration order, that reaches it
    pub declared_by: NodeIndex,
}

/// Nodes reachable from `start` through at least one edge.
pub fn transitive_closure(graph: &DependencyGraph, start: NodeIndex) -> HashSet<NodeIndex> {
    let mut reached = HashSet::new();
    let mut stack = graph.dependencies(start);
    while let Some(node) = stack.pop() {
        if reached.insert(node) {
            stack.extend(graph.dependencies(node));
        }
    }
    reached
}

/// Find redundantly declared dependencies of `target`, in declaration order.
pub fn find_redundant_dependencies(graph: &DependencyGraph, target: NodeIndex) -> Vec<Redundancy> {
    let direct = graph.dependencies(target);
    let closures: Vec<(NodeIndex, HashSet<NodeIndex>)> =
        direct.iter().map(|&dep| (dep, transitive_closure(graph, dep))).collect();

    direct
        .iter()
        .filter_map(|&candidate| {
            closures
                .iter()
                .find(|(provider, closure)| *provider != candidate && closure.contains(&candidate))
                .map(|(provider, _)| Redundancy {
                    duplicate: candidate,
                    declared_by: *provider,
                })
        })
        .collect()
}
