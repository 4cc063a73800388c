//! Dependency depth: the edge count of the longest simple path starting at a resource.
//!
//! When the graph is acyclic the longest chain is computed once per node with memoization. When
//! it is not, simple paths are enumerated exhaustively, skipping nodes already on the current
//! path; resource graphs are small enough for this to stay cheap.
//!
//! Dangling dependencies are leaves: an edge to one counts toward the depth, and the path ends
//! there.

use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};

use super::DependencyGraph;

/// Depth of a resource together with the chain that realizes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthReport {
    /// Edge count of the longest chain
    pub depth: usize,
    /// Nodes along the longest chain, starting at the measured resource
    pub chain: Vec<NodeIndex>,
}

/// Measure the depth of `start`.
///
/// Ties between equally long branches go to the dependency declared first.
pub fn longest_chain(graph: &DependencyGraph, start: NodeIndex) -> DepthReport {
    let chain = if graph.is_acyclic() {
        let mut memo = HashMap::new();
        longest_acyclic(graph, start, &mut memo)
    } else {
        let mut on_path = HashSet::new();
        longest_simple(graph, start, &mut on_path)
    };

    DepthReport {
        depth: chain.len() - 1,
        chain,
    }
}

fn longest_acyclic(
    graph: &DependencyGraph,
    node: NodeIndex,
    memo: &mut HashMap<NodeIndex, Vec<NodeIndex>>,
) -> Vec<NodeIndex> {
    if let Some(chain) = memo.get(&node) {
        return chain.clone();
    }

    let mut best: Vec<NodeIndex> = Vec::new();
    for dependency in graph.dependencies(node) {
        let chain = longest_acyclic(graph, dependency, memo);
        if chain.len() > best.len() {
            best = chain;
        }
    }

    let mut chain = Vec::with_capacity(best.len() + 1);
    chain.push(node);
    chain.extend(best);
    memo.insert(node, chain.clone());
    chain
}

fn longest_simple(graph: &DependencyGraph, node: NodeIndex, on_path: &mut HashSet<NodeIndex>) -> Vec<NodeIndex> {
    on_path.insert(node);

    let mut best: Vec<NodeIndex> = Vec::new();
    for dependency in graph.dependencies(node) {
        if on_path.contains(&dependency) {
            continue;
        }
        let chain = longest_simple(graph, dependency, on_path);
        if chain.len() > best.len() {
            best = chain;
        }
    }

    on_path.remove(&node);

    let mut chain = Vec::with_capacity(best.len() + 1);
    chain.push(node);
    chain.extend(best);
    chain
}
