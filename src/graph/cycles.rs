//! Circular dependency detection.
//!
//! A backtracking depth-first search from the target walks every simple path, keeping only the
//! nodes of the current path marked. Reaching a node that is on the path closes a cycle: the
//! sub-path from that node back to itself. A node leaves the path when the search backs out of it,
//! so a later branch may enter it again and close a different cycle through it.
//!
//! Cycles are deduplicated up to rotation, so `a → b → a` and `b → a → b` count once.

use petgraph::graph::NodeIndex;
use std::collections::HashSet;

use super::DependencyGraph;

/// A closed dependency cycle; the first and last node are the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    /// Nodes along the cycle, closing node repeated at the end
    pub nodes: Vec<NodeIndex>,
}

impl Cycle {
    /// Whether the cycle passes through `node`.
    pub fn contains(&self, node: NodeIndex) -> bool {
        self.nodes.contains(&node)
    }

    /// The same cycle, rotated to start and end at `node` if it passes through it.
    pub fn starting_at(&self, node: NodeIndex) -> Cycle {
        let open = &self.nodes[..self.nodes.len() - 1];
        match open.iter().position(|&n| n == node) {
            Some(start) => {
                let mut nodes: Vec<NodeIndex> = open[start..].iter().chain(&open[..start]).copied().collect();
                nodes.push(node);
                Cycle { nodes }
            }
            None => self.clone(),
        }
    }

    /// Rotation-independent identity, used to report each cycle once.
    pub fn canonical_key(&self, graph: &DependencyGraph) -> Vec<String> {
        let open = &self.nodes[..self.nodes.len() - 1];
        let start = (0..open.len()).min_by_key(|&i| graph.id(open[i])).unwrap_or(0);
        open[start..].iter().chain(&open[..start]).map(|&n| graph.id(n).to_string()).collect()
    }
}

/// Find every distinct cycle reachable from `start`, in DFS discovery order.
///
/// Dependencies are explored in declaration order, so the result is deterministic for a given
/// graph. A self-referencing node yields a one-node cycle `[n, n]`.
pub fn find_cycles_from(graph: &DependencyGraph, start: NodeIndex) -> Vec<Cycle> {
    let mut search = CycleSearch {
        graph,
        on_path: HashSet::new(),
        path: Vec::new(),
        cycles: Vec::new(),
        seen: HashSet::new(),
    };
    search.visit(start);
    search.cycles
}

struct CycleSearch<'a> {
    graph: &'a DependencyGraph,
    on_path: HashSet<NodeIndex>,
    path: Vec<NodeIndex>,
    cycles: Vec<Cycle>,
    seen: HashSet<Vec<String>>,
}

impl CycleSearch<'_> {
    fn visit(&mut self, node: NodeIndex) {
        self.on_path.insert(node);
        self.path.push(node);

        for neighbor in self.graph.dependencies(node) {
            if self.on_path.contains(&neighbor) {
                self.close_cycle(neighbor);
            } else {
                self.visit(neighbor);
            }
        }

        self.path.pop();
        self.on_path.remove(&node);
    }

    fn close_cycle(&mut self, node: NodeIndex) {
        let Some(cycle_start) = self.path.iter().position(|&n| n == node) else {
            return;
        };
        let mut nodes = self.path[cycle_start..].to_vec();
        nodes.push(node);
        let cycle = Cycle { nodes };
        if self.seen.insert(cycle.canonical_key(self.graph)) {
            self.cycles.push(cycle);
        }
    }
}
