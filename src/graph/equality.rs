//! Deep structural graph comparison
//!
//! Walks two graphs from their roots in lock-step, comparing package
//! identity and node metadata pairwise. Children are paired positionally
//! after sorting by canonical package id, which makes the comparison
//! tolerant of node-id relabeling and raw edge-order differences. Same-
//! package siblings are assumed interchangeable, so this is deliberately
//! weaker than graph isomorphism: divergent same-package siblings can be
//! paired against the wrong counterpart.
//!
//! Visited node-id pairs are remembered and skipped on repetition, which
//! bounds the cost on cyclic graphs and prevents unbounded traversal.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use super::store::DepGraph;

/// Options for [`DepGraph::equals`].
#[derive(Debug, Clone, Copy)]
pub struct EqualsOptions {
    /// Compare the root nodes' package and metadata too. On by default;
    /// disable to compare two scans of the same tree taken under different
    /// project names.
    pub compare_root: bool,
}

impl Default for EqualsOptions {
    fn default() -> Self {
        Self { compare_root: true }
    }
}

impl DepGraph {
    /// Deep structural equality against `other`.
    pub fn equals(&self, other: &DepGraph, options: EqualsOptions) -> bool {
        let root_a = match self.node_index(&self.root_node_id) {
            Ok(idx) => idx,
            Err(_) => return false,
        };
        let root_b = match other.node_index(&other.root_node_id) {
            Ok(idx) => idx,
            Err(_) => return false,
        };

        let mut traversed: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        let mut stack = vec![(root_a, root_b)];

        while let Some((a, b)) = stack.pop() {
            let node_a = self.node(a);
            let node_b = other.node(b);

            // Skip the node-data comparison only for root nodes when asked.
            if options.compare_root || (a != root_a && b != root_b) {
                if self.node_pkg_info(a) != other.node_pkg_info(b) {
                    return false;
                }
                if node_a.info != node_b.info {
                    return false;
                }
            }

            if node_a.deps.len() != node_b.deps.len() {
                return false;
            }

            let sorted_a = self.deps_sorted_by_pkg_id(a);
            let sorted_b = other.deps_sorted_by_pkg_id(b);

            for (&child_a, &child_b) in sorted_a.iter().zip(sorted_b.iter()) {
                if traversed.insert((child_a, child_b)) {
                    stack.push((child_a, child_b));
                }
            }
        }

        true
    }

    fn deps_sorted_by_pkg_id(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut keyed: Vec<(String, NodeIndex)> = self
            .node(idx)
            .deps
            .iter()
            .map(|&dep| (self.node_pkg_info(dep).id(), dep))
            .collect();
        keyed.sort_by(|(id_a, _), (id_b, _)| id_a.cmp(id_b));
        keyed.into_iter().map(|(_, dep)| dep).collect()
    }
}

impl PartialEq for DepGraph {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, EqualsOptions::default())
    }
}
