//! Reversible cycle removal
//!
//! Produces an acyclic view of a graph by removing a minimal,
//! order-recoverable set of edges. Every removal is encoded into the graph's
//! own data, as an `"<ordinal>@@<targetNodeId>"` token on the source node's
//! reserved `removed-cyclic-deps` label, so
//! [`crate::cycles::reconnect_cycles`] can restore the original exactly,
//! with no side channel.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::find::find_cycle;
use crate::constants::cycles::EDGE_TOKEN_DELIMITER;
use crate::constants::labels::REMOVED_CYCLIC_DEPS;
use crate::error::Result;
use crate::graph::{DepGraph, DepGraphBuilder};
use crate::spinner::TraversalSpinner;

/// Remove one closing edge per cycle until no cycle is reachable from the
/// root, recording each removal on its source node.
///
/// A graph that is already acyclic is returned unchanged.
pub fn cut_cycles(dep_graph: &DepGraph) -> Result<DepGraph> {
    if !dep_graph.has_cycles() {
        return Ok(dep_graph.clone());
    }

    // Mutable ordered-adjacency view; the immutable original keeps the
    // pre-removal ordinals.
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for idx in dep_graph.node_iter() {
        let node = dep_graph.node(idx);
        let deps: Vec<&str> = node
            .deps
            .iter()
            .map(|&dep| dep_graph.node(dep).node_id.as_str())
            .collect();
        edges.insert(node.node_id.as_str(), deps);
    }
    let original = edges.clone();

    let root_id = dep_graph.root_node_id();
    let mut removed: HashMap<&str, Vec<String>> = HashMap::new();
    let mut spinner = TraversalSpinner::new();

    while let Some(cycle) =
        find_cycle(root_id, |node| edges.get(node).into_iter().flatten().copied())
    {
        // the closing edge runs from the cycle's last node back to its first
        let from = *cycle.last().expect("a cycle has at least one node");
        let to = cycle[0];

        if let Some(deps) = edges.get_mut(from) {
            deps.retain(|dep| *dep != to);
        }
        let ordinal = original[from]
            .iter()
            .position(|dep| *dep == to)
            .expect("the closing edge exists in the pre-removal dep list");
        removed
            .entry(from)
            .or_default()
            .push(format!("{ordinal}{EDGE_TOKEN_DELIMITER}{to}"));

        if spinner.is_starving() {
            spinner.spin();
        }
    }
    debug!(
        sources = removed.len(),
        "removed every cycle-closing edge reachable from root"
    );

    let mut builder = DepGraphBuilder::with_root_node_id(
        dep_graph.pkg_manager().clone(),
        Some(dep_graph.root_pkg().clone()),
        root_id,
    );
    builder.set_root_node_info(dep_graph.get_node(root_id)?.cloned());

    for idx in dep_graph.node_iter() {
        let node = dep_graph.node(idx);
        if node.node_id == root_id {
            continue;
        }
        let mut info = node.info.clone();
        if let Some(tokens) = removed.get(node.node_id.as_str()) {
            let mut inner = info.unwrap_or_default();
            inner
                .labels
                .get_or_insert_with(BTreeMap::new)
                .insert(REMOVED_CYCLIC_DEPS.to_string(), tokens.join(","));
            info = Some(inner);
        }
        builder.add_pkg_node(dep_graph.node_pkg_info(idx).clone(), &node.node_id, info)?;

        if spinner.is_starving() {
            spinner.spin();
        }
    }

    for idx in dep_graph.node_iter() {
        let node_id = dep_graph.node(idx).node_id.as_str();
        for dep in &edges[node_id] {
            builder.connect_dep(node_id, dep)?;
        }
        if spinner.is_starving() {
            spinner.spin();
        }
    }

    Ok(builder.build())
}
