//! Exact inverse of [`crate::cycles::cut_cycles`]
//!
//! Parses the `removed-cyclic-deps` tokens off every node that carries
//! them, strips the label, and re-inserts each recorded edge at its original
//! ordinal position. For any graph G, reconnecting the cut of G yields a
//! graph structurally and label-wise identical to G.

use std::collections::HashMap;

use tracing::debug;

use crate::constants::cycles::EDGE_TOKEN_DELIMITER;
use crate::constants::labels::REMOVED_CYCLIC_DEPS;
use crate::error::{Result, ValidationError};
use crate::graph::{DepGraph, DepGraphBuilder, NodeInfo};
use crate::spinner::TraversalSpinner;

/// Restore every edge removed by [`crate::cycles::cut_cycles`].
pub fn reconnect_cycles(dep_graph: &DepGraph) -> Result<DepGraph> {
    let root_id = dep_graph.root_node_id();
    let mut builder = DepGraphBuilder::with_root_node_id(
        dep_graph.pkg_manager().clone(),
        Some(dep_graph.root_pkg().clone()),
        root_id,
    );
    builder.set_root_node_info(dep_graph.get_node(root_id)?.cloned());

    let mut spinner = TraversalSpinner::new();
    let mut to_reconnect: HashMap<&str, Vec<(usize, String)>> = HashMap::new();

    for idx in dep_graph.node_iter() {
        let node = dep_graph.node(idx);
        if node.node_id == root_id {
            continue;
        }

        let mut info = node.info.clone();
        if let Some(inner) = info.as_mut()
            && let Some(labels) = inner.labels.as_mut()
            && let Some(tokens) = labels.remove(REMOVED_CYCLIC_DEPS)
        {
            let parsed = tokens
                .split(',')
                .map(parse_edge_token)
                .collect::<Result<Vec<_>>>()?;
            to_reconnect.insert(node.node_id.as_str(), parsed);
        }

        builder.add_pkg_node(
            dep_graph.node_pkg_info(idx).clone(),
            &node.node_id,
            NodeInfo::normalized(info),
        )?;

        if spinner.is_starving() {
            spinner.spin();
        }
    }
    debug!(sources = to_reconnect.len(), "re-inserting removed edges");

    // Splice the recorded edges back into the surviving ordered lists.
    let mut edges: HashMap<&str, Vec<String>> = HashMap::new();
    for idx in dep_graph.node_iter() {
        let node = dep_graph.node(idx);
        let deps: Vec<String> = node
            .deps
            .iter()
            .map(|&dep| dep_graph.node(dep).node_id.clone())
            .collect();
        edges.insert(node.node_id.as_str(), deps);

        if spinner.is_starving() {
            spinner.spin();
        }
    }
    for (from, mut tokens) in to_reconnect {
        // ascending original ordinals restore the original relative order
        tokens.sort_by_key(|(ordinal, _)| *ordinal);
        let deps = edges.entry(from).or_default();
        for (ordinal, target) in tokens {
            deps.insert(ordinal.min(deps.len()), target);
        }

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

/// Parse one `<ordinal>@@<targetNodeId>` token.
///
/// Splits on the first delimiter only: target node ids routinely embed `@`
/// (they contain pkg ids) and may themselves contain the delimiter.
fn parse_edge_token(token: &str) -> Result<(usize, String)> {
    let (ordinal, target) = token
        .split_once(EDGE_TOKEN_DELIMITER)
        .ok_or_else(|| {
            ValidationError::new(format!("malformed removed-cyclic-deps token: {token}"))
        })?;
    let ordinal = ordinal.parse::<usize>().map_err(|_| {
        ValidationError::new(format!("malformed removed-cyclic-deps ordinal: {token}"))
    })?;
    Ok((ordinal, target.to_string()))
}
