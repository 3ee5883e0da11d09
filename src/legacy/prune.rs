//! Lossy acyclic projection of a cyclic graph
//!
//! Unlike [`crate::cycles::cut_cycles`], which records enough to undo
//! itself, this projection is one-way: every edge that would close a cycle
//! is redirected to a childless duplicate of its target (the target's node
//! id plus a `_pruned` suffix, labeled `pruned: "cyclic"`). Consumers that
//! choke on cycles get a graph of the same packages with every path intact
//! up to the first repetition.

use std::collections::{BTreeMap, HashSet};

use petgraph::graph::NodeIndex;

use crate::constants::cycles::PRUNED_NODE_SUFFIX;
use crate::constants::labels::{PRUNED, PRUNED_CYCLIC};
use crate::error::Result;
use crate::graph::{DepGraph, DepGraphBuilder};
use crate::spinner::TraversalSpinner;

struct Frame {
    idx: NodeIndex,
    next: usize,
}

/// Produce an acyclic graph by pruning re-entered nodes.
///
/// A graph without cycles is returned unchanged.
pub fn map_to_non_cyclic_graph(dep_graph: &DepGraph) -> Result<DepGraph> {
    if !dep_graph.has_cycles() {
        return Ok(dep_graph.clone());
    }

    let root_id = dep_graph.root_node_id();
    let mut builder = DepGraphBuilder::with_root_node_id(
        dep_graph.pkg_manager().clone(),
        Some(dep_graph.root_pkg().clone()),
        root_id,
    );
    builder.set_root_node_info(dep_graph.get_node(root_id)?.cloned());

    let mut spinner = TraversalSpinner::new();
    let root_idx = dep_graph.node_index(root_id)?;
    let mut stack = vec![Frame {
        idx: root_idx,
        next: 0,
    }];
    let mut on_path: HashSet<NodeIndex> = HashSet::from([root_idx]);
    let mut expanded: HashSet<NodeIndex> = HashSet::new();

    while !stack.is_empty() {
        let top = stack.len() - 1;
        let idx = stack[top].idx;
        let next = stack[top].next;
        let deps = &dep_graph.node(idx).deps;

        if next < deps.len() {
            stack[top].next += 1;
            let child = deps[next];
            let parent_id = dep_graph.node(idx).node_id.as_str();
            let child_node = dep_graph.node(child);

            if on_path.contains(&child) {
                // the edge would close a cycle: point it at a pruned twin
                let pruned_id = format!("{}{}", child_node.node_id, PRUNED_NODE_SUFFIX);
                let mut info = child_node.info.clone().unwrap_or_default();
                info.labels
                    .get_or_insert_with(BTreeMap::new)
                    .insert(PRUNED.to_string(), PRUNED_CYCLIC.to_string());
                builder.add_pkg_node(
                    dep_graph.node_pkg_info(child).clone(),
                    &pruned_id,
                    Some(info),
                )?;
                builder.connect_dep(parent_id, &pruned_id)?;
                continue;
            }

            builder.add_pkg_node(
                dep_graph.node_pkg_info(child).clone(),
                &child_node.node_id,
                child_node.info.clone(),
            )?;
            builder.connect_dep(parent_id, &child_node.node_id)?;

            if expanded.contains(&child) {
                // already expanded elsewhere; the edge is enough
                continue;
            }
            on_path.insert(child);
            stack.push(Frame {
                idx: child,
                next: 0,
            });
        } else {
            let Some(frame) = stack.pop() else { break };
            on_path.remove(&frame.idx);
            expanded.insert(frame.idx);

            if spinner.is_starving() {
                spinner.spin();
            }
        }
    }

    Ok(builder.build())
}
