//! Changed-packages subgraph
//!
//! Builds the induced subgraph of a newer scan containing only the packages
//! that are new or version-changed relative to an older scan, plus every
//! path from those nodes up to the root. Security tooling diffs two
//! snapshots this way to scope analysis to what actually changed.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::graph::{DepGraph, DepGraphBuilder, PkgInfo};
use crate::spinner::TraversalSpinner;

/// Induced subgraph of `graph_b` with only the packages that are not
/// present in `graph_a` (or carry a different version there), connected to
/// the root of `graph_b` through all of their original parents.
pub fn create_changed_packages_graph(
    graph_a: &DepGraph,
    graph_b: &DepGraph,
) -> Result<DepGraph> {
    let pkg_ids_in_a: HashSet<String> = graph_a
        .get_dep_pkgs()
        .iter()
        .map(|pkg| pkg.id())
        .collect();
    let changed: Vec<&PkgInfo> = graph_b
        .get_dep_pkgs()
        .into_iter()
        .filter(|pkg| !pkg_ids_in_a.contains(&pkg.id()))
        .collect();
    debug!(changed = changed.len(), "building changed-packages subgraph");

    let root_id = graph_b.root_node_id();
    let mut builder = DepGraphBuilder::with_root_node_id(
        graph_b.pkg_manager().clone(),
        Some(graph_b.root_pkg().clone()),
        root_id,
    );
    builder.set_root_node_info(graph_b.get_node(root_id)?.cloned());

    let mut spinner = TraversalSpinner::new();

    // every node instance of a changed package enters the subgraph; its
    // parents queue up to be linked back to the root
    let mut parent_queue: Vec<(&str, &str)> = Vec::new();
    for pkg in &changed {
        for node_id in graph_b.get_pkg_node_ids(&pkg.pkg())? {
            builder.add_pkg_node(
                graph_b.get_node_pkg(node_id)?.clone(),
                node_id,
                graph_b.get_node(node_id)?.cloned(),
            )?;
            for parent_id in graph_b.get_node_parents_node_ids(node_id)? {
                parent_queue.push((parent_id, node_id));

                if spinner.is_starving() {
                    spinner.spin();
                }
            }
        }
    }

    // walk parents transitively; re-link even when a parent was already
    // visited through another path
    let mut visited: HashSet<&str> = HashSet::from([root_id]);
    while let Some((node_id, dep_node_id)) = parent_queue.pop() {
        if !visited.insert(node_id) {
            builder.connect_dep(node_id, dep_node_id)?;
            continue;
        }

        builder.add_pkg_node(
            graph_b.get_node_pkg(node_id)?.clone(),
            node_id,
            graph_b.get_node(node_id)?.cloned(),
        )?;
        builder.connect_dep(node_id, dep_node_id)?;

        for parent_id in graph_b.get_node_parents_node_ids(node_id)? {
            parent_queue.push((parent_id, node_id));

            if spinner.is_starving() {
                spinner.spin();
            }
        }
    }

    Ok(builder.build())
}
