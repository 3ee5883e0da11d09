//! Removing packages or nodes from a graph
//!
//! Filtering rebuilds the graph from the root, skipping the filtered nodes
//! and, transitively, everything reachable only through them. Node order
//! within each dep list is preserved.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::graph::{DepGraph, DepGraphBuilder, Pkg, PkgInfo};
use crate::spinner::TraversalSpinner;

/// Selects packages to remove from a graph.
#[derive(Debug, Clone)]
pub enum PkgFilter {
    /// Every version of the named package.
    Name(String),
    /// One exact name+version identity.
    Exact(Pkg),
}

impl PkgFilter {
    fn matches(&self, pkg: &PkgInfo) -> bool {
        match self {
            Self::Name(name) => pkg.name == *name,
            Self::Exact(query) => pkg.name == query.name && pkg.version == query.version,
        }
    }
}

/// Remove every node of the matched packages (the root package cannot be
/// matched). An empty filter list returns the graph unchanged.
pub fn filter_packages_from_graph(
    dep_graph: &DepGraph,
    packages_to_filter_out: &[PkgFilter],
) -> Result<DepGraph> {
    if packages_to_filter_out.is_empty() {
        return Ok(dep_graph.clone());
    }

    let mut node_ids: Vec<String> = Vec::new();
    for pkg in dep_graph.get_dep_pkgs() {
        if packages_to_filter_out
            .iter()
            .any(|filter| filter.matches(pkg))
        {
            for node_id in dep_graph.get_pkg_node_ids(&pkg.pkg())? {
                node_ids.push(node_id.to_string());
            }
        }
    }

    let node_ids: Vec<&str> = node_ids.iter().map(String::as_str).collect();
    filter_nodes_from_graph(dep_graph, &node_ids)
}

/// Remove the listed nodes. Unknown node ids are ignored; an effectively
/// empty list returns the graph unchanged.
pub fn filter_nodes_from_graph(
    dep_graph: &DepGraph,
    node_ids_to_filter_out: &[&str],
) -> Result<DepGraph> {
    let filtered: HashSet<&str> = node_ids_to_filter_out
        .iter()
        .copied()
        .filter(|node_id| dep_graph.node_index(node_id).is_ok())
        .collect();
    if filtered.is_empty() {
        return Ok(dep_graph.clone());
    }
    debug!(nodes = filtered.len(), "filtering nodes out of the graph");

    let root_id = dep_graph.root_node_id();
    let mut builder = DepGraphBuilder::with_root_node_id(
        dep_graph.pkg_manager().clone(),
        Some(dep_graph.root_pkg().clone()),
        root_id,
    );
    builder.set_root_node_info(dep_graph.get_node(root_id)?.cloned());

    let mut spinner = TraversalSpinner::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<(&str, Option<&str>)> = vec![(root_id, None)];

    while let Some((node_id, parent_id)) = stack.pop() {
        if filtered.contains(node_id) {
            continue;
        }

        if let Some(parent_id) = parent_id {
            if !visited.contains(node_id) {
                builder.add_pkg_node(
                    dep_graph.get_node_pkg(node_id)?.clone(),
                    node_id,
                    dep_graph.get_node(node_id)?.cloned(),
                )?;
            }
            builder.connect_dep(parent_id, node_id)?;
        }

        if visited.insert(node_id) {
            let deps = dep_graph.get_node_deps_node_ids(node_id)?;
            for dep in deps.into_iter().rev() {
                stack.push((dep, Some(node_id)));
            }
        }

        if spinner.is_starving() {
            spinner.spin();
        }
    }

    Ok(builder.build())
}
