//! Legacy nested dependency-tree interchange
//!
//! Older scanning pipelines exchange dependencies as nested trees keyed by
//! package name. This module converts trees into graphs (assigning each
//! subtree a content-addressed node id so identical subtrees collapse onto
//! one node) and graphs back into trees. A graph is a strictly richer
//! structure, so the reverse direction either refuses cyclic input or, in
//! cycle-tolerant mode, truncates re-entered nodes into labeled leaves.

mod cache;
mod prune;

pub use prune::map_to_non_cyclic_graph;

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use cache::{Cycle, TraversalCache, partition_cycles};

use crate::constants::graph::DEFAULT_ROOT_PKG_NAME;
use crate::constants::labels::{PRUNED, PRUNED_CYCLIC};
use crate::error::{DepGraphError, Result};
use crate::graph::{DepGraph, DepGraphBuilder, NodeInfo, PkgInfo, PkgManager, Repository};
use crate::spinner::TraversalSpinner;

/// A nested dependency tree as produced by `npm list --json`-style tooling.
///
/// `name` and `version` shouldn't be missing, but might be.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepTree {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, DepTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(rename = "targetOS", skip_serializing_if = "Option::is_none")]
    pub target_os: Option<TargetOs>,
}

impl Drop for DepTree {
    fn drop(&mut self) {
        // flatten the teardown; dropping a deeply nested tree through the
        // derived glue would recurse once per level
        let mut stack: Vec<DepTree> =
            std::mem::take(&mut self.dependencies).into_values().collect();
        while let Some(mut tree) = stack.pop() {
            stack.extend(std::mem::take(&mut tree.dependencies).into_values());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOs {
    pub name: String,
    pub version: String,
}

/// Options for [`graph_to_dep_tree`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphToTreeOptions {
    /// Instead of failing on a cyclic graph, truncate each node that closes
    /// a cycle into a childless leaf labeled `pruned: "cyclic"`.
    pub prune_cycles: bool,
}

struct TreeFrame<'t> {
    /// `None` marks the root of the input tree.
    name: Option<&'t str>,
    tree: &'t DepTree,
    children: Vec<(&'t String, &'t DepTree)>,
    next: usize,
    child_node_ids: Vec<String>,
}

impl<'t> TreeFrame<'t> {
    fn new(name: Option<&'t str>, tree: &'t DepTree) -> Self {
        Self {
            name,
            tree,
            children: tree.dependencies.iter().collect(),
            next: 0,
            child_node_ids: Vec::new(),
        }
    }
}

/// Convert a nested dependency tree into a graph.
///
/// Node ids are `name@version|<hash>` where the hash covers the subtree's
/// child node ids, so identical subtrees share one node. Children are
/// processed in sorted name order; a `targetOS` record becomes a repository
/// alias on the package manager.
pub fn dep_tree_to_graph(dep_tree: &DepTree, pkg_manager_name: &str) -> Result<DepGraph> {
    let root_pkg = PkgInfo {
        name: dep_tree
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_ROOT_PKG_NAME.to_string()),
        version: dep_tree.version.clone(),
        purl: None,
    };

    let mut pkg_manager = PkgManager::new(pkg_manager_name);
    if let Some(target_os) = &dep_tree.target_os {
        pkg_manager.repositories = Some(vec![Repository {
            alias: format!("{}:{}", target_os.name, target_os.version),
        }]);
    }

    let mut builder = DepGraphBuilder::new(pkg_manager, Some(root_pkg));
    let mut spinner = TraversalSpinner::new();

    // postorder over an explicit stack: a node's id depends on its
    // children's ids
    let mut stack = vec![TreeFrame::new(None, dep_tree)];
    while let Some(top) = stack.last_mut() {
        if top.next < top.children.len() {
            let (child_name, child_tree) = top.children[top.next];
            top.next += 1;
            stack.push(TreeFrame::new(Some(child_name), child_tree));
            continue;
        }

        let Some(frame) = stack.pop() else { break };
        let mut hasher = Sha256::new();
        for child_id in &frame.child_node_ids {
            hasher.update(child_id.as_bytes());
        }
        let subtree_hash = hex_digest(hasher);

        let node_id = match frame.name {
            None => builder.root_node_id().to_string(),
            Some(name) => {
                let version = frame.tree.version.as_deref().unwrap_or("");
                let node_id = format!("{name}@{version}|{subtree_hash}");
                let pkg = PkgInfo {
                    name: name.to_string(),
                    version: frame.tree.version.clone(),
                    purl: None,
                };
                let info = frame.tree.labels.clone().map(NodeInfo::with_labels);
                builder.add_pkg_node(pkg, &node_id, NodeInfo::normalized(info))?;
                node_id
            }
        };

        for child_id in &frame.child_node_ids {
            builder.connect_dep(&node_id, child_id)?;
        }
        if !frame.child_node_ids.is_empty() && spinner.is_starving() {
            spinner.spin();
        }

        if let Some(parent) = stack.last_mut() {
            parent.child_node_ids.push(node_id);
        }
    }

    Ok(builder.build())
}

struct GraphFrame {
    idx: NodeIndex,
    next: usize,
    tree: DepTree,
    cycles: Vec<Cycle>,
}

/// Convert a graph into a nested dependency tree.
///
/// Fails with [`DepGraphError::UnsupportedCycle`] on cyclic input unless
/// cycle pruning is enabled. Shared subtrees are materialized once and
/// reused through a cycle-aware traversal cache.
pub fn graph_to_dep_tree(
    dep_graph: &DepGraph,
    options: GraphToTreeOptions,
) -> Result<DepTree> {
    if dep_graph.has_cycles() && !options.prune_cycles {
        return Err(DepGraphError::UnsupportedCycle);
    }

    let mut cache: TraversalCache<DepTree> = TraversalCache::new();
    let mut spinner = TraversalSpinner::new();

    let root_idx = dep_graph.node_index(dep_graph.root_node_id())?;
    let mut stack = vec![GraphFrame {
        idx: root_idx,
        next: 0,
        tree: tree_node(dep_graph, root_idx),
        cycles: Vec::new(),
    }];
    // node on the current path -> its frame position, for cycle slicing
    let mut positions: HashMap<NodeIndex, usize> = HashMap::from([(root_idx, 0)]);
    let mut result = None;

    while !stack.is_empty() {
        let top = stack.len() - 1;
        let idx = stack[top].idx;
        let next = stack[top].next;
        let deps = &dep_graph.node(idx).deps;

        if next < deps.len() {
            stack[top].next += 1;
            let child = deps[next];
            let child_name = dep_graph.node_pkg_info(child).name.clone();

            if let Some(&position) = positions.get(&child) {
                // the child closes a cycle: record it and attach the child
                // as a pruned leaf
                let cycle: Cycle = stack[position..].iter().map(|frame| frame.idx).collect();
                let mut leaf = tree_node(dep_graph, child);
                leaf.labels
                    .get_or_insert_with(BTreeMap::new)
                    .insert(PRUNED.to_string(), PRUNED_CYCLIC.to_string());
                stack[top].tree.dependencies.insert(child_name, leaf);
                stack[top].cycles.push(cycle);
                continue;
            }

            if let Some(cached) = cache.get(child, |node| positions.contains_key(&node)) {
                stack[top].tree.dependencies.insert(child_name, cached.clone());
                continue;
            }

            positions.insert(child, stack.len());
            let tree = tree_node(dep_graph, child);
            stack.push(GraphFrame {
                idx: child,
                next: 0,
                tree,
                cycles: Vec::new(),
            });
        } else {
            let Some(frame) = stack.pop() else { break };
            positions.remove(&frame.idx);

            let partitioned = partition_cycles(frame.idx, frame.cycles);
            // only shared nodes can ever be queried again; skipping the
            // rest keeps chains from cloning their whole tail at every level
            if dep_graph.node(frame.idx).parents.len() > 1 {
                cache.insert(frame.idx, frame.tree.clone(), &partitioned);
            }

            match stack.last_mut() {
                Some(parent) => {
                    let name = dep_graph.node_pkg_info(frame.idx).name.clone();
                    parent.cycles.extend(partitioned.passing_through);
                    parent.tree.dependencies.insert(name, frame.tree);
                }
                None => result = Some(frame.tree),
            }

            if spinner.is_starving() {
                spinner.spin();
            }
        }
    }

    Ok(result.expect("the walk always completes the root frame"))
}

fn tree_node(dep_graph: &DepGraph, idx: NodeIndex) -> DepTree {
    let pkg = dep_graph.node_pkg_info(idx);
    DepTree {
        name: Some(pkg.name.clone()),
        version: pkg.version.clone(),
        dependencies: BTreeMap::new(),
        labels: dep_graph
            .node(idx)
            .info
            .as_ref()
            .and_then(|info| info.labels.clone()),
        target_os: None,
    }
}

fn hex_digest(hasher: Sha256) -> String {
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
