//! The immutable graph store
//!
//! A [`DepGraph`] is built once, by [`crate::graph::DepGraphBuilder`] or by
//! the schema loader, and never mutated. Nodes live in a petgraph arena;
//! each node weight carries its ordered outgoing-edge list (edge order is
//! semantically significant and must survive the cycle cut/reconnect round
//! trip) and its predecessor list in insertion order. The petgraph edges
//! mirror the dep lists so the algorithm layer can reuse petgraph's
//! iterative traversals.
//!
//! Derived caches (path counts, acyclicity) are per-instance interior state;
//! the store is single-threaded by design and holds no locks.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Serialize, Serializer};

use super::types::{NodeInfo, Pkg, PkgInfo, PkgManager};
use crate::constants::graph::ROOT_PKG_ID;
use crate::error::{DepGraphError, Result};
use crate::schema::{DepGraphData, GraphNodeData, NodeDep};

/// One node instance: a package at one position in the graph.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) node_id: String,
    pub(crate) pkg_id: String,
    pub(crate) info: Option<NodeInfo>,
    /// Outgoing edges in their significant, preserved order.
    pub(crate) deps: Vec<NodeIndex>,
    /// Incoming edges in insertion order.
    pub(crate) parents: Vec<NodeIndex>,
}

/// Input record for [`DepGraph::build`]; referential integrity is the
/// caller's responsibility (the builder enforces it at connect time, the
/// loader validates before constructing).
#[derive(Debug)]
pub(crate) struct NodeSpec {
    pub(crate) node_id: String,
    pub(crate) pkg_id: String,
    pub(crate) info: Option<NodeInfo>,
    pub(crate) deps: Vec<String>,
}

/// An immutable dependency graph with derived lookup indices.
#[derive(Debug, Clone)]
pub struct DepGraph {
    pub(crate) pkg_manager: PkgManager,
    pub(crate) graph: DiGraph<NodeData, ()>,
    pub(crate) node_indices: HashMap<String, NodeIndex>,
    pub(crate) pkgs: BTreeMap<String, PkgInfo>,
    pub(crate) pkg_nodes: BTreeMap<String, BTreeSet<String>>,
    pub(crate) root_node_id: String,
    pub(crate) path_counts: RefCell<HashMap<NodeIndex, u64>>,
    pub(crate) cyclic: Cell<Option<bool>>,
}

impl DepGraph {
    /// Assemble a store from validated parts.
    ///
    /// `pkgs` must contain the reserved `"root"` entry, `root_node_id` must
    /// name one of `nodes`, and every dep must reference a listed node.
    pub(crate) fn build(
        pkg_manager: PkgManager,
        pkgs: BTreeMap<String, PkgInfo>,
        nodes: Vec<NodeSpec>,
        root_node_id: String,
    ) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), nodes.len());
        let mut node_indices = HashMap::with_capacity(nodes.len());
        let mut pkg_nodes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        let mut deps = Vec::with_capacity(nodes.len());
        for spec in nodes {
            pkg_nodes
                .entry(spec.pkg_id.clone())
                .or_default()
                .insert(spec.node_id.clone());

            let idx = graph.add_node(NodeData {
                node_id: spec.node_id.clone(),
                pkg_id: spec.pkg_id,
                info: NodeInfo::normalized(spec.info),
                deps: Vec::with_capacity(spec.deps.len()),
                parents: Vec::new(),
            });
            node_indices.insert(spec.node_id, idx);
            deps.push((idx, spec.deps));
        }

        for (from, dep_ids) in deps {
            for dep_id in dep_ids {
                let to = *node_indices
                    .get(&dep_id)
                    .expect("graph construction requires referentially-intact dep lists");
                graph.add_edge(from, to, ());
                graph[from].deps.push(to);
                graph[to].parents.push(from);
            }
        }

        Self {
            pkg_manager,
            graph,
            node_indices,
            pkgs,
            pkg_nodes,
            root_node_id,
            path_counts: RefCell::new(HashMap::new()),
            cyclic: Cell::new(None),
        }
    }

    pub fn pkg_manager(&self) -> &PkgManager {
        &self.pkg_manager
    }

    pub fn root_node_id(&self) -> &str {
        &self.root_node_id
    }

    pub fn root_pkg(&self) -> &PkgInfo {
        self.pkgs
            .get(ROOT_PKG_ID)
            .expect("a store always holds the root package")
    }

    /// All packages in the graph, root included.
    pub fn get_pkgs(&self) -> Vec<&PkgInfo> {
        self.pkgs.values().collect()
    }

    /// All packages except the root package.
    pub fn get_dep_pkgs(&self) -> Vec<&PkgInfo> {
        self.pkgs
            .iter()
            .filter(|(pkg_id, _)| pkg_id.as_str() != ROOT_PKG_ID)
            .map(|(_, info)| info)
            .collect()
    }

    /// Node ids owned by a package.
    ///
    /// Validated graphs guarantee at least one node per package; a builder
    /// can leave a package instance-less, which yields an empty list here.
    pub fn get_pkg_node_ids(&self, pkg: &Pkg) -> Result<Vec<&str>> {
        let pkg_id = self.resolve_pkg_id(pkg)?;
        Ok(self
            .pkg_nodes
            .get(pkg_id)
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect())
    }

    /// Metadata of every node instance of a package.
    pub fn get_pkg_nodes(&self, pkg: &Pkg) -> Result<Vec<NodeInfo>> {
        let pkg_id = self.resolve_pkg_id(pkg)?;
        Ok(self
            .pkg_nodes
            .get(pkg_id)
            .into_iter()
            .flatten()
            .map(|node_id| {
                let idx = self.node_indices[node_id];
                self.graph[idx].info.clone().unwrap_or_default()
            })
            .collect())
    }

    pub fn get_node(&self, node_id: &str) -> Result<Option<&NodeInfo>> {
        let idx = self.node_index(node_id)?;
        Ok(self.graph[idx].info.as_ref())
    }

    pub fn get_node_pkg(&self, node_id: &str) -> Result<&PkgInfo> {
        let idx = self.node_index(node_id)?;
        Ok(&self.pkgs[&self.graph[idx].pkg_id])
    }

    /// Outgoing node ids in their significant order.
    pub fn get_node_deps_node_ids(&self, node_id: &str) -> Result<Vec<&str>> {
        let idx = self.node_index(node_id)?;
        Ok(self.graph[idx]
            .deps
            .iter()
            .map(|&dep| self.graph[dep].node_id.as_str())
            .collect())
    }

    /// Incoming node ids in edge-insertion order.
    pub fn get_node_parents_node_ids(&self, node_id: &str) -> Result<Vec<&str>> {
        let idx = self.node_index(node_id)?;
        Ok(self.graph[idx]
            .parents
            .iter()
            .map(|&parent| self.graph[parent].node_id.as_str())
            .collect())
    }

    /// Whether any cycle exists anywhere in the graph.
    ///
    /// Computed once per instance via petgraph's iterative topological sort,
    /// then cached.
    pub fn has_cycles(&self) -> bool {
        if let Some(cyclic) = self.cyclic.get() {
            return cyclic;
        }
        let cyclic = toposort(&self.graph, None).is_err();
        self.cyclic.set(Some(cyclic));
        cyclic
    }

    /// False when any node of `pkg` is a direct dependency of the root.
    pub fn is_transitive(&self, pkg: &Pkg) -> Result<bool> {
        let pkg_node_ids: HashSet<&str> =
            self.get_pkg_node_ids(pkg)?.into_iter().collect();
        let root = self.node_indices[&self.root_node_id];
        Ok(!self.graph[root]
            .deps
            .iter()
            .any(|&dep| pkg_node_ids.contains(self.graph[dep].node_id.as_str())))
    }

    /// The root's direct dependencies through which `pkg` is reachable.
    pub fn direct_deps_leading_to(&self, pkg: &Pkg) -> Result<Vec<&PkgInfo>> {
        let pkg_id = self.resolve_pkg_id(pkg)?;
        let target_nodes: HashSet<NodeIndex> = self
            .pkg_nodes
            .get(pkg_id)
            .into_iter()
            .flatten()
            .map(|node_id| self.node_indices[node_id])
            .collect();

        let root = self.node_indices[&self.root_node_id];
        let mut leading = Vec::new();
        for &direct_dep in &self.graph[root].deps {
            let mut stack = vec![direct_dep];
            let mut visited = HashSet::from([direct_dep]);
            let mut leads = false;
            while let Some(idx) = stack.pop() {
                if target_nodes.contains(&idx) {
                    leads = true;
                    break;
                }
                for &dep in &self.graph[idx].deps {
                    if visited.insert(dep) {
                        stack.push(dep);
                    }
                }
            }
            if leads {
                leading.push(&self.pkgs[&self.graph[direct_dep].pkg_id]);
            }
        }
        Ok(leading)
    }

    /// Snapshot the graph into the current wire shape.
    pub fn to_data(&self) -> DepGraphData {
        let graph = self
            .graph
            .node_indices()
            .map(|idx| {
                let node = &self.graph[idx];
                let deps = node
                    .deps
                    .iter()
                    .map(|&dep| NodeDep {
                        node_id: self.graph[dep].node_id.clone(),
                    })
                    .collect();
                (
                    node.node_id.clone(),
                    GraphNodeData {
                        pkg_id: node.pkg_id.clone(),
                        info: node.info.clone(),
                        deps,
                    },
                )
            })
            .collect();

        DepGraphData {
            schema_version: crate::constants::schema::VERSION.to_string(),
            pkg_manager: self.pkg_manager.clone(),
            pkgs: self.pkgs.clone(),
            graph,
        }
    }

    /// Resolve a package identity to its id within this graph.
    ///
    /// The root package lives under the reserved id `"root"`, so a query
    /// matching the root package's name and version resolves there before
    /// the `name@version` lookup.
    pub(crate) fn resolve_pkg_id<'a>(&'a self, pkg: &Pkg) -> Result<&'a str> {
        let root_pkg = self.root_pkg();
        if root_pkg.name == pkg.name && root_pkg.version == pkg.version {
            return Ok(ROOT_PKG_ID);
        }
        let pkg_id = pkg.id();
        match self.pkgs.get_key_value(&pkg_id) {
            Some((key, _)) => Ok(key),
            None => Err(DepGraphError::PkgNotFound(pkg_id)),
        }
    }

    pub(crate) fn node_index(&self, node_id: &str) -> Result<NodeIndex> {
        self.node_indices
            .get(node_id)
            .copied()
            .ok_or_else(|| DepGraphError::NodeNotFound(node_id.to_string()))
    }

    pub(crate) fn node(&self, idx: NodeIndex) -> &NodeData {
        &self.graph[idx]
    }

    pub(crate) fn node_pkg_info(&self, idx: NodeIndex) -> &PkgInfo {
        &self.pkgs[&self.graph[idx].pkg_id]
    }

    /// All node indices in insertion order.
    pub(crate) fn node_iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

impl Serialize for DepGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_data().serialize(serializer)
    }
}
