//! Incremental graph construction
//!
//! The builder assembles a [`DepGraph`] node by node and edge by edge. It
//! checks referential integrity at connect time but performs no whole-graph
//! validation: it can create cyclic graphs (several package managers permit
//! them) and disconnected nodes. Loaded documents go through the schema
//! validator instead.

use std::collections::{BTreeMap, HashMap};

use super::store::{DepGraph, NodeSpec};
use super::types::{NodeInfo, PkgInfo, PkgManager};
use crate::constants::graph::{
    DEFAULT_ROOT_NODE_ID, DEFAULT_ROOT_PKG_NAME, DEFAULT_ROOT_PKG_VERSION, ROOT_PKG_ID,
};
use crate::error::{DepGraphError, Result, ValidationError};

struct BuilderNode {
    pkg_id: String,
    info: Option<NodeInfo>,
    deps: Vec<String>,
}

/// Builds a [`DepGraph`] incrementally.
pub struct DepGraphBuilder {
    pkg_manager: PkgManager,
    pkgs: BTreeMap<String, PkgInfo>,
    node_order: Vec<String>,
    nodes: HashMap<String, BuilderNode>,
    root_node_id: String,
}

impl DepGraphBuilder {
    /// Start a graph rooted at `root_pkg` (or a placeholder root package)
    /// under the default root node id.
    pub fn new(pkg_manager: PkgManager, root_pkg: Option<PkgInfo>) -> Self {
        Self::with_root_node_id(pkg_manager, root_pkg, DEFAULT_ROOT_NODE_ID)
    }

    /// Like [`DepGraphBuilder::new`] with a caller-chosen root node id.
    ///
    /// Transformations that rebuild an existing graph use this to keep node
    /// identity stable.
    pub fn with_root_node_id(
        pkg_manager: PkgManager,
        root_pkg: Option<PkgInfo>,
        root_node_id: impl Into<String>,
    ) -> Self {
        let root_pkg = root_pkg.unwrap_or_else(|| PkgInfo {
            name: DEFAULT_ROOT_PKG_NAME.to_string(),
            version: Some(DEFAULT_ROOT_PKG_VERSION.to_string()),
            purl: None,
        });
        let root_node_id = root_node_id.into();

        let mut pkgs = BTreeMap::new();
        pkgs.insert(ROOT_PKG_ID.to_string(), root_pkg);

        let mut nodes = HashMap::new();
        nodes.insert(
            root_node_id.clone(),
            BuilderNode {
                pkg_id: ROOT_PKG_ID.to_string(),
                info: None,
                deps: Vec::new(),
            },
        );

        Self {
            pkg_manager,
            pkgs,
            node_order: vec![root_node_id.clone()],
            nodes,
            root_node_id,
        }
    }

    pub fn root_node_id(&self) -> &str {
        &self.root_node_id
    }

    pub fn get_pkgs(&self) -> Vec<&PkgInfo> {
        self.pkgs.values().collect()
    }

    /// Attach metadata to the root node.
    pub fn set_root_node_info(&mut self, info: Option<NodeInfo>) -> &mut Self {
        if let Some(root) = self.nodes.get_mut(&self.root_node_id) {
            root.info = info;
        }
        self
    }

    /// Add one node instance of a package.
    ///
    /// Re-adding an existing node id replaces its package and metadata but
    /// keeps its position and edges. The root node cannot be overridden.
    pub fn add_pkg_node(
        &mut self,
        pkg_info: PkgInfo,
        node_id: impl Into<String>,
        node_info: Option<NodeInfo>,
    ) -> Result<&mut Self> {
        let node_id = node_id.into();
        if node_id == self.root_node_id {
            return Err(ValidationError::new("cannot override the root node").into());
        }

        let pkg_id = pkg_info.id();
        self.pkgs.insert(pkg_id.clone(), pkg_info);

        match self.nodes.get_mut(&node_id) {
            Some(existing) => {
                existing.pkg_id = pkg_id;
                existing.info = node_info;
            }
            None => {
                self.node_order.push(node_id.clone());
                self.nodes.insert(
                    node_id,
                    BuilderNode {
                        pkg_id,
                        info: node_info,
                        deps: Vec::new(),
                    },
                );
            }
        }
        Ok(self)
    }

    /// Append a directed edge to the parent's ordered dep list.
    ///
    /// Adding the same edge twice is a no-op; parallel edges between one
    /// ordered node pair do not exist in this model.
    pub fn connect_dep(
        &mut self,
        parent_node_id: &str,
        dep_node_id: &str,
    ) -> Result<&mut Self> {
        if !self.nodes.contains_key(dep_node_id) {
            return Err(DepGraphError::NodeNotFound(dep_node_id.to_string()));
        }
        let parent = self
            .nodes
            .get_mut(parent_node_id)
            .ok_or_else(|| DepGraphError::NodeNotFound(parent_node_id.to_string()))?;

        if !parent.deps.iter().any(|dep| dep == dep_node_id) {
            parent.deps.push(dep_node_id.to_string());
        }
        Ok(self)
    }

    pub fn build(mut self) -> DepGraph {
        let specs = self
            .node_order
            .iter()
            .map(|node_id| {
                let node = self
                    .nodes
                    .remove(node_id)
                    .expect("every ordered node id has a node record");
                NodeSpec {
                    node_id: node_id.clone(),
                    pkg_id: node.pkg_id,
                    info: node.info,
                    deps: node.deps,
                }
            })
            .collect();

        DepGraph::build(self.pkg_manager, self.pkgs, specs, self.root_node_id)
    }
}
