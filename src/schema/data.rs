//! Wire-format data shapes
//!
//! The current schema major (2.x) encodes `pkgs` and `graph` as mappings;
//! node dep lists stay ordered lists because their order is significant.
//! The previous major (1.x) encoded `pkgs` and `nodes` as ordered lists and
//! carried an explicit `rootNodeId`. Both deserialize here; the loader
//! resolves the variant once at the boundary and the rest of the crate only
//! ever sees the canonical in-memory store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::{NodeInfo, PkgInfo, PkgManager};

/// A complete graph document in the current wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepGraphData {
    pub schema_version: String,
    pub pkg_manager: PkgManager,
    /// Package id → package info; the root package under the id `"root"`.
    pub pkgs: BTreeMap<String, PkgInfo>,
    /// Node id → node record; the root node is the one whose `pkgId` is
    /// `"root"`.
    pub graph: BTreeMap<String, GraphNodeData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNodeData {
    pub pkg_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<NodeInfo>,
    pub deps: Vec<NodeDep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDep {
    pub node_id: String,
}

/// A graph document in the superseded 1.x wire shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyDepGraphData {
    pub schema_version: String,
    pub pkg_manager: PkgManager,
    pub pkgs: Vec<LegacyPkgEntry>,
    pub graph: LegacyGraphData,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LegacyPkgEntry {
    pub id: String,
    pub info: PkgInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyGraphData {
    pub root_node_id: String,
    pub nodes: Vec<LegacyGraphNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyGraphNode {
    pub node_id: String,
    pub pkg_id: String,
    #[serde(default)]
    pub info: Option<NodeInfo>,
    pub deps: Vec<NodeDep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_shape_round_trips() {
        let json = serde_json::json!({
            "schemaVersion": "2.0.0",
            "pkgManager": { "name": "npm" },
            "pkgs": {
                "root": { "name": "app", "version": "1.0.0" },
                "a@1.0.0": { "name": "a", "version": "1.0.0" }
            },
            "graph": {
                "root-node": { "pkgId": "root", "deps": [ { "nodeId": "a" } ] },
                "a": { "pkgId": "a@1.0.0", "deps": [] }
            }
        });

        let data: DepGraphData = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(data.graph["root-node"].deps[0].node_id, "a");
        assert_eq!(serde_json::to_value(&data).unwrap(), json);
    }

    #[test]
    fn test_legacy_shape_deserializes() {
        let json = serde_json::json!({
            "schemaVersion": "1.2.0",
            "pkgManager": { "name": "npm" },
            "pkgs": [
                { "id": "root", "info": { "name": "app", "version": "1.0.0" } },
                { "id": "a@1.0.0", "info": { "name": "a", "version": "1.0.0" } }
            ],
            "graph": {
                "rootNodeId": "root-node",
                "nodes": [
                    { "nodeId": "root-node", "pkgId": "root", "deps": [ { "nodeId": "a" } ] },
                    { "nodeId": "a", "pkgId": "a@1.0.0", "deps": [] }
                ]
            }
        });

        let data: LegacyDepGraphData = serde_json::from_value(json).unwrap();
        assert_eq!(data.graph.root_node_id, "root-node");
        assert_eq!(data.pkgs.len(), 2);
        assert_eq!(data.graph.nodes[0].deps[0].node_id, "a");
    }
}
