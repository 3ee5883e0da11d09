//! Loading and validating serialized graphs
//!
//! The only place where [`crate::error::ValidationError`] is raised: the
//! core algorithms trust every invariant established here. Validation runs
//! in two stages: referential checks on the raw document, then structural
//! checks (root uniqueness and isolation, instance coverage, reachability)
//! on the assembled store, where petgraph's iterative DFS does the walking.

use std::collections::{BTreeMap, HashSet};

use petgraph::visit::Dfs;
use semver::{Version, VersionReq};
use tracing::debug;

use super::data::{DepGraphData, LegacyDepGraphData};
use crate::constants::graph::ROOT_PKG_ID;
use crate::constants::schema::SUPPORTED_RANGE;
use crate::error::{Result, ValidationError};
use crate::graph::{DepGraph, NodeSpec, PkgInfo};

/// Parse and validate a JSON graph document of any supported schema major.
pub fn create_from_json(json: &str) -> Result<DepGraph> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    create_from_value(value)
}

/// Validate an already-deserialized current-schema document.
pub fn create_from_data(data: DepGraphData) -> Result<DepGraph> {
    check_schema_version(&data.schema_version)?;
    build_current(data)
}

fn create_from_value(value: serde_json::Value) -> Result<DepGraph> {
    let schema_version = value
        .get("schemaVersion")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ValidationError::new("schemaVersion missing"))?
        .to_string();
    let version = check_schema_version(&schema_version)?;

    // The variant split happens exactly once, here; everything downstream
    // sees one canonical in-memory shape.
    if version.major < 2 {
        let legacy: LegacyDepGraphData = serde_json::from_value(value)
            .map_err(|err| ValidationError::new(format!("bad data format: {err}")))?;
        build_legacy(legacy)
    } else {
        let data: DepGraphData = serde_json::from_value(value)
            .map_err(|err| ValidationError::new(format!("bad data format: {err}")))?;
        build_current(data)
    }
}

fn check_schema_version(schema_version: &str) -> Result<Version> {
    let version = Version::parse(schema_version).map_err(|_| {
        ValidationError::new(format!(
            "schemaVersion is not a semantic version: {schema_version}"
        ))
    })?;
    let supported = VersionReq::parse(SUPPORTED_RANGE)
        .expect("the supported schema range is a valid version requirement");
    if !supported.matches(&version) {
        return Err(ValidationError::new(format!(
            "schemaVersion {schema_version} not in \"{SUPPORTED_RANGE}\""
        ))
        .into());
    }
    Ok(version)
}

fn build_current(data: DepGraphData) -> Result<DepGraph> {
    let DepGraphData {
        schema_version,
        pkg_manager,
        pkgs,
        graph,
    } = data;

    // In the current shape the root node is identified structurally: it is
    // the unique node owned by the reserved root package.
    let mut root_node_ids = graph
        .iter()
        .filter(|(_, node)| node.pkg_id == ROOT_PKG_ID)
        .map(|(node_id, _)| node_id.clone());
    let root_node_id = root_node_ids
        .next()
        .ok_or_else(|| ValidationError::new("root graph node is missing"))?;
    if root_node_ids.next().is_some() {
        return Err(
            ValidationError::new("root pkg should have exactly one instance node").into(),
        );
    }
    drop(root_node_ids);

    let nodes: Vec<NodeSpec> = graph
        .into_iter()
        .map(|(node_id, node)| NodeSpec {
            node_id,
            pkg_id: node.pkg_id,
            info: node.info,
            deps: node.deps.into_iter().map(|dep| dep.node_id).collect(),
        })
        .collect();

    debug!(
        schema_version = %schema_version,
        pkgs = pkgs.len(),
        nodes = nodes.len(),
        "loading current-schema graph document"
    );
    validate_and_build(pkg_manager, pkgs, nodes, root_node_id)
}

fn build_legacy(data: LegacyDepGraphData) -> Result<DepGraph> {
    let LegacyDepGraphData {
        schema_version,
        pkg_manager,
        pkgs: pkg_entries,
        graph,
    } = data;

    // The list encodings can carry duplicates the mapping form cannot.
    let mut pkgs: BTreeMap<String, PkgInfo> = BTreeMap::new();
    for entry in pkg_entries {
        if pkgs.insert(entry.id.clone(), entry.info).is_some() {
            return Err(
                ValidationError::new(format!("duplicate pkg id: {}", entry.id)).into(),
            );
        }
    }

    let mut seen_node_ids: HashSet<String> = HashSet::new();
    let mut nodes = Vec::with_capacity(graph.nodes.len());
    for node in graph.nodes {
        if !seen_node_ids.insert(node.node_id.clone()) {
            return Err(
                ValidationError::new(format!("duplicate node id: {}", node.node_id)).into(),
            );
        }
        nodes.push(NodeSpec {
            node_id: node.node_id,
            pkg_id: node.pkg_id,
            info: node.info,
            deps: node.deps.into_iter().map(|dep| dep.node_id).collect(),
        });
    }

    let root_node_id = graph.root_node_id;
    let root = nodes
        .iter()
        .find(|node| node.node_id == root_node_id)
        .ok_or_else(|| ValidationError::new("root graph node is missing"))?;
    if root.pkg_id != ROOT_PKG_ID {
        return Err(ValidationError::new(format!(
            "the root node .pkgId must be \"{ROOT_PKG_ID}\", but got {}",
            root.pkg_id
        ))
        .into());
    }

    debug!(
        schema_version = %schema_version,
        pkgs = pkgs.len(),
        nodes = nodes.len(),
        "upgrading legacy-schema graph document"
    );
    validate_and_build(pkg_manager, pkgs, nodes, root_node_id)
}

fn validate_and_build(
    pkg_manager: crate::graph::PkgManager,
    pkgs: BTreeMap<String, PkgInfo>,
    nodes: Vec<NodeSpec>,
    root_node_id: String,
) -> Result<DepGraph> {
    if pkg_manager.name.is_empty() {
        return Err(ValidationError::new(".pkgManager.name is missing").into());
    }
    let root_pkg = pkgs
        .get(ROOT_PKG_ID)
        .ok_or_else(|| ValidationError::new("root pkg missing"))?;
    if root_pkg.name.is_empty() {
        return Err(ValidationError::new("root pkg has no name").into());
    }

    for (pkg_id, pkg) in &pkgs {
        if pkg.name.is_empty() {
            return Err(
                ValidationError::new("some pkgs elements have no .name field").into(),
            );
        }
        // strict by choice; relaxing it later is cheap
        if pkg_id != ROOT_PKG_ID && *pkg_id != pkg.id() {
            return Err(ValidationError::new(format!(
                "non-root pkg id must be name@version: {pkg_id}"
            ))
            .into());
        }
    }

    let node_ids: HashSet<&str> = nodes.iter().map(|node| node.node_id.as_str()).collect();
    for node in &nodes {
        if !pkgs.contains_key(&node.pkg_id) {
            return Err(ValidationError::new(format!(
                "node points to a non-existing pkgId: {}",
                node.pkg_id
            ))
            .into());
        }
        if node.pkg_id == ROOT_PKG_ID && node.node_id != root_node_id {
            return Err(
                ValidationError::new("root pkg should have exactly one instance node").into(),
            );
        }
        for dep in &node.deps {
            if !node_ids.contains(dep.as_str()) {
                return Err(ValidationError::new(format!(
                    "node depends on a non-existing nodeId: {dep}"
                ))
                .into());
            }
        }
    }

    // Instance coverage: every package owns at least one node.
    let pkg_ids_seen: HashSet<&str> = nodes.iter().map(|node| node.pkg_id.as_str()).collect();
    if pkg_ids_seen.len() != pkgs.len() {
        return Err(ValidationError::new("not all pkgs have instance nodes").into());
    }

    let dep_graph = DepGraph::build(pkg_manager, pkgs, nodes, root_node_id);

    let root_idx = dep_graph
        .node_index(dep_graph.root_node_id())
        .map_err(|_| ValidationError::new("root graph node is missing"))?;
    if !dep_graph.node(root_idx).parents.is_empty() {
        return Err(ValidationError::new(format!(
            "\"{}\" is not really the root",
            dep_graph.root_node_id()
        ))
        .into());
    }

    // Reachability over the mirrored petgraph edges; Dfs keeps its own
    // explicit stack, so depth is not bounded by the call stack.
    let mut reachable = 0usize;
    let mut dfs = Dfs::new(&dep_graph.graph, root_idx);
    while dfs.next(&dep_graph.graph).is_some() {
        reachable += 1;
    }
    if reachable != dep_graph.node_count() {
        return Err(
            ValidationError::new("not all graph nodes are reachable from root").into(),
        );
    }

    Ok(dep_graph)
}
