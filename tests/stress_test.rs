//! Stack-safety and memoization behavior on very large graphs

use std::time::Instant;

use pkg_graph::{DepGraph, DepGraphBuilder, Pkg, PkgInfo, PkgManager};

const NEEDLE: &str = "needle";

/// `width` shallow packages, each a direct dep of the root and each
/// depending on the one shared needle package: the needle has `width + 1`
/// predecessors.
fn generate_wide_graph(width: usize) -> DepGraph {
    let mut builder = DepGraphBuilder::new(
        PkgManager::new("npm"),
        Some(PkgInfo::new("root", "1.2.3")),
    );
    builder
        .add_pkg_node(PkgInfo::new(NEEDLE, "1.2.3"), NEEDLE, None)
        .unwrap();
    builder.connect_dep("root-node", NEEDLE).unwrap();

    for j in 0..width {
        let node_id = format!("id-{j}");
        builder
            .add_pkg_node(PkgInfo::new(&node_id, "1.2.3"), &node_id, None)
            .unwrap();
        builder.connect_dep("root-node", &node_id).unwrap();
        builder.connect_dep(&node_id, NEEDLE).unwrap();
    }

    builder.build()
}

/// One chain of `depth` nodes: root -> n0 -> n1 -> ... -> needle.
fn generate_deep_graph(depth: usize) -> DepGraph {
    let mut builder = DepGraphBuilder::new(
        PkgManager::new("npm"),
        Some(PkgInfo::new("root", "1.2.3")),
    );
    let mut last_node_id = "root-node".to_string();
    for j in 0..depth {
        let node_id = format!("n{j}");
        builder
            .add_pkg_node(PkgInfo::new(&node_id, "1.2.3"), &node_id, None)
            .unwrap();
        builder.connect_dep(&last_node_id, &node_id).unwrap();
        last_node_id = node_id;
    }
    builder
        .add_pkg_node(PkgInfo::new(NEEDLE, "1.2.3"), NEEDLE, None)
        .unwrap();
    builder.connect_dep(&last_node_id, NEEDLE).unwrap();
    builder.build()
}

#[test]
fn pkg_paths_to_root_survives_very_wide_graphs() {
    let graph = generate_wide_graph(125_000);

    let paths = graph
        .pkg_paths_to_root(&Pkg::new(NEEDLE, "1.2.3"), None)
        .unwrap();
    assert_eq!(paths.len(), 125_001);
}

#[test]
fn count_paths_to_root_survives_very_deep_graphs() {
    // predecessor chains beyond any native call-stack budget
    let graph = generate_deep_graph(100_000);

    assert_eq!(
        graph
            .count_paths_to_root(&Pkg::new(NEEDLE, "1.2.3"), None)
            .unwrap(),
        1
    );
    let paths = graph
        .pkg_paths_to_root(&Pkg::new(NEEDLE, "1.2.3"), None)
        .unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 100_002);
}

#[test]
fn count_paths_to_root_is_cached() {
    let graph = generate_wide_graph(100_000);
    let pkg = Pkg::new(NEEDLE, "1.2.3");

    let start = Instant::now();
    let first = graph.count_paths_to_root(&pkg, None).unwrap();
    let first_call = start.elapsed();

    let start = Instant::now();
    let second = graph.count_paths_to_root(&pkg, None).unwrap();
    let second_call = start.elapsed();

    assert_eq!(first, 100_001);
    assert_eq!(first, second);
    // the memoized call must be significantly faster
    assert!(
        second_call <= first_call / 5,
        "expected a >=5x speedup, got {first_call:?} then {second_call:?}"
    );
}
