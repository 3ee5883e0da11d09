//! End-to-end tests for loading graphs and querying them

use pkg_graph::{EqualsOptions, Pkg, PkgInfo, create_from_json};
use pretty_assertions::assert_eq;

fn load_fixture(name: &str) -> pkg_graph::DepGraph {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("cannot read fixture {path}: {err}"));
    create_from_json(&json).unwrap_or_else(|err| panic!("cannot load fixture {name}: {err}"))
}

fn path_names(path: &[PkgInfo]) -> Vec<&str> {
    path.iter().map(|pkg| pkg.name.as_str()).collect()
}

#[test]
fn counts_paths_on_the_simple_graph() {
    let graph = load_fixture("simple-graph.json");

    let expectations = [
        ("root", "0.0.0", 1),
        ("a", "1.0.0", 1),
        ("b", "1.0.0", 1),
        ("c", "1.0.0", 2),
        ("d", "0.0.1", 1),
        ("d", "0.0.2", 1),
        ("e", "5.0.0", 2),
    ];
    for (name, version, expected) in expectations {
        assert_eq!(
            graph
                .count_paths_to_root(&Pkg::new(name, version), None)
                .unwrap(),
            expected,
            "count for {name}@{version}"
        );
    }
}

#[test]
fn count_matches_enumeration_for_every_package() {
    let graph = load_fixture("simple-graph.json");
    for pkg in graph.get_pkgs() {
        let pkg = pkg.pkg();
        assert_eq!(
            graph.count_paths_to_root(&pkg, None).unwrap(),
            graph.pkg_paths_to_root(&pkg, None).unwrap().len() as u64,
            "count vs enumeration for {}",
            pkg.id()
        );
    }
}

#[test]
fn enumerates_paths_shorter_first() {
    let graph = load_fixture("simple-graph.json");

    let paths = graph
        .pkg_paths_to_root(&Pkg::new("e", "5.0.0"), None)
        .unwrap();
    assert_eq!(paths.len(), 2);
    assert_eq!(path_names(&paths[0]), vec!["e", "d", "c", "a", "root"]);
    assert_eq!(paths[0][1].version.as_deref(), Some("0.0.1"));
    assert_eq!(path_names(&paths[1]), vec!["e", "d", "c", "b", "root"]);
    assert_eq!(paths[1][1].version.as_deref(), Some("0.0.2"));
}

#[test]
fn limits_the_number_of_returned_paths() {
    let graph = load_fixture("simple-graph.json");
    let pkg = Pkg::new("e", "5.0.0");

    let unlimited = graph.pkg_paths_to_root(&pkg, None).unwrap();
    assert!(unlimited.len() > 1);

    for limit in 1..=3 {
        let limited = graph.pkg_paths_to_root(&pkg, Some(limit)).unwrap();
        assert!(limited.len() <= limit);
        assert_eq!(limited.len(), limit.min(unlimited.len()));
        for path in &limited {
            assert!(unlimited.contains(path), "limited result must be a subset");
        }
    }

    assert_eq!(graph.count_paths_to_root(&pkg, Some(1)).unwrap(), 1);
}

#[test]
fn classifies_direct_and_transitive_packages() {
    let graph = load_fixture("simple-graph.json");

    assert!(!graph.is_transitive(&Pkg::new("a", "1.0.0")).unwrap());
    assert!(!graph.is_transitive(&Pkg::new("b", "1.0.0")).unwrap());
    assert!(graph.is_transitive(&Pkg::new("c", "1.0.0")).unwrap());
    assert!(graph.is_transitive(&Pkg::new("d", "0.0.1")).unwrap());
    assert!(graph.is_transitive(&Pkg::new("e", "5.0.0")).unwrap());
}

#[test]
fn finds_direct_deps_leading_to_a_package() {
    let graph = load_fixture("simple-graph.json");

    let mut leading: Vec<String> = graph
        .direct_deps_leading_to(&Pkg::new("e", "5.0.0"))
        .unwrap()
        .iter()
        .map(|pkg| pkg.name.clone())
        .collect();
    leading.sort_unstable();
    assert_eq!(leading, vec!["a", "b"]);

    let leading = graph
        .direct_deps_leading_to(&Pkg::new("d", "0.0.1"))
        .unwrap();
    assert_eq!(leading.len(), 1);
    assert_eq!(leading[0].name, "a");
}

#[test]
fn upgrades_the_previous_schema_major() {
    let current = load_fixture("simple-graph.json");
    let upgraded = load_fixture("simple-graph-v1.json");

    assert!(current.equals(&upgraded, EqualsOptions::default()));
    assert_eq!(upgraded.to_data().schema_version, "2.0.0");
    assert_eq!(current.to_data(), upgraded.to_data());
}

#[test]
fn equality_survives_serialization_and_relabeling() {
    let graph = load_fixture("simple-graph.json");

    // serialize, relabel every non-root node id, reload
    let mut value = serde_json::to_value(&graph).unwrap();
    let nodes = value["graph"].as_object().unwrap().clone();
    let mut relabeled = serde_json::Map::new();
    for (index, (node_id, node)) in nodes.iter().enumerate() {
        let mut node = node.clone();
        for dep in node["deps"].as_array_mut().unwrap() {
            let target = dep["nodeId"].as_str().unwrap();
            let position = nodes.keys().position(|key| key == target).unwrap();
            dep["nodeId"] = serde_json::json!(format!("n{position}"));
        }
        if node_id == "root-node" {
            relabeled.insert(node_id.clone(), node);
        } else {
            relabeled.insert(format!("n{index}"), node);
        }
    }
    // deps pointing at the root keep its original id
    for (_, node) in relabeled.iter_mut() {
        for dep in node["deps"].as_array_mut().unwrap() {
            let target = dep["nodeId"].as_str().unwrap();
            let position: usize = target[1..].parse().unwrap();
            if nodes.keys().nth(position).unwrap() == "root-node" {
                dep["nodeId"] = serde_json::json!("root-node");
            }
        }
    }
    value["graph"] = serde_json::Value::Object(relabeled);

    let reloaded = create_from_json(&value.to_string()).unwrap();
    assert!(graph.equals(&reloaded, EqualsOptions::default()));
    assert!(graph.equals(&reloaded, EqualsOptions { compare_root: false }));
}

#[test]
fn cyclic_fixture_counts_are_stable() {
    // every query on a fresh instance; the per-instance count cache makes
    // query order significant on cyclic graphs
    let expectations = [
        ("root", 1),
        ("a", 2),
        ("b", 2),
        ("c", 2),
        ("d", 2),
        ("e", 1),
    ];
    for (name, expected) in expectations {
        let version = if name == "root" { "0.0.0" } else { "1.0.0" };
        let pkg = Pkg::new(name, version);

        let graph = load_fixture("cyclic-graph.json");
        assert_eq!(
            graph.count_paths_to_root(&pkg, None).unwrap(),
            expected,
            "count for {name}"
        );
        assert_eq!(
            graph.pkg_paths_to_root(&pkg, None).unwrap().len() as u64,
            expected,
            "paths for {name}"
        );
    }
}

#[test]
fn cyclic_fixture_paths_terminate_and_sort() {
    let graph = load_fixture("cyclic-graph.json");

    let paths = graph
        .pkg_paths_to_root(&Pkg::new("c", "1.0.0"), None)
        .unwrap();
    assert_eq!(path_names(&paths[0]), vec!["c", "e", "root"]);
    assert_eq!(path_names(&paths[1]), vec!["c", "b", "a", "root"]);
}

#[test]
fn unknown_package_is_not_found() {
    let graph = load_fixture("simple-graph.json");
    assert!(matches!(
        graph.count_paths_to_root(&Pkg::new("ghost", "1.0.0"), None),
        Err(pkg_graph::DepGraphError::PkgNotFound(_))
    ));
}
