//! Path-to-root counting and enumeration
//!
//! Both operations walk predecessor edges from every node instance of a
//! package up to the root. Real package graphs are not guaranteed acyclic,
//! so each walk tracks the ordered set of nodes on the path under
//! construction and skips any predecessor already on it; that bounds the
//! walk without a prior whole-graph acyclicity check. Real graphs also
//! exhibit predecessor chains deep enough to blow the native call stack, so
//! both routines run on explicit frame stacks instead of recursion.
//!
//! Path counts are memoized per node id for the lifetime of the graph
//! instance. The cache is keyed by node id alone, not by the ancestor
//! context the count was computed under; see
//! `test_count_cache_reuses_totals_computed_under_cycle_context` for the
//! observable consequence on cyclic graphs.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use super::store::DepGraph;
use super::types::{Pkg, PkgInfo};
use crate::error::Result;

struct CountFrame {
    node: NodeIndex,
    next: usize,
    acc: u64,
}

struct PathFrame {
    node: NodeIndex,
    next: usize,
}

impl DepGraph {
    /// Number of distinct paths from any instance of `pkg` up to the root.
    ///
    /// With a `limit`, counting stops as soon as that many paths have been
    /// discovered and the limit itself is returned; the cache is still
    /// consulted, but a run cut short writes no partial totals.
    pub fn count_paths_to_root(&self, pkg: &Pkg, limit: Option<usize>) -> Result<u64> {
        let node_ids = self.get_pkg_node_ids(pkg)?;
        let mut count: u64 = 0;
        for node_id in node_ids {
            let start = self.node_index(node_id)?;
            match limit {
                Some(limit) => {
                    let limit = limit as u64;
                    if count >= limit {
                        return Ok(limit);
                    }
                    count = count
                        .saturating_add(self.count_node_paths_to_root(start, Some(limit - count)));
                    if count >= limit {
                        return Ok(limit);
                    }
                }
                None => {
                    count = count.saturating_add(self.count_node_paths_to_root(start, None));
                }
            }
        }
        Ok(count)
    }

    /// Every path from an instance of `pkg` up to the root, shortest first.
    ///
    /// Each path runs from the instance itself up to and including the root
    /// package. Under a `limit` the walk stops after that many paths; the
    /// subset is the first paths in discovery order, not the globally
    /// shortest ones.
    pub fn pkg_paths_to_root(
        &self,
        pkg: &Pkg,
        limit: Option<usize>,
    ) -> Result<Vec<Vec<PkgInfo>>> {
        let node_ids = self.get_pkg_node_ids(pkg)?;
        let mut paths: Vec<Vec<PkgInfo>> = Vec::new();

        'instances: for node_id in node_ids {
            let start = self.node_index(node_id)?;
            let mut stack = vec![PathFrame {
                node: start,
                next: 0,
            }];
            // Multiset of nodes that currently have an active child frame:
            // the nodes a candidate predecessor is not allowed to revisit.
            // The frame's own node is deliberately absent, so a self-loop is
            // traversed exactly once before it is suppressed.
            let mut blocked: HashMap<NodeIndex, usize> = HashMap::new();

            while let Some(top) = stack.last_mut() {
                let node = top.node;
                let parents = &self.node(node).parents;

                if parents.is_empty() {
                    // Terminus: the path under construction is complete.
                    let path: Vec<PkgInfo> = stack
                        .iter()
                        .map(|frame| self.node_pkg_info(frame.node).clone())
                        .collect();
                    paths.push(path);
                    if let Some(limit) = limit
                        && paths.len() >= limit
                    {
                        break 'instances;
                    }
                    stack.pop();
                    Self::unblock_top(&mut stack, &mut blocked);
                    continue;
                }

                if top.next < parents.len() {
                    let parent = parents[top.next];
                    top.next += 1;
                    if blocked.get(&parent).copied().unwrap_or(0) > 0 {
                        // would re-enter the path under construction
                        continue;
                    }
                    *blocked.entry(node).or_insert(0) += 1;
                    stack.push(PathFrame {
                        node: parent,
                        next: 0,
                    });
                } else {
                    stack.pop();
                    Self::unblock_top(&mut stack, &mut blocked);
                }
            }
        }

        paths.sort_by_key(Vec::len);
        Ok(paths)
    }

    fn unblock_top(stack: &mut [PathFrame], blocked: &mut HashMap<NodeIndex, usize>) {
        if let Some(parent_frame) = stack.last()
            && let Some(active) = blocked.get_mut(&parent_frame.node)
        {
            *active = active.saturating_sub(1);
        }
    }

    /// Trampolined postorder sum over the predecessor DAG-view of `start`.
    ///
    /// A node's total is cached once its full sum has been computed; a node
    /// skipped because it is an active ancestor contributes zero and gets no
    /// cache write from that branch. Frames that complete before a
    /// limit-abort carry exact totals, so their cache writes stay valid.
    fn count_node_paths_to_root(&self, start: NodeIndex, limit: Option<u64>) -> u64 {
        if let Some(&cached) = self.path_counts.borrow().get(&start) {
            return cached;
        }

        let mut stack = vec![CountFrame {
            node: start,
            next: 0,
            acc: 0,
        }];
        // Same blocking discipline as path enumeration: a predecessor is
        // skipped while it has an active child frame on this walk.
        let mut blocked: HashMap<NodeIndex, usize> = HashMap::new();
        let mut discovered: u64 = 0;
        let mut total = 0;

        while let Some(top) = stack.last_mut() {
            let node = top.node;
            let parent_count = self.node(node).parents.len();

            if top.next < parent_count {
                let parent = self.node(node).parents[top.next];
                top.next += 1;
                if blocked.get(&parent).copied().unwrap_or(0) > 0 {
                    // re-entering the path under construction counts nothing
                    continue;
                }
                let cached = self.path_counts.borrow().get(&parent).copied();
                if let Some(count) = cached {
                    top.acc = top.acc.saturating_add(count);
                    if let Some(limit) = limit {
                        discovered = discovered.saturating_add(count);
                        if discovered >= limit {
                            return limit;
                        }
                    }
                    continue;
                }
                *blocked.entry(node).or_insert(0) += 1;
                stack.push(CountFrame {
                    node: parent,
                    next: 0,
                    acc: 0,
                });
            } else {
                let Some(frame) = stack.pop() else { break };
                let sum = if parent_count == 0 { 1 } else { frame.acc };
                self.path_counts.borrow_mut().insert(frame.node, sum);
                match stack.last_mut() {
                    Some(parent_frame) => {
                        parent_frame.acc = parent_frame.acc.saturating_add(sum);
                    }
                    None => total = sum,
                }
                if let Some(parent_frame) = stack.last()
                    && let Some(active) = blocked.get_mut(&parent_frame.node)
                {
                    *active = active.saturating_sub(1);
                }
                if parent_count == 0
                    && let Some(limit) = limit
                {
                    discovered = discovered.saturating_add(1);
                    if discovered >= limit {
                        return limit;
                    }
                }
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::graph::{DepGraph, DepGraphBuilder, Pkg, PkgInfo, PkgManager};

    fn builder() -> DepGraphBuilder {
        DepGraphBuilder::new(
            PkgManager::new("npm"),
            Some(PkgInfo::new("app", "1.0.0")),
        )
    }

    /// root -> {a, b}, a -> c, b -> c
    fn diamond() -> DepGraph {
        let mut builder = builder();
        builder
            .add_pkg_node(PkgInfo::new("a", "1.0.0"), "a", None)
            .unwrap();
        builder
            .add_pkg_node(PkgInfo::new("b", "1.0.0"), "b", None)
            .unwrap();
        builder
            .add_pkg_node(PkgInfo::new("c", "3.0.0"), "c", None)
            .unwrap();
        builder.connect_dep("root-node", "a").unwrap();
        builder.connect_dep("root-node", "b").unwrap();
        builder.connect_dep("a", "c").unwrap();
        builder.connect_dep("b", "c").unwrap();
        builder.build()
    }

    fn names(path: &[PkgInfo]) -> Vec<&str> {
        path.iter().map(|pkg| pkg.name.as_str()).collect()
    }

    #[test]
    fn test_count_for_root_is_one() {
        let graph = diamond();
        assert_eq!(
            graph
                .count_paths_to_root(&Pkg::new("app", "1.0.0"), None)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_shared_dependency_has_two_paths() {
        let graph = diamond();
        let pkg = Pkg::new("c", "3.0.0");

        assert_eq!(graph.count_paths_to_root(&pkg, None).unwrap(), 2);

        let paths = graph.pkg_paths_to_root(&pkg, None).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(names(&paths[0]), vec!["c", "a", "app"]);
        assert_eq!(names(&paths[1]), vec!["c", "b", "app"]);
    }

    #[test]
    fn test_paths_sorted_shorter_first() {
        // root -> a -> b -> c, root -> c
        let mut builder = builder();
        for (name, id) in [("a", "a"), ("b", "b"), ("c", "c")] {
            builder
                .add_pkg_node(PkgInfo::new(name, "1.0.0"), id, None)
                .unwrap();
        }
        builder.connect_dep("root-node", "a").unwrap();
        builder.connect_dep("a", "b").unwrap();
        builder.connect_dep("b", "c").unwrap();
        builder.connect_dep("root-node", "c").unwrap();
        let graph = builder.build();

        let paths = graph
            .pkg_paths_to_root(&Pkg::new("c", "1.0.0"), None)
            .unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(names(&paths[0]), vec!["c", "app"]);
        assert_eq!(names(&paths[1]), vec!["c", "b", "a", "app"]);
    }

    #[test]
    fn test_count_equals_path_count_for_acyclic() {
        let graph = diamond();
        for pkg in graph.get_pkgs() {
            let pkg = pkg.pkg();
            assert_eq!(
                graph.count_paths_to_root(&pkg, None).unwrap(),
                graph.pkg_paths_to_root(&pkg, None).unwrap().len() as u64,
                "count and enumeration disagree for {}",
                pkg.id()
            );
        }
    }

    #[test]
    fn test_limit_caps_discovery() {
        let graph = diamond();
        let pkg = Pkg::new("c", "3.0.0");

        let unlimited = graph.pkg_paths_to_root(&pkg, None).unwrap();
        let limited = graph.pkg_paths_to_root(&pkg, Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
        assert!(unlimited.contains(&limited[0]));

        assert_eq!(graph.count_paths_to_root(&pkg, Some(1)).unwrap(), 1);
        // limit above the real count returns the real count
        assert_eq!(graph.count_paths_to_root(&pkg, Some(10)).unwrap(), 2);
    }

    #[test]
    fn test_cycle_paths_terminate() {
        // root -> a -> b -> a
        let mut builder = builder();
        builder
            .add_pkg_node(PkgInfo::new("a", "1.0.0"), "a", None)
            .unwrap();
        builder
            .add_pkg_node(PkgInfo::new("b", "1.0.0"), "b", None)
            .unwrap();
        builder.connect_dep("root-node", "a").unwrap();
        builder.connect_dep("a", "b").unwrap();
        builder.connect_dep("b", "a").unwrap();
        let graph = builder.build();

        let paths = graph
            .pkg_paths_to_root(&Pkg::new("b", "1.0.0"), None)
            .unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(names(&paths[0]), vec!["b", "a", "app"]);
        assert_eq!(
            graph
                .count_paths_to_root(&Pkg::new("b", "1.0.0"), None)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_count_cache_reuses_totals_computed_under_cycle_context() {
        // a <-> b with both also direct deps of root: counting b first
        // caches a's total as seen from b's walk (where b itself was an
        // active ancestor), and a later query for a returns that cached
        // total even though a fresh instance computes a larger one.
        let build = || {
            let mut builder = builder();
            builder
                .add_pkg_node(PkgInfo::new("a", "1.0.0"), "a", None)
                .unwrap();
            builder
                .add_pkg_node(PkgInfo::new("b", "1.0.0"), "b", None)
                .unwrap();
            builder.connect_dep("root-node", "a").unwrap();
            builder.connect_dep("root-node", "b").unwrap();
            builder.connect_dep("a", "b").unwrap();
            builder.connect_dep("b", "a").unwrap();
            builder.build()
        };
        let a = Pkg::new("a", "1.0.0");
        let b = Pkg::new("b", "1.0.0");

        let fresh = build();
        assert_eq!(fresh.count_paths_to_root(&a, None).unwrap(), 2);

        let polluted = build();
        assert_eq!(polluted.count_paths_to_root(&b, None).unwrap(), 2);
        // a's total was cached during b's walk, under b-as-ancestor
        assert_eq!(polluted.count_paths_to_root(&a, None).unwrap(), 1);
        // enumeration carries no cache and still sees both paths
        assert_eq!(polluted.pkg_paths_to_root(&a, None).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_pkg_fails() {
        let graph = diamond();
        assert!(
            graph
                .count_paths_to_root(&Pkg::new("ghost", "0.0.0"), None)
                .is_err()
        );
        assert!(
            graph
                .pkg_paths_to_root(&Pkg::new("ghost", "0.0.0"), None)
                .is_err()
        );
    }

    #[test]
    fn test_self_loop_traverses_once() {
        // a depends on itself: the loop edge is walked exactly once before
        // the blocking set suppresses it, for counting and enumeration alike
        let build = || {
            let mut builder = builder();
            builder
                .add_pkg_node(PkgInfo::new("a", "1.0.0"), "a", None)
                .unwrap();
            builder.connect_dep("root-node", "a").unwrap();
            builder.connect_dep("a", "a").unwrap();
            builder.build()
        };
        let pkg = Pkg::new("a", "1.0.0");

        let paths = build().pkg_paths_to_root(&pkg, None).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(names(&paths[0]), vec!["a", "app"]);
        assert_eq!(names(&paths[1]), vec!["a", "a", "app"]);

        assert_eq!(build().count_paths_to_root(&pkg, None).unwrap(), 2);
    }
}
