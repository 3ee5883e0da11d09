//! Subtree caching for cycle-aware graph walks
//!
//! A walk that reuses finished subtrees must not reuse one that was
//! truncated because of a cycle the current caller is part of. Each cache
//! entry therefore remembers the node ids of the cycles that started at its
//! node: the entry is served only to callers whose ancestors avoid all of
//! them. Nodes inside somebody else's cycle are not cached at all; their
//! result depends on where the walk entered the cycle.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;

pub(crate) type Cycle = Vec<NodeIndex>;

/// Cycles collected beneath one node, split by where they start.
pub(crate) struct PartitionedCycles {
    /// Cycles whose first node is the node itself; they are fully contained
    /// in its subtree and resolved there.
    pub starting_here: Vec<Cycle>,
    /// Cycles that continue above the node; they propagate to its parent.
    pub passing_through: Vec<Cycle>,
}

pub(crate) fn partition_cycles(node: NodeIndex, cycles: Vec<Cycle>) -> PartitionedCycles {
    let mut starting_here = Vec::new();
    let mut passing_through = Vec::new();
    for cycle in cycles {
        if cycle.first() == Some(&node) {
            starting_here.push(cycle);
        } else {
            passing_through.push(cycle);
        }
    }
    PartitionedCycles {
        starting_here,
        passing_through,
    }
}

struct CacheEntry<T> {
    item: T,
    /// Node ids of the cycles this item was computed under; `None` for an
    /// item computed in a cycle-free context.
    cycle_nodes: Option<HashSet<NodeIndex>>,
}

pub(crate) struct TraversalCache<T> {
    map: HashMap<NodeIndex, CacheEntry<T>>,
}

impl<T> TraversalCache<T> {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Cache an item computed with no cycles anywhere beneath it.
    pub(crate) fn insert_plain(&mut self, node: NodeIndex, item: T) {
        self.map.insert(
            node,
            CacheEntry {
                item,
                cycle_nodes: None,
            },
        );
    }

    /// Cache an item according to the cycles collected beneath its node.
    pub(crate) fn insert(
        &mut self,
        node: NodeIndex,
        item: T,
        partitioned: &PartitionedCycles,
    ) {
        if !partitioned.starting_here.is_empty() {
            let cycle_nodes = partitioned
                .starting_here
                .iter()
                .flatten()
                .copied()
                .collect();
            self.map.insert(
                node,
                CacheEntry {
                    item,
                    cycle_nodes: Some(cycle_nodes),
                },
            );
        } else if partitioned.passing_through.is_empty() {
            self.insert_plain(node, item);
        }
        // a node inside somebody else's cycle is not cacheable
    }

    /// Look up a cached item valid for a caller whose current path is
    /// described by `on_path`. The probe runs over the entry's (small)
    /// cycle-node set, never over the caller's full ancestor chain.
    pub(crate) fn get(
        &self,
        node: NodeIndex,
        on_path: impl Fn(NodeIndex) -> bool,
    ) -> Option<&T> {
        let entry = self.map.get(&node)?;
        if let Some(cycle_nodes) = &entry.cycle_nodes
            && cycle_nodes.iter().any(|&cycle_node| on_path(cycle_node))
        {
            return None;
        }
        Some(&entry.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(value: u32) -> NodeIndex {
        NodeIndex::new(value as usize)
    }

    #[test]
    fn test_partition_cycles() {
        let cycles = vec![vec![idx(2), idx(3)], vec![idx(1), idx(2), idx(3)]];
        let partitioned = partition_cycles(idx(2), cycles);

        assert_eq!(partitioned.starting_here, vec![vec![idx(2), idx(3)]]);
        assert_eq!(partitioned.passing_through, vec![vec![idx(1), idx(2), idx(3)]]);
    }

    #[test]
    fn test_plain_entry_ignores_ancestors() {
        let mut cache = TraversalCache::new();
        cache.insert_plain(idx(1), "one");

        let ancestors = HashSet::from([idx(7), idx(8)]);
        assert_eq!(
            cache.get(idx(1), |node| ancestors.contains(&node)),
            Some(&"one")
        );
    }

    #[test]
    fn test_cycle_entry_blocked_for_exposed_ancestors() {
        let mut cache = TraversalCache::new();
        let partitioned = partition_cycles(idx(2), vec![vec![idx(2), idx(3), idx(4)]]);
        cache.insert(idx(2), "two", &partitioned);

        // ancestors untouched by the cycle may reuse the entry
        let clear = HashSet::from([idx(9)]);
        assert_eq!(
            cache.get(idx(2), |node| clear.contains(&node)),
            Some(&"two")
        );
        // ancestors on the cycle may not
        let exposed = HashSet::from([idx(3)]);
        assert_eq!(cache.get(idx(2), |node| exposed.contains(&node)), None);
    }

    #[test]
    fn test_node_inside_foreign_cycle_is_not_cached() {
        let mut cache = TraversalCache::new();
        let partitioned = partition_cycles(idx(3), vec![vec![idx(2), idx(3), idx(4)]]);
        cache.insert(idx(3), "three", &partitioned);

        assert_eq!(cache.get(idx(3), |_| false), None);
    }
}
