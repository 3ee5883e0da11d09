//! Crate-wide constants
//!
//! Reserved identifiers and tuning values shared by the store, the schema
//! layer and the cycle transformations.

use std::time::Duration;

/// Wire-format schema versioning
pub mod schema {
    /// Schema version written by [`crate::graph::DepGraph::to_data`]
    pub const VERSION: &str = "2.0.0";

    /// Schema versions accepted by the loader; the 1.x major (list-encoded
    /// `pkgs`/`nodes`) is upgraded in place to the current shape
    pub const SUPPORTED_RANGE: &str = ">=1.0.0, <3.0.0";
}

/// Reserved graph identifiers
pub mod graph {
    /// The package id reserved for the root package in both schema majors
    pub const ROOT_PKG_ID: &str = "root";

    /// Node id given to the root node by [`crate::graph::DepGraphBuilder`]
    /// unless a caller supplies its own
    pub const DEFAULT_ROOT_NODE_ID: &str = "root-node";

    /// Package name used when a builder is created without a root package
    pub const DEFAULT_ROOT_PKG_NAME: &str = "_root";

    /// Version paired with [`DEFAULT_ROOT_PKG_NAME`]
    pub const DEFAULT_ROOT_PKG_VERSION: &str = "0.0.0";
}

/// Reserved node label keys
pub mod labels {
    /// Comma-joined `<ordinal>@@<targetNodeId>` tokens recorded by
    /// [`crate::cycles::cut_cycles`] on each node that lost an edge
    pub const REMOVED_CYCLIC_DEPS: &str = "removed-cyclic-deps";

    /// Marks nodes truncated by cycle-tolerant conversions
    pub const PRUNED: &str = "pruned";

    /// [`PRUNED`] value for nodes truncated because they closed a cycle
    pub const PRUNED_CYCLIC: &str = "cyclic";
}

/// Cycle-cut edge token encoding
pub mod cycles {
    /// Separates the ordinal from the target node id inside a removed-edge
    /// token; node ids may contain single `@`s (they embed pkg ids)
    pub const EDGE_TOKEN_DELIMITER: &str = "@@";

    /// Suffix appended to duplicated node ids by
    /// [`crate::legacy::map_to_non_cyclic_graph`]
    pub const PRUNED_NODE_SUFFIX: &str = "_pruned";
}

/// Cooperative-yield tuning
pub mod spinner {
    use super::*;

    /// Elapsed busy time after which a whole-graph transformation yields
    pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(10);
}
