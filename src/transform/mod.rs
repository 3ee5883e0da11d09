//! Whole-graph transformations: filtering and snapshot diffing.

mod changed;
mod filter;

pub use changed::create_changed_packages_graph;
pub use filter::{PkgFilter, filter_nodes_from_graph, filter_packages_from_graph};
