//! Versioned JSON wire format: data shapes, loading and validation.

mod data;
mod load;

pub use data::{DepGraphData, GraphNodeData, NodeDep};
pub use load::{create_from_data, create_from_json};
