//! The package dependency graph: value types, the immutable store, its
//! traversal operations and the incremental builder.

mod builder;
mod equality;
mod paths;
mod store;
mod types;

pub use builder::DepGraphBuilder;
pub use equality::EqualsOptions;
pub use store::DepGraph;
pub use types::{
    NodeInfo, Pkg, PkgInfo, PkgManager, Repository, VersionProvenance,
    VersionProvenanceProperty,
};

pub(crate) use store::NodeSpec;
