//! # pkg-graph: package dependency graphs for security analysis
//!
//! Models the directed dependency graph of a scanned project as produced by
//! package managers such as npm, maven or pip. Several real package
//! managers permit circular dependencies, so nothing here assumes a DAG:
//! every traversal is cycle-safe and every deep walk runs on an explicit
//! stack rather than native recursion.
//!
//! ## Main components
//!
//! - **Graph store** ([`DepGraph`]): immutable nodes, packages and ordered
//!   edges plus derived lookup indices
//! - **Builder** ([`DepGraphBuilder`]): incremental construction
//! - **Schema** ([`create_from_json`], [`DepGraphData`]): versioned JSON
//!   wire format with lossless upgrade of the previous major
//! - **Cycles** ([`cycles::find_cycle`], [`cycles::cut_cycles`],
//!   [`cycles::reconnect_cycles`]): generic detection and reversible
//!   removal
//! - **Legacy** ([`legacy::dep_tree_to_graph`],
//!   [`legacy::graph_to_dep_tree`]): nested dependency-tree interchange
//! - **Transforms** ([`transform::filter_packages_from_graph`],
//!   [`transform::create_changed_packages_graph`]): filtered and diffed
//!   subgraphs
//!
//! ## Building and querying a graph
//!
//! ```
//! use pkg_graph::{DepGraphBuilder, Pkg, PkgInfo, PkgManager};
//!
//! # fn main() -> pkg_graph::Result<()> {
//! let mut builder = DepGraphBuilder::new(
//!     PkgManager::new("npm"),
//!     Some(PkgInfo::new("my-app", "1.0.0")),
//! );
//! builder.add_pkg_node(PkgInfo::new("express", "4.17.1"), "express", None)?;
//! builder.add_pkg_node(PkgInfo::new("accepts", "1.3.7"), "accepts", None)?;
//! builder.connect_dep("root-node", "express")?;
//! builder.connect_dep("express", "accepts")?;
//! let dep_graph = builder.build();
//!
//! assert!(!dep_graph.has_cycles());
//! assert!(dep_graph.is_transitive(&Pkg::new("accepts", "1.3.7"))?);
//! assert_eq!(
//!     dep_graph.count_paths_to_root(&Pkg::new("accepts", "1.3.7"), None)?,
//!     1
//! );
//!
//! let paths = dep_graph.pkg_paths_to_root(&Pkg::new("accepts", "1.3.7"), None)?;
//! let names: Vec<&str> = paths[0].iter().map(|pkg| pkg.name.as_str()).collect();
//! assert_eq!(names, ["accepts", "express", "my-app"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Round-tripping through JSON
//!
//! ```
//! use pkg_graph::{DepGraphBuilder, EqualsOptions, PkgInfo, PkgManager, create_from_json};
//!
//! # fn main() -> pkg_graph::Result<()> {
//! let mut builder = DepGraphBuilder::new(
//!     PkgManager::new("npm"),
//!     Some(PkgInfo::new("my-app", "1.0.0")),
//! );
//! builder.add_pkg_node(PkgInfo::new("left-pad", "1.3.0"), "left-pad", None)?;
//! builder.connect_dep("root-node", "left-pad")?;
//! let dep_graph = builder.build();
//!
//! let json = serde_json::to_string(&dep_graph)?;
//! let reloaded = create_from_json(&json)?;
//! assert!(dep_graph.equals(&reloaded, EqualsOptions::default()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Removing and restoring cycles
//!
//! ```
//! use pkg_graph::cycles::{cut_cycles, reconnect_cycles};
//! use pkg_graph::{DepGraphBuilder, PkgInfo, PkgManager};
//!
//! # fn main() -> pkg_graph::Result<()> {
//! let mut builder = DepGraphBuilder::new(
//!     PkgManager::new("npm"),
//!     Some(PkgInfo::new("my-app", "1.0.0")),
//! );
//! builder.add_pkg_node(PkgInfo::new("a", "1.0.0"), "a", None)?;
//! builder.add_pkg_node(PkgInfo::new("b", "1.0.0"), "b", None)?;
//! builder.connect_dep("root-node", "a")?;
//! builder.connect_dep("a", "b")?;
//! builder.connect_dep("b", "a")?;
//! let cyclic = builder.build();
//! assert!(cyclic.has_cycles());
//!
//! let acyclic = cut_cycles(&cyclic)?;
//! assert!(!acyclic.has_cycles());
//!
//! let restored = reconnect_cycles(&acyclic)?;
//! assert_eq!(cyclic.to_data(), restored.to_data());
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod cycles;
pub mod error;
pub mod graph;
pub mod legacy;
pub mod schema;
pub mod spinner;
pub mod transform;

pub use error::{DepGraphError, Result, ValidationError};
pub use graph::{
    DepGraph, DepGraphBuilder, EqualsOptions, NodeInfo, Pkg, PkgInfo, PkgManager,
    Repository, VersionProvenance, VersionProvenanceProperty,
};
pub use schema::{DepGraphData, GraphNodeData, NodeDep, create_from_data, create_from_json};
