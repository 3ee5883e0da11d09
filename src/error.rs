use miette::Diagnostic;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = DepGraphError> = std::result::Result<T, E>;

/// A malformed input document.
///
/// Raised only while loading and validating serialized graph data; the core
/// algorithms trust a validated graph's invariants and never produce this.
#[derive(Error, Debug, Diagnostic)]
#[error("{message}")]
#[diagnostic(
    code(pkg_graph::validation_error),
    help("The graph document violates the schema; fix the producer of this data")
)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum DepGraphError {
    #[error("no such pkg: {0}")]
    #[diagnostic(
        code(pkg_graph::not_found),
        help("The package id is not part of this graph")
    )]
    PkgNotFound(String),

    #[error("no such node: {0}")]
    #[diagnostic(
        code(pkg_graph::not_found),
        help("The node id is not part of this graph")
    )]
    NodeNotFound(String),

    #[error("cyclic graphs are not supported by this operation")]
    #[diagnostic(
        code(pkg_graph::unsupported_cycle),
        help("Remove the cycles first (see cut_cycles) or use a cycle-tolerant mode")
    )]
    UnsupportedCycle,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error("JSON (de)serialization error")]
    #[diagnostic(
        code(pkg_graph::json_error),
        help("The document is not valid JSON for this schema")
    )]
    Json(#[from] serde_json::Error),
}
