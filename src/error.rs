//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::model::NodeId;
use crate::query::errors::PatternError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by the store and the query engine.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Relationship creation referenced a node that does not exist. The
    /// store is left untouched.
    #[error("relationship endpoint {node} does not exist")]
    DanglingEndpoint {
        /// The missing endpoint id.
        node: NodeId,
    },
    /// An id lookup missed. When raised from inside query evaluation this
    /// indicates an index/store inconsistency and is not recoverable.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Strict projection requested a property the bound entity does not
    /// carry.
    #[error("variable '{var}' has no property '{prop}'")]
    MissingProperty {
        /// The projected variable.
        var: String,
        /// The missing property name.
        prop: String,
    },
    /// The pattern failed to compile; no search was started.
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// An internal invariant of the evaluator was violated.
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}
