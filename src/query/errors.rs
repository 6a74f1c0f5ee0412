//! Structured errors emitted by pattern compilation.
//!
//! These are reported to the caller before any search begins; no partial
//! plan is ever executed. They are non-retryable without fixing the
//! pattern.

use thiserror::Error;

/// Errors produced while validating and compiling a [`crate::query::ast::Pattern`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern declares no node variables at all.
    #[error("pattern declares no node variables")]
    EmptyPattern,
    /// A variable name was declared more than once.
    #[error("duplicate variable '{var}'")]
    DuplicateVariable {
        /// The doubly declared variable.
        var: String,
    },
    /// A relationship pattern or constraint referenced a variable that was
    /// never declared.
    #[error("unknown variable '{var}' referenced in {context}")]
    UnboundVariable {
        /// The undeclared variable.
        var: String,
        /// Where the reference appeared.
        context: &'static str,
    },
    /// A one-or-more-hop pattern carried a relationship alias. A chain of
    /// hops has no single relationship id to bind the alias to.
    #[error("variable-length pattern from '{from}' to '{to}' cannot carry an alias")]
    VarLengthAliased {
        /// Declared source variable.
        from: String,
        /// Declared target variable.
        to: String,
    },
    /// A group of variables is unreachable from the rest of the pattern:
    /// no relationship pattern and no cross-variable constraint connects it.
    #[error("pattern is disconnected: variable '{var}' is unreachable from the seed")]
    DisconnectedPattern {
        /// A variable from the unreachable group.
        var: String,
    },
    /// The pattern was structurally malformed while being built.
    #[error("invalid pattern: {0}")]
    Invalid(&'static str),
}
