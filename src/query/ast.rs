//! The structured pattern model submitted to the query engine.
//!
//! A [`Pattern`] is built in-process, either directly or through
//! [`crate::query::builder::PatternBuilder`]; there is no text grammar.
//! It is validated and lowered into an ordered [`crate::query::plan::Plan`]
//! before any matching starts.

use crate::model::PropertyValue;

/// Identifier assigned to a pattern variable (node or relationship).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(pub String);

impl Var {
    /// Creates a variable from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The variable name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Var {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Direction selector for relationship patterns.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    /// The pattern source is the relationship source.
    #[default]
    Out,
    /// The pattern source is the relationship target.
    In,
    /// Either orientation matches.
    Both,
}

/// Hop quantifier for relationship patterns.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Quantifier {
    /// Exactly one hop.
    #[default]
    One,
    /// One or more chained hops of the same type and direction.
    OneOrMore,
}

/// A node variable with optional label and property-equality filters.
#[derive(Clone, Debug)]
pub struct NodePattern {
    /// The variable this pattern declares.
    pub var: Var,
    /// Optional label the bound node must carry.
    pub label: Option<String>,
    /// Property-equality filters the bound node must satisfy.
    pub props: Vec<(String, PropertyValue)>,
}

/// A relationship pattern connecting two declared node variables.
#[derive(Clone, Debug)]
pub struct RelPattern {
    /// Optional alias binding the matched relationship id. Must be absent
    /// on variable-length patterns.
    pub alias: Option<Var>,
    /// Relationship type, or `None` for the any-type wildcard.
    pub rel_type: Option<String>,
    /// Declared source node variable.
    pub from: Var,
    /// Declared target node variable.
    pub to: Var,
    /// Traversal direction relative to `from`.
    pub direction: Direction,
    /// Hop quantifier.
    pub quantifier: Quantifier,
}

/// Reference to a property of a bound variable.
#[derive(Clone, Debug)]
pub struct PropRef {
    /// The referenced variable.
    pub var: Var,
    /// The property name read off the bound entity.
    pub prop: String,
}

/// Cross-variable constraint, evaluated as soon as every referenced
/// variable is bound.
#[derive(Clone, Debug)]
pub enum Constraint {
    /// The named properties of two bound entities must be present and equal.
    PropEq {
        /// Left property reference.
        left: PropRef,
        /// Right property reference.
        right: PropRef,
    },
    /// Two node variables must be bound to distinct nodes.
    NodeNe {
        /// Left node variable.
        left: Var,
        /// Right node variable.
        right: Var,
    },
    /// Two relationship aliases must be bound to relationships of the same
    /// type.
    SameRelType {
        /// Left relationship alias.
        left: Var,
        /// Right relationship alias.
        right: Var,
    },
}

impl Constraint {
    /// The variables this constraint references, for binding-order
    /// placement and connectivity analysis.
    pub fn vars(&self) -> [&Var; 2] {
        match self {
            Constraint::PropEq { left, right } => [&left.var, &right.var],
            Constraint::NodeNe { left, right } => [left, right],
            Constraint::SameRelType { left, right } => [left, right],
        }
    }
}

/// Output field requested from a complete binding: a variable and
/// optionally a property to read off the bound entity. Without a property
/// the entity id itself is projected.
#[derive(Clone, Debug)]
pub struct Projection {
    /// The projected variable.
    pub var: Var,
    /// Optional property name.
    pub prop: Option<String>,
}

impl Projection {
    /// Projects the id of the bound entity.
    pub fn id(var: impl Into<Var>) -> Self {
        Self {
            var: var.into(),
            prop: None,
        }
    }

    /// Projects a property of the bound entity.
    pub fn prop(var: impl Into<Var>, prop: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            prop: Some(prop.into()),
        }
    }
}

/// Top-level pattern: the declared node and relationship variables plus
/// cross-variable constraints.
#[derive(Clone, Debug, Default)]
pub struct Pattern {
    /// Declared node patterns, in declaration order.
    pub nodes: Vec<NodePattern>,
    /// Declared relationship patterns, in declaration order.
    pub rels: Vec<RelPattern>,
    /// Cross-variable constraints.
    pub constraints: Vec<Constraint>,
}
