#![forbid(unsafe_code)]

//! Declarative pattern matching over an in-memory graph.
//!
//! A query is a [`Pattern`](ast::Pattern) of node variables, relationship
//! patterns, and cross-variable constraints. [`planner::compile`] turns the
//! pattern into an ordered [`Plan`](plan::Plan), and
//! [`Executor`](executor::Executor) evaluates the plan lazily against a
//! [`Graph`](crate::graph::Graph).

/// Pattern model: variables, node and relationship patterns, constraints.
pub mod ast;

/// Fluent builder for constructing patterns without writing raw AST.
pub mod builder;

/// Lazy plan evaluation and row projection.
pub mod executor;

/// Structured pattern compilation errors.
pub mod errors;

/// Ordered execution plan representation.
pub mod plan;

/// Pattern validation and plan construction.
pub mod planner;

pub use ast::{Constraint, Direction, Pattern, Projection, PropRef, Quantifier, Var};
pub use builder::PatternBuilder;
pub use errors::PatternError;
pub use executor::{Binding, BoundEntity, Executor, Row, Value};
pub use plan::{Plan, Step};
pub use planner::compile;
