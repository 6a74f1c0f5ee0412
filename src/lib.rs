//! Umbra is an embedded, in-memory property graph with a declarative
//! pattern-matching query engine.
//!
//! Nodes carry labels and properties, relationships are directed, typed, and
//! carry properties of their own. Queries are built programmatically as
//! [`Pattern`](query::ast::Pattern) values, compiled into an ordered
//! [`Plan`](query::plan::Plan), and evaluated lazily with backtracking.
//!
//! ```
//! use umbra::{Database, PatternBuilder, Projection, Value};
//!
//! let db = Database::new();
//! let homer = db.create_node(["Person"], [("name", "Homer")]);
//! let bart = db.create_node(["Person"], [("name", "Bart")]);
//! db.create_relationship(homer, "parentOf", bart, [("since", 1980i64)])?;
//!
//! let pattern = PatternBuilder::new()
//!     .node("parent")
//!     .node("child")
//!     .rel("parent", "parentOf", "child")
//!     .finish()?;
//! let rows = db.query(&pattern, &[Projection::prop("child", "name")])?;
//! assert_eq!(rows, vec![vec![Value::String("Bart".into())]]);
//! # Ok::<(), umbra::GraphError>(())
//! ```

pub mod db;
pub mod error;
pub mod graph;
pub mod model;
pub mod query;

pub use db::Database;
pub use error::{GraphError, Result};
pub use graph::Graph;
pub use model::{Node, NodeId, Properties, PropertyValue, RelId, Relationship};
pub use query::{
    Binding, BoundEntity, Direction, Executor, Pattern, PatternBuilder, PatternError, Plan,
    Projection, Quantifier, Row, Value, Var,
};
