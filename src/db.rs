//! Thread-safe database handle wrapping a [`Graph`].

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::debug;

use crate::error::Result;
use crate::graph::Graph;
use crate::model::{NodeId, Properties, PropertyValue, RelId};
use crate::query::ast::{Pattern, Projection};
use crate::query::executor::{self, Executor, Row};
use crate::query::planner;

/// Shared, thread-safe graph store.
///
/// Writes take an exclusive lock; pattern evaluation runs entirely under a
/// single read lock, so one query never observes a half-applied mutation.
/// Many readers may evaluate concurrently.
#[derive(Default)]
pub struct Database {
    graph: RwLock<Graph>,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node with the given labels and properties, returning its id.
    pub fn create_node<L, P, K, V>(&self, labels: L, properties: P) -> NodeId
    where
        L: IntoIterator,
        L::Item: Into<String>,
        P: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        self.graph.write().create_node(labels, properties)
    }

    /// Creates a relationship between two existing nodes.
    ///
    /// Fails with [`GraphError::DanglingEndpoint`] if either endpoint does
    /// not exist; the store is left unchanged in that case.
    ///
    /// [`GraphError::DanglingEndpoint`]: crate::error::GraphError::DanglingEndpoint
    pub fn create_relationship<P, K, V>(
        &self,
        source: NodeId,
        type_name: impl Into<String>,
        target: NodeId,
        properties: P,
    ) -> Result<RelId>
    where
        P: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        self.graph
            .write()
            .create_relationship(source, type_name, target, properties)
    }

    /// Sets or replaces a property on an existing node.
    pub fn set_node_property(
        &self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.graph.write().set_node_property(id, name, value)
    }

    /// Adds a label to an existing node.
    pub fn add_node_label(&self, id: NodeId, label: impl Into<String>) -> Result<()> {
        self.graph.write().add_node_label(id, label)
    }

    /// Sets or replaces a property on an existing relationship.
    pub fn set_relationship_property(
        &self,
        id: RelId,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.graph.write().set_relationship_property(id, name, value)
    }

    /// Removes every node and relationship.
    pub fn clear(&self) {
        self.graph.write().clear();
    }

    /// Returns a read guard over the underlying graph.
    ///
    /// Useful for multi-step inspection under a single consistent view.
    pub fn read(&self) -> RwLockReadGuard<'_, Graph> {
        self.graph.read()
    }

    /// Returns a node's properties, cloned out of the store.
    pub fn node_properties(&self, id: NodeId) -> Result<Properties> {
        Ok(self.graph.read().node(id)?.properties.clone())
    }

    /// Compiles and evaluates a pattern, collecting all projected rows.
    ///
    /// Missing projected properties yield [`Value::Null`].
    ///
    /// [`Value::Null`]: crate::query::executor::Value::Null
    pub fn query(&self, pattern: &Pattern, projections: &[Projection]) -> Result<Vec<Row>> {
        let plan = planner::compile(pattern)?;
        let graph = self.graph.read();
        let executor = Executor::new(&graph);
        let rows = executor.rows(&plan, projections).collect::<Result<Vec<_>>>()?;
        debug!(rows = rows.len(), "db.query");
        Ok(rows)
    }

    /// Like [`Database::query`], but a missing projected property is an
    /// error instead of a null.
    pub fn query_strict(&self, pattern: &Pattern, projections: &[Projection]) -> Result<Vec<Row>> {
        let plan = planner::compile(pattern)?;
        let graph = self.graph.read();
        let executor = Executor::new(&graph);
        let mut rows = Vec::new();
        for binding in executor.matches(&plan) {
            rows.push(executor::project_strict(&graph, &binding?, projections)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyValue;
    use crate::query::builder::PatternBuilder;
    use crate::query::executor::Value;

    fn props(pairs: &[(&str, &str)]) -> Vec<(String, PropertyValue)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::from(*v)))
            .collect()
    }

    #[test]
    fn query_projects_rows_under_one_read_lock() {
        let db = Database::new();
        let a = db.create_node(["Person"], props(&[("name", "Ada")]));
        let b = db.create_node(["Person"], props(&[("name", "Grace")]));
        db.create_relationship(a, "knows", b, props(&[])).unwrap();

        let pattern = PatternBuilder::new()
            .node("x")
            .label("Person")
            .node("y")
            .rel("x", "knows", "y")
            .finish()
            .unwrap();
        let rows = db
            .query(&pattern, &[Projection::prop("x", "name"), Projection::prop("y", "name")])
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![
                Value::String("Ada".into()),
                Value::String("Grace".into())
            ]]
        );
    }

    #[test]
    fn strict_query_surfaces_missing_property() {
        let db = Database::new();
        db.create_node(["Person"], props(&[("name", "Ada")]));

        let pattern = PatternBuilder::new()
            .node("x")
            .label("Person")
            .finish()
            .unwrap();
        let err = db
            .query_strict(&pattern, &[Projection::prop("x", "age")])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::GraphError::MissingProperty { .. }
        ));
    }
}
