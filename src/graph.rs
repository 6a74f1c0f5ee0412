//! In-memory graph store with derived adjacency and label indices.
//!
//! The store owns the authoritative node and relationship sets and keeps
//! three derived indices consistent with them at all times: label to node
//! ids, (type, source) to relationship ids, and (type, target) to
//! relationship ids. Posting lists preserve insertion order so that scans
//! are deterministic for a fixed store state.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::model::{Labels, Node, NodeId, Properties, PropertyValue, RelId, Relationship};

/// Posting lists keyed by node id, one level below a type key.
type AdjacencyIndex = FxHashMap<String, FxHashMap<NodeId, Vec<RelId>>>;

/// The graph store. Writers take `&mut self`; query evaluation borrows the
/// store immutably for the lifetime of one enumeration, so the borrow
/// checker enforces the single-writer/multiple-reader discipline. Shared
/// ownership across threads goes through [`crate::db::Database`].
#[derive(Debug, Default)]
pub struct Graph {
    nodes: FxHashMap<NodeId, Node>,
    relationships: FxHashMap<RelId, Relationship>,
    /// All node ids in insertion order; backs unlabeled seed scans.
    node_order: Vec<NodeId>,
    /// Label name to node ids in insertion order.
    label_index: FxHashMap<String, Vec<NodeId>>,
    /// Untyped adjacency, serving wildcard relationship lookups.
    outgoing: FxHashMap<NodeId, Vec<RelId>>,
    incoming: FxHashMap<NodeId, Vec<RelId>>,
    /// (type, source) and (type, target) posting lists.
    typed_from: AdjacencyIndex,
    typed_to: AdjacencyIndex,
    next_node_id: NodeId,
    next_rel_id: RelId,
}

impl Graph {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node with the given labels and properties, returning its id.
    pub fn create_node<L, P, K, V>(&mut self, labels: L, properties: P) -> NodeId
    where
        L: IntoIterator,
        L::Item: Into<String>,
        P: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PropertyValue>,
    {
        self.next_node_id += 1;
        let id = self.next_node_id;
        // Labels are a set; duplicate inputs collapse so each posting list
        // holds the node at most once.
        let labels = {
            let mut out = Labels::new();
            for label in labels {
                let label = label.into();
                if !out.contains(&label) {
                    out.push(label);
                }
            }
            out
        };
        let properties: Properties = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for label in &labels {
            self.label_index.entry(label.clone()).or_default().push(id);
        }
        self.node_order.push(id);
        self.nodes.insert(
            id,
            Node {
                id,
                labels,
                properties,
            },
        );
        id
    }

    /// Creates a directed relationship of the given type between two
    /// existing nodes. Fails with [`GraphError::DanglingEndpoint`] when an
    /// endpoint id is unknown; the store is not modified in that case.
    pub fn create_relationship<P, K, V>(
        &mut self,
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
        if !self.nodes.contains_key(&source) {
            return Err(GraphError::DanglingEndpoint { node: source });
        }
        if !self.nodes.contains_key(&target) {
            return Err(GraphError::DanglingEndpoint { node: target });
        }
        self.next_rel_id += 1;
        let id = self.next_rel_id;
        let type_name = type_name.into();
        self.outgoing.entry(source).or_default().push(id);
        self.incoming.entry(target).or_default().push(id);
        self.typed_from
            .entry(type_name.clone())
            .or_default()
            .entry(source)
            .or_default()
            .push(id);
        self.typed_to
            .entry(type_name.clone())
            .or_default()
            .entry(target)
            .or_default()
            .push(id);
        self.relationships.insert(
            id,
            Relationship {
                id,
                type_name,
                source,
                target,
                properties: properties
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            },
        );
        Ok(id)
    }

    /// Removes every node, relationship, and index entry. Id counters are
    /// not reset, so ids held across a clear never alias new entities.
    pub fn clear(&mut self) {
        debug!(
            nodes = self.nodes.len(),
            relationships = self.relationships.len(),
            "store.clear"
        );
        self.nodes.clear();
        self.relationships.clear();
        self.node_order.clear();
        self.label_index.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.typed_from.clear();
        self.typed_to.clear();
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(GraphError::NotFound("node"))
    }

    /// Looks up a relationship by id.
    pub fn relationship(&self, id: RelId) -> Result<&Relationship> {
        self.relationships
            .get(&id)
            .ok_or(GraphError::NotFound("relationship"))
    }

    /// All node ids in insertion order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_order
    }

    /// Node ids carrying the given label, in insertion order.
    pub fn nodes_with_label(&self, label: &str) -> &[NodeId] {
        self.label_index
            .get(label)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Relationships leaving `source`, optionally restricted to a type.
    /// `None` is the any-type wildcard.
    pub fn relationships_from(&self, source: NodeId, type_name: Option<&str>) -> &[RelId] {
        match type_name {
            Some(ty) => self
                .typed_from
                .get(ty)
                .and_then(|by_node| by_node.get(&source))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            None => self.outgoing.get(&source).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Relationships arriving at `target`, optionally restricted to a type.
    pub fn relationships_to(&self, target: NodeId, type_name: Option<&str>) -> &[RelId] {
        match type_name {
            Some(ty) => self
                .typed_to
                .get(ty)
                .and_then(|by_node| by_node.get(&target))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            None => self.incoming.get(&target).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Sets (or replaces) a property on a node.
    pub fn set_node_property(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NotFound("node"))?;
        node.properties.insert(name.into(), value.into());
        Ok(())
    }

    /// Adds a label to a node, updating the label index. Adding a label the
    /// node already carries is a no-op.
    pub fn add_node_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NotFound("node"))?;
        if node.has_label(&label) {
            return Ok(());
        }
        node.labels.push(label.clone());
        self.label_index.entry(label).or_default().push(id);
        Ok(())
    }

    /// Sets (or replaces) a property on a relationship.
    pub fn set_relationship_property(
        &mut self,
        id: RelId,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let rel = self
            .relationships
            .get_mut(&id)
            .ok_or(GraphError::NotFound("relationship"))?;
        rel.properties.insert(name.into(), value.into());
        Ok(())
    }

    /// Number of nodes currently stored.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of relationships currently stored.
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}
