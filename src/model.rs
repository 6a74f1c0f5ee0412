//! Core entity types shared by the store and the query engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Identifier of a node. Assigned on creation, stable, never reused.
pub type NodeId = u64;
/// Identifier of a relationship. Assigned on creation, stable, never reused.
pub type RelId = u64;

/// Label set carried by a node. Almost every node has exactly one label.
pub type Labels = SmallVec<[String; 2]>;

/// Property map keyed by property name.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Scalar value stored under a property name on a node or relationship.
///
/// Properties are not schema-enforced; any entity may carry any subset of
/// property names, each with any value type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer value.
    Int(i64),
    /// 64-bit floating point value.
    Float(f64),
    /// UTF-8 string value.
    String(String),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

/// A node: an entity with zero or more labels and a property map.
///
/// Identity is immutable; labels and properties may be updated through the
/// store after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Stable identifier assigned by the store.
    pub id: NodeId,
    /// Labels attached to this node.
    pub labels: Labels,
    /// Property map.
    pub properties: Properties,
}

impl Node {
    /// Returns the value of the named property, if present.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Returns `true` when the node carries the given label.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// A relationship: a typed, directed, property-bearing edge between two
/// nodes that exist in the same store.
#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    /// Stable identifier assigned by the store.
    pub id: RelId,
    /// The single relationship type.
    pub type_name: String,
    /// Source node id.
    pub source: NodeId,
    /// Target node id.
    pub target: NodeId,
    /// Property map.
    pub properties: Properties,
}

impl Relationship {
    /// Returns the value of the named property, if present.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Given one endpoint, returns the opposite one. A self-loop returns
    /// the same id.
    pub fn other_endpoint(&self, node: NodeId) -> NodeId {
        if node == self.source {
            self.target
        } else {
            self.source
        }
    }
}
