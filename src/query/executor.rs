//! Plan execution: the backtracking matcher and the result projector.
//!
//! A compiled [`Plan`] is turned into a chain of lazy binding streams, one
//! per step. The [`Matches`] iterator pulls complete bindings through the
//! chain on demand; dropping it abandons the search with nothing
//! materialized ahead of the pull, which is what makes early termination
//! free. For a fixed store state the emission order is deterministic
//! because every index scan walks insertion-ordered posting lists.

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::model::{NodeId, PropertyValue, RelId};
use crate::query::ast::{Constraint, Direction, Projection, PropRef};
use crate::query::plan::{Plan, Step};

/// Runtime value flowing out of a projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum Value {
    /// Absent marker: the bound entity does not carry the projected
    /// property. Graph properties are not schema-enforced, so this is a
    /// regular outcome, not an error.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer value.
    Int(i64),
    /// 64-bit floating point value.
    Float(f64),
    /// UTF-8 string value.
    String(String),
    /// Identifier of a bound node.
    Node(NodeId),
    /// Identifier of a bound relationship.
    Relationship(RelId),
}

impl From<&PropertyValue> for Value {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Int(i) => Value::Int(*i),
            PropertyValue::Float(f) => Value::Float(*f),
            PropertyValue::String(s) => Value::String(s.clone()),
        }
    }
}

/// Single output row: one [`Value`] per projection entry, in declaration
/// order.
pub type Row = Vec<Value>;

/// Concrete entity a pattern variable is bound to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BoundEntity {
    /// A node id.
    Node(NodeId),
    /// A relationship id.
    Relationship(RelId),
}

/// Assignment of pattern variables to concrete entities. Complete bindings
/// are emitted by [`Matches`]; callers read them through the accessors and
/// never mutate them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Binding {
    slots: BTreeMap<String, BoundEntity>,
}

impl Binding {
    /// The entity bound to `var`, if any.
    pub fn get(&self, var: &str) -> Option<BoundEntity> {
        self.slots.get(var).copied()
    }

    /// The node id bound to `var`, if `var` is bound to a node.
    pub fn node(&self, var: &str) -> Option<NodeId> {
        match self.get(var) {
            Some(BoundEntity::Node(id)) => Some(id),
            _ => None,
        }
    }

    /// The relationship id bound to `var`, if `var` is bound to a
    /// relationship.
    pub fn relationship(&self, var: &str) -> Option<RelId> {
        match self.get(var) {
            Some(BoundEntity::Relationship(id)) => Some(id),
            _ => None,
        }
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates bound variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, BoundEntity)> {
        self.slots.iter().map(|(var, entity)| (var.as_str(), *entity))
    }

    fn insert(&mut self, var: &str, entity: BoundEntity) {
        self.slots.insert(var.to_owned(), entity);
    }
}

trait BindingStream {
    fn try_next(&mut self) -> Result<Option<Binding>>;
}

type BoxBindingStream<'g> = Box<dyn BindingStream + 'g>;

/// Executes compiled plans against a borrowed store. The borrow spans one
/// query's full enumeration, so no writer can interleave with the
/// traversal's index reads.
pub struct Executor<'g> {
    graph: &'g Graph,
}

impl<'g> Executor<'g> {
    /// Creates an executor over the given store.
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    /// Builds the lazy sequence of complete bindings for a plan.
    pub fn matches(&self, plan: &Plan) -> Matches<'g> {
        let mut stream: BoxBindingStream<'g> = Box::new(InitStream { done: false });
        for step in &plan.steps {
            stream = match step {
                Step::Seed { var, label, props } => Box::new(SeedStream::new(
                    self.graph,
                    stream,
                    var.as_str(),
                    label.as_deref(),
                    props,
                )),
                Step::Expand {
                    alias,
                    from,
                    to,
                    rel_type,
                    direction,
                    bind_target,
                } => Box::new(ExpandStream {
                    graph: self.graph,
                    input: stream,
                    alias: alias.as_ref().map(|a| a.0.clone()),
                    from: from.0.clone(),
                    to: to.0.clone(),
                    rel_type: rel_type.clone(),
                    direction: *direction,
                    bind_target: *bind_target,
                    current: None,
                    rels: Vec::new(),
                    index: 0,
                }),
                Step::ExpandVarLength {
                    from,
                    to,
                    rel_type,
                    direction,
                    bind_target,
                } => Box::new(VarExpandStream {
                    graph: self.graph,
                    input: stream,
                    from: from.0.clone(),
                    to: to.0.clone(),
                    rel_type: rel_type.clone(),
                    direction: *direction,
                    bind_target: *bind_target,
                    current: None,
                    reached: Vec::new(),
                    index: 0,
                }),
                Step::CheckNode { var, label, props } => Box::new(CheckStream {
                    graph: self.graph,
                    input: stream,
                    eval: CheckEval::Node {
                        var: var.0.clone(),
                        label: label.clone(),
                        props: props.clone(),
                    },
                }),
                Step::Constraint(constraint) => Box::new(CheckStream {
                    graph: self.graph,
                    input: stream,
                    eval: CheckEval::Constraint(constraint.clone()),
                }),
            };
        }
        Matches { stream }
    }

    /// Builds the lazy sequence of projected rows for a plan.
    pub fn rows(&self, plan: &Plan, projections: &[Projection]) -> Rows<'g> {
        Rows {
            graph: self.graph,
            matches: self.matches(plan),
            projections: projections.to_vec(),
        }
    }
}

/// Lazy sequence of complete bindings. Finite; dropping it early abandons
/// the search. Re-run the query to restart enumeration.
pub struct Matches<'g> {
    stream: BoxBindingStream<'g>,
}

impl Iterator for Matches<'_> {
    type Item = Result<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.try_next().transpose()
    }
}

/// Lazy sequence of projected rows.
pub struct Rows<'g> {
    graph: &'g Graph,
    matches: Matches<'g>,
    projections: Vec<Projection>,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.matches.next()? {
            Ok(binding) => Some(project(self.graph, &binding, &self.projections)),
            Err(err) => Some(Err(err)),
        }
    }
}

/// Projects a complete binding to the requested fields. A projection
/// without a property name yields the bound entity's id; a missing
/// property yields [`Value::Null`].
pub fn project(graph: &Graph, binding: &Binding, projections: &[Projection]) -> Result<Row> {
    project_inner(graph, binding, projections, false)
}

/// Like [`project`], but a missing property fails with
/// [`GraphError::MissingProperty`] instead of yielding the absent marker.
pub fn project_strict(graph: &Graph, binding: &Binding, projections: &[Projection]) -> Result<Row> {
    project_inner(graph, binding, projections, true)
}

fn project_inner(
    graph: &Graph,
    binding: &Binding,
    projections: &[Projection],
    strict: bool,
) -> Result<Row> {
    let mut row = Row::with_capacity(projections.len());
    for projection in projections {
        let entity = binding
            .get(projection.var.as_str())
            .ok_or(GraphError::Internal("projection references unbound variable"))?;
        let value = match &projection.prop {
            None => match entity {
                BoundEntity::Node(id) => Value::Node(id),
                BoundEntity::Relationship(id) => Value::Relationship(id),
            },
            Some(prop) => {
                let stored = match entity {
                    BoundEntity::Node(id) => graph.node(id)?.property(prop),
                    BoundEntity::Relationship(id) => graph.relationship(id)?.property(prop),
                };
                match stored {
                    Some(value) => Value::from(value),
                    None if strict => {
                        return Err(GraphError::MissingProperty {
                            var: projection.var.0.clone(),
                            prop: prop.clone(),
                        })
                    }
                    None => Value::Null,
                }
            }
        };
        row.push(value);
    }
    Ok(row)
}

/// Yields one empty binding, then ends. Root of every stream chain.
struct InitStream {
    done: bool,
}

impl BindingStream for InitStream {
    fn try_next(&mut self) -> Result<Option<Binding>> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        Ok(Some(Binding::default()))
    }
}

struct SeedStream<'g> {
    graph: &'g Graph,
    input: BoxBindingStream<'g>,
    var: String,
    /// Raw index scan: the label posting list, or every node id.
    ids: Vec<NodeId>,
    props: Vec<(String, PropertyValue)>,
    current: Option<Binding>,
    index: usize,
}

impl<'g> SeedStream<'g> {
    fn new(
        graph: &'g Graph,
        input: BoxBindingStream<'g>,
        var: &str,
        label: Option<&str>,
        props: &[(String, PropertyValue)],
    ) -> Self {
        let ids = match label {
            Some(label) => graph.nodes_with_label(label),
            None => graph.node_ids(),
        }
        .to_vec();
        Self {
            graph,
            input,
            var: var.to_owned(),
            ids,
            props: props.to_vec(),
            current: None,
            index: 0,
        }
    }
}

impl BindingStream for SeedStream<'_> {
    fn try_next(&mut self) -> Result<Option<Binding>> {
        loop {
            if let Some(row) = self.current.as_ref() {
                while self.index < self.ids.len() {
                    let id = self.ids[self.index];
                    self.index += 1;
                    // Property filters apply during the scan, before any
                    // child binding is produced.
                    let node = self.graph.node(id)?;
                    if !self
                        .props
                        .iter()
                        .all(|(name, value)| node.property(name) == Some(value))
                    {
                        continue;
                    }
                    let mut child = row.clone();
                    child.insert(&self.var, BoundEntity::Node(id));
                    return Ok(Some(child));
                }
                self.current = None;
            }
            let Some(row) = self.input.try_next()? else {
                return Ok(None);
            };
            self.current = Some(row);
            self.index = 0;
        }
    }
}

struct ExpandStream<'g> {
    graph: &'g Graph,
    input: BoxBindingStream<'g>,
    alias: Option<String>,
    from: String,
    to: String,
    rel_type: Option<String>,
    direction: Direction,
    bind_target: bool,
    current: Option<Binding>,
    rels: Vec<RelId>,
    index: usize,
}

impl ExpandStream<'_> {
    fn candidates(&self, start: NodeId) -> Vec<RelId> {
        let ty = self.rel_type.as_deref();
        match self.direction {
            Direction::Out => self.graph.relationships_from(start, ty).to_vec(),
            Direction::In => self.graph.relationships_to(start, ty).to_vec(),
            Direction::Both => {
                // A self-loop sits in both adjacency lists; fork it once.
                let mut seen = FxHashSet::default();
                let mut rels = Vec::new();
                for &rel in self
                    .graph
                    .relationships_from(start, ty)
                    .iter()
                    .chain(self.graph.relationships_to(start, ty))
                {
                    if seen.insert(rel) {
                        rels.push(rel);
                    }
                }
                rels
            }
        }
    }
}

impl BindingStream for ExpandStream<'_> {
    fn try_next(&mut self) -> Result<Option<Binding>> {
        loop {
            if let Some(row) = self.current.as_ref() {
                while self.index < self.rels.len() {
                    let rel_id = self.rels[self.index];
                    self.index += 1;
                    let rel = self.graph.relationship(rel_id)?;
                    let start = require_node(row, &self.from)?;
                    let neighbor = match self.direction {
                        Direction::Out => rel.target,
                        Direction::In => rel.source,
                        Direction::Both => rel.other_endpoint(start),
                    };
                    if !self.bind_target && require_node(row, &self.to)? != neighbor {
                        continue;
                    }
                    let mut child = row.clone();
                    if let Some(alias) = &self.alias {
                        child.insert(alias, BoundEntity::Relationship(rel_id));
                    }
                    if self.bind_target {
                        child.insert(&self.to, BoundEntity::Node(neighbor));
                    }
                    return Ok(Some(child));
                }
                self.current = None;
            }
            let Some(row) = self.input.try_next()? else {
                return Ok(None);
            };
            let start = require_node(&row, &self.from)?;
            self.rels = self.candidates(start);
            self.index = 0;
            self.current = Some(row);
        }
    }
}

struct VarExpandStream<'g> {
    graph: &'g Graph,
    input: BoxBindingStream<'g>,
    from: String,
    to: String,
    rel_type: Option<String>,
    direction: Direction,
    bind_target: bool,
    current: Option<Binding>,
    reached: Vec<NodeId>,
    index: usize,
}

impl BindingStream for VarExpandStream<'_> {
    fn try_next(&mut self) -> Result<Option<Binding>> {
        loop {
            if let Some(row) = self.current.as_ref() {
                if self.index < self.reached.len() {
                    let id = self.reached[self.index];
                    self.index += 1;
                    let mut child = row.clone();
                    child.insert(&self.to, BoundEntity::Node(id));
                    return Ok(Some(child));
                }
                self.current = None;
            }
            let Some(row) = self.input.try_next()? else {
                return Ok(None);
            };
            let start = require_node(&row, &self.from)?;
            let reached = reachable(self.graph, start, self.rel_type.as_deref(), self.direction)?;
            if self.bind_target {
                self.reached = reached;
                self.index = 0;
                self.current = Some(row);
            } else {
                // Both endpoints bound: this is a reachability check.
                let expected = require_node(&row, &self.to)?;
                if reached.contains(&expected) {
                    return Ok(Some(row));
                }
            }
        }
    }
}

/// Every distinct node reachable from `start` in one or more hops along
/// relationships of the given type and direction, in breadth-first index
/// order. Each node appears exactly once; a node already visited is never
/// re-expanded, which bounds the traversal on cyclic data. `start` itself
/// is included only when some chain of hops leads back to it.
fn reachable(
    graph: &Graph,
    start: NodeId,
    rel_type: Option<&str>,
    direction: Direction,
) -> Result<Vec<NodeId>> {
    let mut reached: Vec<NodeId> = Vec::new();
    let mut emitted: FxHashSet<NodeId> = FxHashSet::default();
    let mut expanded: FxHashSet<NodeId> = FxHashSet::default();
    let mut frontier: VecDeque<NodeId> = VecDeque::new();
    expanded.insert(start);
    frontier.push_back(start);

    while let Some(node) = frontier.pop_front() {
        let hops: Vec<RelId> = match direction {
            Direction::Out => graph.relationships_from(node, rel_type).to_vec(),
            Direction::In => graph.relationships_to(node, rel_type).to_vec(),
            Direction::Both => graph
                .relationships_from(node, rel_type)
                .iter()
                .chain(graph.relationships_to(node, rel_type))
                .copied()
                .collect(),
        };
        for rel_id in hops {
            let rel = graph.relationship(rel_id)?;
            let neighbor = match direction {
                Direction::Out => rel.target,
                Direction::In => rel.source,
                Direction::Both => rel.other_endpoint(node),
            };
            if emitted.insert(neighbor) {
                reached.push(neighbor);
            }
            if expanded.insert(neighbor) {
                frontier.push_back(neighbor);
            }
        }
    }
    Ok(reached)
}

enum CheckEval {
    Node {
        var: String,
        label: Option<String>,
        props: Vec<(String, PropertyValue)>,
    },
    Constraint(Constraint),
}

struct CheckStream<'g> {
    graph: &'g Graph,
    input: BoxBindingStream<'g>,
    eval: CheckEval,
}

impl CheckStream<'_> {
    fn passes(&self, row: &Binding) -> Result<bool> {
        match &self.eval {
            CheckEval::Node { var, label, props } => {
                let node = self.graph.node(require_node(row, var)?)?;
                if let Some(label) = label {
                    if !node.has_label(label) {
                        return Ok(false);
                    }
                }
                Ok(props
                    .iter()
                    .all(|(name, value)| node.property(name) == Some(value)))
            }
            CheckEval::Constraint(Constraint::PropEq { left, right }) => {
                let left = self.resolve_prop(row, left)?;
                let right = self.resolve_prop(row, right)?;
                // Equality against an absent property never holds.
                Ok(matches!((left, right), (Some(l), Some(r)) if l == r))
            }
            CheckEval::Constraint(Constraint::NodeNe { left, right }) => {
                Ok(require_node(row, left.as_str())? != require_node(row, right.as_str())?)
            }
            CheckEval::Constraint(Constraint::SameRelType { left, right }) => {
                let left = self.graph.relationship(require_rel(row, left.as_str())?)?;
                let right = self.graph.relationship(require_rel(row, right.as_str())?)?;
                Ok(left.type_name == right.type_name)
            }
        }
    }

    fn resolve_prop<'a>(
        &'a self,
        row: &Binding,
        prop_ref: &PropRef,
    ) -> Result<Option<&'a PropertyValue>> {
        match row.get(prop_ref.var.as_str()) {
            Some(BoundEntity::Node(id)) => Ok(self.graph.node(id)?.property(&prop_ref.prop)),
            Some(BoundEntity::Relationship(id)) => {
                Ok(self.graph.relationship(id)?.property(&prop_ref.prop))
            }
            None => Err(GraphError::Internal("constraint references unbound variable")),
        }
    }
}

impl BindingStream for CheckStream<'_> {
    fn try_next(&mut self) -> Result<Option<Binding>> {
        loop {
            let Some(row) = self.input.try_next()? else {
                return Ok(None);
            };
            if self.passes(&row)? {
                return Ok(Some(row));
            }
        }
    }
}

fn require_node(row: &Binding, var: &str) -> Result<NodeId> {
    match row.get(var) {
        Some(BoundEntity::Node(id)) => Ok(id),
        _ => Err(GraphError::Internal("step source variable is not bound to a node")),
    }
}

fn require_rel(row: &Binding, var: &str) -> Result<RelId> {
    match row.get(var) {
        Some(BoundEntity::Relationship(id)) => Ok(id),
        _ => Err(GraphError::Internal("alias is not bound to a relationship")),
    }
}
