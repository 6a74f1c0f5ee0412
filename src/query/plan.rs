//! Ordered evaluation plan produced by the planner.

use std::fmt;

use crate::model::PropertyValue;
use crate::query::ast::{Constraint, Direction, Var};

/// One binding step of a compiled plan. Every step except [`Step::Seed`]
/// only consumes variables bound by earlier steps.
#[derive(Clone, Debug)]
pub enum Step {
    /// Binds a node variable by scanning an index: the label posting list
    /// when a label is present, the full node set otherwise. Property
    /// filters are applied during the scan.
    Seed {
        /// Variable bound by the scan.
        var: Var,
        /// Optional label restricting the scan.
        label: Option<String>,
        /// Property-equality filters applied eagerly.
        props: Vec<(String, PropertyValue)>,
    },
    /// Binds a relationship (and, unless the target is already bound, the
    /// node at its far end) by enumerating the adjacency index of the
    /// bound endpoint.
    Expand {
        /// Optional alias bound to the matched relationship id.
        alias: Option<Var>,
        /// Already-bound endpoint variable the step expands from.
        from: Var,
        /// Endpoint variable at the far end.
        to: Var,
        /// Relationship type, or `None` for the wildcard.
        rel_type: Option<String>,
        /// Traversal direction relative to `from`.
        direction: Direction,
        /// Whether `to` is newly bound by this step. When `false` the step
        /// only forks per relationship already connecting the two bound
        /// endpoints.
        bind_target: bool,
    },
    /// Variable-length counterpart of [`Step::Expand`]: a bounded
    /// traversal of one or more hops, binding every distinct reachable
    /// node (or checking reachability when both endpoints are bound).
    ExpandVarLength {
        /// Already-bound endpoint variable the traversal starts from.
        from: Var,
        /// Endpoint variable at the far end.
        to: Var,
        /// Relationship type followed on every hop, or `None` for any.
        rel_type: Option<String>,
        /// Traversal direction relative to `from`, applied on every hop.
        direction: Direction,
        /// Whether `to` is newly bound by this step.
        bind_target: bool,
    },
    /// Label/property filters for a node variable first reached by an
    /// expand rather than a seed scan.
    CheckNode {
        /// The already-bound node variable.
        var: Var,
        /// Optional label the bound node must carry.
        label: Option<String>,
        /// Property-equality filters.
        props: Vec<(String, PropertyValue)>,
    },
    /// Cross-variable constraint, placed at the earliest position where
    /// all referenced variables are bound.
    Constraint(Constraint),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Seed { var, label, props } => {
                write!(f, "Seed({}", var.0)?;
                if let Some(label) = label {
                    write!(f, " :{label}")?;
                }
                if !props.is_empty() {
                    write!(f, " props={}", props.len())?;
                }
                write!(f, ")")
            }
            Step::Expand {
                from,
                to,
                rel_type,
                bind_target,
                ..
            } => write!(
                f,
                "Expand({} -[{}]-> {}{})",
                from.0,
                rel_type.as_deref().unwrap_or("*any*"),
                to.0,
                if *bind_target { "" } else { ", check" }
            ),
            Step::ExpandVarLength {
                from,
                to,
                rel_type,
                bind_target,
                ..
            } => write!(
                f,
                "ExpandVarLength({} -[{}+]-> {}{})",
                from.0,
                rel_type.as_deref().unwrap_or("*any*"),
                to.0,
                if *bind_target { "" } else { ", check" }
            ),
            Step::CheckNode { var, label, props } => {
                write!(f, "CheckNode({}", var.0)?;
                if let Some(label) = label {
                    write!(f, " :{label}")?;
                }
                if !props.is_empty() {
                    write!(f, " props={}", props.len())?;
                }
                write!(f, ")")
            }
            Step::Constraint(constraint) => {
                let [left, right] = constraint.vars();
                let op = match constraint {
                    Constraint::PropEq { .. } => "prop-eq",
                    Constraint::NodeNe { .. } => "node-ne",
                    Constraint::SameRelType { .. } => "same-rel-type",
                };
                write!(f, "Constraint({op} {} {})", left.0, right.0)
            }
        }
    }
}

/// Compiled, ordered evaluation plan. Built once per pattern and reusable
/// across evaluations against any store state.
#[derive(Clone, Debug)]
pub struct Plan {
    /// The ordered binding steps.
    pub steps: Vec<Step>,
}

impl Plan {
    /// Renders one line per step, for logging and debugging.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        for (ix, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("{ix:>2}: {step}\n"));
        }
        out
    }
}
