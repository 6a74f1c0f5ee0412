//! Fluent, error-latching construction of [`Pattern`] values.
//!
//! The builder never panics on misuse; the first structural mistake is
//! latched and reported by [`PatternBuilder::finish`]. Full validation
//! (unbound references, connectivity) happens later, in
//! [`crate::query::planner::compile`].

use crate::model::PropertyValue;
use crate::query::ast::{
    Constraint, Direction, NodePattern, Pattern, PropRef, Quantifier, RelPattern, Var,
};
use crate::query::errors::PatternError;

/// Fluent builder for query patterns.
///
/// `label` and `prop` apply to the most recently declared node; `alias`
/// and `direction` apply to the most recently declared relationship.
#[derive(Default)]
pub struct PatternBuilder {
    pattern: Pattern,
    error: Option<PatternError>,
}

impl PatternBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a node variable.
    pub fn node(mut self, var: impl Into<Var>) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.pattern.nodes.push(NodePattern {
            var: var.into(),
            label: None,
            props: Vec::new(),
        });
        self
    }

    /// Requires a label on the most recently declared node.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.pattern.nodes.last_mut() {
            Some(node) => node.label = Some(label.into()),
            None => self.error = Some(PatternError::Invalid("label before any node")),
        }
        self
    }

    /// Adds a property-equality filter to the most recently declared node.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.pattern.nodes.last_mut() {
            Some(node) => node.props.push((name.into(), value.into())),
            None => self.error = Some(PatternError::Invalid("property before any node")),
        }
        self
    }

    /// Declares a single-hop relationship pattern of the given type.
    pub fn rel(self, from: impl Into<Var>, rel_type: impl Into<String>, to: impl Into<Var>) -> Self {
        self.push_rel(from, Some(rel_type.into()), to, Quantifier::One)
    }

    /// Declares a single-hop relationship pattern matching any type.
    pub fn rel_any(self, from: impl Into<Var>, to: impl Into<Var>) -> Self {
        self.push_rel(from, None, to, Quantifier::One)
    }

    /// Declares a one-or-more-hop relationship chain of the given type.
    pub fn rel_var_length(
        self,
        from: impl Into<Var>,
        rel_type: impl Into<String>,
        to: impl Into<Var>,
    ) -> Self {
        self.push_rel(from, Some(rel_type.into()), to, Quantifier::OneOrMore)
    }

    fn push_rel(
        mut self,
        from: impl Into<Var>,
        rel_type: Option<String>,
        to: impl Into<Var>,
        quantifier: Quantifier,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.pattern.rels.push(RelPattern {
            alias: None,
            rel_type,
            from: from.into(),
            to: to.into(),
            direction: Direction::Out,
            quantifier,
        });
        self
    }

    /// Binds the most recently declared relationship to an alias variable.
    pub fn alias(mut self, var: impl Into<Var>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.pattern.rels.last_mut() {
            Some(rel) => rel.alias = Some(var.into()),
            None => self.error = Some(PatternError::Invalid("alias before any relationship")),
        }
        self
    }

    /// Overrides the direction of the most recently declared relationship.
    pub fn direction(mut self, direction: Direction) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.pattern.rels.last_mut() {
            Some(rel) => rel.direction = direction,
            None => self.error = Some(PatternError::Invalid("direction before any relationship")),
        }
        self
    }

    /// Requires two variables' named properties to be present and equal.
    pub fn prop_eq(
        mut self,
        left_var: impl Into<Var>,
        left_prop: impl Into<String>,
        right_var: impl Into<Var>,
        right_prop: impl Into<String>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.pattern.constraints.push(Constraint::PropEq {
            left: PropRef {
                var: left_var.into(),
                prop: left_prop.into(),
            },
            right: PropRef {
                var: right_var.into(),
                prop: right_prop.into(),
            },
        });
        self
    }

    /// Requires two node variables to bind distinct nodes.
    pub fn ne(mut self, left: impl Into<Var>, right: impl Into<Var>) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.pattern.constraints.push(Constraint::NodeNe {
            left: left.into(),
            right: right.into(),
        });
        self
    }

    /// Requires two relationship aliases to bind relationships of the same
    /// type.
    pub fn same_rel_type(mut self, left: impl Into<Var>, right: impl Into<Var>) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.pattern.constraints.push(Constraint::SameRelType {
            left: left.into(),
            right: right.into(),
        });
        self
    }

    /// Returns the built pattern, or the first latched structural error.
    pub fn finish(self) -> Result<Pattern, PatternError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.pattern),
        }
    }
}
