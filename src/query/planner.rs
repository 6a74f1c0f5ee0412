//! Pattern compilation: validation, seed selection, and step ordering.
//!
//! The planner lowers a [`Pattern`] into an ordered [`Plan`] such that
//! every step only consumes variables bound by earlier steps. Seed
//! selection follows a simple selectivity heuristic: a concrete label
//! beats property filters, which beat an unconstrained scan. Constraints
//! are attached at the earliest position where all referenced variables
//! are bound so the search prunes as early as possible.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::query::ast::{Constraint, Direction, NodePattern, Pattern, Quantifier, Var};
use crate::query::errors::PatternError;
use crate::query::plan::{Plan, Step};

/// Compiles a pattern into an ordered evaluation plan.
///
/// Fails with a [`PatternError`] before any search begins when the pattern
/// references undeclared variables, declares a variable twice, aliases a
/// variable-length hop, or contains a group of variables connected to the
/// rest by neither a relationship pattern nor a constraint.
pub fn compile(pattern: &Pattern) -> Result<Plan, PatternError> {
    validate(pattern)?;
    check_connectivity(pattern)?;

    let node_patterns: FxHashMap<&str, &NodePattern> = pattern
        .nodes
        .iter()
        .map(|np| (np.var.as_str(), np))
        .collect();

    let mut bound: FxHashSet<String> = FxHashSet::default();
    let mut steps: Vec<Step> = Vec::new();
    let mut pending_rels: Vec<usize> = (0..pattern.rels.len()).collect();
    let mut pending_constraints: Vec<usize> = (0..pattern.constraints.len()).collect();

    let all_nodes_bound = |bound: &FxHashSet<String>| {
        pattern.nodes.iter().all(|np| bound.contains(np.var.as_str()))
    };

    while !pending_rels.is_empty() || !all_nodes_bound(&bound) {
        let next_rel = pending_rels.iter().position(|&ix| {
            let rel = &pattern.rels[ix];
            bound.contains(rel.from.as_str()) || bound.contains(rel.to.as_str())
        });

        match next_rel {
            Some(pos) => {
                let rel = &pattern.rels[pending_rels.remove(pos)];
                let from_bound = bound.contains(rel.from.as_str());
                let (from, to, direction) = if from_bound {
                    (rel.from.clone(), rel.to.clone(), rel.direction)
                } else {
                    (rel.to.clone(), rel.from.clone(), invert(rel.direction))
                };
                let bind_target = !bound.contains(to.as_str());

                match rel.quantifier {
                    Quantifier::One => {
                        if let Some(alias) = &rel.alias {
                            bound.insert(alias.0.clone());
                        }
                        steps.push(Step::Expand {
                            alias: rel.alias.clone(),
                            from,
                            to: to.clone(),
                            rel_type: rel.rel_type.clone(),
                            direction,
                            bind_target,
                        });
                    }
                    Quantifier::OneOrMore => steps.push(Step::ExpandVarLength {
                        from,
                        to: to.clone(),
                        rel_type: rel.rel_type.clone(),
                        direction,
                        bind_target,
                    }),
                }

                if bind_target {
                    bound.insert(to.0.clone());
                    let np = node_patterns[to.as_str()];
                    if np.label.is_some() || !np.props.is_empty() {
                        steps.push(Step::CheckNode {
                            var: to,
                            label: np.label.clone(),
                            props: np.props.clone(),
                        });
                    }
                }
            }
            None => {
                // No relationship touches a bound variable; seed the most
                // selective remaining node variable. This also starts the
                // plan and any component joined to it only by constraints.
                let mut candidates = pattern
                    .nodes
                    .iter()
                    .filter(|np| !bound.contains(np.var.as_str()));
                let mut seed = candidates
                    .next()
                    .expect("loop condition guarantees an unbound node variable");
                for np in candidates {
                    // Strict comparison keeps the earliest declaration on ties.
                    if (np.label.is_some(), np.props.len())
                        > (seed.label.is_some(), seed.props.len())
                    {
                        seed = np;
                    }
                }
                debug!(var = %seed.var.0, label = ?seed.label, "plan.seed");
                bound.insert(seed.var.0.clone());
                steps.push(Step::Seed {
                    var: seed.var.clone(),
                    label: seed.label.clone(),
                    props: seed.props.clone(),
                });
            }
        }

        attach_ready_constraints(pattern, &bound, &mut pending_constraints, &mut steps);
    }

    debug_assert!(pending_constraints.is_empty());
    let plan = Plan { steps };
    debug!(steps = plan.steps.len(), "plan.compiled");
    Ok(plan)
}

fn attach_ready_constraints(
    pattern: &Pattern,
    bound: &FxHashSet<String>,
    pending: &mut Vec<usize>,
    steps: &mut Vec<Step>,
) {
    pending.retain(|&ix| {
        let constraint = &pattern.constraints[ix];
        let ready = constraint
            .vars()
            .iter()
            .all(|var| bound.contains(var.as_str()));
        if ready {
            steps.push(Step::Constraint(constraint.clone()));
        }
        !ready
    });
}

fn invert(direction: Direction) -> Direction {
    match direction {
        Direction::Out => Direction::In,
        Direction::In => Direction::Out,
        Direction::Both => Direction::Both,
    }
}

fn validate(pattern: &Pattern) -> Result<(), PatternError> {
    if pattern.nodes.is_empty() {
        return Err(PatternError::EmptyPattern);
    }

    let mut node_vars: FxHashSet<&str> = FxHashSet::default();
    for np in &pattern.nodes {
        if !node_vars.insert(np.var.as_str()) {
            return Err(PatternError::DuplicateVariable {
                var: np.var.0.clone(),
            });
        }
    }

    let mut aliases: FxHashSet<&str> = FxHashSet::default();
    for rel in &pattern.rels {
        for endpoint in [&rel.from, &rel.to] {
            if !node_vars.contains(endpoint.as_str()) {
                return Err(PatternError::UnboundVariable {
                    var: endpoint.0.clone(),
                    context: "relationship pattern",
                });
            }
        }
        if let Some(alias) = &rel.alias {
            if rel.quantifier == Quantifier::OneOrMore {
                return Err(PatternError::VarLengthAliased {
                    from: rel.from.0.clone(),
                    to: rel.to.0.clone(),
                });
            }
            if node_vars.contains(alias.as_str()) || !aliases.insert(alias.as_str()) {
                return Err(PatternError::DuplicateVariable {
                    var: alias.0.clone(),
                });
            }
        }
    }

    for constraint in &pattern.constraints {
        for var in constraint.vars() {
            let is_node = node_vars.contains(var.as_str());
            let is_alias = aliases.contains(var.as_str());
            if !is_node && !is_alias {
                return Err(PatternError::UnboundVariable {
                    var: var.0.clone(),
                    context: "constraint",
                });
            }
            match constraint {
                Constraint::NodeNe { .. } if !is_node => {
                    return Err(PatternError::Invalid(
                        "node inequality constraint requires node variables",
                    ));
                }
                Constraint::SameRelType { .. } if !is_alias => {
                    return Err(PatternError::Invalid(
                        "relationship-type constraint requires relationship aliases",
                    ));
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Rejects patterns with a variable group connected to the rest by neither
/// a shared relationship pattern nor a constraint. Constraint-only links
/// are legal; the planner handles them with an additional seed step and a
/// cartesian product.
fn check_connectivity(pattern: &Pattern) -> Result<(), PatternError> {
    let mut adjacency: FxHashMap<&str, Vec<&str>> = FxHashMap::default();

    fn push<'p>(adjacency: &mut FxHashMap<&'p str, Vec<&'p str>>, a: &'p Var, b: &'p Var) {
        adjacency.entry(a.as_str()).or_default().push(b.as_str());
        adjacency.entry(b.as_str()).or_default().push(a.as_str());
    }

    for rel in &pattern.rels {
        push(&mut adjacency, &rel.from, &rel.to);
        if let Some(alias) = &rel.alias {
            push(&mut adjacency, alias, &rel.from);
        }
    }
    for constraint in &pattern.constraints {
        let [left, right] = constraint.vars();
        push(&mut adjacency, left, right);
    }

    let mut all_vars: Vec<&str> = pattern.nodes.iter().map(|np| np.var.as_str()).collect();
    all_vars.extend(pattern.rels.iter().filter_map(|r| {
        r.alias.as_ref().map(|a| a.as_str())
    }));

    let mut reached: FxHashSet<&str> = FxHashSet::default();
    let mut frontier = vec![all_vars[0]];
    reached.insert(all_vars[0]);
    while let Some(var) = frontier.pop() {
        if let Some(neighbors) = adjacency.get(var) {
            for &next in neighbors {
                if reached.insert(next) {
                    frontier.push(next);
                }
            }
        }
    }

    match all_vars.iter().find(|var| !reached.contains(*var)) {
        Some(var) => Err(PatternError::DisconnectedPattern {
            var: (*var).to_owned(),
        }),
        None => Ok(()),
    }
}
