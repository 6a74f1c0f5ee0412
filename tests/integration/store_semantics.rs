//! Store-level invariants: determinism, construction-order independence,
//! clear semantics, cycle-safe traversal, and dangling-endpoint rejection.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use umbra::{Database, Graph, GraphError, PatternBuilder, Projection, Value};

fn string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => panic!("expected string value, got {other:?}"),
    }
}

/// Inserts the same ring of nodes in the given order and returns the set of
/// (from, to) name pairs the query engine matches over it.
fn ring_edges_matched(insertion_order: &[usize]) -> BTreeSet<(String, String)> {
    const SIZE: usize = 6;
    let db = Database::new();
    let mut ids = vec![0u64; SIZE];
    for &i in insertion_order {
        ids[i] = db.create_node(["Item"], [("name", format!("item-{i}"))]);
    }
    let no_props: [(&str, &str); 0] = [];
    for i in 0..SIZE {
        db.create_relationship(ids[i], "next", ids[(i + 1) % SIZE], no_props)
            .unwrap();
    }

    let pattern = PatternBuilder::new()
        .node("a")
        .label("Item")
        .node("b")
        .label("Item")
        .rel("a", "next", "b")
        .finish()
        .unwrap();
    db.query(
        &pattern,
        &[Projection::prop("a", "name"), Projection::prop("b", "name")],
    )
    .unwrap()
    .iter()
    .map(|row| (string(&row[0]), string(&row[1])))
    .collect()
}

#[test]
fn match_set_is_independent_of_insertion_order() {
    let baseline = ring_edges_matched(&[0, 1, 2, 3, 4, 5]);
    assert_eq!(baseline.len(), 6);

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut order: Vec<usize> = (0..6).collect();
    for _ in 0..10 {
        order.shuffle(&mut rng);
        assert_eq!(ring_edges_matched(&order), baseline, "order {order:?}");
    }
}

#[test]
fn clear_removes_everything_and_keeps_ids_fresh() {
    let mut graph = Graph::new();
    let a = graph.create_node(["Item"], [("name", "a")]);
    let b = graph.create_node(["Item"], [("name", "b")]);
    let no_props: [(&str, &str); 0] = [];
    graph.create_relationship(a, "next", b, no_props).unwrap();

    graph.clear();
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.relationship_count(), 0);
    assert!(graph.node(a).is_err());
    assert!(graph.nodes_with_label("Item").is_empty());

    // Ids from before the clear are never reissued.
    let c = graph.create_node(["Item"], [("name", "c")]);
    assert!(c > b);
}

#[test]
fn variable_length_match_terminates_on_a_cycle() {
    let db = Database::new();
    let ids: Vec<_> = (0..4)
        .map(|i| db.create_node(["Item"], [("name", format!("item-{i}"))]))
        .collect();
    let no_props: [(&str, &str); 0] = [];
    for i in 0..4 {
        db.create_relationship(ids[i], "next", ids[(i + 1) % 4], no_props)
            .unwrap();
    }

    let pattern = PatternBuilder::new()
        .node("start")
        .prop("name", "item-0")
        .node("reached")
        .rel_var_length("start", "next", "reached")
        .finish()
        .unwrap();
    let rows = db
        .query(&pattern, &[Projection::prop("reached", "name")])
        .unwrap();

    // Every node on the ring is reachable, the start itself included since
    // the cycle comes back around. Each exactly once.
    let reached: BTreeSet<String> = rows.iter().map(|row| string(&row[0])).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(
        reached,
        (0..4).map(|i| format!("item-{i}")).collect::<BTreeSet<_>>()
    );
}

#[test]
fn duplicate_label_input_scans_the_node_once() {
    let db = Database::new();
    db.create_node(["Person", "Person"], [("name", "Homer")]);

    let pattern = PatternBuilder::new()
        .node("p")
        .label("Person")
        .finish()
        .unwrap();
    let rows = db
        .query(&pattern, &[Projection::prop("p", "name")])
        .unwrap();
    assert_eq!(rows, vec![vec![Value::String("Homer".into())]]);
}

#[test]
fn dangling_endpoints_are_rejected_without_side_effects() {
    let mut graph = Graph::new();
    let a = graph.create_node(["Item"], [("name", "a")]);
    let missing = a + 1000;
    let no_props: [(&str, &str); 0] = [];

    let err = graph
        .create_relationship(a, "next", missing, no_props)
        .unwrap_err();
    assert!(matches!(err, GraphError::DanglingEndpoint { node } if node == missing));

    let err = graph
        .create_relationship(missing, "next", a, no_props)
        .unwrap_err();
    assert!(matches!(err, GraphError::DanglingEndpoint { node } if node == missing));

    assert_eq!(graph.relationship_count(), 0);
    assert!(graph.relationships_from(a, None).is_empty());
    assert!(graph.relationships_to(a, None).is_empty());
}

#[test]
fn projected_values_serialize_with_stable_tags() {
    let value = Value::String("Lisa".into());
    assert_eq!(
        serde_json::to_string(&value).unwrap(),
        r#"{"t":"string","v":"Lisa"}"#
    );
    assert_eq!(serde_json::to_string(&Value::Null).unwrap(), r#"{"t":"null"}"#);
}

proptest! {
    // Chains of distinct names; the engine must match every adjacent pair
    // exactly once, no matter how the nodes were interleaved at insert time.
    #[test]
    fn chain_queries_are_deterministic(len in 2usize..8, seed in any::<u64>()) {
        let mut order: Vec<usize> = (0..len).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let db = Database::new();
        let mut ids = vec![0u64; len];
        for &i in &order {
            ids[i] = db.create_node(["Item"], [("name", format!("item-{i}"))]);
        }
        let no_props: [(&str, &str); 0] = [];
        for i in 0..len - 1 {
            db.create_relationship(ids[i], "next", ids[i + 1], no_props).unwrap();
        }

        let pattern = PatternBuilder::new()
            .node("a")
            .node("b")
            .rel("a", "next", "b")
            .finish()
            .unwrap();
        let projections = [Projection::prop("a", "name"), Projection::prop("b", "name")];

        let rows = db.query(&pattern, &projections).unwrap();
        prop_assert_eq!(rows.len(), len - 1);
        let pairs: BTreeSet<(String, String)> = rows
            .iter()
            .map(|row| (string(&row[0]), string(&row[1])))
            .collect();
        let expected: BTreeSet<(String, String)> = (0..len - 1)
            .map(|i| (format!("item-{i}"), format!("item-{}", i + 1)))
            .collect();
        prop_assert_eq!(pairs, expected);

        // Re-running the same plan yields the identical row sequence.
        prop_assert_eq!(db.query(&pattern, &projections).unwrap(), rows);
    }
}
