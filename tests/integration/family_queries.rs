//! End-to-end pattern queries over a small family tree.

use std::collections::BTreeSet;

use umbra::{Database, PatternBuilder, Projection, Row, Value};

/// Builds the Simpson family graph.
///
/// Relationships: `olderThan` Homer→Marge, Bart→Lisa, Lisa→Maggie;
/// `parentOf` from both Homer and Marge to each of Bart, Lisa, Maggie.
fn family() -> Database {
    let db = Database::new();
    let homer = db.create_node(["Person"], [("name", "Homer"), ("sex", "male")]);
    let marge = db.create_node(["Person"], [("name", "Marge"), ("sex", "female")]);
    let bart = db.create_node(["Person"], [("name", "Bart"), ("sex", "male")]);
    let lisa = db.create_node(["Person"], [("name", "Lisa"), ("sex", "female")]);
    let maggie = db.create_node(["Person"], [("name", "Maggie"), ("sex", "female")]);

    let no_props: [(&str, &str); 0] = [];
    db.create_relationship(homer, "olderThan", marge, no_props)
        .unwrap();
    db.create_relationship(bart, "olderThan", lisa, no_props)
        .unwrap();
    db.create_relationship(lisa, "olderThan", maggie, no_props)
        .unwrap();
    for parent in [homer, marge] {
        for child in [bart, lisa, maggie] {
            db.create_relationship(parent, "parentOf", child, no_props)
                .unwrap();
        }
    }
    db
}

fn string(value: &Value) -> &str {
    match value {
        Value::String(s) => s,
        other => panic!("expected string value, got {other:?}"),
    }
}

fn name_pairs(rows: &[Row]) -> BTreeSet<(String, String)> {
    rows.iter()
        .map(|row| (string(&row[0]).to_string(), string(&row[1]).to_string()))
        .collect()
}

#[test]
fn older_sisters_of_maggie_via_shared_mother() {
    let db = family();
    let pattern = PatternBuilder::new()
        .node("mother")
        .label("Person")
        .prop("sex", "female")
        .node("maggie")
        .label("Person")
        .prop("name", "Maggie")
        .node("sister")
        .label("Person")
        .prop("sex", "female")
        .rel("mother", "parentOf", "maggie")
        .rel("mother", "parentOf", "sister")
        .rel_var_length("sister", "olderThan", "maggie")
        .finish()
        .unwrap();

    let rows = db
        .query(&pattern, &[Projection::prop("sister", "name")])
        .unwrap();
    let names: Vec<&str> = rows.iter().map(|row| string(&row[0])).collect();
    assert_eq!(names, vec!["Lisa"]);
}

#[test]
fn fathers_and_daughters() {
    let db = family();
    let pattern = PatternBuilder::new()
        .node("father")
        .label("Person")
        .prop("sex", "male")
        .node("daughter")
        .label("Person")
        .prop("sex", "female")
        .rel("father", "parentOf", "daughter")
        .finish()
        .unwrap();

    let rows = db
        .query(
            &pattern,
            &[
                Projection::prop("father", "name"),
                Projection::prop("daughter", "name"),
            ],
        )
        .unwrap();
    let expected: BTreeSet<(String, String)> = [("Homer", "Lisa"), ("Homer", "Maggie")]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
    assert_eq!(name_pairs(&rows), expected);
    assert_eq!(rows.len(), 2);
}

#[test]
fn every_person_is_listed_exactly_once() {
    let db = family();
    let pattern = PatternBuilder::new()
        .node("person")
        .label("Person")
        .finish()
        .unwrap();

    let rows = db
        .query(
            &pattern,
            &[
                Projection::prop("person", "name"),
                Projection::prop("person", "sex"),
            ],
        )
        .unwrap();
    assert_eq!(rows.len(), 5);

    let people = name_pairs(&rows);
    let expected: BTreeSet<(String, String)> = [
        ("Homer", "male"),
        ("Marge", "female"),
        ("Bart", "male"),
        ("Lisa", "female"),
        ("Maggie", "female"),
    ]
    .into_iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect();
    assert_eq!(people, expected);
}

#[test]
fn parents_sharing_their_childs_sex() {
    let db = family();
    let pattern = PatternBuilder::new()
        .node("parent")
        .label("Person")
        .node("child")
        .label("Person")
        .rel("parent", "parentOf", "child")
        .prop_eq("parent", "sex", "child", "sex")
        .finish()
        .unwrap();

    let rows = db
        .query(
            &pattern,
            &[
                Projection::prop("parent", "name"),
                Projection::prop("child", "name"),
            ],
        )
        .unwrap();
    let expected: BTreeSet<(String, String)> =
        [("Homer", "Bart"), ("Marge", "Lisa"), ("Marge", "Maggie")]
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
    assert_eq!(name_pairs(&rows), expected);
    assert_eq!(rows.len(), 3);
}

#[test]
fn pairs_sharing_the_homer_marge_relationship_type() {
    let db = family();
    // The reference pair itself is a legitimate match, so Homer→Marge shows
    // up in the results alongside the other olderThan pairs.
    let pattern = PatternBuilder::new()
        .node("homer")
        .label("Person")
        .prop("name", "Homer")
        .node("marge")
        .label("Person")
        .prop("name", "Marge")
        .node("src")
        .label("Person")
        .node("dst")
        .label("Person")
        .rel_any("homer", "marge")
        .alias("ref")
        .rel_any("src", "dst")
        .alias("r")
        .same_rel_type("r", "ref")
        .ne("src", "dst")
        .finish()
        .unwrap();

    let rows = db
        .query(
            &pattern,
            &[
                Projection::prop("src", "name"),
                Projection::prop("dst", "name"),
            ],
        )
        .unwrap();
    let expected: BTreeSet<(String, String)> =
        [("Homer", "Marge"), ("Bart", "Lisa"), ("Lisa", "Maggie")]
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
    assert_eq!(name_pairs(&rows), expected);
    assert_eq!(rows.len(), 3);
}

#[test]
fn repeated_evaluation_returns_identical_rows() {
    let db = family();
    let pattern = PatternBuilder::new()
        .node("parent")
        .label("Person")
        .node("child")
        .label("Person")
        .rel("parent", "parentOf", "child")
        .finish()
        .unwrap();
    let projections = [
        Projection::prop("parent", "name"),
        Projection::prop("child", "name"),
    ];

    let first = db.query(&pattern, &projections).unwrap();
    assert_eq!(first.len(), 6);
    for _ in 0..3 {
        assert_eq!(db.query(&pattern, &projections).unwrap(), first);
    }
}
