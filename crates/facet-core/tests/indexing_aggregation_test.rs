//! Indexing and aggregation integration tests: re-keyed views, schema
//! projection, and the point mutations that resolve aggregate vocabulary.

use facet_core::{
    Aggregator, Datom, EntityMap, FacetError, RecordSchema, Value,
};

fn identified() -> EntityMap {
    EntityMap::builder().index_by("identifier").from_facts(&[
        Datom::assert(0, "identifier", "a"),
        Datom::assert(0, "age", 32),
        Datom::assert(1, "identifier", "b"),
        Datom::assert(1, "age", 33),
    ])
}

#[test]
fn indexed_view_resolves_by_attribute_value() {
    let map = identified();
    let aggregate = map.get(&Value::from("a")).unwrap();
    assert_eq!(aggregate.get("age"), Some(&Value::Integer(32)));
    assert_eq!(aggregate.get("db/id"), Some(&Value::Integer(0)));
    assert!(map.get(&Value::Integer(0)).is_none(), "entity keys are not view keys");
}

#[test]
fn reindexing_changes_view_keys_but_not_raw_data() {
    let map = identified();
    let by_age = map.index_by("age");

    assert_eq!(map.raw_data(), by_age.raw_data());
    assert!(by_age.contains_key(&Value::Integer(32)));
    assert!(by_age.contains_key(&Value::Integer(33)));
    assert!(!by_age.contains_key(&Value::from("a")));
    assert_eq!(
        by_age.get_attribute(&Value::Integer(32), "identifier"),
        Some(&Value::from("a"))
    );
}

#[test]
fn entities_without_the_index_attribute_are_dropped_from_view_only() {
    let map = identified().update(&[Datom::assert(2, "age", 40)]);
    assert_eq!(map.raw_data().len(), 3);
    assert_eq!(map.len(), 2, "entity 2 has no identifier, so no view entry");
}

fn person_schema() -> RecordSchema {
    RecordSchema::new()
        .required_field("name")
        .field("age")
        .field_with_default("tags", Value::Array(vec![]))
        .rename("person/name", "name")
        .rename("person/age", "age")
        .rename("person/tags", "tags")
}

#[test]
fn schema_aggregation_projects_renamed_fields_with_defaults() {
    let map = EntityMap::builder()
        .cardinality_many(["person/tags"])
        .schema(person_schema())
        .from_facts(&[
            Datom::assert(0, "person/name", "Bill"),
            Datom::assert(0, "person/age", 32),
        ]);

    let aggregate = map.get(&Value::Integer(0)).unwrap();
    assert_eq!(aggregate.get("name"), Some(&Value::from("Bill")));
    assert_eq!(aggregate.get("age"), Some(&Value::Integer(32)));
    assert_eq!(
        aggregate.get("tags"),
        Some(&Value::Array(vec![])),
        "absent cardinality-many field defaults to empty, not null"
    );
}

#[test]
fn unrepresentable_entities_stay_raw_but_leave_the_view() {
    let map = EntityMap::builder().schema(person_schema()).from_facts(&[
        Datom::assert(0, "person/name", "Bill"),
        Datom::assert(1, "person/age", 33), // no name: unrepresentable
    ]);

    assert_eq!(map.raw_data().len(), 2);
    assert_eq!(map.len(), 1);
    assert!(map.get(&Value::Integer(1)).is_none());
}

#[test]
fn aggregate_by_swaps_projection_over_unchanged_raw_data() {
    let plain = EntityMap::builder().from_facts(&[
        Datom::assert(0, "person/name", "Bill"),
        Datom::assert(0, "person/age", 32),
    ]);
    let projected = plain.aggregate_by(Aggregator::Schema(person_schema()), Some("name"));

    assert_eq!(plain.raw_data(), projected.raw_data());
    assert_eq!(
        projected.get_attribute(&Value::from("Bill"), "age"),
        Some(&Value::Integer(32))
    );
}

#[test]
fn put_attribute_translates_field_names_and_unions_by_default() {
    let map = EntityMap::builder()
        .cardinality_many(["person/tags"])
        .schema(person_schema())
        .from_facts(&[
            Datom::assert(0, "person/name", "Bill"),
            Datom::assert(0, "person/tags", "old"),
        ]);

    let unioned = map
        .put_attribute(&Value::Integer(0), "tags", Value::from("new"), false)
        .unwrap();
    assert_eq!(
        unioned.get_attribute(&Value::Integer(0), "tags"),
        Some(&Value::Array(vec![Value::from("new"), Value::from("old")]))
    );

    let overwritten = map
        .put_attribute(&Value::Integer(0), "tags", Value::from("new"), true)
        .unwrap();
    assert_eq!(
        overwritten.get_attribute(&Value::Integer(0), "tags"),
        Some(&Value::Array(vec![Value::from("new")]))
    );
}

#[test]
fn put_attribute_resolves_through_the_index() {
    let map = identified();
    let next = map
        .put_attribute(&Value::from("a"), "age", Value::Integer(40), false)
        .unwrap();
    assert_eq!(
        next.get_attribute(&Value::from("a"), "age"),
        Some(&Value::Integer(40))
    );
}

#[test]
fn put_attribute_reports_tagged_failures() {
    let map = identified();
    let err = map
        .put_attribute(&Value::from("zz"), "age", Value::Integer(1), false)
        .unwrap_err();
    assert_eq!(err, FacetError::UnresolvedIndexKey { key: Value::from("zz") });

    let schema_map = EntityMap::builder()
        .schema(person_schema())
        .from_facts(&[Datom::assert(0, "person/name", "Bill")]);
    let err = schema_map
        .put_attribute(&Value::Integer(0), "salary", Value::Integer(1), false)
        .unwrap_err();
    assert_eq!(err, FacetError::UnresolvedField { field: "salary".to_string() });
}

#[test]
fn delete_through_an_index_key_removes_the_backing_entity() {
    let map = identified();
    let next = map.delete(&Value::from("a"));
    assert!(!next.contains_key(&Value::from("a")));
    assert!(next.raw_data().get(&Value::Integer(0)).is_none());
    assert!(next.contains_key(&Value::from("b")));
}

#[test]
fn index_field_matching_no_entities_yields_an_empty_view() {
    let map = identified().index_by("no-such-attribute");
    assert!(map.is_empty());
    assert_eq!(map.raw_data().len(), 2, "raw data is unaffected by indexing");
}
