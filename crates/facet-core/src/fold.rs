//! Raw record folder: reduces a batch of assertion datoms into per-entity
//! raw attribute maps, applying cardinality-aware merge rules and the
//! null-marker algebra.
//!
//! Merge rules, per attribute:
//!
//! - cardinality-many: the working slot is a set. A nullish incoming value
//!   starts the set over (empty); a scalar is inserted; a non-empty array
//!   is unioned in. Values arriving after a null in the same pass still
//!   accumulate, so null means "reset", not "freeze".
//! - cardinality-one: a non-null incoming value replaces the scalar, unless
//!   the null marker is already set. A nullish incoming value sets the
//!   marker, and the marker persists to the end of the pass. This lets one
//!   null assertion mixed into a batch force deletion regardless of the
//!   other assertions in that batch.

use crate::types::{Datom, ENTITY_FIELD, EntityRecords, RawRecord, RawValue, ValueSet};
use facet_types::Value;
use std::collections::HashSet;
use tracing::trace;

/// Fold a batch of assertion datoms into the raw records. Datoms with
/// `added = false` are ignored here; the retraction engine handles them.
pub(crate) fn fold_assertions<'a>(
    raw: &mut EntityRecords,
    many: &HashSet<String>,
    datoms: impl IntoIterator<Item = &'a Datom>,
) {
    for datom in datoms {
        if !datom.added {
            continue;
        }
        let record = raw.entry(datom.entity.clone()).or_insert_with(|| {
            let mut record = RawRecord::new();
            record.insert(ENTITY_FIELD.to_string(), RawValue::One(datom.entity.clone()));
            record
        });
        merge_assertion(record, many.contains(&datom.attribute), datom);
    }
}

/// Merge one asserted value into an entity's record
fn merge_assertion(record: &mut RawRecord, is_many: bool, datom: &Datom) {
    trace!(attribute = %datom.attribute, value = %datom.value, is_many, "merging assertion");
    if is_many {
        merge_many(record, datom);
    } else {
        merge_one(record, datom);
    }
}

fn merge_many(record: &mut RawRecord, datom: &Datom) {
    if datom.value.is_nullish() {
        // Null resets the working set; later values in the pass start from empty.
        record.insert(datom.attribute.clone(), RawValue::Many(ValueSet::new()));
        return;
    }

    let slot = record
        .entry(datom.attribute.clone())
        .or_insert_with(|| RawValue::Many(ValueSet::new()));
    // A marker or stray scalar left in a many slot starts a fresh set.
    if slot.as_many().is_none() {
        *slot = RawValue::Many(ValueSet::new());
    }
    if let RawValue::Many(set) = slot {
        match &datom.value {
            Value::Array(items) => set.extend(items.iter().cloned()),
            scalar => {
                set.insert(scalar.clone());
            }
        }
    }
}

fn merge_one(record: &mut RawRecord, datom: &Datom) {
    if datom.value.is_nullish() {
        record.insert(datom.attribute.clone(), RawValue::Null);
        return;
    }
    match record.get(&datom.attribute) {
        // The marker wins over anything else arriving in the same pass.
        Some(RawValue::Null) => {}
        _ => {
            record.insert(datom.attribute.clone(), RawValue::One(datom.value.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn many_of(attrs: &[&str]) -> HashSet<String> {
        attrs.iter().map(|a| (*a).to_string()).collect()
    }

    #[test]
    fn folding_creates_record_with_entity_field() {
        let mut raw = EntityRecords::new();
        fold_assertions(&mut raw, &HashSet::new(), &[Datom::assert(0, "age", 32)]);

        let record = raw.get(&Value::Integer(0)).unwrap();
        assert_eq!(
            record.get(ENTITY_FIELD),
            Some(&RawValue::One(Value::Integer(0)))
        );
        assert_eq!(record.get("age"), Some(&RawValue::One(Value::Integer(32))));
    }

    #[test]
    fn cardinality_one_last_value_wins() {
        let mut raw = EntityRecords::new();
        fold_assertions(
            &mut raw,
            &HashSet::new(),
            &[Datom::assert(0, "age", 32), Datom::assert(0, "age", 33)],
        );
        let record = raw.get(&Value::Integer(0)).unwrap();
        assert_eq!(record.get("age"), Some(&RawValue::One(Value::Integer(33))));
    }

    #[test]
    fn cardinality_many_accumulates_into_set() {
        let mut raw = EntityRecords::new();
        fold_assertions(
            &mut raw,
            &many_of(&["name"]),
            &[
                Datom::assert(0, "name", "Bill"),
                Datom::assert(0, "name", "Billy"),
                Datom::assert(0, "name", "Bill"), // set deduplicates
            ],
        );
        let record = raw.get(&Value::Integer(0)).unwrap();
        let set = record.get("name").unwrap().as_many().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Value::from("Bill")));
        assert!(set.contains(&Value::from("Billy")));
    }

    #[test]
    fn array_value_unions_into_many_set() {
        let mut raw = EntityRecords::new();
        fold_assertions(
            &mut raw,
            &many_of(&["tags"]),
            &[
                Datom::assert(0, "tags", "x"),
                Datom::assert(0, "tags", vec![Value::from("y"), Value::from("z")]),
            ],
        );
        let record = raw.get(&Value::Integer(0)).unwrap();
        assert_eq!(record.get("tags").unwrap().as_many().unwrap().len(), 3);
    }

    #[test]
    fn null_marker_persists_for_cardinality_one() {
        let mut raw = EntityRecords::new();
        fold_assertions(
            &mut raw,
            &HashSet::new(),
            &[
                Datom::assert(0, "age", 32),
                Datom::assert(0, "age", Value::Null),
                Datom::assert(0, "age", 40), // must not clear the marker
            ],
        );
        let record = raw.get(&Value::Integer(0)).unwrap();
        assert_eq!(record.get("age"), Some(&RawValue::Null));
    }

    #[test]
    fn null_resets_many_set_but_later_values_accumulate() {
        let mut raw = EntityRecords::new();
        fold_assertions(
            &mut raw,
            &many_of(&["name"]),
            &[
                Datom::assert(0, "name", "Bill"),
                Datom::assert(0, "name", Value::Null),
                Datom::assert(0, "name", "Billy"),
            ],
        );
        let record = raw.get(&Value::Integer(0)).unwrap();
        let set = record.get("name").unwrap().as_many().unwrap();
        assert_eq!(set.len(), 1, "null starts the set over, it does not freeze it");
        assert!(set.contains(&Value::from("Billy")));
    }

    #[test]
    fn empty_array_and_empty_object_count_as_null() {
        let mut raw = EntityRecords::new();
        fold_assertions(
            &mut raw,
            &HashSet::new(),
            &[
                Datom::assert(0, "a", 1),
                Datom::assert(0, "a", Value::Array(vec![])),
                Datom::assert(0, "b", 2),
                Datom::assert(0, "b", Value::Object(Default::default())),
            ],
        );
        let record = raw.get(&Value::Integer(0)).unwrap();
        assert_eq!(record.get("a"), Some(&RawValue::Null));
        assert_eq!(record.get("b"), Some(&RawValue::Null));
    }

    #[test]
    fn retract_datoms_are_ignored_by_the_folder() {
        let mut raw = EntityRecords::new();
        fold_assertions(&mut raw, &HashSet::new(), &[Datom::retract(0, "age", 32)]);
        assert!(raw.is_empty());
    }
}
