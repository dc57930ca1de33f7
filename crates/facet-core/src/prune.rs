//! Null filter and pruner, run after folding and retraction have both been
//! applied in an update:
//!
//! 1. every declared cardinality-many attribute absent from a record is
//!    synthesized as an empty set, so many-attributes are always present
//!    once an entity is in scope;
//! 2. lingering null markers are resolved: to an empty set on a
//!    cardinality-many attribute, to key removal on anything else;
//! 3. entities whose only remaining key is the entity id, or whose only
//!    non-id attributes are empty sets, are removed outright.

use crate::types::{ENTITY_FIELD, EntityRecords, RawRecord, RawValue, ValueSet};
use std::collections::HashSet;
use tracing::trace;

/// Resolve null markers and drop entities left with no meaningful attributes
pub(crate) fn filter_and_prune(raw: &mut EntityRecords, many: &HashSet<String>) {
    for record in raw.values_mut() {
        filter_record(record, many);
    }
    raw.retain(|entity, record| {
        let keep = has_meaningful_attributes(record);
        if !keep {
            trace!(entity = %entity, "pruning empty entity");
        }
        keep
    });
}

fn filter_record(record: &mut RawRecord, many: &HashSet<String>) {
    for attr in many {
        record
            .entry(attr.clone())
            .or_insert_with(|| RawValue::Many(ValueSet::new()));
    }

    let marked: Vec<String> = record
        .iter()
        .filter(|(_, slot)| matches!(slot, RawValue::Null))
        .map(|(attr, _)| attr.clone())
        .collect();
    for attr in marked {
        if many.contains(&attr) {
            record.insert(attr, RawValue::Many(ValueSet::new()));
        } else {
            record.remove(&attr);
        }
    }
}

fn has_meaningful_attributes(record: &RawRecord) -> bool {
    record
        .iter()
        .any(|(attr, slot)| attr != ENTITY_FIELD && !slot.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::fold_assertions;
    use crate::types::Datom;
    use facet_types::Value;

    fn many_of(attrs: &[&str]) -> HashSet<String> {
        attrs.iter().map(|a| (*a).to_string()).collect()
    }

    #[test]
    fn declared_many_attributes_are_synthesized_empty() {
        let many = many_of(&["name"]);
        let mut raw = EntityRecords::new();
        fold_assertions(&mut raw, &many, &[Datom::assert(0, "age", 32)]);
        filter_and_prune(&mut raw, &many);

        let record = raw.get(&Value::Integer(0)).unwrap();
        assert_eq!(record.get("name"), Some(&RawValue::Many(ValueSet::new())));
    }

    #[test]
    fn lingering_marker_removes_cardinality_one_key() {
        let many = HashSet::new();
        let mut raw = EntityRecords::new();
        fold_assertions(
            &mut raw,
            &many,
            &[
                Datom::assert(0, "age", 32),
                Datom::assert(0, "nickname", Value::Null),
            ],
        );
        filter_and_prune(&mut raw, &many);

        let record = raw.get(&Value::Integer(0)).unwrap();
        assert!(!record.contains_key("nickname"));
        assert!(record.contains_key("age"));
        assert!(
            !record.values().any(|slot| matches!(slot, RawValue::Null)),
            "no marker survives the prune pass"
        );
    }

    #[test]
    fn entity_with_only_id_is_pruned() {
        let many = HashSet::new();
        let mut raw = EntityRecords::new();
        fold_assertions(&mut raw, &many, &[Datom::assert(0, "age", Value::Null)]);
        filter_and_prune(&mut raw, &many);
        assert!(raw.is_empty());
    }

    #[test]
    fn entity_with_only_empty_sets_is_pruned() {
        let many = many_of(&["name"]);
        let mut raw = EntityRecords::new();
        fold_assertions(&mut raw, &many, &[Datom::assert(0, "name", Value::Null)]);
        filter_and_prune(&mut raw, &many);
        assert!(raw.is_empty());
    }

    #[test]
    fn entity_with_empty_set_but_other_attributes_survives() {
        let many = many_of(&["name"]);
        let mut raw = EntityRecords::new();
        fold_assertions(
            &mut raw,
            &many,
            &[
                Datom::assert(0, "name", Value::Null),
                Datom::assert(0, "age", 32),
            ],
        );
        filter_and_prune(&mut raw, &many);

        let record = raw.get(&Value::Integer(0)).unwrap();
        assert_eq!(record.get("name"), Some(&RawValue::Many(ValueSet::new())));
        assert_eq!(record.get("age"), Some(&RawValue::One(Value::Integer(32))));
    }
}
