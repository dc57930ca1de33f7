//! Retraction engine: applies retract datoms against existing raw records.
//!
//! Rules, in order:
//!
//! - the reserved entity-id attribute is never removable;
//! - a nullish retract value clears the attribute entirely (cardinality-many
//!   to the empty set, cardinality-one by removing the key);
//! - a retract value exactly equal to the existing value (including set
//!   equality for multi-valued attributes) removes the key;
//! - retracting a scalar or collection from a set takes the set-difference;
//! - anything else is inert, not an error.

use crate::types::{Datom, ENTITY_FIELD, EntityRecords, RawRecord, RawValue, ValueSet};
use facet_types::Value;
use std::collections::HashSet;
use tracing::trace;

/// Apply a batch of retraction datoms to the raw records. Datoms with
/// `added = true` are ignored here; the folder handles them.
pub(crate) fn apply_retractions<'a>(
    raw: &mut EntityRecords,
    many: &HashSet<String>,
    datoms: impl IntoIterator<Item = &'a Datom>,
) {
    for datom in datoms {
        if datom.added || datom.attribute == ENTITY_FIELD {
            continue;
        }
        if let Some(record) = raw.get_mut(&datom.entity) {
            retract_value(record, many.contains(&datom.attribute), datom);
        }
    }
}

fn retract_value(record: &mut RawRecord, is_many: bool, datom: &Datom) {
    trace!(attribute = %datom.attribute, value = %datom.value, "applying retraction");

    if datom.value.is_nullish() {
        if is_many {
            record.insert(datom.attribute.clone(), RawValue::Many(ValueSet::new()));
        } else {
            record.remove(&datom.attribute);
        }
        return;
    }

    let remove_key = match record.get(&datom.attribute) {
        Some(RawValue::One(existing)) => *existing == datom.value,
        Some(RawValue::Many(set)) => set_equals(set, &datom.value),
        // A marker only exists mid-update; a concrete retraction against it
        // has nothing to remove. Absent keys and mismatches are inert.
        Some(RawValue::Null) | None => return,
    };

    if remove_key {
        record.remove(&datom.attribute);
        return;
    }

    if let Some(RawValue::Many(set)) = record.get_mut(&datom.attribute) {
        match &datom.value {
            Value::Array(items) => {
                for item in items {
                    set.remove(item);
                }
            }
            scalar => {
                set.remove(scalar);
            }
        }
    }
}

/// Set equality between an existing set and a retract value given as a
/// collection: same elements, duplicates in the retract list ignored.
fn set_equals(set: &ValueSet, value: &Value) -> bool {
    match value {
        Value::Array(items) => {
            let retracted: ValueSet = items.iter().cloned().collect();
            *set == retracted
        }
        _ => false,
    }
}
