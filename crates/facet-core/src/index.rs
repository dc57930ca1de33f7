//! Indexer: derives the caller-facing view from the raw records by running
//! the aggregator and, when an index field is configured, re-keying the
//! result by each aggregate's value at that field.

use crate::aggregate::{Aggregate, Aggregator};
use crate::types::EntityRecords;
use facet_types::Value;
use std::collections::HashMap;
use tracing::trace;

/// Build the view from the raw records under a configuration.
///
/// Entities the aggregator cannot represent are skipped; when `index_by`
/// is set, entities whose value at that field is nullish are skipped too.
/// Index uniqueness is the caller's responsibility: if two entities
/// resolve to the same index key, the one processed later in map
/// iteration order silently replaces the other.
pub(crate) fn build_view(
    raw: &EntityRecords,
    aggregator: &Aggregator,
    index_by: Option<&str>,
) -> HashMap<Value, Aggregate> {
    let mut view = HashMap::with_capacity(raw.len());
    for (entity, record) in raw {
        let Some(aggregate) = aggregator.apply(record) else {
            trace!(entity = %entity, "entity not representable by aggregator, skipping");
            continue;
        };
        let key = match index_by {
            None => entity.clone(),
            Some(field) => match aggregate.get(field) {
                Some(value) if !value.is_nullish() => value.clone(),
                _ => {
                    trace!(entity = %entity, field, "null index value, excluding from view");
                    continue;
                }
            },
        };
        view.insert(key, aggregate);
    }
    view
}
