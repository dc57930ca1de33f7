//! The immutable `EntityMap` value: per-entity ground truth folded from
//! datom streams, plus the derived caller-facing view.
//!
//! Every operation takes one state and returns a new one; nothing is
//! mutated in place and nothing blocks or performs I/O. Concurrent readers
//! of a single instance need no synchronization; concurrent writers must
//! coordinate externally, typically by confining updates to one owning
//! task that swaps the current instance on each update.
//!
//! Data flows one way: datoms → retraction/folding → raw records → null
//! filter and prune → aggregation → indexing → the view callers observe.
//! Updates re-run the pipeline from the raw records onward.

use crate::aggregate::{Aggregate, Aggregator, RecordSchema};
use crate::error::{FacetError, FacetResult};
use crate::fold::fold_assertions;
use crate::index::build_view;
use crate::prune::filter_and_prune;
use crate::retract::apply_retractions;
use crate::types::{AttrName, Datom, EntityRecords, Transaction};
use facet_types::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Immutable materialized view over a stream of asserted and retracted
/// entity-attribute-value datoms.
///
/// The view is always derivable from the raw records plus the
/// configuration triple (cardinality-many set, index field, aggregator);
/// it is never stored independently of that derivation.
#[derive(Debug, Clone)]
pub struct EntityMap {
    raw: EntityRecords,
    view: HashMap<Value, Aggregate>,
    many: HashSet<AttrName>,
    index_by: Option<String>,
    aggregator: Aggregator,
    field_to_attr: HashMap<String, AttrName>,
}

/// Equality compares view contents only; configuration is ignored. Two
/// maps built through different schemas or index fields are equal exactly
/// when callers cannot tell them apart through the read API.
impl PartialEq for EntityMap {
    fn eq(&self, other: &Self) -> bool {
        self.view == other.view
    }
}

impl Default for EntityMap {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Configuration builder for [`EntityMap`]
#[derive(Debug, Clone, Default)]
pub struct EntityMapBuilder {
    many: HashSet<AttrName>,
    index_by: Option<String>,
    aggregator: Aggregator,
}

impl EntityMapBuilder {
    /// Declare the attributes that hold a set of values per entity rather
    /// than a single scalar
    #[must_use]
    pub fn cardinality_many<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AttrName>,
    {
        self.many.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Key the view by this field's value instead of the entity key
    #[must_use]
    pub fn index_by(mut self, field: impl Into<String>) -> Self {
        self.index_by = Some(field.into());
        self
    }

    /// Project entities through a schema instead of the identity aggregator
    #[must_use]
    pub fn schema(mut self, schema: RecordSchema) -> Self {
        self.aggregator = Aggregator::Schema(schema);
        self
    }

    /// Build an empty map with this configuration
    #[must_use]
    pub fn build(self) -> EntityMap {
        let field_to_attr = self.aggregator.field_to_attribute();
        EntityMap {
            raw: EntityRecords::new(),
            view: HashMap::new(),
            many: self.many,
            index_by: self.index_by,
            aggregator: self.aggregator,
            field_to_attr,
        }
    }

    /// Build from an initial datom batch
    #[must_use]
    pub fn from_facts(self, datoms: &[Datom]) -> EntityMap {
        self.build().update(datoms)
    }

    /// Build from flat records, keyed by the named primary-key field
    #[must_use]
    pub fn from_records(self, records: &[HashMap<String, Value>], primary_key: &str) -> EntityMap {
        records
            .iter()
            .fold(self.build(), |map, record| map.put(record, primary_key))
    }

    /// Build from positional rows zipped with a header of attribute names
    #[must_use]
    pub fn from_rows(self, header: &[String], rows: &[Vec<Value>], primary_key: &str) -> EntityMap {
        let records: Vec<HashMap<String, Value>> = rows
            .iter()
            .map(|row| header.iter().cloned().zip(row.iter().cloned()).collect())
            .collect();
        self.from_records(&records, primary_key)
    }
}

impl EntityMap {
    /// Start configuring a new map
    #[must_use]
    pub fn builder() -> EntityMapBuilder {
        EntityMapBuilder::default()
    }

    /// Apply a datom batch and return the resulting map.
    ///
    /// Retractions are applied first against the existing raw records,
    /// then assertions are folded into the result; the null filter and
    /// pruner run after each phase. The view is then re-derived under the
    /// unchanged configuration.
    #[must_use]
    #[instrument(skip(self, datoms), fields(datom_count = datoms.len()))]
    pub fn update(&self, datoms: &[Datom]) -> Self {
        let mut raw = self.raw.clone();
        apply_retractions(&mut raw, &self.many, datoms);
        filter_and_prune(&mut raw, &self.many);
        fold_assertions(&mut raw, &self.many, datoms);
        filter_and_prune(&mut raw, &self.many);
        debug!(entities = raw.len(), "update applied");
        self.with_raw(raw)
    }

    /// Apply a transaction bundle from the fact-delivery collaborator
    #[must_use]
    pub fn apply(&self, transaction: &Transaction) -> Self {
        self.update(&transaction.clone().into_datoms())
    }

    /// Upsert one flat record, keyed by the named primary-key field.
    ///
    /// Each field becomes an assertion datom paired with a null retraction
    /// for the same attribute, so the new value fully overwrites any prior
    /// cardinality-many set instead of unioning with it. Record keys are
    /// raw attribute names. A record lacking its primary-key field cannot
    /// be keyed and leaves the map unchanged.
    #[must_use]
    #[instrument(skip(self, record))]
    pub fn put(&self, record: &HashMap<String, Value>, primary_key: &str) -> Self {
        let Some(entity) = record.get(primary_key) else {
            debug!(primary_key, "record lacks its primary-key field, ignoring");
            return self.clone();
        };
        let mut datoms = Vec::with_capacity(record.len() * 2);
        for (attribute, value) in record {
            datoms.push(Datom::retract(entity.clone(), attribute.clone(), Value::Null));
            datoms.push(Datom::assert(entity.clone(), attribute.clone(), value.clone()));
        }
        self.update(&datoms)
    }

    /// Set one attribute of the entity behind `index_key`.
    ///
    /// `field` is aggregate vocabulary and is translated back to the raw
    /// attribute name. By default a cardinality-many value unions into the
    /// existing set; `overwrite_collection` forces full replacement by
    /// pairing the assertion with a null retraction.
    ///
    /// # Errors
    ///
    /// [`FacetError::UnresolvedIndexKey`] when `index_key` resolves to no
    /// entity, [`FacetError::UnresolvedField`] when `field` is not part of
    /// the aggregate shape.
    #[instrument(skip(self, value))]
    pub fn put_attribute(
        &self,
        index_key: &Value,
        field: &str,
        value: Value,
        overwrite_collection: bool,
    ) -> FacetResult<Self> {
        let attribute = self.resolve_field(field)?;
        let entity = self.resolve_entity(index_key)?;
        let mut datoms = Vec::with_capacity(2);
        if overwrite_collection {
            datoms.push(Datom::retract(entity.clone(), attribute.clone(), Value::Null));
        }
        datoms.push(Datom { entity, attribute, value, added: true });
        Ok(self.update(&datoms))
    }

    /// Remove the entity behind `index_key` from both the raw records and
    /// the view. A key absent from the view leaves the map unchanged.
    #[must_use]
    #[instrument(skip(self))]
    pub fn delete(&self, index_key: &Value) -> Self {
        if !self.view.contains_key(index_key) {
            return self.clone();
        }
        match self.resolve_entity(index_key) {
            Ok(entity) => {
                let mut raw = self.raw.clone();
                raw.remove(&entity);
                debug!(entity = %entity, "entity deleted");
                self.with_raw(raw)
            }
            Err(_) => self.clone(),
        }
    }

    /// Re-key the view by this field's value; the raw records are untouched
    #[must_use]
    pub fn index_by(&self, field: &str) -> Self {
        let mut next = self.clone();
        next.index_by = Some(field.to_string());
        next.view = build_view(&next.raw, &next.aggregator, next.index_by.as_deref());
        next
    }

    /// Re-derive the view under a new aggregator, optionally changing the
    /// index field at the same time; the raw records are untouched
    #[must_use]
    pub fn aggregate_by(&self, aggregator: Aggregator, index_field: Option<&str>) -> Self {
        let mut next = self.clone();
        next.aggregator = aggregator;
        next.field_to_attr = next.aggregator.field_to_attribute();
        if let Some(field) = index_field {
            next.index_by = Some(field.to_string());
        }
        next.view = build_view(&next.raw, &next.aggregator, next.index_by.as_deref());
        next
    }

    /// Look up an entity's aggregate by view key
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Aggregate> {
        self.view.get(key)
    }

    /// Look up one field of an entity's aggregate by view key
    #[must_use]
    pub fn get_attribute(&self, key: &Value, field: &str) -> Option<&Value> {
        self.view.get(key)?.get(field)
    }

    /// Whether the view contains this key
    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.view.contains_key(key)
    }

    /// Iterate the view's keys
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.view.keys()
    }

    /// Iterate the view's aggregates
    pub fn values(&self) -> impl Iterator<Item = &Aggregate> {
        self.view.values()
    }

    /// Number of entities in the view. Entities the aggregator cannot
    /// represent (or whose index value is null) stay in the raw records
    /// but are not counted here; compare with `raw_data().len()` to detect
    /// them.
    #[must_use]
    pub fn len(&self) -> usize {
        self.view.len()
    }

    /// Whether the view is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// The ground-truth raw records, always keyed by entity key
    #[must_use]
    pub const fn raw_data(&self) -> &EntityRecords {
        &self.raw
    }

    fn with_raw(&self, raw: EntityRecords) -> Self {
        let view = build_view(&raw, &self.aggregator, self.index_by.as_deref());
        Self {
            raw,
            view,
            many: self.many.clone(),
            index_by: self.index_by.clone(),
            aggregator: self.aggregator.clone(),
            field_to_attr: self.field_to_attr.clone(),
        }
    }

    /// Translate an aggregate-level field name to its raw attribute name
    fn resolve_field(&self, field: &str) -> FacetResult<AttrName> {
        match &self.aggregator {
            Aggregator::Identity => Ok(field.to_string()),
            Aggregator::Schema(_) => self
                .field_to_attr
                .get(field)
                .cloned()
                .ok_or_else(|| FacetError::unresolved_field(field)),
        }
    }

    /// Resolve a view key to the backing entity key via the raw records
    fn resolve_entity(&self, index_key: &Value) -> FacetResult<Value> {
        match &self.index_by {
            None => {
                if self.raw.contains_key(index_key) {
                    Ok(index_key.clone())
                } else {
                    Err(FacetError::unresolved_key(index_key.clone()))
                }
            }
            Some(field) => {
                let attribute = self.resolve_field(field)?;
                self.raw
                    .iter()
                    .find(|(_, record)| {
                        record
                            .get(&attribute)
                            .is_some_and(|slot| slot.to_value() == *index_key)
                    })
                    .map(|(entity, _)| entity.clone())
                    .ok_or_else(|| FacetError::unresolved_key(index_key.clone()))
            }
        }
    }
}
