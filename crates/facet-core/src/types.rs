//! Core data types for the Facet engine: datoms, transactions, and the raw
//! per-entity attribute records the fold/retract/prune passes operate on.

use facet_types::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Reserved attribute holding an entity's own key inside its raw record.
/// Injected by the folder on first contact with an entity and never
/// removable by retraction.
pub const ENTITY_FIELD: &str = "db/id";

/// Attribute names are opaque comparable keys
pub type AttrName = String;

/// Set storage for cardinality-many attributes. `BTreeSet` over the total
/// order on `Value` keeps iteration and the array rendering of sets
/// deterministic.
pub type ValueSet = BTreeSet<Value>;

/// An atomic assertion or retraction of one attribute's value for one entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Datom {
    pub entity: Value,
    pub attribute: AttrName,
    pub value: Value,
    pub added: bool,
}

impl Datom {
    /// Create an assertion datom
    pub fn assert(
        entity: impl Into<Value>,
        attribute: impl Into<AttrName>,
        value: impl Into<Value>,
    ) -> Self {
        Self { entity: entity.into(), attribute: attribute.into(), value: value.into(), added: true }
    }

    /// Create a retraction datom
    pub fn retract(
        entity: impl Into<Value>,
        attribute: impl Into<AttrName>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            entity: entity.into(),
            attribute: attribute.into(),
            value: value.into(),
            added: false,
        }
    }
}

/// A transaction as handed over by the external fact-delivery collaborator:
/// two already-separated datom lists. Consumed by concatenating both lists
/// (with `added` normalized to match the list each datom came from) and
/// running a single update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub assertions: Vec<Datom>,
    pub retractions: Vec<Datom>,
}

impl Transaction {
    /// Flatten into one datom list with normalized `added` flags
    pub fn into_datoms(self) -> Vec<Datom> {
        let mut datoms = Vec::with_capacity(self.assertions.len() + self.retractions.len());
        for mut datom in self.retractions {
            datom.added = false;
            datoms.push(datom);
        }
        for mut datom in self.assertions {
            datom.added = true;
            datoms.push(datom);
        }
        datoms
    }
}

/// The value slot an attribute occupies inside a raw record.
///
/// `Null` is the internal null marker: it records the intent "delete this
/// value" during a fold pass so an explicit null cannot be silently
/// overwritten by a later assertion in the same batch. The prune pass
/// resolves every marker (cardinality-many to an empty set, anything else
/// to key removal), so `Null` never survives an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RawValue {
    /// A cardinality-one scalar
    One(Value),
    /// A cardinality-many set, possibly empty
    Many(ValueSet),
    /// Null marker, internal to a fold pass
    Null,
}

impl RawValue {
    /// Build a `Many` slot from any iterable of values
    pub fn many(values: impl IntoIterator<Item = Value>) -> Self {
        Self::Many(values.into_iter().collect())
    }

    /// View as a scalar, if this slot is cardinality-one
    pub const fn as_one(&self) -> Option<&Value> {
        match self {
            Self::One(v) => Some(v),
            _ => None,
        }
    }

    /// View as a set, if this slot is cardinality-many
    pub const fn as_many(&self) -> Option<&ValueSet> {
        match self {
            Self::Many(set) => Some(set),
            _ => None,
        }
    }

    /// Render the slot as a plain `Value` for aggregation and index
    /// resolution: scalars pass through, sets become sorted arrays, the
    /// marker renders as null.
    pub fn to_value(&self) -> Value {
        match self {
            Self::One(v) => v.clone(),
            Self::Many(set) => Value::Array(set.iter().cloned().collect()),
            Self::Null => Value::Null,
        }
    }

    /// Whether the slot carries no meaningful value: an empty set or a
    /// lingering marker. Used by the pruner when deciding if an entity is
    /// left with nothing but its own id.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(_) => false,
            Self::Many(set) => set.is_empty(),
            Self::Null => true,
        }
    }
}

/// The ground-truth per-entity attribute map, before aggregation and
/// indexing. Always contains [`ENTITY_FIELD`] holding the entity's own key.
pub type RawRecord = HashMap<AttrName, RawValue>;

/// All raw records, keyed by entity key
pub type EntityRecords = HashMap<Value, RawRecord>;
