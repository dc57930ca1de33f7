//! Aggregator: converts a raw attribute record into the caller's chosen
//! shape. The default projection is the raw map itself (set-valued slots
//! rendered as sorted arrays); the schema projection renames attributes
//! through a rename table and builds a fixed record shape, filling
//! unspecified fields from their declared defaults. A record the schema
//! cannot represent is dropped from the aggregated view but stays in raw
//! state.

use crate::types::{AttrName, RawRecord};
use facet_types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The caller-facing projection of a raw record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Aggregate {
    /// Identity projection: every raw attribute, untouched names
    Map(HashMap<String, Value>),
    /// Schema projection: the fixed field set declared by a [`RecordSchema`]
    Record(HashMap<String, Value>),
}

impl Aggregate {
    /// Look up one field of the projection
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields().get(field)
    }

    /// All fields of the projection
    #[must_use]
    pub const fn fields(&self) -> &HashMap<String, Value> {
        match self {
            Self::Map(fields) | Self::Record(fields) => fields,
        }
    }

    /// Render as a JSON object
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields()
            .iter()
            .map(|(k, v)| (k.clone(), v.into()))
            .collect::<serde_json::Map<String, serde_json::Value>>();
        serde_json::Value::Object(map)
    }
}

/// One field of a schema-shaped record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    /// Value used when the raw record has no corresponding attribute
    pub default: Value,
    /// Required fields with no raw attribute make the record unrepresentable
    pub required: bool,
}

/// Declares the fixed shape the schema aggregator projects into: the field
/// list plus the rename table from raw attribute names to field names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordSchema {
    fields: Vec<FieldSpec>,
    renames: HashMap<AttrName, String>,
}

impl RecordSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an optional field defaulting to null
    #[must_use]
    pub fn field(self, name: impl Into<String>) -> Self {
        self.field_with_default(name, Value::Null)
    }

    /// Declare an optional field with an explicit default. Give a
    /// cardinality-many field an empty-array default so it reads as empty
    /// rather than null when the attribute never appears.
    #[must_use]
    pub fn field_with_default(mut self, name: impl Into<String>, default: Value) -> Self {
        self.fields.push(FieldSpec { name: name.into(), default, required: false });
        self
    }

    /// Declare a required field; records lacking it are unrepresentable
    #[must_use]
    pub fn required_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldSpec { name: name.into(), default: Value::Null, required: true });
        self
    }

    /// Map a raw attribute name onto a field name
    #[must_use]
    pub fn rename(mut self, attribute: impl Into<AttrName>, field: impl Into<String>) -> Self {
        self.renames.insert(attribute.into(), field.into());
        self
    }

    /// The inverse of the rename table, total over the declared fields:
    /// field name back to raw attribute name. Point mutations and indexing
    /// resolve aggregate vocabulary through this.
    #[must_use]
    pub fn field_to_attribute(&self) -> HashMap<String, AttrName> {
        let inverse: HashMap<&String, &AttrName> =
            self.renames.iter().map(|(attr, field)| (field, attr)).collect();
        self.fields
            .iter()
            .map(|spec| {
                let attr = inverse.get(&spec.name).map_or(spec.name.clone(), |a| (*a).clone());
                (spec.name.clone(), attr)
            })
            .collect()
    }

    fn project(&self, record: &RawRecord) -> Option<Aggregate> {
        let renamed: HashMap<&str, Value> = record
            .iter()
            .map(|(attr, slot)| {
                let field = self.renames.get(attr).map_or(attr.as_str(), String::as_str);
                (field, slot.to_value())
            })
            .collect();

        let mut fields = HashMap::with_capacity(self.fields.len());
        for spec in &self.fields {
            match renamed.get(spec.name.as_str()) {
                Some(value) => {
                    fields.insert(spec.name.clone(), value.clone());
                }
                None if spec.required => return None,
                None => {
                    fields.insert(spec.name.clone(), spec.default.clone());
                }
            }
        }
        Some(Aggregate::Record(fields))
    }
}

/// The closed aggregator variant: either the identity projection or a
/// schema projection. Total over every raw record; a `None` result means
/// "unrepresentable", never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Aggregator {
    #[default]
    Identity,
    Schema(RecordSchema),
}

impl Aggregator {
    /// Project one raw record into the caller-facing shape
    #[must_use]
    pub fn apply(&self, record: &RawRecord) -> Option<Aggregate> {
        match self {
            Self::Identity => Some(Aggregate::Map(
                record.iter().map(|(attr, slot)| (attr.clone(), slot.to_value())).collect(),
            )),
            Self::Schema(schema) => schema.project(record),
        }
    }

    /// The field-to-attribute translation table this aggregator implies
    #[must_use]
    pub fn field_to_attribute(&self) -> HashMap<String, AttrName> {
        match self {
            Self::Identity => HashMap::new(),
            Self::Schema(schema) => schema.field_to_attribute(),
        }
    }
}
