#![deny(warnings)]
#![allow(missing_docs)]
//! Core functionality for the Facet entity view engine.
//!
//! Facet ingests a stream of entity-attribute-value datoms, each tagged as
//! an assertion or a retraction, and maintains an immutable, queryable
//! view: entity key to current attributes, optionally re-keyed by an
//! attribute value and optionally projected through a schema into a fixed
//! record shape. Everything is a pure transformation: each operation takes
//! one [`EntityMap`] and returns a new one.

use tracing::{debug, instrument};

/// Aggregation of raw records into the caller-facing projection
pub mod aggregate;
/// The immutable entity map state and its operation surface
pub mod entity_map;
/// Structured error types for point mutations
pub mod error;
/// Cardinality-aware folding of assertion datoms into raw records
pub mod fold;
/// Derivation and re-keying of the caller-facing view
pub mod index;
/// Null-marker resolution and empty-entity pruning
pub mod prune;
/// Application of retraction datoms against raw records
pub mod retract;
/// Datoms, transactions, and raw record types
pub mod types;

// Re-export the public surface at the crate root
pub use aggregate::{Aggregate, Aggregator, FieldSpec, RecordSchema};
pub use entity_map::{EntityMap, EntityMapBuilder};
pub use error::{FacetError, FacetResult};
pub use facet_types::Value;
pub use types::{AttrName, Datom, ENTITY_FIELD, EntityRecords, RawRecord, RawValue, Transaction, ValueSet};

/// Initialize the core engine components
#[instrument]
pub fn init() -> anyhow::Result<()> {
    debug!("Initializing Facet core engine");
    Ok(())
}
