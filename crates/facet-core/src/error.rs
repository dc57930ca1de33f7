//! Structured error handling for the Facet engine.
//!
//! The engine itself is total: merges, retractions, and aggregation never
//! fail (mismatched retractions are inert, unaggregatable entities are
//! excluded from the view). The only fallible operations are the point
//! mutations that must resolve caller-supplied names, and those return
//! tagged errors carrying the offending key or field.

use facet_types::Value;
use thiserror::Error;

/// Error type for Facet engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FacetError {
    /// An index key could not be resolved to a backing entity
    #[error("index key `{key}` does not resolve to any entity")]
    UnresolvedIndexKey { key: Value },

    /// An aggregate-level field name could not be resolved to a raw attribute
    #[error("field `{field}` does not resolve to a raw attribute")]
    UnresolvedField { field: String },
}

impl FacetError {
    /// Create an unresolved index key error
    pub fn unresolved_key(key: impl Into<Value>) -> Self {
        Self::UnresolvedIndexKey { key: key.into() }
    }

    /// Create an unresolved field error
    pub fn unresolved_field(field: impl Into<String>) -> Self {
        Self::UnresolvedField { field: field.into() }
    }

    /// Get the error category for logging and metrics
    pub const fn category(&self) -> &'static str {
        match self {
            Self::UnresolvedIndexKey { .. } => "index_key",
            Self::UnresolvedField { .. } => "field",
        }
    }
}

/// Result type alias for engine operations
pub type FacetResult<T> = Result<T, FacetError>;
