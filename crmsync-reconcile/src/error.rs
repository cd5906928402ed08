//! Error types for the reconciliation engine.

use thiserror::Error;

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors that abort a reconciliation call.
///
/// Ambiguous lookups are deliberately not here: they are per-record
/// failures, logged and reported as skipped while the batch continues.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The specification document is malformed.
    #[error("invalid specification: {0}")]
    Spec(#[from] crmsync_model::SpecError),

    /// A store operation failed; propagated unchanged.
    #[error("store error: {0}")]
    Store(#[from] crmsync_store::StoreError),

    /// A lookup key names a field the spec does not carry.
    #[error("lookup field `{field}` missing from {entity_type} spec")]
    MissingLookupField { entity_type: String, field: String },

    /// The store handed back a record without a usable numeric id.
    #[error("{entity_type} record returned by the store has no id")]
    RecordWithoutId { entity_type: String },

    /// A custom field references an option group by name that cannot be
    /// resolved; the whole custom-group sync is aborted.
    #[error("option group `{name}` could not be resolved to an id")]
    UnresolvedOptionGroup { name: String },
}
