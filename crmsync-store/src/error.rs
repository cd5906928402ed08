//! Error types for the entity-store interface.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying store call failed.
    #[error("store call failed: {0}")]
    Backend(String),

    /// An upsert referenced an id the store does not know.
    #[error("no {entity_type} record with id {id}")]
    UnknownId { entity_type: String, id: u32 },
}
