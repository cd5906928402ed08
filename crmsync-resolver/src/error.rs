//! Error types for the field resolver.

use thiserror::Error;

/// Result type for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors that can occur while populating the resolver caches.
///
/// Unresolvable field references are not errors: rewriting leaves them
/// unchanged (counted) or substitutes the not-found sentinel.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Store failure while loading cache entries.
    #[error("store error: {0}")]
    Store(#[from] crmsync_store::StoreError),
}
