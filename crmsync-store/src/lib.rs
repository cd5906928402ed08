//! Entity-store collaborator interface for crmsync.
//!
//! The reconciliation engine never touches storage directly; it reaches the
//! host platform only through the generic [`EntityApi`] trait defined here.
//! Operations are keyed by entity type name and exchange schemaless field
//! maps, mirroring the host's generic entity API.
//!
//! # Architecture
//!
//! - `get` answers filtered lookups with a bounded page of records
//! - `create` persists a new record, or acts as an upsert when the field
//!   map carries an `id`
//! - [`MemoryStore`] is an in-memory reference implementation for tests
//!   and embedding hosts that fake the platform

mod error;
mod memory;

use crmsync_model::Record;
use serde_json::{Map, Value};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// One page of lookup results.
#[derive(Debug, Clone, Default)]
pub struct LookupPage {
    /// Number of records in this page.
    pub count: usize,
    /// The matching records, up to the requested limit.
    pub records: Vec<Record>,
}

/// The host platform's generic entity API.
///
/// Filter semantics: a scalar filter value matches by equality; an array
/// filter value matches records whose field equals any element (set
/// membership). All calls are blocking; failures propagate to the caller
/// unchanged, and the core performs no retries.
pub trait EntityApi {
    /// Looks up records of `entity_type` matching `filter`, returning at
    /// most `limit` of them (no bound when `None`).
    fn get(
        &self,
        entity_type: &str,
        filter: &Map<String, Value>,
        limit: Option<usize>,
    ) -> StoreResult<LookupPage>;

    /// Persists a record of `entity_type`.
    ///
    /// When `fields` carries a numeric `id`, the call updates the existing
    /// record instead (upsert-by-id). Returns the stored record, including
    /// its id.
    fn create(&self, entity_type: &str, fields: &Map<String, Value>) -> StoreResult<Record>;
}
