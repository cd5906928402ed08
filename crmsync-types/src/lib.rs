//! Core type definitions for crmsync.
//!
//! This crate defines the fundamental, store-agnostic types used throughout
//! the reconciliation engine:
//! - Custom-field and custom-group identifiers (numeric, host-assigned)
//! - The `FieldRef` sum type covering both field-addressing notations
//!
//! Everything that talks to the entity store (records, specs, caches)
//! belongs in the higher-level crates, not here.

mod field_ref;
mod ids;

pub use field_ref::FieldRef;
pub use ids::{FieldId, GroupId};
