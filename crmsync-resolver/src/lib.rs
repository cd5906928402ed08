//! Custom-field name resolution for crmsync.
//!
//! The host platform addresses dynamically-defined fields by two notations:
//! the store-native `custom_<id>` and the stable `<group>.<field>` form.
//! This crate maintains the caches needed to translate between them and
//! rewrites arbitrary documents from one notation to the other.
//!
//! # Architecture
//!
//! [`ResolverContext`] is an explicit cache service: callers own one
//! context per process (or per request under concurrent hosts) and pass
//! the entity-store client into every operation that may need to load.
//! Caches grow monotonically and are never refreshed; see the crate-level
//! operations for what each cache holds.
//!
//! - **group cache**: group name → that group's fields, by name and by id
//! - **field cache**: field id → descriptor, negative results included
//! - **group-name index**: group id → group name, loaded once in full

mod context;
mod error;
mod rewrite;

pub use context::ResolverContext;
pub use error::{ResolveError, ResolveResult};
pub use rewrite::FIELD_NOT_FOUND_PREFIX;
