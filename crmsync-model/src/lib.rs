//! Core data model for crmsync.
//!
//! Pure data types shared by the reconciler and the field resolver:
//! - `Record`: a resolved entity as returned by the store
//! - `RecordSpec`: a structured sync request parsed from a JSON document
//! - the three specification-document shapes (entity batch, option group,
//!   custom group)
//! - `FieldDescriptor`: the cached description of a custom field
//! - the padded-list encoding for multi-value string columns
//!
//! Nothing in this crate talks to the entity store.

mod descriptor;
mod padded;
mod record;
mod spec;

pub use descriptor::FieldDescriptor;
pub use padded::{VALUE_SEPARATOR, decode_padded, encode_padded};
pub use record::Record;
pub use spec::{CustomGroupSpec, EntityBatch, OptionGroupSpec, RecordSpec, SpecError, SpecResult};
