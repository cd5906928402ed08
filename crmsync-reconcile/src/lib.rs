//! Entity reconciliation engine for crmsync.
//!
//! Drives idempotent sync of three entity families (generic entities,
//! option-group/option-value pairs, custom-group/custom-field pairs) from
//! JSON specification documents against the host entity store.
//!
//! # Architecture
//!
//! Every record runs through the same three-state machine:
//!
//! 1. **absent**: no store record matches the lookup keys, so create it
//! 2. **present, unambiguous**: exactly one match, so diff and update it
//! 3. **ambiguous**: two or more matches, so log, skip, and continue
//!
//! The [`Reconciler`] owns nothing but its collaborators: the entity-store
//! client and the [`Localizer`] applied to translatable fields. Store
//! failures propagate unchanged; there are no retries and no rollback.
//!
//! # Example
//!
//! ```
//! use crmsync_model::OptionGroupSpec;
//! use crmsync_reconcile::{NoLocalization, Reconciler};
//! use crmsync_store::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let reconciler = Reconciler::new(&store, &NoLocalization, "my.extension");
//!
//! let doc = OptionGroupSpec::from_json(
//!     r#"{
//!         "_lookup": ["name"],
//!         "name": "gender",
//!         "title": "Gender",
//!         "_values": [
//!             {"_lookup": ["value"], "value": 1, "label": "Female"}
//!         ]
//!     }"#,
//! )
//! .unwrap();
//!
//! let report = reconciler.sync_option_group(&doc).unwrap();
//! assert_eq!(report.created(), 2);
//! ```

mod error;
mod localize;
mod reconciler;
mod report;
mod sync;

pub use error::{ReconcileError, ReconcileResult};
pub use localize::{Localizer, NoLocalization};
pub use reconciler::{Lookup, Reconciler, UpdateOutcome};
pub use report::{RecordOutcome, SyncAction, SyncReport};
