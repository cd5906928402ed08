//! Per-call outcome reporting.

use serde::Serialize;

/// What the sync state machine did with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// No match existed; the record was created.
    Created,
    /// One match existed and differed; it was patched.
    Updated,
    /// One match existed and nothing differed; no store call.
    Unchanged,
    /// The lookup was ambiguous; the record was logged and skipped.
    Skipped,
}

/// The outcome for a single record of a sync call.
#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    pub entity_type: String,
    pub action: SyncAction,
    /// The resolved store id; absent for skipped records.
    pub id: Option<u32>,
}

/// Ordered record outcomes of one reconciliation call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl SyncReport {
    pub(crate) fn push(&mut self, entity_type: &str, action: SyncAction, id: Option<u32>) {
        self.outcomes.push(RecordOutcome {
            entity_type: entity_type.to_string(),
            action,
            id,
        });
    }

    /// Number of records created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.count(SyncAction::Created)
    }

    /// Number of records patched.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(SyncAction::Updated)
    }

    /// Number of records already in sync.
    #[must_use]
    pub fn unchanged(&self) -> usize {
        self.count(SyncAction::Unchanged)
    }

    /// Number of records skipped on ambiguous lookups.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(SyncAction::Skipped)
    }

    fn count(&self, action: SyncAction) -> usize {
        self.outcomes.iter().filter(|o| o.action == action).count()
    }
}
