use crate::Record;
use crmsync_types::{FieldId, FieldRef, GroupId};
use serde::{Deserialize, Serialize};

/// Cached description of a custom field: its id, name, and owning group.
///
/// Descriptors are immutable once built; the resolver caches them for the
/// process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub name: String,
    pub group_id: GroupId,
}

impl FieldDescriptor {
    /// The store-native key for this field (`custom_<id>`).
    #[must_use]
    pub fn key(&self) -> String {
        FieldRef::id(self.id).to_string()
    }

    /// Builds a descriptor from a `CustomField` store record.
    ///
    /// Returns `None` when the record lacks an id, a name, or its owning
    /// group id.
    #[must_use]
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: FieldId::new(record.get_u32("id")?),
            name: record.get_str("name")?.to_string(),
            group_id: GroupId::new(record.get_u32("custom_group_id")?),
        })
    }
}
