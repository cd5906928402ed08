//! The two field-addressing notations used by the host platform.
//!
//! Dynamically-defined custom fields can be addressed either by their
//! store-native key `custom_<numeric-id>` (legacy notation) or by the
//! stable, human-readable `<group-name>.<field-name>` form (addressed
//! notation). `FieldRef` is the typed form of both; conversion between
//! them requires the resolver caches and lives there.

use crate::FieldId;
use std::fmt;

/// A reference to a custom field, in either addressing notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldRef {
    /// Legacy notation: `custom_<id>`.
    Id(FieldId),
    /// Addressed notation: `<group>.<field>`.
    GroupField { group: String, field: String },
}

impl FieldRef {
    /// Parses a record key into a field reference.
    ///
    /// Returns `None` for keys in neither notation; ordinary data keys
    /// (`name`, `title`, ...) fall through untouched, so callers can scan
    /// arbitrary documents without pre-filtering.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        if let Some(digits) = key.strip_prefix("custom_")
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && let Ok(id) = digits.parse::<u32>()
        {
            return Some(Self::Id(FieldId::new(id)));
        }

        let (group, field) = key.split_once('.')?;
        if is_word(group) && is_word(field) {
            return Some(Self::GroupField {
                group: group.to_string(),
                field: field.to_string(),
            });
        }
        None
    }

    /// Builds the legacy-notation reference for a field id.
    #[must_use]
    pub const fn id(id: FieldId) -> Self {
        Self::Id(id)
    }

    /// Builds the addressed-notation reference for a group/field pair.
    #[must_use]
    pub fn group_field(group: impl Into<String>, field: impl Into<String>) -> Self {
        Self::GroupField {
            group: group.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "custom_{id}"),
            Self::GroupField { group, field } => write!(f, "{group}.{field}"),
        }
    }
}

/// A "word" in either notation: non-empty, ASCII alphanumerics and
/// underscores only. Matches what the host platform allows in group and
/// field names.
fn is_word(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
