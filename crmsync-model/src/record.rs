use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record returned by the entity store after lookup or creation.
///
/// The store is schemaless from our point of view: a record is whatever
/// field map it hands back, expected to include a numeric `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: Map<String, Value>,
}

impl Record {
    /// Wraps a field map as a record.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns a field value, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a field as a string slice.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Returns a field as a small unsigned integer.
    ///
    /// The host store round-trips numeric columns inconsistently (sometimes
    /// as JSON numbers, sometimes as decimal strings), so both forms are
    /// accepted.
    #[must_use]
    pub fn get_u32(&self, field: &str) -> Option<u32> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_u64()?.try_into().ok(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// The record's store-assigned id.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.get_u32("id")
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
