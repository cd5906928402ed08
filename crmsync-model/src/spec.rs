//! Parsing of JSON specification documents into structured sync requests.
//!
//! Input documents address sync behavior through reserved directive keys:
//! `_lookup` names the identifying fields, `_translate` names the fields to
//! localize, and `_entities`/`_values`/`_fields` carry child records. Any
//! other underscore-prefixed key is a directive too and is never persisted.
//! Parsing is the only place that looks at key prefixes; the rest of the
//! engine works with the structured types below.

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Result type for specification parsing.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors raised while parsing a specification document.
///
/// All of these fire before any store access; a malformed document aborts
/// the whole sync call.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The document (or a child record) is not a JSON object.
    #[error("specification is not a JSON object")]
    NotAnObject,

    /// The top-level document is an empty object.
    #[error("specification document is empty")]
    Empty,

    /// A required key is missing from the document.
    #[error("specification is missing required key `{0}`")]
    MissingKey(&'static str),

    /// A key is present but has the wrong shape.
    #[error("specification key `{key}` must be {expected}")]
    InvalidKey { key: String, expected: &'static str },

    /// The document is not valid JSON at all.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The specification file could not be read.
    #[error("failed to read specification file: {0}")]
    Io(#[from] std::io::Error),
}

/// A structured sync request for one record.
///
/// Produced from a JSON object by splitting off the reserved directive
/// keys; `fields` holds exactly what may be persisted to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSpec {
    /// Field names whose values identify this record in the store.
    pub lookup_keys: Vec<String>,
    /// Field names whose string values are localized before use.
    pub translate_keys: Vec<String>,
    /// The persistable fields, directive-free.
    pub fields: Map<String, Value>,
}

impl RecordSpec {
    /// Parses a JSON object into a record spec.
    pub fn from_value(value: Value) -> SpecResult<Self> {
        let Value::Object(obj) = value else {
            return Err(SpecError::NotAnObject);
        };

        let mut spec = Self::default();
        for (key, value) in obj {
            if key == "_lookup" {
                spec.lookup_keys = key_list(&key, value)?;
            } else if key == "_translate" {
                spec.translate_keys = key_list(&key, value)?;
            } else if key.starts_with('_') {
                // an unknown directive; dropped rather than persisted
            } else {
                spec.fields.insert(key, value);
            }
        }
        Ok(spec)
    }
}

/// A flat batch of records of one explicitly named entity type.
///
/// Document shape: `{ "entity": "...", "_entities": [ ... ] }`.
#[derive(Debug, Clone)]
pub struct EntityBatch {
    pub entity_type: String,
    pub records: Vec<RecordSpec>,
}

impl EntityBatch {
    /// Parses a batch document from a JSON value.
    pub fn from_value(value: Value) -> SpecResult<Self> {
        let mut obj = document_object(value)?;
        let entity_type = match obj.remove("entity") {
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(SpecError::InvalidKey {
                    key: "entity".to_string(),
                    expected: "a string entity type",
                });
            }
            None => return Err(SpecError::MissingKey("entity")),
        };
        let records = record_array(&mut obj, "_entities")?;
        Ok(Self {
            entity_type,
            records,
        })
    }

    /// Parses a batch document from JSON text.
    pub fn from_json(json: &str) -> SpecResult<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Reads and parses a batch document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> SpecResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// An option group and its option values.
///
/// The top-level object describes the `OptionGroup` record itself;
/// `_values` carries the `OptionValue` children.
#[derive(Debug, Clone)]
pub struct OptionGroupSpec {
    pub group: RecordSpec,
    pub values: Vec<RecordSpec>,
}

impl OptionGroupSpec {
    /// Parses an option-group document from a JSON value.
    pub fn from_value(value: Value) -> SpecResult<Self> {
        let mut obj = document_object(value)?;
        let values = record_array(&mut obj, "_values")?;
        let group = RecordSpec::from_value(Value::Object(obj))?;
        Ok(Self { group, values })
    }

    /// Parses an option-group document from JSON text.
    pub fn from_json(json: &str) -> SpecResult<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Reads and parses an option-group document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> SpecResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// A custom group and its custom fields.
///
/// The top-level object describes the `CustomGroup` record itself;
/// `_fields` carries the `CustomField` children.
#[derive(Debug, Clone)]
pub struct CustomGroupSpec {
    pub group: RecordSpec,
    pub fields: Vec<RecordSpec>,
}

impl CustomGroupSpec {
    /// Parses a custom-group document from a JSON value.
    pub fn from_value(value: Value) -> SpecResult<Self> {
        let mut obj = document_object(value)?;
        let fields = record_array(&mut obj, "_fields")?;
        let group = RecordSpec::from_value(Value::Object(obj))?;
        Ok(Self { group, fields })
    }

    /// Parses a custom-group document from JSON text.
    pub fn from_json(json: &str) -> SpecResult<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Reads and parses a custom-group document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> SpecResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

fn document_object(value: Value) -> SpecResult<Map<String, Value>> {
    let Value::Object(obj) = value else {
        return Err(SpecError::NotAnObject);
    };
    if obj.is_empty() {
        return Err(SpecError::Empty);
    }
    Ok(obj)
}

fn record_array(obj: &mut Map<String, Value>, key: &'static str) -> SpecResult<Vec<RecordSpec>> {
    let Some(value) = obj.remove(key) else {
        return Err(SpecError::MissingKey(key));
    };
    let Value::Array(items) = value else {
        return Err(SpecError::InvalidKey {
            key: key.to_string(),
            expected: "an array of record objects",
        });
    };
    items.into_iter().map(RecordSpec::from_value).collect()
}

fn key_list(key: &str, value: Value) -> SpecResult<Vec<String>> {
    let invalid = || SpecError::InvalidKey {
        key: key.to_string(),
        expected: "an array of field names",
    };
    let Value::Array(items) = value else {
        return Err(invalid());
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(invalid()),
        })
        .collect()
}
