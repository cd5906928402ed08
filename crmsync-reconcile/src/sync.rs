//! Per-family sync orchestration.
//!
//! Three entry points share one record state machine: generic entity
//! batches, option groups with their values, and custom groups with their
//! fields. Parents are reconciled first so children can be wired to the
//! resolved parent id.

use crate::{
    Lookup, ReconcileError, ReconcileResult, Reconciler, SyncAction, SyncReport, UpdateOutcome,
};
use crmsync_model::{CustomGroupSpec, EntityBatch, OptionGroupSpec, Record, RecordSpec, encode_padded};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::error;

/// CustomGroup attributes the store does not round-trip faithfully; they
/// ride along with every update.
const CUSTOM_GROUP_UPDATE_FIELDS: &[&str] = &[
    "extends",
    "style",
    "is_active",
    "title",
    "extends_entity_column_value",
];

/// CustomField attributes that ride along with every update.
const CUSTOM_FIELD_UPDATE_FIELDS: &[&str] = &[
    "in_selector",
    "is_view",
    "is_searchable",
    "html_type",
    "data_type",
    "custom_group_id",
];

impl Reconciler<'_> {
    /// Reconciles a flat batch of records of one entity type.
    ///
    /// Ambiguous records are logged and skipped; the rest of the batch
    /// continues.
    pub fn sync_entities(&self, batch: &EntityBatch) -> ReconcileResult<SyncReport> {
        let mut report = SyncReport::default();
        for record in &batch.records {
            let mut spec = record.clone();
            self.localize(&mut spec);
            self.reconcile_record(&batch.entity_type, &spec, &[], false, &mut report)?;
        }
        Ok(report)
    }

    /// Reads, parses, and reconciles an entity-batch document from a file.
    pub fn sync_entities_file(&self, path: impl AsRef<Path>) -> ReconcileResult<SyncReport> {
        self.sync_entities(&EntityBatch::from_path(path)?)
    }

    /// Reconciles an option group, then each of its option values.
    ///
    /// Children are wired to the resolved group id, which also becomes an
    /// identifying field for their own lookups. An ambiguous group lookup
    /// skips the children entirely.
    pub fn sync_option_group(&self, doc: &OptionGroupSpec) -> ReconcileResult<SyncReport> {
        let mut report = SyncReport::default();
        let mut group = doc.group.clone();
        self.localize(&mut group);

        let Some(parent) = self.reconcile_record("OptionGroup", &group, &[], false, &mut report)?
        else {
            return Ok(report);
        };
        let parent_id = require_id("OptionGroup", &parent)?;

        for value in &doc.values {
            let mut spec = value.clone();
            self.localize(&mut spec);
            spec.fields
                .insert("option_group_id".to_string(), Value::from(parent_id));
            spec.lookup_keys.push("option_group_id".to_string());
            self.reconcile_record("OptionValue", &spec, &[], false, &mut report)?;
        }
        Ok(report)
    }

    /// Reads, parses, and reconciles an option-group document from a file.
    pub fn sync_option_group_file(&self, path: impl AsRef<Path>) -> ReconcileResult<SyncReport> {
        self.sync_option_group(&OptionGroupSpec::from_path(path)?)
    }

    /// Reconciles a custom group, then each of its custom fields.
    ///
    /// A group extending entity-column values gets its value list encoded
    /// into the store's padded form first, and the update is forced: the
    /// store never echoes that field back in comparable form. A custom
    /// field referencing its option group by name has the name resolved to
    /// an id up front; failure there aborts the whole sync.
    pub fn sync_custom_group(&self, doc: &CustomGroupSpec) -> ReconcileResult<SyncReport> {
        let mut report = SyncReport::default();
        let mut group = doc.group.clone();

        let force_update = group.fields.contains_key("extends_entity_column_value");
        if force_update {
            self.encode_extends_list(&mut group)?;
        }
        self.localize(&mut group);

        let Some(parent) = self.reconcile_record(
            "CustomGroup",
            &group,
            CUSTOM_GROUP_UPDATE_FIELDS,
            force_update,
            &mut report,
        )?
        else {
            return Ok(report);
        };
        let parent_id = require_id("CustomGroup", &parent)?;

        for field in &doc.fields {
            let mut spec = field.clone();
            self.localize(&mut spec);
            spec.fields
                .insert("custom_group_id".to_string(), Value::from(parent_id));
            spec.lookup_keys.push("custom_group_id".to_string());
            self.resolve_option_group_reference(&mut spec)?;
            self.reconcile_record(
                "CustomField",
                &spec,
                CUSTOM_FIELD_UPDATE_FIELDS,
                false,
                &mut report,
            )?;
        }
        Ok(report)
    }

    /// Reads, parses, and reconciles a custom-group document from a file.
    pub fn sync_custom_group_file(&self, path: impl AsRef<Path>) -> ReconcileResult<SyncReport> {
        self.sync_custom_group(&CustomGroupSpec::from_path(path)?)
    }

    /// The per-record state machine: absent → created, present → updated
    /// or unchanged, ambiguous → logged and skipped.
    ///
    /// Returns the resolved record, or `None` for a skipped one.
    fn reconcile_record(
        &self,
        entity_type: &str,
        spec: &RecordSpec,
        always_include: &[&str],
        force: bool,
        report: &mut SyncReport,
    ) -> ReconcileResult<Option<Record>> {
        match self.identify(entity_type, spec)? {
            Lookup::NotFound => {
                let record = self.create(entity_type, spec)?;
                report.push(entity_type, SyncAction::Created, record.id());
                Ok(Some(record))
            }
            Lookup::Found(current) => {
                match self.update(entity_type, spec, &current, always_include, force)? {
                    UpdateOutcome::Updated(record) => {
                        report.push(entity_type, SyncAction::Updated, record.id().or(current.id()));
                        Ok(Some(record))
                    }
                    UpdateOutcome::Unchanged => {
                        report.push(entity_type, SyncAction::Unchanged, current.id());
                        Ok(Some(current))
                    }
                }
            }
            Lookup::Ambiguous => {
                error!(
                    "cannot create or update {entity_type}: {}",
                    serde_json::Value::Object(spec.fields.clone())
                );
                report.push(entity_type, SyncAction::Skipped, None);
                Ok(None)
            }
        }
    }

    /// Normalizes `extends_entity_column_value` into the padded encoding.
    ///
    /// For groups extending `Activity`, non-numeric entries are activity
    /// type names and are resolved to their numeric codes first;
    /// unresolvable names are dropped.
    fn encode_extends_list(&self, group: &mut RecordSpec) -> ReconcileResult<()> {
        let Some(Value::Array(entries)) = group.fields.get("extends_entity_column_value").cloned()
        else {
            return Ok(());
        };

        let extends_activity =
            group.fields.get("extends").and_then(Value::as_str) == Some("Activity");

        let mut values = Vec::new();
        if extends_activity {
            // resolved on the first named entry, once
            let mut activity_types: Option<Option<u32>> = None;
            for entry in &entries {
                if let Some(code) = scalar_string(entry).filter(|s| is_numeric(s)) {
                    values.push(code);
                    continue;
                }
                let Some(name) = entry.as_str() else {
                    continue;
                };
                let group_id = match activity_types {
                    Some(cached) => cached,
                    None => *activity_types.insert(self.activity_type_group_id()?),
                };
                if let Some(group_id) = group_id
                    && let Some(code) = self.option_value_code(group_id, name)?
                {
                    values.push(code);
                }
            }
        } else {
            values.extend(entries.iter().filter_map(scalar_string));
        }

        group.fields.insert(
            "extends_entity_column_value".to_string(),
            Value::from(encode_padded(&values)),
        );
        Ok(())
    }

    /// Replaces a by-name `option_group_id` reference with the group's id.
    ///
    /// The child record cannot be constructed at all without the id, so a
    /// failed resolution aborts the enclosing sync instead of skipping the
    /// one field.
    fn resolve_option_group_reference(&self, spec: &mut RecordSpec) -> ReconcileResult<()> {
        let Some(value) = spec.fields.get("option_group_id") else {
            return Ok(());
        };
        if scalar_string(value).is_some_and(|s| is_numeric(&s)) {
            return Ok(());
        }
        let name = match value.as_str() {
            Some(name) if !name.is_empty() => name.to_string(),
            Some(_) => return Ok(()),
            None => {
                return Err(ReconcileError::UnresolvedOptionGroup {
                    name: value.to_string(),
                });
            }
        };

        let mut filter = Map::new();
        filter.insert("name".to_string(), Value::from(name.clone()));
        match self.lookup("OptionGroup", &filter)? {
            Lookup::Found(record) => {
                let id = require_id("OptionGroup", &record)?;
                spec.fields
                    .insert("option_group_id".to_string(), Value::from(id));
                Ok(())
            }
            Lookup::NotFound | Lookup::Ambiguous => {
                error!("cannot sync custom field, bad option group: {name}");
                Err(ReconcileError::UnresolvedOptionGroup { name })
            }
        }
    }

    /// Id of the `activity_type` option group, if the store has one.
    fn activity_type_group_id(&self) -> ReconcileResult<Option<u32>> {
        let mut filter = Map::new();
        filter.insert("name".to_string(), Value::from("activity_type"));
        match self.lookup("OptionGroup", &filter)? {
            Lookup::Found(record) => Ok(record.id()),
            Lookup::NotFound | Lookup::Ambiguous => Ok(None),
        }
    }

    /// Numeric code of a named option value within a group.
    fn option_value_code(&self, group_id: u32, name: &str) -> ReconcileResult<Option<String>> {
        let mut filter = Map::new();
        filter.insert("option_group_id".to_string(), Value::from(group_id));
        filter.insert("name".to_string(), Value::from(name));
        match self.lookup("OptionValue", &filter)? {
            Lookup::Found(record) => Ok(record.get("value").and_then(scalar_string)),
            Lookup::NotFound | Lookup::Ambiguous => Ok(None),
        }
    }
}

fn require_id(entity_type: &str, record: &Record) -> ReconcileResult<u32> {
    record.id().ok_or_else(|| ReconcileError::RecordWithoutId {
        entity_type: entity_type.to_string(),
    })
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
