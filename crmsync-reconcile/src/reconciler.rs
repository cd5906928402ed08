use crate::{Localizer, ReconcileError, ReconcileResult};
use crmsync_model::{Record, RecordSpec};
use crmsync_store::EntityApi;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// Result of identifying a record in the store.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// No record matches the filter.
    NotFound,
    /// Exactly one record matches.
    Found(Record),
    /// Two or more records match a supposedly-unique filter; the caller
    /// must not create or update.
    Ambiguous,
}

/// Result of a selective-field update.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// Nothing differed and no update was forced; no store call was made.
    Unchanged,
    /// A patch was submitted; the store's view of the record.
    Updated(Record),
}

/// Drives create-or-update reconciliation against the entity store.
///
/// Holds only its collaborators; all sync state lives in the store and in
/// the per-call specification documents.
pub struct Reconciler<'a> {
    store: &'a dyn EntityApi,
    localizer: &'a dyn Localizer,
    domain: String,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler bound to a store client, a localizer, and the
    /// text domain passed to it.
    pub fn new(
        store: &'a dyn EntityApi,
        localizer: &'a dyn Localizer,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            store,
            localizer,
            domain: domain.into(),
        }
    }

    /// Determines whether a record matching the spec's lookup keys exists.
    ///
    /// A spec with no lookup keys is never queried: the store would match
    /// everything, so it is treated as not found.
    pub fn identify(&self, entity_type: &str, spec: &RecordSpec) -> ReconcileResult<Lookup> {
        if spec.lookup_keys.is_empty() {
            return Ok(Lookup::NotFound);
        }

        let mut filter = Map::new();
        for key in &spec.lookup_keys {
            let Some(value) = spec.fields.get(key) else {
                return Err(ReconcileError::MissingLookupField {
                    entity_type: entity_type.to_string(),
                    field: key.clone(),
                });
            };
            filter.insert(key.clone(), value.clone());
        }
        self.lookup(entity_type, &filter)
    }

    /// Runs a bounded lookup and classifies the result.
    pub fn lookup(&self, entity_type: &str, filter: &Map<String, Value>) -> ReconcileResult<Lookup> {
        if filter.is_empty() {
            return Ok(Lookup::NotFound);
        }

        debug!("LOOKUP {entity_type}: {}", serde_json::Value::Object(filter.clone()));
        let page = self.store.get(entity_type, filter, Some(2))?;
        let count = page.count;
        match (count, page.records.into_iter().next()) {
            (0, _) | (_, None) => Ok(Lookup::NotFound),
            (1, Some(record)) => Ok(Lookup::Found(record)),
            _ => {
                error!(
                    "ambiguous {entity_type} lookup, filter matched {count} records: {}",
                    serde_json::Value::Object(filter.clone())
                );
                Ok(Lookup::Ambiguous)
            }
        }
    }

    /// Persists a new record from the spec's fields, verbatim.
    ///
    /// `RecordSpec::fields` is directive-free by construction, so the spec
    /// goes to the store as-is.
    pub fn create(&self, entity_type: &str, spec: &RecordSpec) -> ReconcileResult<Record> {
        debug!("CREATE {entity_type}: {}", serde_json::Value::Object(spec.fields.clone()));
        Ok(self.store.create(entity_type, &spec.fields)?)
    }

    /// Patches `current` with whatever the spec changes.
    ///
    /// Fields whose requested value differs from, or is absent in, the
    /// current record are staged. With an empty diff and no `force`, this
    /// is a no-op. Otherwise the patch carries the record id plus every
    /// `always_include` field: attributes the store does not round-trip
    /// faithfully, which equality-based diffing would spuriously skip.
    pub fn update(
        &self,
        entity_type: &str,
        spec: &RecordSpec,
        current: &Record,
        always_include: &[&str],
        force: bool,
    ) -> ReconcileResult<UpdateOutcome> {
        let mut patch = Map::new();
        for (field, value) in &spec.fields {
            if current.get(field) != Some(value) {
                patch.insert(field.clone(), value.clone());
            }
        }

        if patch.is_empty() && !force {
            return Ok(UpdateOutcome::Unchanged);
        }

        let Some(id) = current.id() else {
            return Err(ReconcileError::RecordWithoutId {
                entity_type: entity_type.to_string(),
            });
        };
        patch.insert("id".to_string(), Value::from(id));

        for field in always_include {
            if let Some(value) = spec.fields.get(*field).or_else(|| current.get(*field)) {
                patch.insert((*field).to_string(), value.clone());
            }
        }

        info!("UPDATE {entity_type}: {}", serde_json::Value::Object(patch.clone()));
        Ok(UpdateOutcome::Updated(self.store.create(entity_type, &patch)?))
    }

    /// Localizes the string values of the spec's translatable fields.
    pub fn localize(&self, spec: &mut RecordSpec) {
        for key in &spec.translate_keys {
            let Some(Value::String(text)) = spec.fields.get(key) else {
                continue;
            };
            let translated = self.localizer.translate(text, &self.domain);
            spec.fields.insert(key.clone(), Value::String(translated));
        }
    }
}
