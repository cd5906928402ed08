//! In-memory reference implementation of the entity API.
//!
//! Stores records in per-type tables with sequential id assignment,
//! matching filters by literal JSON equality. Used by the crate's own
//! tests and by embedding hosts that fake the platform.

use crate::{EntityApi, LookupPage, StoreError, StoreResult};
use crmsync_model::Record;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// An in-memory entity store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Table>>,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Record>,
    next_id: u32,
}

impl Table {
    fn assign_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fixture record verbatim, keeping a supplied `id` or
    /// assigning the next sequential one.
    ///
    /// Unlike [`EntityApi::create`], a supplied id does not have to exist
    /// already; this is for seeding test data.
    pub fn seed(&self, entity_type: &str, fields: Map<String, Value>) -> StoreResult<Record> {
        let mut tables = self.lock()?;
        let table = tables.entry(entity_type.to_string()).or_default();

        let mut record = Record::new(fields);
        match record.id() {
            Some(id) => table.next_id = table.next_id.max(id),
            None => {
                let id = table.assign_id();
                record.fields.insert("id".to_string(), Value::from(id));
            }
        }
        table.rows.push(record.clone());
        Ok(record)
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, Table>>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

impl EntityApi for MemoryStore {
    fn get(
        &self,
        entity_type: &str,
        filter: &Map<String, Value>,
        limit: Option<usize>,
    ) -> StoreResult<LookupPage> {
        let tables = self.lock()?;
        let rows = tables.get(entity_type).map(|t| t.rows.as_slice()).unwrap_or(&[]);

        let mut records: Vec<Record> = rows
            .iter()
            .filter(|record| matches_filter(record, filter))
            .cloned()
            .collect();
        if let Some(limit) = limit {
            records.truncate(limit);
        }

        debug!(
            "GET {entity_type}: {} match(es) for {}",
            records.len(),
            serde_json::Value::Object(filter.clone())
        );
        Ok(LookupPage {
            count: records.len(),
            records,
        })
    }

    fn create(&self, entity_type: &str, fields: &Map<String, Value>) -> StoreResult<Record> {
        let mut tables = self.lock()?;
        let table = tables.entry(entity_type.to_string()).or_default();

        let incoming = Record::new(fields.clone());
        if let Some(id) = incoming.id() {
            // upsert: merge the patch into the existing record
            let Some(row) = table.rows.iter_mut().find(|row| row.id() == Some(id)) else {
                return Err(StoreError::UnknownId {
                    entity_type: entity_type.to_string(),
                    id,
                });
            };
            for (key, value) in fields {
                row.fields.insert(key.clone(), value.clone());
            }
            debug!("UPDATE {entity_type} id {id}");
            return Ok(row.clone());
        }

        let mut record = incoming;
        let id = table.assign_id();
        record.fields.insert("id".to_string(), Value::from(id));
        table.rows.push(record.clone());
        debug!("CREATE {entity_type} id {id}");
        Ok(record)
    }
}

fn matches_filter(record: &Record, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(key, wanted)| {
        let Some(actual) = record.get(key) else {
            return false;
        };
        match wanted {
            Value::Array(options) => options.contains(actual),
            _ => actual == wanted,
        }
    })
}
