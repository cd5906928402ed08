use crmsync_model::{EntityBatch, Record, RecordSpec};
use crmsync_reconcile::{
    Localizer, Lookup, NoLocalization, ReconcileError, Reconciler, UpdateOutcome,
};
use crmsync_store::{EntityApi, LookupPage, MemoryStore, StoreError, StoreResult};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};
use std::cell::RefCell;

/// Records every store call so tests can assert exactly what was issued.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    calls: RefCell<Vec<Call>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Get { entity_type: String, filter: Value },
    Create { entity_type: String, fields: Value },
}

impl RecordingStore {
    fn new() -> Self {
        Self::default()
    }

    fn seed(&self, entity_type: &str, value: Value) {
        let Value::Object(fields) = value else {
            panic!("fixture must be an object");
        };
        self.inner.seed(entity_type, fields).unwrap();
    }

    fn creates(&self) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Create { .. }))
            .cloned()
            .collect()
    }

    fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl EntityApi for RecordingStore {
    fn get(
        &self,
        entity_type: &str,
        filter: &Map<String, Value>,
        limit: Option<usize>,
    ) -> StoreResult<LookupPage> {
        self.calls.borrow_mut().push(Call::Get {
            entity_type: entity_type.to_string(),
            filter: Value::Object(filter.clone()),
        });
        self.inner.get(entity_type, filter, limit)
    }

    fn create(&self, entity_type: &str, fields: &Map<String, Value>) -> StoreResult<Record> {
        self.calls.borrow_mut().push(Call::Create {
            entity_type: entity_type.to_string(),
            fields: Value::Object(fields.clone()),
        });
        self.inner.create(entity_type, fields)
    }
}

fn spec(value: Value) -> RecordSpec {
    RecordSpec::from_value(value).unwrap()
}

fn record(value: Value) -> Record {
    let Value::Object(fields) = value else {
        panic!("record fixture must be an object");
    };
    Record::new(fields)
}

fn batch(value: Value) -> EntityBatch {
    EntityBatch::from_value(value).unwrap()
}

// ── Identification ───────────────────────────────────────────────

#[test]
fn identify_finds_the_single_match() {
    let store = RecordingStore::new();
    store.seed("OptionGroup", json!({"id": 7, "name": "gender", "title": "Gender"}));
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let lookup = reconciler
        .identify("OptionGroup", &spec(json!({"_lookup": ["name"], "name": "gender"})))
        .unwrap();

    let Lookup::Found(found) = lookup else {
        panic!("expected Found, got {lookup:?}");
    };
    assert_eq!(found.id(), Some(7));
    assert_eq!(found.get_str("title"), Some("Gender"));
}

#[test]
fn identify_reports_absent_records() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let lookup = reconciler
        .identify("OptionGroup", &spec(json!({"_lookup": ["name"], "name": "ghost"})))
        .unwrap();
    assert!(matches!(lookup, Lookup::NotFound));
}

#[test]
fn identify_reports_ambiguous_lookups() {
    let store = RecordingStore::new();
    store.seed("OptionValue", json!({"id": 1, "name": "dup"}));
    store.seed("OptionValue", json!({"id": 2, "name": "dup"}));
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let lookup = reconciler
        .identify("OptionValue", &spec(json!({"_lookup": ["name"], "name": "dup"})))
        .unwrap();
    assert!(matches!(lookup, Lookup::Ambiguous));
}

#[test]
fn identify_without_lookup_keys_never_queries() {
    let store = RecordingStore::new();
    store.seed("OptionValue", json!({"id": 1, "name": "x"}));
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let lookup = reconciler
        .identify("OptionValue", &spec(json!({"name": "x"})))
        .unwrap();
    assert!(matches!(lookup, Lookup::NotFound));
    assert!(store.calls.borrow().is_empty());
}

#[test]
fn identify_with_missing_lookup_field_fails() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let err = reconciler
        .identify("OptionValue", &spec(json!({"_lookup": ["name"], "label": "x"})))
        .unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::MissingLookupField { ref field, .. } if field == "name"
    ));
}

#[test]
fn identify_builds_the_filter_from_lookup_keys_only() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    reconciler
        .identify(
            "OptionValue",
            &spec(json!({"_lookup": ["name"], "name": "a", "label": "Label"})),
        )
        .unwrap();

    assert_eq!(
        store.calls.borrow()[0],
        Call::Get {
            entity_type: "OptionValue".to_string(),
            filter: json!({"name": "a"}),
        }
    );
}

// ── Creation ─────────────────────────────────────────────────────

#[test]
fn create_submits_spec_fields_verbatim() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let created = reconciler
        .create(
            "OptionGroup",
            &spec(json!({"_lookup": ["name"], "name": "A", "title": "Alpha"})),
        )
        .unwrap();

    // directives never reach the store
    assert_eq!(
        store.creates(),
        vec![Call::Create {
            entity_type: "OptionGroup".to_string(),
            fields: json!({"name": "A", "title": "Alpha"}),
        }]
    );
    assert_eq!(created.id(), Some(1));
}

// ── Update ───────────────────────────────────────────────────────

#[test]
fn update_patches_only_changed_fields() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");
    store.seed("OptionGroup", json!({"id": 7, "name": "A", "title": "Alpha"}));

    let outcome = reconciler
        .update(
            "OptionGroup",
            &spec(json!({"_lookup": ["name"], "name": "A", "title": "Beta"})),
            &record(json!({"id": 7, "name": "A", "title": "Alpha"})),
            &[],
            false,
        )
        .unwrap();

    assert!(matches!(outcome, UpdateOutcome::Updated(_)));
    assert_eq!(
        store.creates(),
        vec![Call::Create {
            entity_type: "OptionGroup".to_string(),
            fields: json!({"id": 7, "title": "Beta"}),
        }]
    );
}

#[test]
fn update_with_no_changes_is_a_no_op() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let outcome = reconciler
        .update(
            "OptionGroup",
            &spec(json!({"name": "A", "title": "Alpha"})),
            &record(json!({"id": 7, "name": "A", "title": "Alpha"})),
            &[],
            false,
        )
        .unwrap();

    assert!(matches!(outcome, UpdateOutcome::Unchanged));
    assert!(store.calls.borrow().is_empty());
}

#[test]
fn update_stages_fields_absent_from_the_current_record() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");
    store.seed("OptionGroup", json!({"id": 7, "name": "A"}));

    reconciler
        .update(
            "OptionGroup",
            &spec(json!({"name": "A", "description": "fresh"})),
            &record(json!({"id": 7, "name": "A"})),
            &[],
            false,
        )
        .unwrap();

    assert_eq!(
        store.creates(),
        vec![Call::Create {
            entity_type: "OptionGroup".to_string(),
            fields: json!({"id": 7, "description": "fresh"}),
        }]
    );
}

#[test]
fn forced_update_with_empty_diff_sends_id_and_always_fields_only() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");
    store.seed("CustomGroup", json!({"id": 3, "name": "g", "title": "G", "extends": "Contact"}));

    let outcome = reconciler
        .update(
            "CustomGroup",
            &spec(json!({"name": "g", "title": "G"})),
            &record(json!({"id": 3, "name": "g", "title": "G", "extends": "Contact"})),
            &["title", "extends"],
            true,
        )
        .unwrap();

    assert!(matches!(outcome, UpdateOutcome::Updated(_)));
    assert_eq!(
        store.creates(),
        vec![Call::Create {
            entity_type: "CustomGroup".to_string(),
            fields: json!({"id": 3, "title": "G", "extends": "Contact"}),
        }]
    );
}

#[test]
fn always_fields_prefer_the_request_then_the_current_record() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");
    store.seed("CustomField", json!({"id": 5, "name": "f", "data_type": "String"}));

    reconciler
        .update(
            "CustomField",
            &spec(json!({"name": "f", "label": "New", "html_type": "Text"})),
            &record(json!({"id": 5, "name": "f", "label": "Old", "data_type": "String"})),
            &["html_type", "data_type", "is_view"],
            false,
        )
        .unwrap();

    let creates = store.creates();
    let Call::Create { fields, .. } = &creates[0] else {
        panic!("expected a create call");
    };
    // html_type from the request, data_type from the current record,
    // is_view present in neither and silently omitted
    assert_eq!(fields["html_type"], json!("Text"));
    assert_eq!(fields["data_type"], json!("String"));
    assert_eq!(fields["label"], json!("New"));
    assert!(fields.get("is_view").is_none());
}

#[test]
fn update_of_record_without_id_fails() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let err = reconciler
        .update(
            "OptionGroup",
            &spec(json!({"title": "Beta"})),
            &record(json!({"name": "A", "title": "Alpha"})),
            &[],
            false,
        )
        .unwrap_err();
    assert!(matches!(err, ReconcileError::RecordWithoutId { .. }));
}

// ── Batch state machine ──────────────────────────────────────────

#[test]
fn absent_record_is_created_with_directives_stripped() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let report = reconciler
        .sync_entities(&batch(json!({
            "entity": "OptionGroup",
            "_entities": [{"_lookup": ["name"], "name": "A", "title": "Alpha"}],
        })))
        .unwrap();

    assert_eq!(report.created(), 1);
    assert_eq!(
        store.creates(),
        vec![Call::Create {
            entity_type: "OptionGroup".to_string(),
            fields: json!({"name": "A", "title": "Alpha"}),
        }]
    );
}

#[test]
fn present_record_is_patched() {
    let store = RecordingStore::new();
    store.seed("OptionGroup", json!({"id": 7, "name": "A", "title": "Alpha"}));
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let report = reconciler
        .sync_entities(&batch(json!({
            "entity": "OptionGroup",
            "_entities": [{"_lookup": ["name"], "name": "A", "title": "Beta"}],
        })))
        .unwrap();

    assert_eq!(report.updated(), 1);
    assert_eq!(
        store.creates(),
        vec![Call::Create {
            entity_type: "OptionGroup".to_string(),
            fields: json!({"id": 7, "title": "Beta"}),
        }]
    );
}

#[test]
fn ambiguous_record_is_skipped_without_store_writes() {
    let store = RecordingStore::new();
    store.seed("OptionValue", json!({"id": 1, "name": "dup"}));
    store.seed("OptionValue", json!({"id": 2, "name": "dup"}));
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let report = reconciler
        .sync_entities(&batch(json!({
            "entity": "OptionValue",
            "_entities": [
                {"_lookup": ["name"], "name": "dup", "label": "X"},
                {"_lookup": ["name"], "name": "fresh", "label": "Y"},
            ],
        })))
        .unwrap();

    // the ambiguous record is skipped, the batch continues
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.created(), 1);
    assert_eq!(store.creates().len(), 1);
}

#[test]
fn second_run_is_idempotent() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");
    let doc = batch(json!({
        "entity": "OptionGroup",
        "_entities": [{"_lookup": ["name"], "name": "A", "title": "Alpha"}],
    }));

    let first = reconciler.sync_entities(&doc).unwrap();
    assert_eq!(first.created(), 1);
    let first_id = first.outcomes[0].id;
    store.clear();

    let second = reconciler.sync_entities(&doc).unwrap();
    assert_eq!(second.unchanged(), 1);
    assert_eq!(second.outcomes[0].id, first_id);
    // second run issued no create and no update call
    assert!(store.creates().is_empty());
}

// ── Localization ─────────────────────────────────────────────────

struct TaggingLocalizer;

impl Localizer for TaggingLocalizer {
    fn translate(&self, text: &str, domain: &str) -> String {
        format!("{domain}:{text}")
    }
}

#[test]
fn translate_keys_are_localized_before_store_access() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &TaggingLocalizer, "my.ext");

    reconciler
        .sync_entities(&batch(json!({
            "entity": "OptionGroup",
            "_entities": [{
                "_lookup": ["name"],
                "_translate": ["title"],
                "name": "gender",
                "title": "Gender",
            }],
        })))
        .unwrap();

    assert_eq!(
        store.creates(),
        vec![Call::Create {
            entity_type: "OptionGroup".to_string(),
            fields: json!({"name": "gender", "title": "my.ext:Gender"}),
        }]
    );
}

#[test]
fn only_string_values_are_localized() {
    let store = RecordingStore::new();
    let reconciler = Reconciler::new(&store, &TaggingLocalizer, "my.ext");

    reconciler
        .sync_entities(&batch(json!({
            "entity": "OptionValue",
            "_entities": [{
                "_lookup": ["name"],
                "_translate": ["weight"],
                "name": "v",
                "weight": 3,
            }],
        })))
        .unwrap();

    let creates = store.creates();
    let Call::Create { fields, .. } = &creates[0] else {
        panic!("expected a create call");
    };
    assert_eq!(fields["weight"], json!(3));
}

// ── Store failure propagation ────────────────────────────────────

struct FailingStore;

impl EntityApi for FailingStore {
    fn get(
        &self,
        _entity_type: &str,
        _filter: &Map<String, Value>,
        _limit: Option<usize>,
    ) -> StoreResult<LookupPage> {
        Err(StoreError::Backend("connection lost".to_string()))
    }

    fn create(&self, _entity_type: &str, _fields: &Map<String, Value>) -> StoreResult<Record> {
        Err(StoreError::Backend("connection lost".to_string()))
    }
}

#[test]
fn store_failures_propagate_unchanged() {
    let store = FailingStore;
    let reconciler = Reconciler::new(&store, &NoLocalization, "test");

    let err = reconciler
        .sync_entities(&batch(json!({
            "entity": "OptionGroup",
            "_entities": [{"_lookup": ["name"], "name": "A"}],
        })))
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Store(StoreError::Backend(_))));
}
