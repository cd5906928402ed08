use crate::ResolveResult;
use crmsync_model::FieldDescriptor;
use crmsync_store::EntityApi;
use crmsync_types::{FieldId, GroupId};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Cache service for custom-field name/id translation.
///
/// Holds three lazily populated, process-lifetime caches. Every operation
/// that may need to load takes the store client as an argument; reads over
/// already-warm caches never touch the store.
#[derive(Debug, Default)]
pub struct ResolverContext {
    /// Group name → that group's field tables. Presence of an entry (even
    /// an empty one) means the group has been loaded.
    groups: HashMap<String, GroupFields>,
    /// Field id → descriptor. `None` records a lookup that found nothing,
    /// so each id hits the store at most once.
    fields: HashMap<FieldId, Option<FieldDescriptor>>,
    /// Group id → group name, loaded once in full on first use.
    group_names: Option<HashMap<GroupId, String>>,
    unresolved: u64,
}

#[derive(Debug, Default)]
struct GroupFields {
    by_name: HashMap<String, FieldDescriptor>,
    by_id: HashMap<FieldId, FieldDescriptor>,
}

impl ResolverContext {
    /// Creates a context with empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads descriptors for all uncached ids in one store round-trip.
    ///
    /// Ids the store does not return are cached as missing and will not be
    /// fetched again.
    pub fn warm_fields(&mut self, store: &dyn EntityApi, ids: &[FieldId]) -> ResolveResult<()> {
        let mut to_load: Vec<FieldId> = ids
            .iter()
            .copied()
            .filter(|id| !self.fields.contains_key(id))
            .collect();
        to_load.sort_unstable();
        to_load.dedup();
        if to_load.is_empty() {
            return Ok(());
        }

        let mut filter = Map::new();
        filter.insert(
            "id".to_string(),
            Value::Array(to_load.iter().map(|id| Value::from(id.value())).collect()),
        );
        let page = store.get("CustomField", &filter, None)?;

        for record in &page.records {
            if let Some(descriptor) = FieldDescriptor::from_record(record) {
                self.fields.insert(descriptor.id, Some(descriptor));
            }
        }
        for id in to_load {
            self.fields.entry(id).or_insert(None);
        }
        Ok(())
    }

    /// Loads the field tables of all uncached groups.
    ///
    /// A name the store cannot resolve to exactly one group is cached as an
    /// empty table: loaded, no fields.
    pub fn warm_groups<I, S>(&mut self, store: &dyn EntityApi, names: I) -> ResolveResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            if self.groups.contains_key(name) {
                continue;
            }

            let mut filter = Map::new();
            filter.insert("name".to_string(), Value::from(name));
            let page = store.get("CustomGroup", &filter, Some(2))?;
            let group_id = match page.count {
                1 => page.records.first().and_then(|record| record.id()),
                _ => None,
            };
            let Some(group_id) = group_id else {
                debug!("custom group not resolvable: {name}");
                self.groups.insert(name.to_string(), GroupFields::default());
                continue;
            };

            let mut filter = Map::new();
            filter.insert("custom_group_id".to_string(), Value::from(group_id));
            let page = store.get("CustomField", &filter, None)?;

            let mut table = GroupFields::default();
            for record in &page.records {
                if let Some(descriptor) = FieldDescriptor::from_record(record) {
                    table.by_name.insert(descriptor.name.clone(), descriptor.clone());
                    table.by_id.insert(descriptor.id, descriptor);
                }
            }
            self.groups.insert(name.to_string(), table);
        }
        Ok(())
    }

    /// Looks up a field descriptor by group and field name, loading the
    /// group on first use.
    pub fn field(
        &mut self,
        store: &dyn EntityApi,
        group: &str,
        name: &str,
    ) -> ResolveResult<Option<FieldDescriptor>> {
        self.warm_groups(store, [group])?;
        Ok(self.cached_field(group, name).cloned())
    }

    /// Looks up the store-native key (`custom_<id>`) for a field, loading
    /// the group on first use.
    pub fn field_key(
        &mut self,
        store: &dyn EntityApi,
        group: &str,
        name: &str,
    ) -> ResolveResult<Option<String>> {
        Ok(self.field(store, group, name)?.map(|d| d.key()))
    }

    /// Looks up a field descriptor by id, loading it on first use.
    pub fn field_by_id(
        &mut self,
        store: &dyn EntityApi,
        id: FieldId,
    ) -> ResolveResult<Option<FieldDescriptor>> {
        self.warm_fields(store, &[id])?;
        Ok(self.fields.get(&id).and_then(|cached| cached.clone()))
    }

    /// Looks up a field by id within one group's table, loading the group
    /// on first use.
    ///
    /// Unlike [`field_by_id`](Self::field_by_id), this answers from the
    /// group cache, so a field outside the named group is not found.
    pub fn group_field_by_id(
        &mut self,
        store: &dyn EntityApi,
        group: &str,
        id: FieldId,
    ) -> ResolveResult<Option<FieldDescriptor>> {
        self.warm_groups(store, [group])?;
        Ok(self
            .groups
            .get(group)
            .and_then(|table| table.by_id.get(&id))
            .cloned())
    }

    /// Returns the full group-id → group-name index, loading it on first
    /// use. The index is fetched in one call, never incrementally.
    pub fn group_names(
        &mut self,
        store: &dyn EntityApi,
    ) -> ResolveResult<&HashMap<GroupId, String>> {
        if self.group_names.is_none() {
            let page = store.get("CustomGroup", &Map::new(), None)?;
            let mut index = HashMap::new();
            for record in &page.records {
                if let (Some(id), Some(name)) = (record.id(), record.get_str("name")) {
                    index.insert(GroupId::new(id), name.to_string());
                }
            }
            self.group_names = Some(index);
        }
        Ok(self.group_names.get_or_insert_with(HashMap::new))
    }

    /// Returns the name of a custom group, loading the index on first use.
    pub fn group_name(
        &mut self,
        store: &dyn EntityApi,
        id: GroupId,
    ) -> ResolveResult<Option<String>> {
        Ok(self.group_names(store)?.get(&id).cloned())
    }

    /// Number of addressed keys left unchanged by
    /// [`resolve_custom_fields`](Self::resolve_custom_fields) because no
    /// cached field matched them.
    #[must_use]
    pub const fn unresolved_count(&self) -> u64 {
        self.unresolved
    }

    /// Drops a group's cached field table so the next use reloads it.
    pub fn invalidate_group(&mut self, name: &str) {
        self.groups.remove(name);
    }

    /// Drops a cached field descriptor so the next use reloads it.
    pub fn invalidate_field(&mut self, id: FieldId) {
        self.fields.remove(&id);
    }

    pub(crate) fn cached_field(&self, group: &str, name: &str) -> Option<&FieldDescriptor> {
        self.groups.get(group)?.by_name.get(name)
    }

    pub(crate) fn note_unresolved(&mut self) {
        self.unresolved += 1;
    }
}
