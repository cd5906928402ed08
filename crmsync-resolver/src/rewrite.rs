//! In-place rewriting of documents between the two field notations.
//!
//! These operations scan arbitrary caller-supplied documents, so an
//! unresolvable reference is never a hard error: labeling substitutes a
//! sentinel key, resolving leaves the key unchanged and counts it.

use crate::{ResolveResult, ResolverContext};
use crmsync_store::EntityApi;
use crmsync_types::{FieldId, FieldRef};
use serde_json::{Map, Value};
use tracing::debug;

/// Key prefix substituted for a legacy reference whose field (or its
/// owning group) cannot be resolved.
pub const FIELD_NOT_FOUND_PREFIX: &str = "FIELD_NOT_FOUND_";

impl ResolverContext {
    /// Rewrites legacy `custom_<id>` keys to the stable `<group>.<field>`
    /// notation, in place, down to `depth` container levels.
    ///
    /// All distinct ids found at a level are batch-loaded in one store
    /// call. Keys whose id cannot be resolved become
    /// `FIELD_NOT_FOUND_<id>` instead of failing.
    pub fn label_custom_fields(
        &mut self,
        store: &dyn EntityApi,
        data: &mut Value,
        depth: usize,
    ) -> ResolveResult<()> {
        if depth == 0 {
            return Ok(());
        }
        match data {
            Value::Object(map) => {
                let ids: Vec<FieldId> = map
                    .keys()
                    .filter_map(|key| match FieldRef::parse(key) {
                        Some(FieldRef::Id(id)) => Some(id),
                        _ => None,
                    })
                    .collect();
                self.warm_fields(store, &ids)?;

                let keys: Vec<String> = map.keys().cloned().collect();
                for key in keys {
                    let Some(FieldRef::Id(id)) = FieldRef::parse(&key) else {
                        continue;
                    };
                    let label = self.addressed_label(store, id)?;
                    if let Some(value) = map.remove(&key) {
                        map.insert(label, value);
                    }
                }

                for child in map.values_mut() {
                    self.label_custom_fields(store, child, depth - 1)?;
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.label_custom_fields(store, item, depth - 1)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Rewrites top-level `<group>.<field>` keys to the store-native
    /// `custom_<id>` notation, in place.
    ///
    /// The reserved `option`/`options` namespace is never touched; when a
    /// group filter is given, only those groups are eligible. Keys that
    /// match no cached field stay unchanged and are counted on
    /// [`unresolved_count`](Self::unresolved_count).
    pub fn resolve_custom_fields(
        &mut self,
        store: &dyn EntityApi,
        data: &mut Map<String, Value>,
        group_filter: Option<&[&str]>,
    ) -> ResolveResult<()> {
        let mut groups_used: Vec<String> = Vec::new();
        for key in data.keys() {
            if let Some(FieldRef::GroupField { group, .. }) = FieldRef::parse(key)
                && eligible(&group, group_filter)
                && !groups_used.contains(&group)
            {
                groups_used.push(group);
            }
        }
        self.warm_groups(store, &groups_used)?;

        let keys: Vec<String> = data.keys().cloned().collect();
        for key in keys {
            let Some(FieldRef::GroupField { group, field }) = FieldRef::parse(&key) else {
                continue;
            };
            if !eligible(&group, group_filter) {
                continue;
            }
            match self.cached_field(&group, &field) {
                Some(descriptor) => {
                    let new_key = descriptor.key();
                    if let Some(value) = data.remove(&key) {
                        data.insert(new_key, value);
                    }
                }
                None => {
                    debug!("unresolved custom field reference left unchanged: {key}");
                    self.note_unresolved();
                }
            }
        }
        Ok(())
    }

    /// Recovers dotted notation from transports that flatten dots to
    /// underscores: for each group name, a key starting with `<group>_`
    /// gains a duplicate entry under `<group>.<rest>`, original retained.
    ///
    /// With no explicit list, every group in the group-name index is
    /// processed.
    pub fn unrest(
        &mut self,
        store: &dyn EntityApi,
        params: &mut Map<String, Value>,
        group_names: Option<&[&str]>,
    ) -> ResolveResult<()> {
        let names: Vec<String> = match group_names {
            Some(list) => list.iter().map(|s| (*s).to_string()).collect(),
            None => self.group_names(store)?.values().cloned().collect(),
        };

        for group in &names {
            let prefix = format!("{group}_");
            let keys: Vec<String> = params
                .keys()
                .filter(|key| key.starts_with(&prefix))
                .cloned()
                .collect();
            for key in keys {
                let rest = &key[prefix.len()..];
                let new_key = format!("{group}.{rest}");
                if let Some(value) = params.get(&key).cloned() {
                    params.insert(new_key, value);
                }
            }
        }
        Ok(())
    }

    fn addressed_label(&mut self, store: &dyn EntityApi, id: FieldId) -> ResolveResult<String> {
        if let Some(descriptor) = self.field_by_id(store, id)?
            && let Some(group) = self.group_name(store, descriptor.group_id)?
        {
            return Ok(format!("{group}.{}", descriptor.name));
        }
        Ok(format!("{FIELD_NOT_FOUND_PREFIX}{id}"))
    }
}

/// The `option`/`options` namespace is reserved for store API options and
/// is never rewritten; an explicit filter further restricts eligibility.
fn eligible(group: &str, group_filter: Option<&[&str]>) -> bool {
    if group == "option" || group == "options" {
        return false;
    }
    match group_filter {
        Some(filter) => filter.contains(&group),
        None => true,
    }
}
