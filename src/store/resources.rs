//! Normalized per-resource record cache.
//!
//! The data store is the single owner of [`Record`] values. It merges
//! fetched records by id (last write wins) and applies optimistic
//! mutations synchronously. An optimistic delete is NOT rolled back when
//! the real request later fails; the refresh that accompanies the failure
//! notification re-fetches the truth instead.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::record::{Identifier, Record};

use super::{Intent, Reducer, StoreState};

/// The visible slice of a resource's list view: ordered ids plus the
/// total reported by the backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListSlice {
    pub ids: Vec<Identifier>,
    pub total: u64,
    /// Whether a list fetch ever completed for this resource.
    pub loaded: bool,
}

/// Cache for one resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceState {
    pub data: HashMap<Identifier, Record>,
    pub list: ListSlice,
}

/// Caches for all registered resources.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourcesState {
    pub resources: HashMap<String, ResourceState>,
}

impl StoreState for ResourcesState {}

impl ResourcesState {
    pub fn is_registered(&self, resource: &str) -> bool {
        self.resources.contains_key(resource)
    }

    /// Look up one record. Referencing an undeclared resource is a
    /// diagnostic, not an error: logs and returns `None`.
    pub fn record(&self, resource: &str, id: &Identifier) -> Option<&Record> {
        let Some(state) = self.resources.get(resource) else {
            tracing::error!(
                resource,
                "invalid resource: it has not been registered, returning no data"
            );
            return None;
        };
        state.data.get(id)
    }

    /// Look up several records, skipping ids that are not cached yet.
    pub fn records(&self, resource: &str, ids: &[Identifier]) -> Vec<Record> {
        if ids.is_empty() {
            return Vec::new();
        }
        if !self.is_registered(resource) {
            tracing::error!(
                resource,
                "invalid resource: it has not been registered, returning no data"
            );
            return Vec::new();
        }
        ids.iter()
            .filter_map(|id| self.record(resource, id).cloned())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum ResourcesIntent {
    /// Declare a resource so reads against it are legal.
    Register { resource: String },
    /// Merge fetched records into the cache (get-one/get-many shapes).
    Upsert {
        resource: String,
        records: Vec<Record>,
    },
    /// Merge fetched records and replace the list slice (get-list shape).
    ListFetched {
        resource: String,
        records: Vec<Record>,
        total: u64,
    },
    /// Drop records, optimistically or after a confirmed delete.
    Remove {
        resource: String,
        ids: Vec<Identifier>,
    },
    /// Patch one cached record in place (optimistic update).
    Patch {
        resource: String,
        id: Identifier,
        data: Map<String, Value>,
    },
}

impl Intent for ResourcesIntent {}

pub struct ResourcesReducer;

impl Reducer for ResourcesReducer {
    type State = ResourcesState;
    type Intent = ResourcesIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            ResourcesIntent::Register { resource } => {
                state.resources.entry(resource).or_default();
            }
            ResourcesIntent::Upsert { resource, records } => {
                upsert(state.resources.entry(resource).or_default(), records);
            }
            ResourcesIntent::ListFetched {
                resource,
                records,
                total,
            } => {
                let entry = state.resources.entry(resource).or_default();
                let ids = records.iter().map(|r| r.id.clone()).collect();
                upsert(entry, records);
                entry.list = ListSlice {
                    ids,
                    total,
                    loaded: true,
                };
            }
            ResourcesIntent::Remove { resource, ids } => {
                let entry = state.resources.entry(resource).or_default();
                for id in &ids {
                    entry.data.remove(id);
                }
                let before = entry.list.ids.len();
                entry.list.ids.retain(|id| !ids.contains(id));
                let removed = (before - entry.list.ids.len()) as u64;
                entry.list.total = entry.list.total.saturating_sub(removed);
            }
            ResourcesIntent::Patch { resource, id, data } => {
                let entry = state.resources.entry(resource).or_default();
                if let Some(record) = entry.data.get_mut(&id) {
                    record.merge(&data);
                }
            }
        }
        state
    }
}

fn upsert(entry: &mut ResourceState, records: Vec<Record>) {
    for record in records {
        match entry.data.get_mut(&record.id) {
            // Merge so a partial projection cannot erase known fields.
            Some(existing) => existing.merge(&record.fields),
            None => {
                entry.data.insert(record.id.clone(), record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reduce(state: ResourcesState, intent: ResourcesIntent) -> ResourcesState {
        ResourcesReducer::reduce(state, intent)
    }

    fn seeded() -> ResourcesState {
        reduce(
            ResourcesState::default(),
            ResourcesIntent::ListFetched {
                resource: "posts".to_string(),
                records: vec![
                    Record::new(1).with("title", "one"),
                    Record::new(2).with("title", "two"),
                ],
                total: 2,
            },
        )
    }

    #[test]
    fn upsert_merges_last_write_wins() {
        let state = seeded();
        let state = reduce(
            state,
            ResourcesIntent::Upsert {
                resource: "posts".to_string(),
                records: vec![Record::new(1).with("title", "edited").with("votes", 4)],
            },
        );
        let record = state.record("posts", &Identifier::Number(1)).unwrap();
        assert_eq!(record.get("title"), Some(&json!("edited")));
        assert_eq!(record.get("votes"), Some(&json!(4)));
    }

    #[test]
    fn list_fetched_replaces_slice() {
        let state = seeded();
        let slice = &state.resources["posts"].list;
        assert_eq!(slice.ids, vec![Identifier::Number(1), Identifier::Number(2)]);
        assert_eq!(slice.total, 2);
        assert!(slice.loaded);
    }

    #[test]
    fn remove_drops_record_and_fixes_slice() {
        let state = seeded();
        let state = reduce(
            state,
            ResourcesIntent::Remove {
                resource: "posts".to_string(),
                ids: vec![Identifier::Number(1)],
            },
        );
        assert!(state.resources["posts"]
            .data
            .get(&Identifier::Number(1))
            .is_none());
        assert_eq!(state.resources["posts"].list.ids, vec![Identifier::Number(2)]);
        assert_eq!(state.resources["posts"].list.total, 1);
    }

    #[test]
    fn remove_absent_id_does_not_decrement_total() {
        let state = seeded();
        let state = reduce(
            state,
            ResourcesIntent::Remove {
                resource: "posts".to_string(),
                ids: vec![Identifier::Number(99)],
            },
        );
        assert_eq!(state.resources["posts"].list.total, 2);
    }

    #[test]
    fn patch_merges_fields() {
        let state = seeded();
        let mut patch = Map::new();
        patch.insert("title".to_string(), json!("patched"));
        let state = reduce(
            state,
            ResourcesIntent::Patch {
                resource: "posts".to_string(),
                id: Identifier::Number(2),
                data: patch,
            },
        );
        let record = state.record("posts", &Identifier::Number(2)).unwrap();
        assert_eq!(record.get("title"), Some(&json!("patched")));
    }

    #[test]
    fn unregistered_resource_reads_degrade_to_no_data() {
        let state = ResourcesState::default();
        assert!(state.record("ghosts", &Identifier::Number(1)).is_none());
        assert!(state.records("ghosts", &[Identifier::Number(1)]).is_empty());
    }
}
