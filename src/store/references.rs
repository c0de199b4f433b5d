//! Derived one-to-many reference index.
//!
//! Maps a relation query ("comments of post 5, filtered by X") to an
//! ordered id list plus the backend-reported total. Buckets hold ids only;
//! the records themselves live in the resource data store.
//!
//! Optimistic deletes patch every bucket whose key references the deleted
//! resource. The scan is linear over buckets, which is bounded by the
//! number of distinct (relation x filter) combinations in view, not by
//! record count.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::record::Identifier;

use super::{Intent, Reducer, StoreState};

/// Cached id list and total for one relation query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceBucket {
    pub ids: Vec<Identifier>,
    pub total: u64,
}

/// All reference buckets, keyed by [`relation_key`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceIndex {
    pub buckets: HashMap<String, ReferenceBucket>,
}

impl StoreState for ReferenceIndex {}

impl ReferenceIndex {
    pub fn ids(&self, relation_key: &str) -> Option<&[Identifier]> {
        self.buckets.get(relation_key).map(|b| b.ids.as_slice())
    }

    pub fn total(&self, relation_key: &str) -> Option<u64> {
        self.buckets.get(relation_key).map(|b| b.total)
    }
}

/// Deterministic key for a relation query: records of `reference` whose
/// `target` field points at `parent_id`, viewed from `resource`.
///
/// Filter keys are sorted before serialization so identical queries
/// collapse to the same bucket regardless of call-site map order.
pub fn relation_key(
    resource: &str,
    reference: &str,
    target: &str,
    parent_id: &Identifier,
    filter: &Map<String, Value>,
) -> String {
    let base = format!("{}_{}@{}_{}", resource, reference, target, parent_id);
    if filter.is_empty() {
        return base;
    }
    let mut keys: Vec<&String> = filter.keys().collect();
    keys.sort();
    let serialized = keys
        .iter()
        .map(|k| format!("{}={}", k, filter[k.as_str()]))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", base, serialized)
}

#[derive(Debug, Clone)]
pub enum ReferencesIntent {
    /// A reference fetch completed: replace the bucket.
    RecordsReceived {
        relation_key: String,
        ids: Vec<Identifier>,
        total: u64,
    },
    /// A record of `resource` was deleted (optimistically or for real).
    RemoveDeleted {
        resource: String,
        id: Identifier,
    },
    RemoveDeletedMany {
        resource: String,
        ids: Vec<Identifier>,
    },
}

impl Intent for ReferencesIntent {}

pub struct ReferencesReducer;

impl Reducer for ReferencesReducer {
    type State = ReferenceIndex;
    type Intent = ReferencesIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            ReferencesIntent::RecordsReceived {
                relation_key,
                ids,
                total,
            } => {
                state
                    .buckets
                    .insert(relation_key, ReferenceBucket { ids, total });
            }
            ReferencesIntent::RemoveDeleted { resource, id } => {
                remove_from_matching(&mut state, &resource, std::slice::from_ref(&id));
            }
            ReferencesIntent::RemoveDeletedMany { resource, ids } => {
                remove_from_matching(&mut state, &resource, &ids);
            }
        }
        state
    }
}

/// Filter deleted ids out of every bucket whose key references `resource`,
/// decrementing each total by the count actually removed. Removing an id
/// that is already absent decrements nothing, so the operation is
/// idempotent and totals never go negative.
fn remove_from_matching(state: &mut ReferenceIndex, resource: &str, ids: &[Identifier]) {
    for (key, bucket) in state.buckets.iter_mut() {
        if !key.contains(resource) {
            continue;
        }
        let before = bucket.ids.len();
        bucket.ids.retain(|id| !ids.contains(id));
        let removed = (before - bucket.ids.len()) as u64;
        bucket.total = bucket.total.saturating_sub(removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bucket(ids: &[i64], total: u64) -> ReferencesIntent {
        ReferencesIntent::RecordsReceived {
            relation_key: "posts_comments@post_id_5".to_string(),
            ids: ids.iter().map(|n| Identifier::Number(*n)).collect(),
            total,
        }
    }

    #[test]
    fn relation_key_without_filter() {
        assert_eq!(
            relation_key("posts", "comments", "post_id", &Identifier::Number(5), &Map::new()),
            "posts_comments@post_id_5"
        );
    }

    #[test]
    fn relation_key_sorts_filter_keys() {
        let mut filter = Map::new();
        filter.insert("status".to_string(), json!("published"));
        filter.insert("author".to_string(), json!(7));
        let key = relation_key(
            "posts",
            "comments",
            "post_id",
            &Identifier::Number(5),
            &filter,
        );
        assert_eq!(key, "posts_comments@post_id_5?author=7&status=\"published\"");
    }

    #[test]
    fn optimistic_delete_patches_matching_bucket() {
        let state = ReferencesReducer::reduce(ReferenceIndex::default(), bucket(&[1, 2, 3], 3));
        let state = ReferencesReducer::reduce(
            state,
            ReferencesIntent::RemoveDeleted {
                resource: "comments".to_string(),
                id: Identifier::Number(2),
            },
        );
        assert_eq!(
            state.ids("posts_comments@post_id_5").unwrap(),
            &[Identifier::Number(1), Identifier::Number(3)]
        );
        assert_eq!(state.total("posts_comments@post_id_5"), Some(2));
    }

    #[test]
    fn delete_of_unrelated_resource_leaves_bucket_alone() {
        let state = ReferencesReducer::reduce(ReferenceIndex::default(), bucket(&[1, 2], 2));
        let state = ReferencesReducer::reduce(
            state,
            ReferencesIntent::RemoveDeleted {
                resource: "tags".to_string(),
                id: Identifier::Number(1),
            },
        );
        assert_eq!(state.total("posts_comments@post_id_5"), Some(2));
    }

    #[test]
    fn remove_deleted_is_idempotent() {
        let state = ReferencesReducer::reduce(ReferenceIndex::default(), bucket(&[1, 2, 3], 3));
        let delete = ReferencesIntent::RemoveDeleted {
            resource: "comments".to_string(),
            id: Identifier::Number(2),
        };
        let state = ReferencesReducer::reduce(state, delete.clone());
        let state = ReferencesReducer::reduce(state, delete);
        assert_eq!(state.total("posts_comments@post_id_5"), Some(2));
        assert_eq!(state.ids("posts_comments@post_id_5").unwrap().len(), 2);
    }

    #[test]
    fn delete_many_decrements_by_ids_actually_present() {
        let state = ReferencesReducer::reduce(ReferenceIndex::default(), bucket(&[1, 2, 3], 3));
        let state = ReferencesReducer::reduce(
            state,
            ReferencesIntent::RemoveDeletedMany {
                resource: "comments".to_string(),
                // 99 is not in the bucket; only 1 and 3 count
                ids: vec![
                    Identifier::Number(1),
                    Identifier::Number(3),
                    Identifier::Number(99),
                ],
            },
        );
        assert_eq!(
            state.ids("posts_comments@post_id_5").unwrap(),
            &[Identifier::Number(2)]
        );
        assert_eq!(state.total("posts_comments@post_id_5"), Some(1));
    }

    #[test]
    fn total_never_goes_negative() {
        let state = ReferencesReducer::reduce(ReferenceIndex::default(), bucket(&[1], 0));
        let state = ReferencesReducer::reduce(
            state,
            ReferencesIntent::RemoveDeleted {
                resource: "comments".to_string(),
                id: Identifier::Number(1),
            },
        );
        assert_eq!(state.total("posts_comments@post_id_5"), Some(0));
    }
}
