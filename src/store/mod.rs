//! State container and reducers.
//!
//! ```text
//! Action ──→ AdminStore::apply ──→ sub-reducers ──→ AdminState ──→ subscribers
//!    ↑                                                               │
//!    └───────────────────── runtime / UI ────────────────────────────┘
//! ```
//!
//! The store is the single writer: `apply` serializes all state
//! transitions behind one lock, and each sub-reducer is a pure function
//! `(State, Intent) -> State`. Consumers read snapshots freely and watch a
//! version channel for changes. There are no hidden globals; tests build a
//! fresh store per case.

mod action;
pub mod list_params;
pub mod loading;
pub mod notifications;
pub mod references;
pub mod resources;

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

pub use action::{deleted_ids, register_resource, Action};
pub use list_params::{ListParamsIntent, ListParamsReducer, ListParamsState, ListQueryState};
pub use loading::{FetchVerb, LoadingIntent, LoadingReducer, LoadingState};
pub use notifications::{NotificationIntent, NotificationReducer, NotificationState};
pub use references::{relation_key, ReferenceBucket, ReferenceIndex, ReferencesIntent, ReferencesReducer};
pub use resources::{ResourceState, ResourcesIntent, ResourcesReducer, ResourcesState};

use crate::intent::{MutationKind, QueryKind};

/// Marker trait for store sub-states.
pub trait StoreState: Clone + PartialEq + Default + Send + 'static {}

/// Marker trait for intents processed by a reducer.
pub trait Intent: Send + 'static {}

/// A pure state transition: `(State, Intent) -> State`.
///
/// Reducers never perform side effects; everything effectful lives in the
/// runtime around the dispatch call.
pub trait Reducer {
    type State: StoreState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}

/// The combined state of the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdminState {
    pub resources: ResourcesState,
    pub references: ReferenceIndex,
    pub list_params: ListParamsState,
    pub loading: LoadingState,
    pub notifications: NotificationState,
}

/// Single-writer state container with `apply`/`subscribe`/`snapshot`.
#[derive(Clone)]
pub struct AdminStore {
    state: Arc<Mutex<AdminState>>,
    version: Arc<watch::Sender<u64>>,
}

impl AdminStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        AdminStore {
            state: Arc::new(Mutex::new(AdminState::default())),
            version: Arc::new(version),
        }
    }

    /// Watch for state changes. The value is a monotonically increasing
    /// version; read the state through [`AdminStore::with_state`] after a
    /// change is observed.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Read the current state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&AdminState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Clone the full state. Cheap enough for tests and small views.
    pub fn snapshot(&self) -> AdminState {
        self.state.lock().clone()
    }

    /// Apply an action to all sub-states, synchronously and in order.
    ///
    /// `Query`/`Mutation`/`Refresh` actions produce no state change here:
    /// they are instructions to the runtime, which answers with follow-up
    /// actions that do.
    pub fn apply(&self, action: &Action) {
        {
            let mut state = self.state.lock();
            Self::transition(&mut state, action);
        }
        self.version.send_modify(|v| *v += 1);
    }

    fn transition(state: &mut AdminState, action: &Action) {
        match action {
            Action::Query(_) | Action::Mutation(_) | Action::Refresh => {}

            Action::FetchStarted { verb } => {
                reduce_in_place::<LoadingReducer>(
                    &mut state.loading,
                    LoadingIntent::Started { verb: *verb },
                );
            }
            Action::FetchCancelled { verb } => {
                reduce_in_place::<LoadingReducer>(
                    &mut state.loading,
                    LoadingIntent::Finished { verb: *verb },
                );
            }

            Action::Optimistic(intent) => {
                Self::apply_mutation_to_caches(state, intent, None);
            }

            Action::QueryDone {
                intent,
                data,
                total,
            } => {
                reduce_in_place::<LoadingReducer>(
                    &mut state.loading,
                    LoadingIntent::Finished {
                        verb: FetchVerb::of_query(intent),
                    },
                );
                match &intent.kind {
                    QueryKind::GetList { .. } => {
                        reduce_in_place::<ResourcesReducer>(
                            &mut state.resources,
                            ResourcesIntent::ListFetched {
                                resource: intent.resource.clone(),
                                records: data.clone(),
                                total: total.unwrap_or(data.len() as u64),
                            },
                        );
                    }
                    QueryKind::GetOne { .. } | QueryKind::GetMany { .. } => {
                        reduce_in_place::<ResourcesReducer>(
                            &mut state.resources,
                            ResourcesIntent::Upsert {
                                resource: intent.resource.clone(),
                                records: data.clone(),
                            },
                        );
                    }
                    QueryKind::GetManyReference {
                        source,
                        target,
                        parent_id,
                        params,
                    } => {
                        reduce_in_place::<ResourcesReducer>(
                            &mut state.resources,
                            ResourcesIntent::Upsert {
                                resource: intent.resource.clone(),
                                records: data.clone(),
                            },
                        );
                        let key = relation_key(
                            source,
                            &intent.resource,
                            target,
                            parent_id,
                            &params.filters,
                        );
                        reduce_in_place::<ReferencesReducer>(
                            &mut state.references,
                            ReferencesIntent::RecordsReceived {
                                relation_key: key,
                                ids: data.iter().map(|r| r.id.clone()).collect(),
                                total: total.unwrap_or(data.len() as u64),
                            },
                        );
                    }
                }
            }

            Action::QueryFailed { intent, .. } => {
                reduce_in_place::<LoadingReducer>(
                    &mut state.loading,
                    LoadingIntent::Finished {
                        verb: FetchVerb::of_query(intent),
                    },
                );
            }

            Action::MutationDone { intent, data } => {
                reduce_in_place::<LoadingReducer>(
                    &mut state.loading,
                    LoadingIntent::Finished {
                        verb: FetchVerb::of_mutation(intent),
                    },
                );
                Self::apply_mutation_to_caches(state, intent, data.as_ref());
            }

            Action::MutationFailed { intent, .. } => {
                // No rollback of earlier optimistic state: documented
                // eventual-consistency trade-off. The failure side effects
                // include a refresh that re-fetches the truth.
                reduce_in_place::<LoadingReducer>(
                    &mut state.loading,
                    LoadingIntent::Finished {
                        verb: FetchVerb::of_mutation(intent),
                    },
                );
            }

            Action::ListParams(intent) => {
                reduce_in_place::<ListParamsReducer>(&mut state.list_params, intent.clone());
            }

            Action::RegisterResource { name } => {
                reduce_in_place::<ResourcesReducer>(
                    &mut state.resources,
                    ResourcesIntent::Register {
                        resource: name.clone(),
                    },
                );
            }

            Action::ShowNotification(notification) => {
                reduce_in_place::<NotificationReducer>(
                    &mut state.notifications,
                    NotificationIntent::Show(notification.clone()),
                );
            }
            Action::HideNotification => {
                reduce_in_place::<NotificationReducer>(
                    &mut state.notifications,
                    NotificationIntent::Hide,
                );
            }
        }
    }

    /// Apply a mutation's effect to record cache and reference index.
    ///
    /// Used both for the optimistic variant and for backend confirmation;
    /// the cache operations are idempotent (removing an absent id never
    /// decrements a total), so applying a confirmed delete after its
    /// optimistic twin changes nothing.
    fn apply_mutation_to_caches(
        state: &mut AdminState,
        intent: &crate::intent::MutationIntent,
        confirmed: Option<&crate::record::Record>,
    ) {
        match intent.kind {
            MutationKind::Delete | MutationKind::DeleteMany => {
                let ids = deleted_ids(intent);
                reduce_in_place::<ResourcesReducer>(
                    &mut state.resources,
                    ResourcesIntent::Remove {
                        resource: intent.resource.clone(),
                        ids: ids.clone(),
                    },
                );
                let references_intent = if intent.kind == MutationKind::Delete {
                    ReferencesIntent::RemoveDeleted {
                        resource: intent.resource.clone(),
                        id: ids.into_iter().next().unwrap_or(
                            crate::record::Identifier::Number(0),
                        ),
                    }
                } else {
                    ReferencesIntent::RemoveDeletedMany {
                        resource: intent.resource.clone(),
                        ids,
                    }
                };
                reduce_in_place::<ReferencesReducer>(&mut state.references, references_intent);
            }
            MutationKind::Update | MutationKind::UpdateMany => {
                if let Some(record) = confirmed {
                    reduce_in_place::<ResourcesReducer>(
                        &mut state.resources,
                        ResourcesIntent::Upsert {
                            resource: intent.resource.clone(),
                            records: vec![record.clone()],
                        },
                    );
                } else if let Some(data) = &intent.data {
                    for id in intent.affected_ids() {
                        reduce_in_place::<ResourcesReducer>(
                            &mut state.resources,
                            ResourcesIntent::Patch {
                                resource: intent.resource.clone(),
                                id,
                                data: data.clone(),
                            },
                        );
                    }
                }
            }
            MutationKind::Create => {
                // Nothing to apply optimistically (no id yet); on
                // confirmation the backend record lands in the cache.
                if let Some(record) = confirmed {
                    reduce_in_place::<ResourcesReducer>(
                        &mut state.resources,
                        ResourcesIntent::Upsert {
                            resource: intent.resource.clone(),
                            records: vec![record.clone()],
                        },
                    );
                }
            }
        }
    }
}

impl Default for AdminStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a pure reducer against a sub-state slot.
fn reduce_in_place<R: Reducer>(slot: &mut R::State, intent: R::Intent) {
    let state = mem::take(slot);
    *slot = R::reduce(state, intent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{crud_delete, crud_get_list};
    use crate::provider::ListQuery;
    use crate::record::{Identifier, Record};

    #[test]
    fn apply_bumps_version() {
        let store = AdminStore::new();
        let rx = store.subscribe();
        store.apply(&register_resource("posts"));
        assert_eq!(*rx.borrow(), 1);
    }

    #[test]
    fn query_done_merges_records_and_clears_loading() {
        let store = AdminStore::new();
        let intent = crud_get_list("posts", ListQuery::default());
        store.apply(&Action::FetchStarted {
            verb: FetchVerb::GetList,
        });
        assert!(store.with_state(|s| s.loading.is_loading()));
        store.apply(&Action::QueryDone {
            intent,
            data: vec![Record::new(1).with("title", "one")],
            total: Some(1),
        });
        let state = store.snapshot();
        assert!(!state.loading.is_loading());
        assert!(state
            .resources
            .record("posts", &Identifier::Number(1))
            .is_some());
        assert_eq!(state.resources.resources["posts"].list.total, 1);
    }

    #[test]
    fn optimistic_delete_then_confirmation_decrements_once() {
        let store = AdminStore::new();
        store.apply(&Action::QueryDone {
            intent: crud_get_list("posts", ListQuery::default()),
            data: vec![Record::new(1), Record::new(2)],
            total: Some(2),
        });
        let intent = crud_delete(
            "posts",
            Identifier::Number(1),
            Record::new(1),
            "/posts",
            None,
            true,
        );
        store.apply(&Action::Optimistic(intent.clone()));
        assert_eq!(
            store.with_state(|s| s.resources.resources["posts"].list.total),
            1
        );
        // backend confirmation replays the removal; totals must not move
        store.apply(&Action::MutationDone {
            intent,
            data: Some(Record::new(1)),
        });
        assert_eq!(
            store.with_state(|s| s.resources.resources["posts"].list.total),
            1
        );
    }
}
