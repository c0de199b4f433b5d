//! The action vocabulary of the pipeline.
//!
//! Dispatched intents are the only consumer-facing API surface of the
//! core: UI layers build actions (usually through the intent factory) and
//! dispatch them; they never mutate the caches directly. Follow-up actions
//! (fetch outcomes, optimistic variants) are emitted by the runtime and
//! flow through the same dispatch path.

use crate::error::DataError;
use crate::intent::{MutationIntent, MutationKind, QueryIntent, QueryKind};
use crate::notification::Notification;
use crate::record::{Identifier, Record};

use super::list_params::ListParamsIntent;
use super::loading::FetchVerb;

#[derive(Debug, Clone)]
pub enum Action {
    /// Run a read-only fetch through the provider.
    Query(QueryIntent),
    /// Run a mutation. Undoable/cancellable intents go through the
    /// optimistic race first; plain ones hit the provider directly.
    Mutation(MutationIntent),
    /// The optimistic variant of a mutation, applied synchronously to the
    /// caches with zero latency. Emitted by the orchestrator.
    Optimistic(MutationIntent),

    /// A fetch left the gate: bump the loading counters.
    FetchStarted { verb: FetchVerb },
    /// A query finished. `total` is present for list-shaped queries.
    QueryDone {
        intent: QueryIntent,
        data: Vec<Record>,
        total: Option<u64>,
    },
    QueryFailed {
        intent: QueryIntent,
        error: DataError,
    },
    /// A mutation was confirmed by the backend.
    MutationDone {
        intent: MutationIntent,
        data: Option<Record>,
    },
    MutationFailed {
        intent: MutationIntent,
        error: DataError,
    },
    /// A cancel signal won before the request settled; neither success nor
    /// failure will be emitted for it.
    FetchCancelled { verb: FetchVerb },

    ListParams(ListParamsIntent),
    /// Declare a resource so reads against it are legal.
    RegisterResource { name: String },

    ShowNotification(Notification),
    HideNotification,
    /// Ask subscribed views to re-fetch.
    Refresh,
}

impl FetchVerb {
    pub fn of_query(intent: &QueryIntent) -> FetchVerb {
        match intent.kind {
            QueryKind::GetList { .. } => FetchVerb::GetList,
            QueryKind::GetOne { .. } => FetchVerb::GetOne,
            QueryKind::GetMany { .. } => FetchVerb::GetMany,
            QueryKind::GetManyReference { .. } => FetchVerb::GetManyReference,
        }
    }

    pub fn of_mutation(intent: &MutationIntent) -> FetchVerb {
        match intent.kind {
            MutationKind::Create => FetchVerb::Create,
            MutationKind::Update => FetchVerb::Update,
            MutationKind::UpdateMany => FetchVerb::UpdateMany,
            MutationKind::Delete => FetchVerb::Delete,
            MutationKind::DeleteMany => FetchVerb::DeleteMany,
        }
    }
}

/// Convenience constructor for registration.
pub fn register_resource(name: &str) -> Action {
    Action::RegisterResource {
        name: name.to_string(),
    }
}

/// Ids touched by a confirmed or optimistic delete, used by both the
/// resource store and the reference index.
pub fn deleted_ids(intent: &MutationIntent) -> Vec<Identifier> {
    debug_assert!(intent.kind.is_delete());
    intent.affected_ids()
}
