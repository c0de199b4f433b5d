//! In-flight request counters, one per fetch verb plus a global one.
//!
//! The UI derives its loading indicator from these. Every started request
//! is balanced by exactly one terminal event (done, failed or cancelled),
//! so the counters return to zero when the pipeline drains.

use std::collections::HashMap;

use super::{Intent, Reducer, StoreState};

/// The verbs a request can run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchVerb {
    GetList,
    GetOne,
    GetMany,
    GetManyReference,
    Create,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
}

impl FetchVerb {
    pub fn label(&self) -> &'static str {
        match self {
            FetchVerb::GetList => "get_list",
            FetchVerb::GetOne => "get_one",
            FetchVerb::GetMany => "get_many",
            FetchVerb::GetManyReference => "get_many_reference",
            FetchVerb::Create => "create",
            FetchVerb::Update => "update",
            FetchVerb::UpdateMany => "update_many",
            FetchVerb::Delete => "delete",
            FetchVerb::DeleteMany => "delete_many",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadingState {
    per_verb: HashMap<FetchVerb, u32>,
    total: u32,
}

impl StoreState for LoadingState {}

impl LoadingState {
    pub fn in_flight(&self, verb: FetchVerb) -> u32 {
        self.per_verb.get(&verb).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.total > 0
    }
}

#[derive(Debug, Clone, Copy)]
pub enum LoadingIntent {
    Started { verb: FetchVerb },
    /// Covers all three terminal outcomes: done, failed, cancelled.
    Finished { verb: FetchVerb },
}

impl Intent for LoadingIntent {}

pub struct LoadingReducer;

impl Reducer for LoadingReducer {
    type State = LoadingState;
    type Intent = LoadingIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            LoadingIntent::Started { verb } => {
                *state.per_verb.entry(verb).or_insert(0) += 1;
                state.total += 1;
            }
            LoadingIntent::Finished { verb } => {
                let counter = state.per_verb.entry(verb).or_insert(0);
                *counter = counter.saturating_sub(1);
                state.total = state.total.saturating_sub(1);
            }
        }
        state
    }
}
