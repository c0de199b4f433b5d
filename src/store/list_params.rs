//! Per-resource list query state: pagination, sort, filters.
//!
//! This state is a cursor over what the user asked to see, independent of
//! the fetched data. It is created on first use for a resource, persists
//! across navigation, and is never reset implicitly.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

use crate::provider::{ListQuery, Pagination, Sort, SortOrder};

use super::{Intent, Reducer, StoreState};

/// Query cursor of one list view.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQueryState {
    pub page: u32,
    pub per_page: u32,
    pub sort: Sort,
    pub filters: Map<String, Value>,
    /// Names of filter inputs currently shown in the UI.
    pub displayed_filters: BTreeSet<String>,
}

impl Default for ListQueryState {
    fn default() -> Self {
        ListQueryState {
            page: 1,
            per_page: 10,
            sort: Sort::default(),
            filters: Map::new(),
            displayed_filters: BTreeSet::new(),
        }
    }
}

impl ListQueryState {
    /// Project this cursor into provider query parameters.
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            pagination: Pagination {
                page: self.page,
                per_page: self.per_page,
            },
            sort: self.sort.clone(),
            filters: self.filters.clone(),
        }
    }
}

/// List query cursors for all resources, keyed by resource name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListParamsState {
    pub params: HashMap<String, ListQueryState>,
}

impl StoreState for ListParamsState {}

impl ListParamsState {
    /// Cursor for a resource, default when the view never mounted.
    pub fn for_resource(&self, resource: &str) -> ListQueryState {
        self.params.get(resource).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub enum ListParamsIntent {
    SetPage {
        resource: String,
        page: u32,
    },
    SetPerPage {
        resource: String,
        per_page: u32,
    },
    /// Sort by `field`; toggles the order when the field is already the
    /// active ascending sort.
    SetSort {
        resource: String,
        field: String,
    },
    SetFilters {
        resource: String,
        filters: Map<String, Value>,
    },
    ShowFilter {
        resource: String,
        name: String,
        default_value: Option<Value>,
    },
    HideFilter {
        resource: String,
        name: String,
    },
}

impl Intent for ListParamsIntent {}

pub struct ListParamsReducer;

impl Reducer for ListParamsReducer {
    type State = ListParamsState;
    type Intent = ListParamsIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            ListParamsIntent::SetPage { resource, page } => {
                let entry = state.params.entry(resource).or_default();
                entry.page = page.max(1);
            }
            ListParamsIntent::SetPerPage { resource, per_page } => {
                let entry = state.params.entry(resource).or_default();
                if per_page > 0 {
                    entry.per_page = per_page;
                    entry.page = 1;
                }
            }
            ListParamsIntent::SetSort { resource, field } => {
                let entry = state.params.entry(resource).or_default();
                let order = if entry.sort.field == field && entry.sort.order == SortOrder::Asc {
                    SortOrder::Desc
                } else {
                    SortOrder::Asc
                };
                entry.sort = Sort { field, order };
                entry.page = 1;
            }
            ListParamsIntent::SetFilters { resource, filters } => {
                let entry = state.params.entry(resource).or_default();
                entry.filters = filters;
                entry.page = 1;
            }
            ListParamsIntent::ShowFilter {
                resource,
                name,
                default_value,
            } => {
                let entry = state.params.entry(resource).or_default();
                entry.displayed_filters.insert(name.clone());
                if let Some(value) = default_value {
                    entry.filters.entry(name).or_insert(value);
                }
            }
            ListParamsIntent::HideFilter { resource, name } => {
                let entry = state.params.entry(resource).or_default();
                entry.displayed_filters.remove(&name);
                entry.filters.remove(&name);
            }
        }
        state
    }
}
