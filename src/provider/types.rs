//! Query parameter and result types shared by the provider contract,
//! the list-params reducer, and the intent factory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::Record;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Sort criterion for a list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Sort {
            field: "id".to_string(),
            order: SortOrder::Asc,
        }
    }
}

/// One-based pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            per_page: 10,
        }
    }
}

/// Full parameter set for `get_list` / `get_many_reference`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub pagination: Pagination,
    pub sort: Sort,
    #[serde(default)]
    pub filters: Map<String, Value>,
}

/// Result of a list-shaped provider call: one page of records plus the
/// total size of the full result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    pub data: Vec<Record>,
    pub total: u64,
}
