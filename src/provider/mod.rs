//! Backend contract: the data provider abstraction and its built-in
//! implementations.
//!
//! A backend is abstracted as a handful of verbs per resource. The
//! pipeline never talks HTTP directly; it calls whatever [`DataProvider`]
//! it was built with.

pub mod http;
pub mod memory;
mod types;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::DataError;
use crate::record::{Identifier, Record};

pub use http::HttpProvider;
pub use memory::MemoryProvider;
pub use types::{ListQuery, ListResult, Pagination, Sort, SortOrder};

/// The verbs a backend must answer. Object-safe so the runtime can hold
/// `Arc<dyn DataProvider>`.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn get_list(&self, resource: &str, params: &ListQuery) -> Result<ListResult, DataError>;

    async fn get_one(&self, resource: &str, id: &Identifier) -> Result<Record, DataError>;

    async fn get_many(
        &self,
        resource: &str,
        ids: &[Identifier],
    ) -> Result<Vec<Record>, DataError>;

    async fn get_many_reference(
        &self,
        resource: &str,
        target: &str,
        parent_id: &Identifier,
        params: &ListQuery,
    ) -> Result<ListResult, DataError>;

    async fn create(&self, resource: &str, data: &Map<String, Value>)
        -> Result<Record, DataError>;

    async fn update(
        &self,
        resource: &str,
        id: &Identifier,
        data: &Map<String, Value>,
        previous_data: Option<&Record>,
    ) -> Result<Record, DataError>;

    async fn update_many(
        &self,
        resource: &str,
        ids: &[Identifier],
        data: &Map<String, Value>,
    ) -> Result<Vec<Identifier>, DataError>;

    /// Delete one record, returning its previous state.
    async fn delete(
        &self,
        resource: &str,
        id: &Identifier,
        previous_data: Option<&Record>,
    ) -> Result<Record, DataError>;

    async fn delete_many(
        &self,
        resource: &str,
        ids: &[Identifier],
    ) -> Result<Vec<Identifier>, DataError>;
}
