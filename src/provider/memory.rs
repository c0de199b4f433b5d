//! In-memory data provider for tests and demos.
//!
//! Supports equality filters, sorting, pagination, scripted failures and
//! artificial latency. Records a log of the verbs it served so tests can
//! assert which calls were (or were never) issued.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::DataError;
use crate::record::{Identifier, Record};

use super::types::{ListQuery, ListResult, SortOrder};
use super::DataProvider;

#[derive(Default)]
struct Inner {
    tables: HashMap<String, BTreeMap<Identifier, Record>>,
    /// Errors to fail the next calls with, front first.
    fail_next: VecDeque<DataError>,
    latency: Option<Duration>,
    calls: Vec<String>,
    next_id: i64,
}

/// Thread-safe in-memory backend.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a resource with records.
    pub fn seed(&self, resource: &str, records: Vec<Record>) {
        let mut inner = self.inner.lock();
        let table = inner.tables.entry(resource.to_string()).or_default();
        for record in records {
            table.insert(record.id.clone(), record);
        }
    }

    /// Queue an error; the next provider call consumes and returns it.
    pub fn fail_next(&self, error: DataError) {
        self.inner.lock().fail_next.push_back(error);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().latency = Some(latency);
    }

    /// The verbs served to completion so far, e.g. `["get_list posts",
    /// "delete posts/2"]`. A call still sleeping its latency is not listed.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    /// Direct read, bypassing the provider contract. Test helper.
    pub fn record(&self, resource: &str, id: &Identifier) -> Option<Record> {
        self.inner
            .lock()
            .tables
            .get(resource)
            .and_then(|t| t.get(id).cloned())
    }

    async fn enter(&self, call: String) -> Result<(), DataError> {
        let (latency, failure) = {
            let mut inner = self.inner.lock();
            (inner.latency, inner.fail_next.pop_front())
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        // Logged after the latency: the call list records completed
        // requests, so a caller that gave up early still shows up here
        // once the backend finishes.
        self.inner.lock().calls.push(call);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn not_found(resource: &str, id: &Identifier) -> DataError {
        DataError::Http {
            status: 404,
            message: format!("{}/{} not found", resource, id),
            body: None,
        }
    }
}

fn matches_filters(record: &Record, filters: &Map<String, Value>) -> bool {
    filters.iter().all(|(field, expected)| {
        if field == "id" {
            return Identifier::from_value(expected).as_ref() == Some(&record.id);
        }
        record.get(field) == Some(expected)
    })
}

fn sort_key(record: &Record, field: &str) -> Value {
    if field == "id" {
        return record.id.to_value();
    }
    record.get(field).cloned().unwrap_or(Value::Null)
}

fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn select(
    table: &BTreeMap<Identifier, Record>,
    params: &ListQuery,
    extra_filter: Option<(&str, &Identifier)>,
) -> ListResult {
    let mut matching: Vec<Record> = table
        .values()
        .filter(|record| matches_filters(record, &params.filters))
        .filter(|record| match extra_filter {
            Some((target, parent_id)) => {
                record
                    .get(target)
                    .and_then(Identifier::from_value)
                    .as_ref()
                    == Some(parent_id)
            }
            None => true,
        })
        .cloned()
        .collect();

    matching.sort_by(|a, b| {
        let ordering = compare_values(
            &sort_key(a, &params.sort.field),
            &sort_key(b, &params.sort.field),
        );
        match params.sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let total = matching.len() as u64;
    // Page and size clamp to 1 so a zeroed query cannot underflow the offset.
    let page = params.pagination.page.max(1);
    let per_page = params.pagination.per_page.max(1) as usize;
    let start = (page - 1) as usize * per_page;
    let data = matching.into_iter().skip(start).take(per_page).collect();
    ListResult { data, total }
}

#[async_trait]
impl DataProvider for MemoryProvider {
    async fn get_list(&self, resource: &str, params: &ListQuery) -> Result<ListResult, DataError> {
        self.enter(format!("get_list {}", resource)).await?;
        let inner = self.inner.lock();
        let table = inner.tables.get(resource).cloned().unwrap_or_default();
        Ok(select(&table, params, None))
    }

    async fn get_one(&self, resource: &str, id: &Identifier) -> Result<Record, DataError> {
        self.enter(format!("get_one {}/{}", resource, id)).await?;
        self.record(resource, id)
            .ok_or_else(|| Self::not_found(resource, id))
    }

    async fn get_many(
        &self,
        resource: &str,
        ids: &[Identifier],
    ) -> Result<Vec<Record>, DataError> {
        self.enter(format!("get_many {}", resource)).await?;
        let inner = self.inner.lock();
        let table = inner.tables.get(resource).cloned().unwrap_or_default();
        Ok(ids.iter().filter_map(|id| table.get(id).cloned()).collect())
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        target: &str,
        parent_id: &Identifier,
        params: &ListQuery,
    ) -> Result<ListResult, DataError> {
        self.enter(format!("get_many_reference {}", resource))
            .await?;
        let inner = self.inner.lock();
        let table = inner.tables.get(resource).cloned().unwrap_or_default();
        Ok(select(&table, params, Some((target, parent_id))))
    }

    async fn create(
        &self,
        resource: &str,
        data: &Map<String, Value>,
    ) -> Result<Record, DataError> {
        self.enter(format!("create {}", resource)).await?;
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        // Generated ids start high to stay clear of seeded ones.
        let id = data
            .get("id")
            .and_then(Identifier::from_value)
            .unwrap_or(Identifier::Number(1000 + inner.next_id));
        let mut record = Record::new(id.clone());
        record.merge(data);
        inner
            .tables
            .entry(resource.to_string())
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        resource: &str,
        id: &Identifier,
        data: &Map<String, Value>,
        _previous_data: Option<&Record>,
    ) -> Result<Record, DataError> {
        self.enter(format!("update {}/{}", resource, id)).await?;
        let mut inner = self.inner.lock();
        let record = inner
            .tables
            .get_mut(resource)
            .and_then(|t| t.get_mut(id))
            .ok_or_else(|| Self::not_found(resource, id))?;
        record.merge(data);
        Ok(record.clone())
    }

    async fn update_many(
        &self,
        resource: &str,
        ids: &[Identifier],
        data: &Map<String, Value>,
    ) -> Result<Vec<Identifier>, DataError> {
        self.enter(format!("update_many {}", resource)).await?;
        let mut inner = self.inner.lock();
        let table = inner.tables.entry(resource.to_string()).or_default();
        let mut updated = Vec::new();
        for id in ids {
            if let Some(record) = table.get_mut(id) {
                record.merge(data);
                updated.push(id.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(
        &self,
        resource: &str,
        id: &Identifier,
        _previous_data: Option<&Record>,
    ) -> Result<Record, DataError> {
        self.enter(format!("delete {}/{}", resource, id)).await?;
        let mut inner = self.inner.lock();
        inner
            .tables
            .get_mut(resource)
            .and_then(|t| t.remove(id))
            .ok_or_else(|| Self::not_found(resource, id))
    }

    async fn delete_many(
        &self,
        resource: &str,
        ids: &[Identifier],
    ) -> Result<Vec<Identifier>, DataError> {
        self.enter(format!("delete_many {}", resource)).await?;
        let mut inner = self.inner.lock();
        let table = inner.tables.entry(resource.to_string()).or_default();
        Ok(ids
            .iter()
            .filter(|id| table.remove(id).is_some())
            .cloned()
            .collect())
    }
}
