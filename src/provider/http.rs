//! Simple JSON REST provider.
//!
//! Maps the provider verbs onto the common REST dialect: list queries
//! carry `sort`, `range` and `filter` query parameters as JSON, and the
//! total size of a list result comes from the `content-range` header
//! (`items 0-9/100`), falling back to `x-total-count`.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};

use async_trait::async_trait;

use crate::error::DataError;
use crate::record::{Identifier, Record};

use super::types::{ListQuery, ListResult};
use super::DataProvider;

pub struct HttpProvider {
    client: Client,
    api_url: String,
}

impl HttpProvider {
    pub fn new(api_url: &str) -> Self {
        HttpProvider {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn resource_url(&self, resource: &str) -> String {
        format!("{}/{}", self.api_url, resource)
    }

    fn record_url(&self, resource: &str, id: &Identifier) -> String {
        format!("{}/{}/{}", self.api_url, resource, id)
    }

    fn list_request(&self, resource: &str, params: &ListQuery, extra_filter: Option<(&str, &Identifier)>) -> RequestBuilder {
        let mut filter = params.filters.clone();
        if let Some((target, parent_id)) = extra_filter {
            filter.insert(target.to_string(), parent_id.to_value());
        }
        let page = params.pagination.page.max(1);
        let per_page = params.pagination.per_page.max(1);
        let start = (page - 1) * per_page;
        let end = page * per_page - 1;
        self.client.get(self.resource_url(resource)).query(&[
            (
                "sort",
                json!([params.sort.field, params.sort.order.as_str()]).to_string(),
            ),
            ("range", json!([start, end]).to_string()),
            ("filter", Value::Object(filter).to_string()),
        ])
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DataError> {
        let response = request
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(http_error(status, response).await)
    }

    async fn json_record(&self, request: RequestBuilder) -> Result<Record, DataError> {
        let response = self.send(request).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;
        Record::from_value(value)
    }

    async fn json_records(&self, request: RequestBuilder) -> Result<(Vec<Record>, Option<u64>), DataError> {
        let response = self.send(request).await?;
        let total = total_from_headers(&response);
        let values: Vec<Value> = response
            .json()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;
        let records = values
            .into_iter()
            .map(Record::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((records, total))
    }
}

async fn http_error(status: StatusCode, response: Response) -> DataError {
    let body: Option<Value> = response.json().await.ok();
    let message = body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
        .to_string();
    DataError::Http {
        status: status.as_u16(),
        message,
        body,
    }
}

/// Total result-set size from `content-range: items 0-9/100`, or the
/// plainer `x-total-count`.
fn total_from_headers(response: &Response) -> Option<u64> {
    if let Some(range) = response
        .headers()
        .get("content-range")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(total) = range.rsplit('/').next().and_then(|t| t.parse().ok()) {
            return Some(total);
        }
    }
    response
        .headers()
        .get("x-total-count")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[async_trait]
impl DataProvider for HttpProvider {
    async fn get_list(&self, resource: &str, params: &ListQuery) -> Result<ListResult, DataError> {
        let (data, total) = self
            .json_records(self.list_request(resource, params, None))
            .await?;
        let total = total.unwrap_or(data.len() as u64);
        Ok(ListResult { data, total })
    }

    async fn get_one(&self, resource: &str, id: &Identifier) -> Result<Record, DataError> {
        self.json_record(self.client.get(self.record_url(resource, id)))
            .await
    }

    async fn get_many(
        &self,
        resource: &str,
        ids: &[Identifier],
    ) -> Result<Vec<Record>, DataError> {
        let id_values: Vec<Value> = ids.iter().map(Identifier::to_value).collect();
        let request = self.client.get(self.resource_url(resource)).query(&[(
            "filter",
            json!({ "id": id_values }).to_string(),
        )]);
        let (records, _) = self.json_records(request).await?;
        Ok(records)
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        target: &str,
        parent_id: &Identifier,
        params: &ListQuery,
    ) -> Result<ListResult, DataError> {
        let (data, total) = self
            .json_records(self.list_request(resource, params, Some((target, parent_id))))
            .await?;
        let total = total.unwrap_or(data.len() as u64);
        Ok(ListResult { data, total })
    }

    async fn create(
        &self,
        resource: &str,
        data: &Map<String, Value>,
    ) -> Result<Record, DataError> {
        self.json_record(self.client.post(self.resource_url(resource)).json(data))
            .await
    }

    async fn update(
        &self,
        resource: &str,
        id: &Identifier,
        data: &Map<String, Value>,
        _previous_data: Option<&Record>,
    ) -> Result<Record, DataError> {
        self.json_record(self.client.put(self.record_url(resource, id)).json(data))
            .await
    }

    async fn update_many(
        &self,
        resource: &str,
        ids: &[Identifier],
        data: &Map<String, Value>,
    ) -> Result<Vec<Identifier>, DataError> {
        // The simple REST dialect has no bulk endpoint; fan out.
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            self.update(resource, id, data, None).await?;
            updated.push(id.clone());
        }
        Ok(updated)
    }

    async fn delete(
        &self,
        resource: &str,
        id: &Identifier,
        _previous_data: Option<&Record>,
    ) -> Result<Record, DataError> {
        self.json_record(
            self.client
                .request(Method::DELETE, self.record_url(resource, id)),
        )
        .await
    }

    async fn delete_many(
        &self,
        resource: &str,
        ids: &[Identifier],
    ) -> Result<Vec<Identifier>, DataError> {
        let mut deleted = Vec::with_capacity(ids.len());
        for id in ids {
            self.delete(resource, id, None).await?;
            deleted.push(id.clone());
        }
        Ok(deleted)
    }
}
