//! Shared test harness: seeded in-memory backends and a pipeline runtime.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use anyadmin::config::Config;
use anyadmin::error::DataError;
use anyadmin::provider::{DataProvider, ListQuery, ListResult, MemoryProvider};
use anyadmin::record::{Identifier, Record};
use anyadmin::runtime::{AdminRuntime, UiEffect};
use tracing_subscriber::EnvFilter;

/// Install the test logger once per process; `RUST_LOG` controls what the
/// pipeline traces during a test run.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Undo window used by every test runtime, in milliseconds. Tests run on
/// a paused clock, so the real value does not matter as long as the test
/// advances past (or stays short of) it explicitly.
pub const UNDO_DELAY_MS: u64 = 4000;

pub fn test_config() -> Config {
    Config {
        api_url: String::new(),
        undo_delay_ms: UNDO_DELAY_MS,
        default_per_page: 10,
        notification_auto_hide_ms: 4000,
    }
}

pub fn runtime_with(provider: impl DataProvider + 'static) -> AdminRuntime {
    init_tracing();
    AdminRuntime::new(Arc::new(provider), test_config())
}

/// A backend holding posts `1..=n` titled `post-<id>`.
pub fn seeded_posts(n: i64) -> MemoryProvider {
    let provider = MemoryProvider::new();
    provider.seed(
        "posts",
        (1..=n)
            .map(|id| Record::new(id).with("title", format!("post-{}", id)))
            .collect(),
    );
    provider
}

/// Let spawned runtime tasks run up to their next timer or I/O await.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Drain everything currently queued on an effect receiver.
pub fn drain_effects(rx: &mut broadcast::Receiver<UiEffect>) -> Vec<UiEffect> {
    let mut effects = Vec::new();
    while let Ok(effect) = rx.try_recv() {
        effects.push(effect);
    }
    effects
}

pub fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Answers `get_one` with the record of a different id than the one asked
/// for, to exercise the mismatched-response guard. Every other verb
/// passes through.
#[derive(Clone)]
pub struct MismatchedProvider {
    pub inner: MemoryProvider,
    pub answer_with: Identifier,
}

#[async_trait]
impl DataProvider for MismatchedProvider {
    async fn get_list(&self, resource: &str, params: &ListQuery) -> Result<ListResult, DataError> {
        self.inner.get_list(resource, params).await
    }

    async fn get_one(&self, resource: &str, _id: &Identifier) -> Result<Record, DataError> {
        self.inner.get_one(resource, &self.answer_with).await
    }

    async fn get_many(&self, resource: &str, ids: &[Identifier]) -> Result<Vec<Record>, DataError> {
        self.inner.get_many(resource, ids).await
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        target: &str,
        parent_id: &Identifier,
        params: &ListQuery,
    ) -> Result<ListResult, DataError> {
        self.inner
            .get_many_reference(resource, target, parent_id, params)
            .await
    }

    async fn create(&self, resource: &str, data: &Map<String, Value>) -> Result<Record, DataError> {
        self.inner.create(resource, data).await
    }

    async fn update(
        &self,
        resource: &str,
        id: &Identifier,
        data: &Map<String, Value>,
        previous_data: Option<&Record>,
    ) -> Result<Record, DataError> {
        self.inner.update(resource, id, data, previous_data).await
    }

    async fn update_many(
        &self,
        resource: &str,
        ids: &[Identifier],
        data: &Map<String, Value>,
    ) -> Result<Vec<Identifier>, DataError> {
        self.inner.update_many(resource, ids, data).await
    }

    async fn delete(
        &self,
        resource: &str,
        id: &Identifier,
        previous_data: Option<&Record>,
    ) -> Result<Record, DataError> {
        self.inner.delete(resource, id, previous_data).await
    }

    async fn delete_many(
        &self,
        resource: &str,
        ids: &[Identifier],
    ) -> Result<Vec<Identifier>, DataError> {
        self.inner.delete_many(resource, ids).await
    }
}
