//! Fetch lifecycle: the non-optimistic path between an intent and the
//! backend.
//!
//! Every request follows the same shape: a started event bumps the
//! loading counters, the provider call runs, and exactly one terminal
//! event follows — done, failed, or cancelled. A cancel observed during
//! the request suppresses both success and failure.

use tokio::select;
use uuid::Uuid;

use crate::error::DataError;
use crate::intent::{
    crud_get_list, MutationIntent, MutationKind, QueryIntent, QueryKind,
};
use crate::notification::Notification;
use crate::record::{Identifier, Record};
use crate::store::{Action, FetchVerb, ListParamsIntent};

use super::cancel::CancelHandle;
use super::effects::UiEffect;
use super::AdminRuntime;

pub(crate) async fn run_query(rt: AdminRuntime, intent: QueryIntent, cancel: CancelHandle) {
    let verb = FetchVerb::of_query(&intent);
    let request_id = Uuid::new_v4();
    tracing::debug!(
        request_id = %request_id,
        verb = verb.label(),
        resource = %intent.resource,
        "query started"
    );
    rt.store().apply(&Action::FetchStarted { verb });

    // The provider call runs detached: cancel cannot abort a request
    // already on the wire, it only discards whatever comes back.
    let call = {
        let rt = rt.clone();
        let intent = intent.clone();
        tokio::spawn(async move { call_query(&rt, &intent).await })
    };
    let result = select! {
        _ = cancel.wait() => {
            tracing::debug!(request_id = %request_id, "query cancelled");
            rt.store().apply(&Action::FetchCancelled { verb });
            return;
        }
        joined = call => {
            joined.unwrap_or_else(|e| Err(DataError::Network(format!("query task failed: {}", e))))
        }
    };

    match result {
        Ok((data, total)) => on_query_success(&rt, intent, data, total, request_id),
        Err(error) => on_query_failure(&rt, intent, error, request_id),
    }
}

async fn call_query(
    rt: &AdminRuntime,
    intent: &QueryIntent,
) -> Result<(Vec<Record>, Option<u64>), DataError> {
    let provider = rt.provider();
    match &intent.kind {
        QueryKind::GetList { params } => {
            let result = provider.get_list(&intent.resource, params).await?;
            Ok((result.data, Some(result.total)))
        }
        QueryKind::GetOne { id } => {
            let record = provider.get_one(&intent.resource, id).await?;
            Ok((vec![record], None))
        }
        QueryKind::GetMany { ids } => {
            let records = provider.get_many(&intent.resource, ids).await?;
            Ok((records, None))
        }
        QueryKind::GetManyReference {
            target, parent_id, params, ..
        } => {
            let result = provider
                .get_many_reference(&intent.resource, target, parent_id, params)
                .await?;
            Ok((result.data, Some(result.total)))
        }
    }
}

fn on_query_success(
    rt: &AdminRuntime,
    intent: QueryIntent,
    data: Vec<Record>,
    total: Option<u64>,
    request_id: Uuid,
) {
    // A record that is not the one we asked for never enters the cache.
    if let QueryKind::GetOne { id } = &intent.kind {
        if let Some(received) = data.first().map(|r| r.id.clone()) {
            if &received != id {
                let error = DataError::InconsistentResponse {
                    resource: intent.resource.clone(),
                    requested: id.clone(),
                    received,
                };
                tracing::warn!(request_id = %request_id, error = %error, "discarding response");
                on_query_failure(rt, intent, error, request_id);
                return;
            }
        }
    }

    let is_empty = data.is_empty();
    rt.store().apply(&Action::QueryDone {
        intent: intent.clone(),
        data,
        total,
    });
    tracing::debug!(request_id = %request_id, "query done");

    // Self-correcting pagination: a list page beyond the end of the
    // result set walks back one page instead of showing nothing.
    if let QueryKind::GetList { params } = &intent.kind {
        if is_empty && total.unwrap_or(0) > 0 && params.pagination.page > 1 {
            let page = params.pagination.page - 1;
            tracing::debug!(resource = %intent.resource, page, "empty page, walking back");
            rt.dispatch(Action::ListParams(ListParamsIntent::SetPage {
                resource: intent.resource.clone(),
                page,
            }));
            let mut params = params.clone();
            params.pagination.page = page;
            rt.dispatch(Action::Query(crud_get_list(&intent.resource, params)));
        }
    }
}

fn on_query_failure(rt: &AdminRuntime, intent: QueryIntent, error: DataError, request_id: Uuid) {
    tracing::warn!(
        request_id = %request_id,
        resource = %intent.resource,
        error = %error,
        error_type = error.error_type(),
        status = error.status(),
        "query failed"
    );
    rt.store().apply(&Action::QueryFailed {
        intent: intent.clone(),
        error: error.clone(),
    });

    match (&intent.kind, &error) {
        // Mismatched response: report, leave state alone, stay on the view.
        (_, DataError::InconsistentResponse { .. }) => {
            rt.dispatch(Action::ShowNotification(
                Notification::warning("notification.bad_item")
                    .auto_hide(rt.config().notification_auto_hide_ms),
            ));
        }
        (QueryKind::GetOne { .. }, _) => {
            rt.dispatch(Action::ShowNotification(
                Notification::warning("notification.item_doesnt_exist")
                    .auto_hide(rt.config().notification_auto_hide_ms),
            ));
            if let Some(base_path) = &intent.base_path {
                rt.emit(UiEffect::Redirect(base_path.clone()));
            }
        }
        _ => {
            rt.dispatch(Action::ShowNotification(
                Notification::warning("notification.http_error")
                    .auto_hide(rt.config().notification_auto_hide_ms),
            ));
            rt.dispatch(Action::Refresh);
        }
    }
}

/// Run a mutation against the backend for real. Used directly for plain
/// mutations; the undo orchestrator calls it after the cancel window
/// elapses.
pub(crate) async fn run_mutation(rt: AdminRuntime, intent: MutationIntent) {
    let verb = FetchVerb::of_mutation(&intent);
    let request_id = Uuid::new_v4();
    tracing::debug!(
        request_id = %request_id,
        verb = verb.label(),
        resource = %intent.resource,
        kind = intent.kind.label(),
        "mutation started"
    );
    rt.store().apply(&Action::FetchStarted { verb });

    match call_mutation(&rt, &intent).await {
        Ok(data) => {
            let settled_id = data.as_ref().map(|r| r.id.clone()).or(intent.id.clone());
            rt.store().apply(&Action::MutationDone {
                intent: intent.clone(),
                data,
            });
            tracing::debug!(request_id = %request_id, "mutation done");
            rt.run_side_effects(
                &intent.meta.on_success,
                &intent.meta.base_path,
                settled_id.as_ref(),
            );
        }
        Err(error) => {
            tracing::warn!(
                request_id = %request_id,
                resource = %intent.resource,
                error = %error,
                error_type = error.error_type(),
                status = error.status(),
                "mutation failed"
            );
            // Optimistic state, if any, stays applied: the refresh in the
            // failure effects re-fetches the truth instead of rolling back.
            rt.store().apply(&Action::MutationFailed {
                intent: intent.clone(),
                error,
            });
            rt.run_side_effects(
                &intent.meta.on_failure,
                &intent.meta.base_path,
                intent.id.as_ref(),
            );
        }
    }
}

async fn call_mutation(
    rt: &AdminRuntime,
    intent: &MutationIntent,
) -> Result<Option<Record>, DataError> {
    let provider = rt.provider();
    let resource = &intent.resource;
    match intent.kind {
        MutationKind::Create => {
            let data = require_data(intent)?;
            Ok(Some(provider.create(resource, data).await?))
        }
        MutationKind::Update => {
            let id = require_id(intent)?;
            let data = require_data(intent)?;
            Ok(Some(
                provider
                    .update(resource, id, data, intent.previous_data.as_ref())
                    .await?,
            ))
        }
        MutationKind::Delete => {
            let id = require_id(intent)?;
            provider
                .delete(resource, id, intent.previous_data.as_ref())
                .await?;
            Ok(None)
        }
        MutationKind::UpdateMany => {
            let data = require_data(intent)?;
            provider.update_many(resource, &intent.ids, data).await?;
            Ok(None)
        }
        MutationKind::DeleteMany => {
            provider.delete_many(resource, &intent.ids).await?;
            Ok(None)
        }
    }
}

fn require_id(intent: &MutationIntent) -> Result<&Identifier, DataError> {
    intent.id.as_ref().ok_or_else(|| {
        DataError::Validation(format!(
            "{} intent on '{}' is missing an id",
            intent.kind.label(),
            intent.resource
        ))
    })
}

fn require_data(
    intent: &MutationIntent,
) -> Result<&serde_json::Map<String, serde_json::Value>, DataError> {
    intent.data.as_ref().ok_or_else(|| {
        DataError::Validation(format!(
            "{} intent on '{}' is missing a payload",
            intent.kind.label(),
            intent.resource
        ))
    })
}
