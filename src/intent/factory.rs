//! Action factory: pure constructors for fetch and mutation intents.
//!
//! Every constructor installs the default declarative side effects (success
//! notification, failure notification, redirect, refresh) so callers only
//! override what they need. No I/O happens here.
//!
//! Passing an empty resource name is a programmer error and fails fast.

use serde_json::{Map, Value};

use crate::record::{Identifier, Record};

use super::types::{
    IntentMeta, MutationIntent, MutationKind, NotificationEffect, QueryIntent, QueryKind,
    RedirectTo, SideEffects,
};
use crate::provider::ListQuery;

fn check_resource(resource: &str) {
    assert!(!resource.is_empty(), "resource name must not be empty");
}

fn failure_effects() -> SideEffects {
    SideEffects {
        notification: Some(NotificationEffect::warning("notification.http_error")),
        redirect_to: None,
        // Failed mutations may have applied optimistically; re-fetch the
        // truth rather than roll back.
        refresh: true,
    }
}

/// Build a delete intent for a single record.
///
/// Defaults: "deleted" info notification, redirect to the list, refresh.
pub fn crud_delete(
    resource: &str,
    id: Identifier,
    previous_data: Record,
    base_path: &str,
    redirect_to: Option<RedirectTo>,
    refresh: bool,
) -> MutationIntent {
    check_resource(resource);
    let mut meta = IntentMeta::new(base_path);
    meta.on_success = SideEffects {
        notification: Some(NotificationEffect::info("notification.deleted", 1)),
        redirect_to,
        refresh,
    };
    meta.on_failure = failure_effects();
    MutationIntent {
        kind: MutationKind::Delete,
        resource: resource.to_string(),
        id: Some(id),
        ids: Vec::new(),
        data: None,
        previous_data: Some(previous_data),
        meta,
    }
}

/// Build a delete intent for several records at once.
pub fn crud_delete_many(resource: &str, ids: Vec<Identifier>, base_path: &str) -> MutationIntent {
    check_resource(resource);
    let count = ids.len() as u64;
    let mut meta = IntentMeta::new(base_path);
    meta.on_success = SideEffects {
        notification: Some(NotificationEffect::info("notification.deleted", count)),
        redirect_to: None,
        refresh: true,
    };
    meta.on_failure = failure_effects();
    MutationIntent {
        kind: MutationKind::DeleteMany,
        resource: resource.to_string(),
        id: None,
        ids,
        data: None,
        previous_data: None,
        meta,
    }
}

/// Build an update intent for a single record.
///
/// `previous_data` rides along for the provider's update contract and
/// survives the undo window.
pub fn crud_update(
    resource: &str,
    id: Identifier,
    data: Map<String, Value>,
    previous_data: Record,
    base_path: &str,
    redirect_to: Option<RedirectTo>,
) -> MutationIntent {
    check_resource(resource);
    let mut meta = IntentMeta::new(base_path);
    meta.on_success = SideEffects {
        notification: Some(NotificationEffect::info("notification.updated", 1)),
        redirect_to,
        refresh: false,
    };
    meta.on_failure = failure_effects();
    MutationIntent {
        kind: MutationKind::Update,
        resource: resource.to_string(),
        id: Some(id),
        ids: Vec::new(),
        data: Some(data),
        previous_data: Some(previous_data),
        meta,
    }
}

/// Build an update intent applying the same patch to several records.
pub fn crud_update_many(
    resource: &str,
    ids: Vec<Identifier>,
    data: Map<String, Value>,
    base_path: &str,
) -> MutationIntent {
    check_resource(resource);
    let count = ids.len() as u64;
    let mut meta = IntentMeta::new(base_path);
    meta.on_success = SideEffects {
        notification: Some(NotificationEffect::info("notification.updated", count)),
        redirect_to: None,
        refresh: true,
    };
    meta.on_failure = failure_effects();
    MutationIntent {
        kind: MutationKind::UpdateMany,
        resource: resource.to_string(),
        id: None,
        ids,
        data: Some(data),
        previous_data: None,
        meta,
    }
}

/// Build a create intent.
///
/// Defaults: "created" info notification, redirect to the edit view of the
/// new record.
pub fn crud_create(
    resource: &str,
    data: Map<String, Value>,
    base_path: &str,
    redirect_to: Option<RedirectTo>,
) -> MutationIntent {
    check_resource(resource);
    let mut meta = IntentMeta::new(base_path);
    meta.on_success = SideEffects {
        notification: Some(NotificationEffect::info("notification.created", 1)),
        redirect_to: redirect_to.or(Some(RedirectTo::Edit)),
        refresh: false,
    };
    meta.on_failure = failure_effects();
    MutationIntent {
        kind: MutationKind::Create,
        resource: resource.to_string(),
        id: None,
        ids: Vec::new(),
        data: Some(data),
        previous_data: None,
        meta,
    }
}

/// Build a paginated list fetch.
pub fn crud_get_list(resource: &str, params: ListQuery) -> QueryIntent {
    check_resource(resource);
    QueryIntent {
        resource: resource.to_string(),
        kind: QueryKind::GetList { params },
        base_path: None,
    }
}

/// Build a single-record fetch. `base_path` is where to redirect when the
/// record turns out not to exist.
pub fn crud_get_one(resource: &str, id: Identifier, base_path: &str) -> QueryIntent {
    check_resource(resource);
    QueryIntent {
        resource: resource.to_string(),
        kind: QueryKind::GetOne { id },
        base_path: Some(base_path.to_string()),
    }
}

/// Build a fetch for an explicit set of ids.
pub fn crud_get_many(resource: &str, ids: Vec<Identifier>) -> QueryIntent {
    check_resource(resource);
    QueryIntent {
        resource: resource.to_string(),
        kind: QueryKind::GetMany { ids },
        base_path: None,
    }
}

/// Build a one-to-many reference fetch: records of `reference` whose
/// `target` field points at `parent_id`, viewed from `source` (the parent
/// record's resource).
pub fn crud_get_many_reference(
    source: &str,
    reference: &str,
    target: &str,
    parent_id: Identifier,
    params: ListQuery,
) -> QueryIntent {
    check_resource(source);
    check_resource(reference);
    QueryIntent {
        resource: reference.to_string(),
        kind: QueryKind::GetManyReference {
            source: source.to_string(),
            target: target.to_string(),
            parent_id,
            params,
        },
        base_path: None,
    }
}
