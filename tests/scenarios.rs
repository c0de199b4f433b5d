//! End-to-end flows across the store, the runtime and the provider:
//! reference bucket maintenance, self-correcting pagination, and failure
//! recovery.

mod common;

use std::time::Duration;

use serde_json::json;

use anyadmin::intent::{
    crud_create, crud_delete, crud_delete_many, crud_get_list, crud_get_many_reference,
};
use anyadmin::notification::NotificationLevel;
use anyadmin::provider::{ListQuery, MemoryProvider, Pagination};
use anyadmin::record::{Identifier, Record};
use anyadmin::runtime::UiEffect;
use anyadmin::store::{relation_key, Action};

use common::{drain_effects, fields, runtime_with, seeded_posts, settle, UNDO_DELAY_MS};

fn comments_of_post_five() -> MemoryProvider {
    let provider = MemoryProvider::new();
    provider.seed(
        "comments",
        vec![
            Record::new(1).with("post_id", 5),
            Record::new(2).with("post_id", 5),
            Record::new(3).with("post_id", 5),
            Record::new(4).with("post_id", 6),
        ],
    );
    provider
}

#[tokio::test(start_paused = true)]
async fn deleting_a_referenced_record_shrinks_its_bucket() {
    let provider = comments_of_post_five();
    let rt = runtime_with(provider.clone());

    rt.dispatch(Action::Query(crud_get_many_reference(
        "posts",
        "comments",
        "post_id",
        Identifier::Number(5),
        ListQuery::default(),
    )));
    settle().await;

    let key = relation_key(
        "posts",
        "comments",
        "post_id",
        &Identifier::Number(5),
        &serde_json::Map::new(),
    );
    let state = rt.store().snapshot();
    assert_eq!(
        state.references.ids(&key),
        Some(
            &[
                Identifier::Number(1),
                Identifier::Number(2),
                Identifier::Number(3)
            ][..]
        )
    );
    assert_eq!(state.references.total(&key), Some(3));

    rt.dispatch_undoable(crud_delete(
        "comments",
        Identifier::Number(2),
        Record::new(2).with("post_id", 5),
        "/comments",
        None,
        true,
    ));

    // Optimistic: the bucket no longer lists the deleted comment.
    let state = rt.store().snapshot();
    assert_eq!(
        state.references.ids(&key),
        Some(&[Identifier::Number(1), Identifier::Number(3)][..])
    );
    assert_eq!(state.references.total(&key), Some(2));

    tokio::time::sleep(Duration::from_millis(UNDO_DELAY_MS + 1)).await;
    settle().await;

    // Confirmation is idempotent on the bucket.
    let state = rt.store().snapshot();
    assert_eq!(state.references.total(&key), Some(2));
    assert_eq!(
        state.references.ids(&key),
        Some(&[Identifier::Number(1), Identifier::Number(3)][..])
    );
    assert!(provider
        .calls()
        .contains(&"delete comments/2".to_string()));
}

#[tokio::test]
async fn bulk_delete_shrinks_the_bucket_by_the_ids_it_held() {
    let provider = comments_of_post_five();
    let rt = runtime_with(provider);

    rt.dispatch(Action::Query(crud_get_many_reference(
        "posts",
        "comments",
        "post_id",
        Identifier::Number(5),
        ListQuery::default(),
    )));
    settle().await;

    // Id 4 belongs to another post and is not in this bucket; only the
    // two that are actually present count against the total.
    rt.dispatch(Action::Mutation(crud_delete_many(
        "comments",
        vec![
            Identifier::Number(1),
            Identifier::Number(3),
            Identifier::Number(4),
        ],
        "/comments",
    )));
    settle().await;

    let key = relation_key(
        "posts",
        "comments",
        "post_id",
        &Identifier::Number(5),
        &serde_json::Map::new(),
    );
    let state = rt.store().snapshot();
    assert_eq!(state.references.ids(&key), Some(&[Identifier::Number(2)][..]));
    assert_eq!(state.references.total(&key), Some(1));
}

#[tokio::test]
async fn empty_page_beyond_the_end_walks_back_one_page() {
    let provider = seeded_posts(20);
    let rt = runtime_with(provider.clone());

    let mut params = ListQuery::default();
    params.pagination = Pagination {
        page: 3,
        per_page: 10,
    };
    rt.dispatch(Action::Query(crud_get_list("posts", params)));
    settle().await;

    // Page 3 of 20 records came back empty, so the pipeline re-requested
    // page 2 on its own.
    assert_eq!(
        provider.calls(),
        vec!["get_list posts", "get_list posts"]
    );
    let state = rt.store().snapshot();
    assert_eq!(state.list_params.for_resource("posts").page, 2);
    let slice = &state.resources.resources["posts"].list;
    assert_eq!(slice.ids.len(), 10);
    assert_eq!(slice.total, 20);
    assert!(!state.loading.is_loading());
}

#[tokio::test]
async fn first_page_never_walks_back() {
    let provider = MemoryProvider::new();
    provider.seed("posts", Vec::new());
    let rt = runtime_with(provider.clone());

    rt.dispatch(Action::Query(crud_get_list("posts", ListQuery::default())));
    settle().await;

    assert_eq!(provider.calls(), vec!["get_list posts"]);
    let state = rt.store().snapshot();
    assert_eq!(state.resources.resources["posts"].list.total, 0);
}

#[tokio::test]
async fn failed_create_leaves_no_record_behind() {
    let provider = MemoryProvider::new();
    provider.fail_next(anyadmin::error::DataError::Http {
        status: 500,
        message: "internal error".to_string(),
        body: Some(json!({"message": "internal error"})),
    });
    let rt = runtime_with(provider.clone());
    rt.register_resource("posts");
    let mut effects = rt.subscribe_effects();

    rt.dispatch(Action::Mutation(crud_create(
        "posts",
        fields(&[("title", json!("draft"))]),
        "/posts",
        None,
    )));
    settle().await;

    let state = rt.store().snapshot();
    assert!(!state.loading.is_loading());
    assert!(state.resources.resources["posts"].data.is_empty());

    let notification = state.notifications.current().unwrap();
    assert_eq!(notification.message, "notification.http_error");
    assert_eq!(notification.level, NotificationLevel::Warning);

    // Failure effects ask the views to re-fetch rather than roll back.
    assert!(drain_effects(&mut effects)
        .iter()
        .any(|e| matches!(e, UiEffect::Refresh)));
    assert_eq!(provider.calls(), vec!["create posts"]);
}

#[tokio::test]
async fn successful_create_caches_the_new_record_and_redirects_to_it() {
    let provider = MemoryProvider::new();
    let rt = runtime_with(provider.clone());
    rt.register_resource("posts");
    let mut effects = rt.subscribe_effects();

    rt.dispatch(Action::Mutation(crud_create(
        "posts",
        fields(&[("title", json!("draft"))]),
        "/posts",
        None,
    )));
    settle().await;

    let state = rt.store().snapshot();
    let created: Vec<_> = state.resources.resources["posts"].data.values().collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].get("title"), Some(&json!("draft")));

    // Create redirects to the edit view of the record the backend minted.
    let expected = format!("/posts/{}", created[0].id);
    assert!(drain_effects(&mut effects)
        .iter()
        .any(|e| matches!(e, UiEffect::Redirect(path) if path == &expected)));
    assert_eq!(
        state.notifications.current().map(|n| n.message.clone()),
        Some("notification.created".to_string())
    );
}
