//! Sync engine integration tests
//!
//! Todo list reads through the engine: shared fetches, cache freshness,
//! pagination, stale-while-error and the stale response guard.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use todosync::client::sync::{SyncEngine, TodoQuery, ViewKind};
use todosync::shared::{AppConfig, SyncError, TodoCreate};

use crate::assert_ok;
use crate::common::{settle_until, todos, wait_for_todos, ScriptedClient};

fn engine(client: ScriptedClient) -> (Arc<ScriptedClient>, SyncEngine<ScriptedClient>) {
    let client = Arc::new(client);
    let engine = SyncEngine::with_client(Arc::clone(&client), AppConfig::default());
    (client, engine)
}

#[tokio::test]
async fn test_first_page_loads() {
    let (_, engine) = engine(ScriptedClient::with_todos(todos(120)));
    let list = assert_ok!(engine.list_state());

    let mut page = engine.subscribe_list(&list).await;
    let model = wait_for_todos(&mut page, |m| m.view == ViewKind::Data).await;

    assert_eq!(model.total, 120);
    assert_eq!(model.items.len(), 50);
    assert_eq!(model.items[0].id, 120);
    assert!(model.can_go_next);
    assert!(!model.can_go_previous);
    assert_eq!(model.page_label, "Page 1 of 3");
    assert_eq!(model.range_label, "Showing 1-50 of 120");
}

#[tokio::test]
async fn test_last_page_flags() {
    let (_, engine) = engine(ScriptedClient::with_todos(todos(120)));
    let mut list = assert_ok!(engine.list_state());
    assert!(list.next_page(120));
    assert!(list.next_page(120));

    let mut page = engine.subscribe_list(&list).await;
    let model = wait_for_todos(&mut page, |m| m.view == ViewKind::Data).await;

    assert_eq!(model.items.len(), 20);
    assert!(!model.can_go_next);
    assert!(model.can_go_previous);
    assert_eq!(model.page_label, "Page 3 of 3");
}

#[tokio::test]
async fn test_empty_collection() {
    let (client, engine) = engine(ScriptedClient::default());
    let mut page = engine.subscribe_todos(TodoQuery::default()).await;
    settle_until(|| client.todo_fetch_count() == 1).await;
    let model = wait_for_todos(&mut page, |m| !m.is_loading).await;
    assert_eq!(model.view, ViewKind::Empty);
    assert!(!model.show_pagination);
}

#[tokio::test]
async fn test_concurrent_subscribers_share_one_fetch() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(3)));
    let mut first = engine.subscribe_todos(TodoQuery::default()).await;
    let mut second = engine.subscribe_todos(TodoQuery::default()).await;

    wait_for_todos(&mut first, |m| m.view == ViewKind::Data).await;
    let model = wait_for_todos(&mut second, |m| m.view == ViewKind::Data).await;

    assert_eq!(model.total, 3);
    assert_eq!(client.todo_fetch_count(), 1);
    assert_eq!(
        engine.todo_queries().subscriber_count(first.fingerprint()),
        2
    );
}

#[tokio::test]
async fn test_fresh_snapshot_served_from_cache() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(3)));
    let mut page = engine.subscribe_todos(TodoQuery::default()).await;
    wait_for_todos(&mut page, |m| m.view == ViewKind::Data).await;
    page.unsubscribe();

    let again = engine.subscribe_todos(TodoQuery::default()).await;
    let model = again.current();
    assert_eq!(model.view, ViewKind::Data);
    assert_eq!(model.total, 3);

    tokio::task::yield_now().await;
    assert_eq!(client.todo_fetch_count(), 1);
}

#[tokio::test]
async fn test_filter_change_fetches_first_page() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(120)));
    let mut list = assert_ok!(engine.list_state());
    list.next_page(120);
    let mut page = engine.subscribe_list(&list).await;
    wait_for_todos(&mut page, |m| m.view == ViewKind::Data).await;

    list.set_search("#11");
    assert_eq!(list.window().offset(), 0);
    assert_ne!(&list.fingerprint(), page.fingerprint());

    let mut filtered = engine.subscribe_list(&list).await;
    let model = wait_for_todos(&mut filtered, |m| m.view == ViewKind::Data).await;
    // "#11" and "#110".."#119"
    assert_eq!(model.total, 11);
    assert_eq!(client.todo_fetch_count(), 2);
}

#[tokio::test]
async fn test_failed_refetch_keeps_previous_snapshot() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(3)));
    let query = TodoQuery::default();
    let mut page = engine.subscribe_todos(query.clone()).await;
    wait_for_todos(&mut page, |m| m.view == ViewKind::Data).await;

    client.fail_next_todo_fetch(SyncError::http(500, "Internal server error"));
    assert!(engine.refetch_todos(&query));
    let model = wait_for_todos(&mut page, |m| m.error.is_some() && !m.is_loading).await;

    assert_eq!(model.view, ViewKind::Error);
    assert_eq!(model.items.len(), 3);
    assert_eq!(model.error, Some(SyncError::http(500, "Internal server error")));

    assert!(engine.refetch_todos(&query));
    let model = wait_for_todos(&mut page, |m| m.error.is_none() && !m.is_loading).await;
    assert_eq!(model.view, ViewKind::Data);
}

#[tokio::test]
async fn test_refetch_without_subscriber_is_noop() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(3)));
    assert!(!engine.refetch_todos(&TodoQuery::default()));
    tokio::task::yield_now().await;
    assert_eq!(client.todo_fetch_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_response_started_before_invalidation_is_discarded() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(1)));
    let query = TodoQuery::default();
    let mut page = engine.subscribe_todos(query.clone()).await;
    wait_for_todos(&mut page, |m| m.total == 1).await;

    // A slow read sees the server before the create lands
    client.delay_next_todo_fetch(Duration::from_millis(100));
    assert!(engine.refetch_todos(&query));
    settle_until(|| client.todo_fetch_count() == 2).await;

    assert_ok!(engine.mutations().create(TodoCreate::new("Buy milk")).await);

    // The watch channel coalesces, so the first model seen is post-invalidation
    let mut seen = Vec::new();
    loop {
        let model = page.changed().await.expect("subscription closed");
        let done = !model.is_loading && model.view == ViewKind::Data;
        seen.push((model.total, model.view));
        if done {
            break;
        }
    }

    assert!(seen.iter().all(|(total, _)| *total != 1), "stale page surfaced: {:?}", seen);
    assert!(
        seen.iter().all(|(_, view)| *view != ViewKind::Empty),
        "non-empty collection rendered as empty: {:?}",
        seen
    );
    assert_eq!(seen.last().map(|(total, _)| *total), Some(2));
    assert_eq!(client.todo_fetch_count(), 3);
    assert_eq!(engine.metrics().stale_discarded, 1);
    assert_eq!(engine.todo_cache().get(&query.fingerprint()).await.unwrap().data.total, 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_flight_leaves_cache_untouched() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(3)));
    let query = TodoQuery::default();
    client.delay_next_todo_fetch(Duration::from_millis(100));

    let page = engine.subscribe_todos(query.clone()).await;
    settle_until(|| client.todo_fetch_count() == 1).await;
    page.unsubscribe();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(engine.todo_cache().get(&query.fingerprint()).await.is_none());
    assert!(engine.todo_queries().active_fingerprints().is_empty());
    assert_eq!(engine.metrics().cancelled_discarded, 1);
}

#[tokio::test]
async fn test_stream_yields_render_models() {
    use futures_util::StreamExt;

    let (_, engine) = engine(ScriptedClient::with_todos(todos(2)));
    let mut stream = engine.subscribe_todos(TodoQuery::default()).await.into_stream();

    let mut last = None;
    while let Some(model) = stream.next().await {
        if model.view == ViewKind::Data {
            last = Some(model);
            break;
        }
    }
    assert_eq!(last.map(|m| m.total), Some(2));
}
