//! Mutation integration tests
//!
//! Successful writes invalidate every todo page, failed writes leave the
//! cache alone, and invalid input never reaches the server.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use todosync::client::sync::{PageWindow, SyncEngine, TodoQuery, ViewKind};
use todosync::shared::{AppConfig, SyncError, TodoCreate, TodoForm, TodoPatch};

use crate::common::{todo, todos, wait_for_todos, ScriptedClient};
use crate::{assert_contains, assert_http_err, assert_ok, assert_validation_err};

fn engine(client: ScriptedClient) -> (Arc<ScriptedClient>, SyncEngine<ScriptedClient>) {
    let client = Arc::new(client);
    let engine = SyncEngine::with_client(Arc::clone(&client), AppConfig::default());
    (client, engine)
}

fn page(offset: u32) -> TodoQuery {
    TodoQuery {
        window: PageWindow::new(offset, 50).unwrap(),
        ..TodoQuery::default()
    }
}

#[tokio::test]
async fn test_create_invalidates_every_todo_page() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(60)));

    // Cached but no longer watched
    let mut cached = engine.subscribe_todos(page(50)).await;
    wait_for_todos(&mut cached, |m| m.view == ViewKind::Data).await;
    cached.unsubscribe();

    let mut first = engine.subscribe_todos(page(0)).await;
    wait_for_todos(&mut first, |m| m.total == 60).await;

    let created = assert_ok!(engine.mutations().create(TodoCreate::new("Water plants")).await);
    assert_eq!(created.id, 61);

    assert!(engine.todo_cache().get(&page(50).fingerprint()).await.is_none());
    let model = wait_for_todos(&mut first, |m| m.total == 61 && !m.is_loading).await;
    assert_eq!(model.items[0].title, "Water plants");
    assert_eq!(client.todo_fetch_count(), 3);
    assert_eq!(engine.metrics().mutations_succeeded, 1);
}

#[tokio::test]
async fn test_list_never_renders_empty_while_refetching_after_create() {
    let (_, engine) = engine(ScriptedClient::with_todos(todos(3)));
    let mut list = engine.subscribe_todos(page(0)).await;
    wait_for_todos(&mut list, |m| m.view == ViewKind::Data).await;

    assert_ok!(engine.mutations().create(TodoCreate::new("Buy milk")).await);

    let mut model = list.current();
    loop {
        assert_ne!(model.view, ViewKind::Empty, "list of 4 todos rendered as empty");
        if !model.is_loading {
            break;
        }
        model = list.changed().await.expect("subscription closed");
    }
    assert_eq!(model.total, 4);
    assert_eq!(model.view, ViewKind::Data);
}

#[tokio::test]
async fn test_failed_mutation_leaves_cache_untouched() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(3)));
    let mut list = engine.subscribe_todos(page(0)).await;
    wait_for_todos(&mut list, |m| m.view == ViewKind::Data).await;

    client.fail_next_mutation(SyncError::http(500, "Internal server error"));
    assert_http_err!(engine.mutations().create(TodoCreate::new("Nope")).await, 500);

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(engine.todo_cache().get(&page(0).fingerprint()).await.is_some());
    assert_eq!(client.todo_fetch_count(), 1);
    assert_eq!(list.current().total, 3);
    assert_eq!(engine.metrics().mutations_failed, 1);
}

#[tokio::test]
async fn test_invalid_title_never_sent() {
    let (client, engine) = engine(ScriptedClient::default());
    let mutations = engine.mutations();

    assert_validation_err!(mutations.create(TodoCreate::new("")).await, "title");
    assert_validation_err!(mutations.create(TodoCreate::new("x".repeat(201))).await, "title");
    let rename = TodoPatch {
        title: Some(String::new()),
        ..TodoPatch::default()
    };
    assert_validation_err!(mutations.update(1, rename).await, "title");

    assert_eq!(client.mutation_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_submit_form_validates_before_sending() {
    let (client, engine) = engine(ScriptedClient::default());
    let form = TodoForm {
        title: "Dentist".to_string(),
        priority: "high".to_string(),
        due_date: "next tuesday".to_string(),
        ..TodoForm::default()
    };

    let result = engine.mutations().submit_form(None, &form).await;
    match &result {
        Err(SyncError::Validation { message, .. }) => assert_contains!(message, "next tuesday"),
        other => panic!("Expected validation error, got {:?}", other),
    }
    assert_validation_err!(result, "due_date");
    assert_eq!(client.mutation_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_submit_form_creates_or_updates() {
    let (client, engine) = engine(ScriptedClient::with_todos(vec![todo(1, "Old title")]));
    let mutations = engine.mutations();
    let form = TodoForm {
        title: "New title".to_string(),
        description: "with notes".to_string(),
        priority: "low".to_string(),
        due_date: "2024-06-01T09:30".to_string(),
    };

    let existing = todo(1, "Old title");
    let updated = assert_ok!(mutations.submit_form(Some(&existing), &form).await);
    assert_eq!(updated.id, 1);
    assert_eq!(updated.title, "New title");
    assert_eq!(updated.description.as_deref(), Some("with notes"));
    assert!(updated.due_date.is_some());

    let created = assert_ok!(mutations.submit_form(None, &form).await);
    assert_eq!(created.id, 2);
    assert_eq!(client.todo_count(), 2);
}

#[tokio::test]
async fn test_toggle_and_delete() {
    let (client, engine) = engine(ScriptedClient::with_todos(todos(2)));
    let mutations = engine.mutations();

    let toggled = assert_ok!(mutations.toggle_complete(1, false).await);
    assert!(toggled.completed);
    let toggled = assert_ok!(mutations.toggle_complete(1, true).await);
    assert!(!toggled.completed);

    assert_ok!(mutations.delete(2).await);
    assert_eq!(client.todo_count(), 1);
    assert_http_err!(mutations.delete(2).await, 404);
}

#[tokio::test]
async fn test_completed_filter_sees_toggle() {
    let (_, engine) = engine(ScriptedClient::with_todos(todos(3)));
    let mut list = assert_ok!(engine.list_state());
    list.set_completed(Some(true));

    let mut done = engine.subscribe_list(&list).await;
    let model = wait_for_todos(&mut done, |m| !m.is_loading && m.view != ViewKind::Loading).await;
    assert_eq!(model.total, 0);

    assert_ok!(engine.mutations().toggle_complete(2, false).await);
    let model = wait_for_todos(&mut done, |m| m.total == 1 && !m.is_loading).await;
    assert_eq!(model.items[0].id, 2);
    assert_eq!(model.stats.completed, 1);
}
