//! # Mutation Coordinator
//!
//! The only writer besides the poll loop. Each mutation is sent once; a
//! successful one invalidates every cached page of the `todos` collection so
//! that active list subscriptions refetch, a failed one leaves the cache as it
//! was and hands the error back to the caller.
//!
//! Validation runs before anything is sent.

use std::sync::{Arc, Mutex, PoisonError};

use crate::client::api::RemoteClient;
use crate::client::sync::fingerprint::TODOS;
use crate::client::sync::metrics::SyncMetrics;
use crate::client::sync::query::QueryEngine;
use crate::shared::error::SyncResult;
use crate::shared::todo::{validate_title, Todo, TodoCreate, TodoForm, TodoPage, TodoPatch};

pub struct MutationCoordinator<C: RemoteClient> {
    client: Arc<C>,
    todos: QueryEngine<TodoPage>,
    metrics: Arc<Mutex<SyncMetrics>>,
}

impl<C: RemoteClient> Clone for MutationCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            todos: self.todos.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<C: RemoteClient> MutationCoordinator<C> {
    pub fn new(
        client: Arc<C>,
        todos: QueryEngine<TodoPage>,
        metrics: Arc<Mutex<SyncMetrics>>,
    ) -> Self {
        Self {
            client,
            todos,
            metrics,
        }
    }

    pub async fn create(&self, payload: TodoCreate) -> SyncResult<Todo> {
        validate_title(&payload.title)?;
        let result = self.client.create_todo(&payload).await;
        self.settle("create", result).await
    }

    pub async fn update(&self, id: i64, patch: TodoPatch) -> SyncResult<Todo> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        let result = self.client.update_todo(id, &patch).await;
        self.settle("update", result).await
    }

    pub async fn delete(&self, id: i64) -> SyncResult<()> {
        let result = self.client.delete_todo(id).await;
        self.settle("delete", result).await
    }

    /// Flip the completion flag of a todo whose current value is `current`
    pub async fn toggle_complete(&self, id: i64, current: bool) -> SyncResult<Todo> {
        self.update(id, TodoPatch::completed(!current)).await
    }

    /// Validate the form, then create a new todo or edit `existing`
    pub async fn submit_form(&self, existing: Option<&Todo>, form: &TodoForm) -> SyncResult<Todo> {
        let valid = form.validate()?;
        match existing {
            Some(todo) => self.update(todo.id, valid.into_patch()).await,
            None => self.create(valid.into_create()).await,
        }
    }

    async fn settle<R>(&self, action: &str, result: SyncResult<R>) -> SyncResult<R> {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_mutation(result.is_ok());

        match result {
            Ok(value) => {
                let invalidated = self.todos.invalidate(|fp| fp.belongs_to(TODOS)).await;
                tracing::info!(
                    "Todo {} succeeded, invalidated {} cached page(s)",
                    action,
                    invalidated.len()
                );
                Ok(value)
            }
            Err(err) => {
                tracing::warn!("Todo {} failed: {}", action, err);
                Err(err)
            }
        }
    }
}
