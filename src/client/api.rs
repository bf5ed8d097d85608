//! Remote Resource Client
//!
//! The capability the sync engine consumes. [`crate::client::http::HttpRemoteClient`]
//! implements it over HTTP; tests substitute scripted clients.
//!
//! Reads (`fetch_*`) are idempotent and safe to repeat on every poll tick.
//! Mutations are not, and the engine never retries them.

use std::future::Future;

use crate::client::sync::fingerprint::TodoQuery;
use crate::shared::error::SyncResult;
use crate::shared::health::{DatabaseHealthResponse, HealthResponse};
use crate::shared::todo::{Todo, TodoCreate, TodoPage, TodoPatch};

pub trait RemoteClient: Send + Sync + 'static {
    /// `GET /todos` with filter and pagination parameters
    fn fetch_todos(&self, query: &TodoQuery) -> impl Future<Output = SyncResult<TodoPage>> + Send;

    /// `POST /todos`
    fn create_todo(&self, payload: &TodoCreate) -> impl Future<Output = SyncResult<Todo>> + Send;

    /// `PATCH /todos/{id}`
    fn update_todo(
        &self,
        id: i64,
        patch: &TodoPatch,
    ) -> impl Future<Output = SyncResult<Todo>> + Send;

    /// `DELETE /todos/{id}`
    fn delete_todo(&self, id: i64) -> impl Future<Output = SyncResult<()>> + Send;

    /// `GET /health`
    fn fetch_health(&self) -> impl Future<Output = SyncResult<HealthResponse>> + Send;

    /// `GET /health/db`
    fn fetch_health_db(&self) -> impl Future<Output = SyncResult<DatabaseHealthResponse>> + Send;
}
