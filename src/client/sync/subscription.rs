//! View-facing subscriptions: query state already run through the projector.

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;

use crate::client::sync::fingerprint::{Fingerprint, PageWindow};
use crate::client::sync::projector::{
    project_health, project_todos, HealthRenderModel, TodoRenderModel,
};
use crate::client::sync::query::{QueryState, QuerySubscription};
use crate::shared::health::{DatabaseHealthResponse, HealthResponse};
use crate::shared::todo::TodoPage;

/// One page of the todo list
pub struct TodoSubscription {
    inner: QuerySubscription<TodoPage>,
    window: PageWindow,
}

impl TodoSubscription {
    pub(crate) fn new(inner: QuerySubscription<TodoPage>, window: PageWindow) -> Self {
        Self { inner, window }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        self.inner.fingerprint()
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    /// Raw query state, before projection
    pub fn state(&self) -> QueryState<TodoPage> {
        self.inner.current()
    }

    pub fn current(&self) -> TodoRenderModel {
        project_page(&self.inner.current(), self.window)
    }

    /// Wait for the next change. `None` once the query is gone.
    pub async fn changed(&mut self) -> Option<TodoRenderModel> {
        let state = self.inner.changed().await?;
        Some(project_page(&state, self.window))
    }

    pub fn unsubscribe(self) {}

    /// Current model followed by one model per change
    pub fn into_stream(self) -> BoxStream<'static, TodoRenderModel> {
        let window = self.window;
        self.inner
            .into_stream()
            .map(move |state| project_page(&state, window))
            .boxed()
    }
}

fn project_page(state: &QueryState<TodoPage>, window: PageWindow) -> TodoRenderModel {
    project_todos(state.snapshot.as_deref(), &state.in_flight, window)
}

/// Both health endpoints, polled independently
pub struct HealthSubscription {
    app: QuerySubscription<HealthResponse>,
    database: QuerySubscription<DatabaseHealthResponse>,
}

impl HealthSubscription {
    pub(crate) fn new(
        app: QuerySubscription<HealthResponse>,
        database: QuerySubscription<DatabaseHealthResponse>,
    ) -> Self {
        Self { app, database }
    }

    pub fn current(&self) -> HealthRenderModel {
        let app = self.app.current();
        let database = self.database.current();
        project_health(
            (app.snapshot.as_deref(), &app.in_flight),
            (database.snapshot.as_deref(), &database.in_flight),
        )
    }

    /// Wait until either endpoint changes
    pub async fn changed(&mut self) -> Option<HealthRenderModel> {
        let changed = tokio::select! {
            state = self.app.changed() => state.map(drop),
            state = self.database.changed() => state.map(drop),
        };
        changed?;
        Some(self.current())
    }

    pub fn unsubscribe(self) {}

    pub fn into_stream(self) -> BoxStream<'static, HealthRenderModel> {
        let first = self.current();
        stream::once(async move { first })
            .chain(stream::unfold(self, |mut subscription| async move {
                let model = subscription.changed().await?;
                Some((model, subscription))
            }))
            .boxed()
    }
}
