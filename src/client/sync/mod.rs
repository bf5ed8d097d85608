//! # Remote Collection Sync
//!
//! Keeps local views of the remote todo collection and health endpoints in
//! step with the server. Every read goes through a cache keyed by a
//! fingerprint of the request parameters; views subscribe to a fingerprint and
//! receive render-ready models whenever its state changes.
//!
//! ## Architecture
//!
//! Data flows one way:
//!
//! ```text
//! Fingerprint -> Poll Scheduler -> Collection Cache -> View Projector
//!                                        ^
//!                            Mutation Coordinator
//! ```
//!
//! - **Fingerprint**: canonical cache key of a request
//! - **Scheduler**: initial fetch, fixed-interval polls, refresh requests
//! - **Query engine**: one shared fetch per fingerprint, stale-response guard
//! - **Cache**: last good snapshot per fingerprint, survives failures
//! - **Mutations**: create/update/delete, then invalidate the collection
//! - **Projector**: loading/error/empty/data and pagination flags
//!
//! ## Usage
//!
//! ```rust,no_run
//! use todosync::client::http::HttpRemoteClient;
//! use todosync::client::config::Config;
//! use todosync::client::sync::SyncEngine;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let engine = SyncEngine::new(HttpRemoteClient::new(config.clone())?, config.app().clone());
//!
//! let list = engine.list_state()?;
//! let mut todos = engine.subscribe_list(&list).await;
//! let health = engine.subscribe_health().await;
//!
//! while let Some(model) = todos.changed().await {
//!     println!("{} ({:?})", model.page_label, model.view);
//! }
//! # drop(health);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod debounce;
pub mod fingerprint;
pub mod inflight;
pub mod list_state;
pub mod metrics;
pub mod mutation;
pub mod projector;
pub mod query;
pub mod scheduler;
pub mod subscription;

use futures_util::FutureExt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

use crate::client::api::RemoteClient;
use crate::shared::config::AppConfig;
use crate::shared::error::SyncResult;
use crate::shared::health::{DatabaseHealthResponse, HealthResponse};
use crate::shared::todo::TodoPage;

pub use cache::{CollectionCache, Snapshot};
pub use debounce::Debouncer;
pub use fingerprint::{Filter, Fingerprint, PageWindow, TodoQuery, HEALTH, HEALTH_DB, TODOS};
pub use inflight::{InFlightState, QueryPhase};
pub use list_state::ListState;
pub use metrics::SyncMetrics;
pub use mutation::MutationCoordinator;
pub use projector::{HealthRenderModel, TodoRenderModel, ViewKind};
pub use query::{Fetcher, QueryEngine, QueryState, QuerySubscription};
pub use scheduler::QueryOptions;
pub use subscription::{HealthSubscription, TodoSubscription};

/// Owns the caches and queries of one backend
pub struct SyncEngine<C: RemoteClient> {
    client: Arc<C>,
    config: AppConfig,
    todos: QueryEngine<TodoPage>,
    health: QueryEngine<HealthResponse>,
    health_db: QueryEngine<DatabaseHealthResponse>,
    metrics: Arc<Mutex<SyncMetrics>>,
}

impl<C: RemoteClient> SyncEngine<C> {
    pub fn new(client: C, config: AppConfig) -> Self {
        Self::with_client(Arc::new(client), config)
    }

    pub fn with_client(client: Arc<C>, config: AppConfig) -> Self {
        let metrics = Arc::new(Mutex::new(SyncMetrics::new()));
        Self {
            client,
            config,
            todos: QueryEngine::new(Arc::new(CollectionCache::new()), Arc::clone(&metrics)),
            health: QueryEngine::new(Arc::new(CollectionCache::new()), Arc::clone(&metrics)),
            health_db: QueryEngine::new(Arc::new(CollectionCache::new()), Arc::clone(&metrics)),
            metrics,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fresh list state with the configured page size
    pub fn list_state(&self) -> SyncResult<ListState> {
        ListState::new(self.config.page_limit)
    }

    pub async fn subscribe_todos(&self, query: TodoQuery) -> TodoSubscription {
        let window = query.window;
        let inner = self
            .todos
            .subscribe(
                query.fingerprint(),
                QueryOptions::on_demand(self.config.todo_stale_time),
                self.todo_fetcher(query),
            )
            .await;
        TodoSubscription::new(inner, window)
    }

    pub async fn subscribe_list(&self, state: &ListState) -> TodoSubscription {
        self.subscribe_todos(state.query()).await
    }

    /// Poll `/health` and `/health/db`, each on its own schedule
    pub async fn subscribe_health(&self) -> HealthSubscription {
        let options = QueryOptions::polling(self.config.health_poll_interval);

        let client = Arc::clone(&self.client);
        let app_fetcher: Fetcher<HealthResponse> = Arc::new(move || {
            let client = Arc::clone(&client);
            async move { client.fetch_health().await }.boxed()
        });
        let client = Arc::clone(&self.client);
        let db_fetcher: Fetcher<DatabaseHealthResponse> = Arc::new(move || {
            let client = Arc::clone(&client);
            async move { client.fetch_health_db().await }.boxed()
        });

        let app = self
            .health
            .subscribe(Fingerprint::resource(HEALTH), options, app_fetcher)
            .await;
        let database = self
            .health_db
            .subscribe(Fingerprint::resource(HEALTH_DB), options, db_fetcher)
            .await;
        HealthSubscription::new(app, database)
    }

    pub fn mutations(&self) -> MutationCoordinator<C> {
        MutationCoordinator::new(
            Arc::clone(&self.client),
            self.todos.clone(),
            Arc::clone(&self.metrics),
        )
    }

    /// Manual refresh of one page. `false` if nobody is subscribed to it.
    pub fn refetch_todos(&self, query: &TodoQuery) -> bool {
        self.todos.refetch(&query.fingerprint())
    }

    /// Drop every cached todo page; active pages refetch
    pub async fn invalidate_todos(&self) -> Vec<Fingerprint> {
        self.todos.invalidate(|fp| fp.belongs_to(TODOS)).await
    }

    /// Debouncer for search input, using the configured quiet period
    pub fn search_debouncer(&self) -> (Debouncer<String>, mpsc::UnboundedReceiver<String>) {
        Debouncer::new(self.config.search_debounce)
    }

    pub fn metrics(&self) -> SyncMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn todo_cache(&self) -> &Arc<CollectionCache<TodoPage>> {
        self.todos.cache()
    }

    pub fn todo_queries(&self) -> &QueryEngine<TodoPage> {
        &self.todos
    }

    fn todo_fetcher(&self, query: TodoQuery) -> Fetcher<TodoPage> {
        let client = Arc::clone(&self.client);
        Arc::new(move || {
            let client = Arc::clone(&client);
            let query = query.clone();
            async move { client.fetch_todos(&query).await }.boxed()
        })
    }
}
