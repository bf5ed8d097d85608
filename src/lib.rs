//! Todosync - Main Library
//!
//! Todosync keeps a client's view of a remote todo collection consistent with
//! the server: cached reads keyed by request fingerprint, fixed-interval
//! polling of the health endpoints, out-of-order response protection and
//! cache invalidation after successful writes.
//!
//! # Module Structure
//!
//! - **`shared`** - Types with no I/O
//!   - Todo and health wire types, form validation
//!   - Error types
//!   - Application configuration
//!
//! - **`client`** - Talks to the backend
//!   - Config loading (TOML file + environment)
//!   - `RemoteClient` trait and its reqwest implementation
//!   - Sync engine: fingerprints, poll scheduler, cache, mutations, projector
//!
//! # Feature Flags
//!
//! - **`http`** (default) - reqwest-backed `HttpRemoteClient` and the
//!   `todosync-monitor` binary. Without it the engine runs against any
//!   `RemoteClient` implementation.
//!
//! # Usage
//!
//! ```rust,no_run
//! use todosync::client::{Config, HttpRemoteClient, SyncEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let engine = SyncEngine::new(HttpRemoteClient::new(config.clone())?, config.app().clone());
//! let mut health = engine.subscribe_health().await;
//! if let Some(model) = health.changed().await {
//!     println!("app: {}, db: {}", model.app.status, model.database.connection);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - Caches sit behind a `tokio::sync::RwLock`, query registries behind a
//!   `std::sync::Mutex` that is never held across an `.await`
//! - Subscriptions are `Send` and can move between tasks
//!
//! # Error Handling
//!
//! - `SyncError` for everything the engine reports
//! - `ConfigError` for configuration loading
//! - Failed reads keep the last good snapshot visible

/// Shared types and data structures
pub mod shared;

/// Backend client and sync engine
pub mod client;
