//! Shared Module
//!
//! Wire types exchanged with the todo/health REST backend, the crate-wide
//! error type and the application configuration. Nothing in here performs
//! I/O; the `client` module builds on these types.

/// Todo resource types and form validation
pub mod todo;

/// Health check responses
pub mod health;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use todo::{Priority, SortBy, SortOrder, Todo, TodoCreate, TodoForm, TodoPage, TodoPatch, TodoStats};
pub use health::{DatabaseHealthResponse, HealthResponse};
pub use error::{SyncError, SyncResult};
pub use config::{AppConfig, AppConfigBuilder, ConfigError, FileConfig};
