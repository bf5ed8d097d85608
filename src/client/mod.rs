//! Client Module
//!
//! Everything that talks to the backend: configuration loading, the
//! [`api::RemoteClient`] capability, its reqwest implementation and the
//! sync engine that keeps local views consistent with the server.

/// Configuration loading (file + environment)
pub mod config;

/// Remote resource client trait
pub mod api;

/// reqwest-backed remote client
#[cfg(feature = "http")]
pub mod http;

/// Cache, polling, mutations and view projection
pub mod sync;

pub use api::RemoteClient;
pub use config::Config;
#[cfg(feature = "http")]
pub use http::HttpRemoteClient;
pub use sync::SyncEngine;
