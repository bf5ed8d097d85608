//! Shared Error Types
//!
//! This module defines the error type returned by every fallible operation of
//! the sync engine and the remote client.
//!
//! # Error Categories
//!
//! - `Network` - no response was received from the backend
//! - `Http` - the backend answered with a 4xx/5xx status
//! - `Validation` - client-side form checks failed, nothing was sent
//! - `Decode` - a response body could not be parsed
//! - `StaleResponseDiscarded` - internal guard outcome, never shown to users
//!
//! # Usage
//!
//! ```rust
//! use todosync::shared::error::SyncError;
//!
//! let error = SyncError::validation("title", "Title is required");
//! assert!(error.is_validation());
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and `Clone`, so the last error of a
//! query can be shared with every subscriber of that query.
use thiserror::Error;

/// Errors surfaced by the sync engine and the remote client
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No response was received (connection refused, timeout, DNS...)
    #[error("Network error: {message}")]
    Network {
        /// Human-readable error message
        message: String,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Client-side validation failed before any network call
    #[error("Validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Response body could not be decoded
    #[error("Decode error: {message}")]
    Decode {
        /// Human-readable error message
        message: String,
    },

    /// A response arrived for a request older than the one already stored
    #[error("Stale response discarded for {fingerprint}: seq {seq} <= {current}")]
    StaleResponseDiscarded {
        /// Fingerprint of the cache entry
        fingerprint: String,
        /// Sequence number of the discarded response
        seq: u64,
        /// Sequence number already recorded for the entry
        current: u64,
    },
}

impl SyncError {
    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new HTTP error
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleResponseDiscarded { .. })
    }

    /// HTTP status code, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(format!("JSON error: {}", err))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::decode(err.to_string());
        }
        match err.status() {
            Some(status) => Self::http(status.as_u16(), err.to_string()),
            None => Self::network(err.to_string()),
        }
    }
}

/// Result alias used across the crate
pub type SyncResult<T> = Result<T, SyncError>;
