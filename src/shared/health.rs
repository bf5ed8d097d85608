//! Health check response types for `/api/v1/health` and `/api/v1/health/db`.
use serde::{Deserialize, Serialize};

/// Liveness check response, e.g. `{"status": "healthy"}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

/// Database connectivity check response
///
/// The backend answers 503 with this same body when the database is down.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseHealthResponse {
    pub status: String,
    pub database: String,
    #[serde(default)]
    pub error: Option<String>,
}
