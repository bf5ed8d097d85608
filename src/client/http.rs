//! HTTP Remote Client
//!
//! reqwest implementation of [`RemoteClient`] against the `/api/v1` REST API.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::client::api::RemoteClient;
use crate::client::config::Config;
use crate::client::sync::fingerprint::TodoQuery;
use crate::shared::error::{SyncError, SyncResult};
use crate::shared::health::{DatabaseHealthResponse, HealthResponse};
use crate::shared::todo::{Todo, TodoCreate, TodoPage, TodoPatch};

/// REST client for the todo and health endpoints
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    config: Config,
    client: Client,
}

impl HttpRemoteClient {
    pub fn new(config: Config) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(config.app().request_timeout)
            .build()
            .map_err(|e| SyncError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> SyncResult<T> {
        let url = self.config.api_url(path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;
        decode(check_status(&url, response).await?).await
    }
}

impl RemoteClient for HttpRemoteClient {
    async fn fetch_todos(&self, query: &TodoQuery) -> SyncResult<TodoPage> {
        self.get_json("/todos", &query.query_pairs()).await
    }

    async fn create_todo(&self, payload: &TodoCreate) -> SyncResult<Todo> {
        let url = self.config.api_url("/todos");
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;
        decode(check_status(&url, response).await?).await
    }

    async fn update_todo(&self, id: i64, patch: &TodoPatch) -> SyncResult<Todo> {
        let url = self.config.api_url(&format!("/todos/{}", id));
        let response = self
            .client
            .patch(&url)
            .json(patch)
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;
        decode(check_status(&url, response).await?).await
    }

    async fn delete_todo(&self, id: i64) -> SyncResult<()> {
        let url = self.config.api_url(&format!("/todos/{}", id));
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;
        check_status(&url, response).await?;
        Ok(())
    }

    async fn fetch_health(&self) -> SyncResult<HealthResponse> {
        self.get_json("/health", &[]).await
    }

    async fn fetch_health_db(&self) -> SyncResult<DatabaseHealthResponse> {
        self.get_json("/health/db", &[]).await
    }
}

fn network_error(url: &str, err: reqwest::Error) -> SyncError {
    tracing::error!("Network error - no response received from {}: {}", url, err);
    SyncError::network(err.to_string())
}

/// Turn 4xx/5xx into [`SyncError::Http`], keeping the body
async fn check_status(url: &str, response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string());
    match status.as_u16() {
        404 => tracing::warn!("Resource not found: {}", url),
        403 => tracing::warn!("Forbidden: {}", url),
        code if code >= 500 => tracing::error!("Server error from {}: {}", url, body),
        _ => tracing::debug!("Request to {} failed with {}", url, status),
    }
    Err(SyncError::http(status.as_u16(), body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> SyncResult<T> {
    let bytes = response.bytes().await.map_err(SyncError::from)?;
    Ok(serde_json::from_slice(&bytes)?)
}
