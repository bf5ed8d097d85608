//! Application configuration module
//!
//! Provides the validated configuration consumed by the remote client and
//! the sync engine, its builder, and the on-disk TOML representation.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(1500);
pub const DEFAULT_TODO_STALE_TIME: Duration = Duration::from_secs(30);
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 1000;
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend base URL, without the `/api/v1` prefix
    pub api_url: String,
    /// Per-request timeout for the HTTP client
    pub request_timeout: Duration,
    /// Poll cadence of both health endpoints
    pub health_poll_interval: Duration,
    /// How long a todo page is served from cache without refetching
    pub todo_stale_time: Duration,
    /// Default page size of the todo list
    pub page_limit: u32,
    /// Quiet period before a search input is applied
    pub search_debounce: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_poll_interval: DEFAULT_HEALTH_POLL_INTERVAL,
            todo_stale_time: DEFAULT_TODO_STALE_TIME,
            page_limit: DEFAULT_PAGE_LIMIT,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.api_url.clone()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("request_timeout must be positive"));
        }
        if self.health_poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue("health_poll_interval must be positive"));
        }
        if self.page_limit == 0 || self.page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::InvalidValue("page_limit must be within 1..=1000"));
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default, Clone)]
pub struct AppConfigBuilder {
    api_url: Option<String>,
    request_timeout: Option<Duration>,
    health_poll_interval: Option<Duration>,
    todo_stale_time: Option<Duration>,
    page_limit: Option<u32>,
    search_debounce: Option<Duration>,
}

impl AppConfigBuilder {
    /// Set the backend URL
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn health_poll_interval(mut self, interval: Duration) -> Self {
        self.health_poll_interval = Some(interval);
        self
    }

    pub fn todo_stale_time(mut self, stale_time: Duration) -> Self {
        self.todo_stale_time = Some(stale_time);
        self
    }

    pub fn page_limit(mut self, limit: u32) -> Self {
        self.page_limit = Some(limit);
        self
    }

    pub fn search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = Some(delay);
        self
    }

    /// Apply values present in a config file, keeping earlier settings for
    /// keys the file leaves out
    pub fn merge_file(mut self, file: FileConfig) -> Self {
        if let Some(url) = file.api_url {
            self.api_url = Some(url);
        }
        if let Some(ms) = file.request_timeout_ms {
            self.request_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = file.health_poll_interval_ms {
            self.health_poll_interval = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = file.todo_stale_time_ms {
            self.todo_stale_time = Some(Duration::from_millis(ms));
        }
        if let Some(limit) = file.page_limit {
            self.page_limit = Some(limit);
        }
        if let Some(ms) = file.search_debounce_ms {
            self.search_debounce = Some(Duration::from_millis(ms));
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            api_url: self
                .api_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            health_poll_interval: self
                .health_poll_interval
                .unwrap_or(defaults.health_poll_interval),
            todo_stale_time: self.todo_stale_time.unwrap_or(defaults.todo_stale_time),
            page_limit: self.page_limit.unwrap_or(defaults.page_limit),
            search_debounce: self.search_debounce.unwrap_or(defaults.search_debounce),
        };
        config.validate()?;
        Ok(config)
    }
}

/// On-disk configuration, every key optional
///
/// ```toml
/// api_url = "http://localhost:8000"
/// health_poll_interval_ms = 1500
/// page_limit = 50
/// ```
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub health_poll_interval_ms: Option<u64>,
    pub todo_stale_time_ms: Option<u64>,
    pub page_limit: Option<u32>,
    pub search_debounce_ms: Option<u64>,
}

impl FileConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },
}
