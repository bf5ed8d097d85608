use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError, FileConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment overrides, applied after the config file
const ENV_API_URL: &str = "TODOSYNC_API_URL";
const ENV_HEALTH_POLL_MS: &str = "TODOSYNC_HEALTH_POLL_MS";
const ENV_PAGE_LIMIT: &str = "TODOSYNC_PAGE_LIMIT";

/// Client configuration wrapper.
#[derive(Debug, Clone, Default)]
pub struct Config {
    app: AppConfig,
}

impl Config {
    /// Defaults, then the config file at the default location (if any), then
    /// environment variables
    pub fn load() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Self::with_builder(apply_env(AppConfig::builder())?),
        }
    }

    /// Like [`Config::load`] with an explicit config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let file = FileConfig::from_toml_str(&source)?;
        tracing::debug!("Loaded config file {}", path.display());
        Self::with_builder(apply_env(AppConfig::builder().merge_file(file))?)
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self { app: builder.build()? })
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.app.api_url, path)
    }

    pub fn server_url(&self) -> &str {
        &self.app.api_url
    }
}

/// `$XDG_CONFIG_HOME/todosync/config.toml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("todosync").join("config.toml"))
}

fn apply_env(mut builder: AppConfigBuilder) -> Result<AppConfigBuilder, ConfigError> {
    if let Ok(url) = std::env::var(ENV_API_URL) {
        builder = builder.api_url(url);
    }
    if let Ok(ms) = std::env::var(ENV_HEALTH_POLL_MS) {
        let ms = ms
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue("TODOSYNC_HEALTH_POLL_MS must be an integer"))?;
        builder = builder.health_poll_interval(Duration::from_millis(ms));
    }
    if let Ok(limit) = std::env::var(ENV_PAGE_LIMIT) {
        let limit = limit
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue("TODOSYNC_PAGE_LIMIT must be an integer"))?;
        builder = builder.page_limit(limit);
    }
    Ok(builder)
}
