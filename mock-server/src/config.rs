//! Mock server configuration.
//!
//! Priority, highest first:
//! 1. environment (`MOCK_SERVER_PORT=8001`, `MOCK_SERVER_PAGE_SIZE=2`, ...)
//! 2. defaults

use config::{Config, ConfigError as ConfigCrateError, Environment};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest page `GET /api/emails/` will return.
    pub page_size: usize,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            page_size: 100,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn load_config() -> Result<ServerConfig, ConfigError> {
    let defaults = ServerConfig::default();
    let config = Config::builder()
        .set_default("host", defaults.host)?
        .set_default("port", i64::from(defaults.port))?
        .set_default("page_size", defaults.page_size as i64)?
        .set_default("log_level", defaults.log_level)?
        .add_source(
            Environment::with_prefix("MOCK_SERVER")
                .prefix_separator("_")
                .try_parsing(true),
        )
        .build()?;

    let server_config: ServerConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(format!("failed to deserialize config: {e}")))?;

    if server_config.page_size == 0 {
        return Err(ConfigError::Invalid("page_size must be positive".to_string()));
    }
    Ok(server_config)
}
