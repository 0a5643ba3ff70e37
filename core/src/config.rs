//! Client configuration.
//!
//! Values are merged from defaults and `INVOICE_API_`-prefixed environment
//! variables, highest priority last:
//! 1. defaults (`http://localhost:8000`, no timeout, failure logging on)
//! 2. environment, e.g. `INVOICE_API_BASE_URL=http://backend:8000`,
//!    `INVOICE_API_TIMEOUT_SECS=30`, `INVOICE_API_LOG_FAILURES=false`

use std::time::Duration;

use config::{Config, ConfigError as ConfigCrateError, Environment};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

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

/// Configuration handed to `ApiClient::new`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Origin the API paths are joined onto.
    pub base_url: String,
    /// Sent with every request, after `Content-Type: application/json`.
    #[serde(default)]
    pub default_headers: Vec<(String, String)>,
    /// Transport timeout. `None` inherits the transport's default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Write every failure to the `tracing` error channel before returning it.
    #[serde(default = "default_log_failures")]
    pub log_failures: bool,
}

fn default_log_failures() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_headers: Vec::new(),
            timeout_secs: None,
            log_failures: true,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn without_failure_logging(mut self) -> Self {
        self.log_failures = false;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Load a `ClientConfig` from defaults and the environment.
pub fn load_client_config() -> Result<ClientConfig, ConfigError> {
    let config = Config::builder()
        .set_default("base_url", DEFAULT_BASE_URL)?
        .set_default("log_failures", true)?
        .add_source(
            Environment::with_prefix("INVOICE_API")
                .prefix_separator("_")
                .try_parsing(true),
        )
        .build()?;

    let client_config: ClientConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(format!("failed to deserialize config: {e}")))?;

    validate(&client_config)?;
    Ok(client_config)
}

fn validate(config: &ClientConfig) -> Result<(), ConfigError> {
    if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
        return Err(ConfigError::Invalid(format!(
            "base_url must be an http(s) URL, got {:?}",
            config.base_url
        )));
    }
    if config.timeout_secs == Some(0) {
        return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
    }
    Ok(())
}
