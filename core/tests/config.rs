use std::env;
use std::sync::Mutex;
use std::time::Duration;

use invoice_api_core::{load_client_config, ConfigError};

// Environment variables are process-wide.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: [&str; 3] = [
    "INVOICE_API_BASE_URL",
    "INVOICE_API_TIMEOUT_SECS",
    "INVOICE_API_LOG_FAILURES",
];

fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    for name in VARS {
        env::remove_var(name);
    }
    for (name, value) in vars {
        env::set_var(name, value);
    }
    let result = f();
    for name in VARS {
        env::remove_var(name);
    }
    result
}

#[test]
fn defaults_without_environment() {
    let config = with_env(&[], load_client_config).unwrap();
    assert_eq!(config.base_url, "http://localhost:8000");
    assert_eq!(config.timeout(), None);
    assert!(config.log_failures);
    assert!(config.default_headers.is_empty());
}

#[test]
fn environment_overrides_defaults() {
    let config = with_env(
        &[
            ("INVOICE_API_BASE_URL", "https://invoices.example.com"),
            ("INVOICE_API_TIMEOUT_SECS", "5"),
            ("INVOICE_API_LOG_FAILURES", "false"),
        ],
        load_client_config,
    )
    .unwrap();
    assert_eq!(config.base_url, "https://invoices.example.com");
    assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    assert!(!config.log_failures);
}

#[test]
fn zero_timeout_is_rejected() {
    let err = with_env(&[("INVOICE_API_TIMEOUT_SECS", "0")], load_client_config).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
}

#[test]
fn base_url_without_scheme_is_rejected() {
    let err = with_env(&[("INVOICE_API_BASE_URL", "localhost:8000")], load_client_config)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
}
