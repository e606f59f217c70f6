//! # Environment Variable Loader
//!
//! Loads client configuration from environment variables following 12-factor
//! app principles.
//!
//! # Variables
//! - `ADF_API_KEY`: API key used to sign requests
//! - `ADF_KEY_ID`: numeric id of the API key
//! - `ADF_ENVIRONMENT`: `staging` (default) or `production`
//! - `ADF_BASE_URL`: explicit endpoint override
//! - `ADF_ACCEPT_INVALID_CERTS`: disable TLS certificate validation (default: false)
//! - `ADF_REQUEST_TIMEOUT_SECONDS`: per-call timeout (default: 3600)
//! - `ADF_RAISE_ERRORS`: return service errors instead of recording them (default: true)
//! - `ADF_DOWNLOAD_DIR`: directory for downloaded files
//! - `ADF_POLL_MAX_ATTEMPTS`: polling budget (default: 30)
//! - `ADF_POLL_INTERVAL_MS`: pause between polls (default: 1000)

use crate::config::{ClientConfig, Environment};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_API_KEY: &str = "ADF_API_KEY";
pub const ENV_KEY_ID: &str = "ADF_KEY_ID";
pub const ENV_ENVIRONMENT: &str = "ADF_ENVIRONMENT";
pub const ENV_BASE_URL: &str = "ADF_BASE_URL";
pub const ENV_ACCEPT_INVALID_CERTS: &str = "ADF_ACCEPT_INVALID_CERTS";
pub const ENV_REQUEST_TIMEOUT_SECONDS: &str = "ADF_REQUEST_TIMEOUT_SECONDS";
pub const ENV_RAISE_ERRORS: &str = "ADF_RAISE_ERRORS";
pub const ENV_DOWNLOAD_DIR: &str = "ADF_DOWNLOAD_DIR";
pub const ENV_POLL_MAX_ATTEMPTS: &str = "ADF_POLL_MAX_ATTEMPTS";
pub const ENV_POLL_INTERVAL_MS: &str = "ADF_POLL_INTERVAL_MS";

/// A variable was set but could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {name}: {value:?}")]
pub struct EnvVarError {
    pub name: String,
    pub value: String
}

/// Load configuration from environment variables on top of the defaults.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_env()?;
///     println!("Endpoint: {}", config.endpoint());
///     Ok(())
/// }
/// ```
pub fn load_from_env() -> Result<ClientConfig, EnvVarError> {
    let mut config = ClientConfig::default();
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Override fields of `config` with any variables that are set.
///
/// Unset variables leave the field untouched; a set but malformed variable
/// is an error.
pub fn apply_env_overrides(config: &mut ClientConfig) -> Result<(), EnvVarError> {
    if let Ok(key) = env::var(ENV_API_KEY) {
        config.api_key = key;
    }
    if let Some(key_id) = parse_env::<u32>(ENV_KEY_ID)? {
        config.key_id = key_id;
    }
    if let Some(environment) = parse_env::<Environment>(ENV_ENVIRONMENT)? {
        config.environment = environment;
    }
    if let Ok(url) = env::var(ENV_BASE_URL) {
        config.base_url = Some(url);
    }
    if let Some(accept) = parse_bool_env(ENV_ACCEPT_INVALID_CERTS)? {
        config.accept_invalid_certs = accept;
    }
    if let Some(timeout) = parse_env::<u64>(ENV_REQUEST_TIMEOUT_SECONDS)? {
        config.request_timeout_seconds = timeout;
    }
    if let Some(raise) = parse_bool_env(ENV_RAISE_ERRORS)? {
        config.raise_errors = raise;
    }
    if let Ok(dir) = env::var(ENV_DOWNLOAD_DIR) {
        config.download_dir = Some(PathBuf::from(dir));
    }
    if let Some(attempts) = parse_env::<u32>(ENV_POLL_MAX_ATTEMPTS)? {
        config.polling.max_attempts = attempts;
    }
    if let Some(interval) = parse_env::<u64>(ENV_POLL_INTERVAL_MS)? {
        config.polling.interval_ms = interval;
    }
    Ok(())
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, EnvVarError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| EnvVarError {
            name: key.to_string(),
            value: raw
        }),
        Err(_) => Ok(None)
    }
}

fn parse_bool_env(key: &str) -> Result<Option<bool>, EnvVarError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(EnvVarError {
                name: key.to_string(),
                value: raw
            })
        },
        Err(_) => Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: [&str; 10] = [
        ENV_API_KEY,
        ENV_KEY_ID,
        ENV_ENVIRONMENT,
        ENV_BASE_URL,
        ENV_ACCEPT_INVALID_CERTS,
        ENV_REQUEST_TIMEOUT_SECONDS,
        ENV_RAISE_ERRORS,
        ENV_DOWNLOAD_DIR,
        ENV_POLL_MAX_ATTEMPTS,
        ENV_POLL_INTERVAL_MS
    ];

    fn clear_env() {
        for name in ALL_VARS {
            unsafe {
                env::remove_var(name);
            }
        }
    }

    #[test]
    #[serial]
    fn test_load_from_env_defaults() {
        clear_env();
        let config = load_from_env().unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_from_env_overrides() {
        clear_env();
        unsafe {
            env::set_var(ENV_API_KEY, "secret");
            env::set_var(ENV_KEY_ID, "1234");
            env::set_var(ENV_ENVIRONMENT, "production");
            env::set_var(ENV_ACCEPT_INVALID_CERTS, "1");
            env::set_var(ENV_RAISE_ERRORS, "false");
            env::set_var(ENV_DOWNLOAD_DIR, "/tmp/reviews");
            env::set_var(ENV_POLL_MAX_ATTEMPTS, "5");
            env::set_var(ENV_POLL_INTERVAL_MS, "20");
        }

        let config = load_from_env().unwrap();
        clear_env();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.key_id, 1234);
        assert_eq!(config.environment, Environment::Production);
        assert!(config.accept_invalid_certs);
        assert!(!config.raise_errors);
        assert_eq!(config.download_dir, Some(PathBuf::from("/tmp/reviews")));
        assert_eq!(config.polling.max_attempts, 5);
        assert_eq!(config.polling.interval_ms, 20);
    }

    #[test]
    #[serial]
    fn test_invalid_number_is_reported() {
        clear_env();
        unsafe {
            env::set_var(ENV_KEY_ID, "not_a_number");
        }

        let result = load_from_env();
        clear_env();

        let err = result.unwrap_err();
        assert_eq!(err.name, ENV_KEY_ID);
        assert_eq!(err.value, "not_a_number");
    }

    #[test]
    #[serial]
    fn test_invalid_bool_is_reported() {
        clear_env();
        unsafe {
            env::set_var(ENV_RAISE_ERRORS, "maybe");
        }

        let result = load_from_env();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_overrides_keep_unset_fields() {
        clear_env();
        unsafe {
            env::set_var(ENV_POLL_MAX_ATTEMPTS, "3");
        }

        let mut config = ClientConfig::new("from-file", 9).with_base_url("http://localhost:1");
        let result = apply_env_overrides(&mut config);
        clear_env();

        assert!(result.is_ok());
        assert_eq!(config.api_key, "from-file");
        assert_eq!(config.key_id, 9);
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:1"));
        assert_eq!(config.polling.max_attempts, 3);
    }
}
