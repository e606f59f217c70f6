//! # Configuration Structures
//!
//! Settings for one integration session: credentials, target endpoint,
//! transport options and the polling budget used while waiting for
//! generated documents.
//!
//! All structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Provide defaults matching the service's documented behaviour

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

pub const STAGING_ENDPOINT: &str = "https://api.staging.adfitech.com";
pub const PRODUCTION_ENDPOINT: &str = "https://api.adfitech.com";

/// Named deployment of the review service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Staging,
    Production
}

impl Environment {
    /// Base URL of the deployment.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Staging => STAGING_ENDPOINT,
            Self::Production => PRODUCTION_ENDPOINT
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}"))
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staging => f.write_str("staging"),
            Self::Production => f.write_str("production")
        }
    }
}

/// Client configuration for one integration session.
///
/// # Fields
/// - `api_key` / `key_id`: credentials issued by the service, used to sign
///   every request
/// - `environment`: deployment to talk to when `base_url` is not set
/// - `base_url`: explicit endpoint override (private deployments, tests)
/// - `accept_invalid_certs`: disables TLS certificate validation; never
///   implied by `environment`
/// - `request_timeout_seconds`: per-call timeout, generous to allow large
///   uploads
/// - `raise_errors`: when false, service errors are recorded on the session
///   instead of returned
/// - `download_dir`: where downloaded files are written (system temp dir
///   when unset)
/// - `polling`: budget for waiting on generated documents
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub api_key: String,

    #[serde(default)]
    pub key_id: u32,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    #[validate(url)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default = "default_request_timeout_seconds")]
    #[validate(range(min = 1, max = 86400))]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_raise_errors")]
    pub raise_errors: bool,

    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    #[serde(default)]
    #[validate(nested)]
    pub polling: PollingConfig
}

fn default_request_timeout_seconds() -> u64 {
    3600
}

fn default_raise_errors() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            key_id: 0,
            environment: Environment::default(),
            base_url: None,
            accept_invalid_certs: false,
            request_timeout_seconds: default_request_timeout_seconds(),
            raise_errors: default_raise_errors(),
            download_dir: None,
            polling: PollingConfig::default()
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("key_id", &self.key_id)
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("raise_errors", &self.raise_errors)
            .field("download_dir", &self.download_dir)
            .field("polling", &self.polling)
            .finish()
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, key_id: u32) -> Self {
        Self {
            api_key: api_key.into(),
            key_id,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    #[must_use]
    pub fn with_raise_errors(mut self, raise: bool) -> Self {
        self.raise_errors = raise;
        self
    }

    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.endpoint())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Budget for polling a generated file link.
///
/// Worst-case wait is roughly `max_attempts * interval_ms`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct PollingConfig {
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 1000))]
    pub max_attempts: u32,

    #[serde(default = "default_interval_ms")]
    #[validate(range(max = 60000))]
    pub interval_ms: u64
}

fn default_max_attempts() -> u32 {
    30
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms()
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.request_timeout(), Duration::from_secs(3600));
        assert!(config.raise_errors);
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.polling.max_attempts, 30);
        assert_eq!(config.polling.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_endpoint_resolution() {
        let config = ClientConfig::new("key", 1);
        assert_eq!(config.endpoint(), STAGING_ENDPOINT);

        let config = config.with_environment(Environment::Production);
        assert_eq!(config.endpoint(), PRODUCTION_ENDPOINT);

        let config = config.with_base_url("http://127.0.0.1:9000");
        assert_eq!(config.endpoint(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_production_does_not_imply_tls_relaxation() {
        let staging = ClientConfig::new("key", 1);
        let production = ClientConfig::new("key", 1).with_environment(Environment::Production);
        assert!(!staging.accept_invalid_certs);
        assert!(!production.accept_invalid_certs);
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("Production".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("staging".parse::<Environment>(), Ok(Environment::Staging));
        assert!("qa".parse::<Environment>().is_err());
        assert_eq!(Environment::Production.to_string(), "production");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::new("super-secret", 7);
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_polling_from_duration() {
        let polling = PollingConfig::new(5, Duration::from_millis(250));
        assert_eq!(polling.interval_ms, 250);
        assert_eq!(polling.interval(), Duration::from_millis(250));
    }
}
