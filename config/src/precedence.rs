//! # Configuration Precedence
//!
//! Resolves the effective configuration from multiple sources.
//!
//! # Precedence Order
//! 1. Environment variables (highest priority)
//! 2. Configuration file
//! 3. Default values (lowest priority)
//!
//! The merged result is validated before it is returned.

use crate::config::ClientConfig;
use crate::file_loader::{ConfigFileError, load_from_file};
use crate::loader::{EnvVarError, apply_env_overrides};
use std::path::Path;
use tracing::debug;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    File(#[from] ConfigFileError),

    #[error(transparent)]
    Env(#[from] EnvVarError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors)
}

/// Resolve the client configuration: defaults, then `file` when given, then
/// environment overrides.
///
/// ## Usage
/// ```rust,no_run
/// use config::resolve_config;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = resolve_config(Some(Path::new("review-client.toml")))?;
///     println!("Endpoint: {}", config.endpoint());
///     Ok(())
/// }
/// ```
pub fn resolve_config(file: Option<&Path>) -> Result<ClientConfig, ConfigLoadError> {
    let mut config = match file {
        Some(path) => {
            let config = load_from_file(path)?;
            debug!(path = %path.display(), "Loaded client configuration file");
            config
        }
        None => ClientConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;

    debug!(
        endpoint = %config.endpoint(),
        key_id = config.key_id,
        raise_errors = config.raise_errors,
        "Resolved client configuration"
    );

    Ok(config)
}
