//! # Configuration System
//!
//! Configuration for the loan review integration client.
//!
//! This crate provides:
//! - [`ClientConfig`]: credentials, endpoint, transport and polling settings
//! - Environment variable loading (12-factor app principles)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (env > file > defaults)
//! - Configuration validation
//!
//! TLS relaxation is an explicit option on [`ClientConfig`]; it is never
//! derived from the selected [`Environment`].

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validation;

pub use config::{
    ClientConfig, Environment, PRODUCTION_ENDPOINT, PollingConfig, STAGING_ENDPOINT,
};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::{EnvVarError, apply_env_overrides, load_from_env};
pub use precedence::{ConfigLoadError, resolve_config};
pub use validation::validate;
pub use validator::Validate;
