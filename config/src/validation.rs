//! # Configuration Validation
//!
//! Validation for [`ClientConfig`] using the `validator` crate.

use crate::config::ClientConfig;
use validator::Validate;

/// Validate a client configuration.
///
/// ## Validation Rules
/// - `api_key`: at least 1 character
/// - `base_url`: a URL when set
/// - `request_timeout_seconds`: 1-86400
/// - `polling.max_attempts`: 1-1000
/// - `polling.interval_ms`: 0-60000
pub fn validate(config: &ClientConfig) -> Result<(), validator::ValidationErrors> {
    config.validate()
}
