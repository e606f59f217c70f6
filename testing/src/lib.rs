//! Shared test fixtures for the integration workspace.
//!
//! - Session configuration pointed at a `wiremock::MockServer`
//! - Collection+JSON response bodies (items, errors, file links)
//! - Binary document responses
//! - [`SignatureMatcher`], which only matches correctly signed requests
//! - Input files for upload tests

mod fixtures;
mod matchers;

pub use fixtures::*;
pub use matchers::SignatureMatcher;
