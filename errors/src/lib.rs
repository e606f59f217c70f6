//! # Integration Errors
//!
//! Error taxonomy for the loan review integration.
//!
//! - Uses `thiserror` for structured error definitions
//! - Service-level failures carry the envelope [`collection::Error`] the
//!   server returned
//! - [`ErrorKind`] is a fieldless tag callers can switch on

use thiserror::Error;

/// Error code the service uses for "resource not found".
pub const NOT_FOUND_CODE: &str = "404";

/// Error code meaning the asynchronous generation job has not completed.
pub const NOT_READY_CODE: &str = "created";

pub type IntegrationResult<T> = Result<T, IntegrationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ResourceNotFound,
    ResourceNotReady,
    Service,
    Transport,
    Cancelled,
    Config,
    Io,
    Serialization
}

#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The server reported the resource missing with a parseable error body.
    #[error("{path} not found: {error}")]
    ResourceNotFound {
        path: String,
        error: collection::Error
    },

    /// The polling budget ran out while the file was still being generated.
    #[error("Resource {href} not ready after {attempts} attempts")]
    ResourceNotReady {
        href: String,
        attempts: u32,
        error: Option<collection::Error>
    },

    /// Any other parseable service-level error.
    #[error("Integration error ({status}): {error}")]
    Service {
        status: u16,
        error: collection::Error
    },

    /// Network failure, or an error response without a parseable envelope.
    #[error("Transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<reqwest::Error>
    },

    #[error("Polling of {href} cancelled after {attempts} attempts")]
    Cancelled { href: String, attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error)
}

impl From<reqwest::Error> for IntegrationError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            status: error.status().map(|status| status.as_u16()),
            message: error.to_string(),
            source: Some(error)
        }
    }
}

impl IntegrationError {
    /// Classifies a parseable error envelope returned for `path`.
    ///
    /// A 404 status or a `"404"` code becomes [`Self::ResourceNotFound`];
    /// everything else is a generic [`Self::Service`] error.
    #[must_use]
    pub fn from_service(path: &str, status: u16, error: collection::Error) -> Self {
        if status == 404 || error.has_code(NOT_FOUND_CODE) {
            Self::ResourceNotFound {
                path: path.to_string(),
                error
            }
        } else {
            Self::Service { status, error }
        }
    }

    /// Error response whose body is not an envelope.
    #[must_use]
    pub fn unparseable(status: u16, body: &str) -> Self {
        const MAX_BODY: usize = 256;
        let snippet: String = body.chars().take(MAX_BODY).collect();
        Self::Transport {
            status: Some(status),
            message: format!("Non-JSON error received from server (HTTP {status}): {snippet}"),
            source: None
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::ResourceNotReady { .. } => ErrorKind::ResourceNotReady,
            Self::Service { .. } => ErrorKind::Service,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization
        }
    }

    /// The envelope error attached to this failure, if the server sent one.
    #[must_use]
    pub fn service_error(&self) -> Option<&collection::Error> {
        match self {
            Self::ResourceNotFound { error, .. } | Self::Service { error, .. } => Some(error),
            Self::ResourceNotReady { error, .. } => error.as_ref(),
            _ => None
        }
    }

    /// True for the one transient condition: a service error carrying the
    /// not-ready code.
    #[must_use]
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::Service { error, .. } if error.has_code(NOT_READY_CODE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_error(code: &str) -> collection::Error {
        collection::Error::new("title", code, "message")
    }

    #[test]
    fn test_from_service_not_found_by_status() {
        let err = IntegrationError::from_service("reviews/1", 404, envelope_error("missing"));
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
        assert_eq!(err.service_error().map(|e| e.code.as_str()), Some("missing"));
    }

    #[test]
    fn test_from_service_not_found_by_code() {
        let err = IntegrationError::from_service("reviews/1", 400, envelope_error("404"));
        assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
        assert!(err.to_string().starts_with("reviews/1 not found"));
    }

    #[test]
    fn test_from_service_generic() {
        let err = IntegrationError::from_service("reviews", 422, envelope_error("invalid"));
        assert_eq!(err.kind(), ErrorKind::Service);
        assert!(!err.is_not_ready());
    }

    #[test]
    fn test_not_ready_is_only_retryable_condition() {
        let err = IntegrationError::from_service("files/1", 409, envelope_error(NOT_READY_CODE));
        assert!(err.is_not_ready());

        let exhausted = IntegrationError::ResourceNotReady {
            href: "files/1".to_string(),
            attempts: 30,
            error: Some(envelope_error(NOT_READY_CODE))
        };
        assert!(!exhausted.is_not_ready());
        assert_eq!(exhausted.kind(), ErrorKind::ResourceNotReady);
        assert_eq!(exhausted.to_string(), "Resource files/1 not ready after 30 attempts");
    }

    #[test]
    fn test_unparseable_truncates_body() {
        let body = "x".repeat(1000);
        let err = IntegrationError::unparseable(502, &body);
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.service_error().is_none());
        assert!(err.to_string().len() < 400);
        assert!(matches!(err, IntegrationError::Transport { status: Some(502), .. }));
    }
}
