//! # Request Signing
//!
//! Every request carries
//!
//! ```text
//! Authorization: AD {key_id}:{base64(HMAC-SHA1(api_key, canonical))}
//! Date: {timestamp}
//! ```
//!
//! where `canonical` is `METHOD\ncontent-type\ntimestamp\npath`. The path is
//! the URL path without scheme, host or query string, and the `Date` header
//! carries exactly the timestamp string that was signed.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use errors::{IntegrationError, IntegrationResult};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// Authorization scheme prefix.
pub const AUTH_SCHEME: &str = "AD";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Header values produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub authorization: String,
    pub date: String
}

/// Signs requests with the session's API key.
#[derive(Clone)]
pub struct Signer {
    mac: HmacSha1,
    key_id: u32
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(api_key: impl AsRef<[u8]>, key_id: u32) -> IntegrationResult<Self> {
        let api_key = api_key.as_ref();
        if api_key.is_empty() {
            return Err(IntegrationError::Config(
                "API key must not be empty".to_string()
            ));
        }
        let mac = <HmacSha1 as KeyInit>::new_from_slice(api_key)
            .map_err(|e| IntegrationError::Config(format!("Invalid API key: {e}")))?;
        Ok(Self { mac, key_id })
    }

    #[must_use]
    pub fn key_id(&self) -> u32 {
        self.key_id
    }

    /// Sign a request at the current time.
    #[must_use]
    pub fn sign_now(&self, method: &str, content_type: &str, path: &str) -> Signature {
        self.sign(method, content_type, path, Utc::now())
    }

    #[must_use]
    pub fn sign(
        &self,
        method: &str,
        content_type: &str,
        path: &str,
        at: DateTime<Utc>
    ) -> Signature {
        let date = http_date(at);
        let authorization = self.authorization(method, content_type, &date, path);
        Signature {
            authorization,
            date
        }
    }

    /// Authorization header value for an already formatted timestamp.
    #[must_use]
    pub fn authorization(&self, method: &str, content_type: &str, date: &str, path: &str) -> String {
        let canonical = canonical_string(method, content_type, date, path);
        format!("{AUTH_SCHEME} {}:{}", self.key_id, self.digest(&canonical))
    }

    /// Check an `Authorization` header against the request it was sent with.
    #[must_use]
    pub fn verify(
        &self,
        method: &str,
        content_type: &str,
        date: &str,
        path: &str,
        authorization: &str
    ) -> bool {
        self.authorization(method, content_type, date, path) == authorization
    }

    fn digest(&self, canonical: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(canonical.as_bytes());
        general_purpose::STANDARD.encode(&mac.finalize().into_bytes()[..])
    }
}

/// `METHOD\ncontent-type\ntimestamp\npath`
#[must_use]
pub fn canonical_string(method: &str, content_type: &str, date: &str, path: &str) -> String {
    format!("{method}\n{content_type}\n{date}\n{path}")
}

/// RFC 1123 timestamp in GMT, e.g. `Tue, 01 Jul 2025 12:00:00 GMT`.
#[must_use]
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}
