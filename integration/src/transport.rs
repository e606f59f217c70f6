//! # Signed Transport
//!
//! Sends signed requests to the review service and classifies what comes
//! back:
//!
//! - 2xx with a binary content type: [`Outcome::File`]
//! - 2xx otherwise: [`Outcome::Collection`] (an empty body is an empty
//!   collection)
//! - an error envelope, on any status: [`IntegrationError::from_service`]
//! - non-2xx without one: [`IntegrationError::unparseable`]
//!
//! Network failures propagate as transport errors. The response body is
//! always read to the end, so the connection is released on every path.

use crate::signer::Signer;
use collection::{Collection, CollectionWrapper, MEDIA_TYPE};
use config::ClientConfig;
use errors::{IntegrationError, IntegrationResult};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, DATE, HeaderMap};
use reqwest::{Client, Method, StatusCode, Url};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Binary payload type returned for generated documents.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// `Accept` value for calls that may answer with a document or an envelope.
pub const FILE_ACCEPT: &str = "application/pdf, application/vnd.collection+json";

/// A classified 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    File {
        content_type: String,
        bytes: Vec<u8>
    },
    Collection(Collection)
}

/// Unclassified response, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_binary)
    }

    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: Url,
    signer: Signer
}

impl Transport {
    pub fn new(config: &ClientConfig, signer: Signer) -> IntegrationResult<Self> {
        if config.accept_invalid_certs {
            warn!("TLS certificate validation is disabled for this session");
        }
        let client = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url(config.endpoint())?,
            signer
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute targets (file links handed out by the service) are used as
    /// is; anything else is joined onto the base URL.
    pub fn resolve(&self, target: &str) -> IntegrationResult<Url> {
        let resolved = if is_absolute(target) {
            Url::parse(target)
        } else {
            self.base_url.join(target.trim_start_matches('/'))
        };
        resolved.map_err(|e| IntegrationError::Config(format!("Invalid request target {target}: {e}")))
    }

    /// Send a signed request and classify the response.
    pub async fn execute(
        &self,
        method: Method,
        target: &str,
        body: Option<Vec<u8>>,
        accept: &str
    ) -> IntegrationResult<Outcome> {
        let response = self.send(method, target, body, accept).await?;
        let status = response.status();
        let content_type = content_type_of(response.headers());
        let bytes = response.bytes().await?;

        if status.is_success() {
            classify_success(target, status, content_type, &bytes)
        } else {
            let error = classify_failure(target, status, &bytes);
            warn!(target, status = status.as_u16(), error = %error, "Request failed");
            Err(error)
        }
    }

    /// Send a signed request and return the response untouched.
    pub async fn raw(&self, method: Method, target: &str, accept: &str) -> IntegrationResult<RawResponse> {
        let response = self.send(method, target, None, accept).await?;
        let status = response.status().as_u16();
        let content_type = content_type_of(response.headers());
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse {
            status,
            content_type,
            body
        })
    }

    async fn send(
        &self,
        method: Method,
        target: &str,
        body: Option<Vec<u8>>,
        accept: &str
    ) -> IntegrationResult<reqwest::Response> {
        let url = self.resolve(target)?;
        let signature = self.signer.sign_now(method.as_str(), MEDIA_TYPE, url.path());
        debug!(method = %method, url = %url, "Sending signed request");

        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, MEDIA_TYPE)
            .header(ACCEPT, accept)
            .header(AUTHORIZATION, signature.authorization)
            .header(DATE, signature.date);
        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request.send().await?)
    }
}

fn base_url(endpoint: &str) -> IntegrationResult<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| IntegrationError::Config(format!("Invalid endpoint {endpoint}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn is_absolute(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

fn content_type_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Whether a `Content-Type` value denotes a binary document.
#[must_use]
pub fn is_binary(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
}

fn classify_success(
    target: &str,
    status: StatusCode,
    content_type: Option<String>,
    bytes: &[u8]
) -> IntegrationResult<Outcome> {
    if let Some(content_type) = content_type.filter(|value| is_binary(value)) {
        return Ok(Outcome::File {
            content_type,
            bytes: bytes.to_vec()
        });
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Outcome::Collection(Collection::default()));
    }

    let mut collection = CollectionWrapper::from_slice(bytes)?.into_collection();
    // An error envelope is a failure whatever the status says.
    match collection.error.take() {
        Some(error) => Err(IntegrationError::from_service(target, status.as_u16(), error)),
        None => Ok(Outcome::Collection(collection))
    }
}

fn classify_failure(target: &str, status: StatusCode, bytes: &[u8]) -> IntegrationError {
    match CollectionWrapper::from_slice(bytes).map(|wrapper| wrapper.collection.error) {
        Ok(Some(error)) => IntegrationError::from_service(target, status.as_u16(), error),
        _ => IntegrationError::unparseable(status.as_u16(), &String::from_utf8_lossy(bytes))
    }
}
