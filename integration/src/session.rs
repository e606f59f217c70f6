//! # Integration Session
//!
//! A [`Session`] binds credentials, an endpoint and an error policy, and
//! exposes the service operations. Every operation overwrites the session's
//! [`SessionResult`]; files received along the way are tracked until
//! [`Session::close`].
//!
//! Operations take `&mut self`, so one session serves one caller at a time.
//! Share it across tasks behind a `tokio::sync::Mutex` if needed.
//!
//! ## Error policy
//! With `raise_errors` set (the default) every failure is returned. With it
//! cleared, failures carrying a service error envelope are recorded on the
//! result instead and the operation returns normally; transport, I/O and
//! cancellation failures are always returned.

use crate::artifacts::ArtifactStore;
use crate::signer::Signer;
use crate::transport::{FILE_ACCEPT, Outcome, RawResponse, Transport, is_binary};
use base64::{Engine as _, engine::general_purpose};
use collection::{Collection, Datum, Item, MEDIA_TYPE, TemplateWrapper};
use config::{ClientConfig, PollingConfig};
use errors::{IntegrationError, IntegrationResult};
use reqwest::Method;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Loan review resources.
pub const REVIEWS_PATH: &str = "reviews";
/// Document uploads.
pub const AI_PATH: &str = "ai";
/// Image generation jobs.
pub const IMAGES_PATH: &str = "loan_images";

const LOAN_SOURCE_TYPE: &str = "Fannie32";
const PDF_IMPORT_PROFILE: &str = "adf_import";

/// Outcome of the most recent operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResult {
    pub success: bool,
    pub empty: bool,
    pub items: Vec<Item>,
    pub item: Option<Item>,
    pub error: Option<collection::Error>
}

impl SessionResult {
    fn set_collection(&mut self, collection: Collection) {
        self.empty = collection.items.is_empty();
        self.item = collection.single_item().cloned();
        self.items = collection.items;
    }
}

#[derive(Debug)]
pub struct Session {
    transport: Transport,
    raise_errors: bool,
    pub(crate) polling: PollingConfig,
    result: SessionResult,
    artifacts: ArtifactStore
}

impl Session {
    /// Validate `config` and build a session from it.
    pub fn new(config: ClientConfig) -> IntegrationResult<Self> {
        config::validate(&config).map_err(|e| IntegrationError::Config(e.to_string()))?;

        let signer = Signer::new(config.api_key.as_bytes(), config.key_id)?;
        let transport = Transport::new(&config, signer)?;
        info!(
            endpoint = %transport.base_url(),
            key_id = config.key_id,
            raise_errors = config.raise_errors,
            "Created integration session"
        );

        Ok(Self {
            transport,
            raise_errors: config.raise_errors,
            polling: config.polling,
            result: SessionResult::default(),
            artifacts: ArtifactStore::new(config.download_dir)
        })
    }

    // Result accessors

    #[must_use]
    pub fn result(&self) -> &SessionResult {
        &self.result
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.result.success
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.result.empty
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.result.items
    }

    #[must_use]
    pub fn item(&self) -> Option<&Item> {
        self.result.item.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&collection::Error> {
        self.result.error.as_ref()
    }

    /// Every file downloaded by this session and not yet released.
    #[must_use]
    pub fn downloaded_files(&self) -> Vec<&Path> {
        self.artifacts.paths().collect()
    }

    #[must_use]
    pub fn file_received(&self) -> bool {
        !self.artifacts.is_empty()
    }

    #[must_use]
    pub fn raise_errors(&self) -> bool {
        self.raise_errors
    }

    // Reads

    /// Reviews for a loan number.
    pub async fn find_reviews(&mut self, loan_number: &str) -> IntegrationResult<&SessionResult> {
        let target = format!("{REVIEWS_PATH}?loan_number={}", urlencoding::encode(loan_number));
        self.read(&target).await
    }

    pub async fn get_review(&mut self, review_id: &str) -> IntegrationResult<&SessionResult> {
        let target = format!("{REVIEWS_PATH}/{}", urlencoding::encode(review_id));
        self.read(&target).await
    }

    /// Documents attached to a review.
    pub async fn get_document_list(&mut self, review_id: &str) -> IntegrationResult<&SessionResult> {
        let target = format!("{REVIEWS_PATH}/{}/documents", urlencoding::encode(review_id));
        self.read(&target).await
    }

    /// Image jobs, optionally narrowed to one review. The service filters
    /// on the `loan_number` parameter.
    pub async fn list_review_images(
        &mut self,
        review_id: Option<&str>
    ) -> IntegrationResult<&SessionResult> {
        let target = match review_id {
            Some(review_id) => format!(
                "{IMAGES_PATH}?loan_number={}",
                urlencoding::encode(review_id)
            ),
            None => IMAGES_PATH.to_string()
        };
        self.read(&target).await
    }

    /// One image job by id.
    pub async fn get_review_images_resource(
        &mut self,
        images_id: &str
    ) -> IntegrationResult<&SessionResult> {
        let target = format!("{IMAGES_PATH}/{}", urlencoding::encode(images_id));
        self.read(&target).await
    }

    /// Download a single file link.
    ///
    /// Returns the local path when the service answered with a document,
    /// `None` when it answered with an envelope (or the failure was recorded
    /// under the non-raising policy). A link whose document is still being
    /// generated fails with a service error for which
    /// [`IntegrationError::is_not_ready`] holds.
    pub async fn fetch_file(&mut self, url: &str) -> IntegrationResult<Option<PathBuf>> {
        self.begin();
        let outcome = self.dispatch(Method::GET, url, None, FILE_ACCEPT).await;
        Ok(self.settle(outcome)?.flatten())
    }

    // Writes

    /// Submit a loan file for review.
    pub async fn post_loan_file(
        &mut self,
        loan_number: &str,
        product_id: &str,
        file: impl AsRef<Path>
    ) -> IntegrationResult<&SessionResult> {
        let encoded = encode_file(file.as_ref()).await?;
        self.write(
            REVIEWS_PATH,
            vec![
                Datum::new("loan_number", loan_number),
                Datum::new("product_id", product_id),
                Datum::new("source_type", LOAN_SOURCE_TYPE),
                Datum::new("fannie_3_2_file", encoded)
            ]
        )
        .await
    }

    /// Submit loan data given as template fields.
    pub async fn post_loan(&mut self, data: Vec<Datum>) -> IntegrationResult<&SessionResult> {
        self.write(REVIEWS_PATH, data).await
    }

    /// Attach a PDF to a review.
    pub async fn post_pdf(
        &mut self,
        review_id: &str,
        file: impl AsRef<Path>,
        doc_type: Option<&str>
    ) -> IntegrationResult<&SessionResult> {
        let encoded = encode_file(file.as_ref()).await?;
        self.write(
            AI_PATH,
            vec![
                Datum::new("review_id", review_id),
                Datum::new("profile", PDF_IMPORT_PROFILE),
                Datum::optional("doc_type", doc_type),
                Datum::new("file", encoded)
            ]
        )
        .await
    }

    // Diagnostics

    /// Fetch `target` and log the raw response. The session result is left
    /// untouched.
    pub async fn inspect(&self, target: &str) -> IntegrationResult<RawResponse> {
        let raw = self.transport.raw(Method::GET, target, FILE_ACCEPT).await?;
        if raw.is_file() {
            info!(target, status = raw.status, size = raw.body.len(), "Inspected binary response");
        } else {
            info!(
                target,
                status = raw.status,
                content_type = raw.content_type.as_deref().unwrap_or(""),
                body = %raw.text(),
                "Inspected response"
            );
        }
        Ok(raw)
    }

    /// Delete every downloaded file and end the session.
    pub fn close(mut self) -> IntegrationResult<()> {
        let count = self.artifacts.len();
        self.artifacts.release()?;
        debug!(files = count, "Closed integration session");
        Ok(())
    }

    // Internals

    pub(crate) fn begin(&mut self) {
        self.result = SessionResult::default();
    }

    pub(crate) fn restore_result(&mut self, result: SessionResult) {
        self.result = result;
    }

    async fn read(&mut self, target: &str) -> IntegrationResult<&SessionResult> {
        self.begin();
        let outcome = self.dispatch(Method::GET, target, None, MEDIA_TYPE).await;
        self.settle(outcome)?;
        Ok(&self.result)
    }

    async fn write(&mut self, target: &str, data: Vec<Datum>) -> IntegrationResult<&SessionResult> {
        self.begin();
        let body = TemplateWrapper::new(data).to_vec()?;
        let outcome = self.dispatch(Method::POST, target, Some(body), MEDIA_TYPE).await;
        if outcome.is_ok() && self.result.item.is_none() {
            warn!(target, items = self.result.items.len(), "Write did not return exactly one item");
        }
        self.settle(outcome)?;
        Ok(&self.result)
    }

    /// Send one request and record its outcome on the result.
    ///
    /// Files received are persisted and their path returned. Failures are
    /// always returned; the raise policy is applied by [`Self::settle`].
    pub(crate) async fn dispatch(
        &mut self,
        method: Method,
        target: &str,
        body: Option<Vec<u8>>,
        accept: &str
    ) -> IntegrationResult<Option<PathBuf>> {
        match self.transport.execute(method, target, body, accept).await {
            Ok(Outcome::File {
                content_type,
                bytes
            }) => {
                let path = self
                    .artifacts
                    .persist(&bytes, file_suffix(&content_type))
                    .await?;
                self.result.success = true;
                self.result.empty = false;
                self.result.error = None;
                Ok(Some(path))
            }
            Ok(Outcome::Collection(collection)) => {
                self.result.success = true;
                self.result.error = None;
                self.result.set_collection(collection);
                Ok(None)
            }
            Err(error) => {
                self.result.success = false;
                self.result.error = error.service_error().cloned();
                Err(error)
            }
        }
    }

    /// Apply the raise policy: service failures become `Ok(None)` when
    /// errors are not raised.
    pub(crate) fn settle<T>(&mut self, outcome: IntegrationResult<T>) -> IntegrationResult<Option<T>> {
        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(error) if !self.raise_errors && error.service_error().is_some() => {
                debug!(error = %error, "Recording service error on session result");
                self.result.success = false;
                self.result.error = error.service_error().cloned();
                Ok(None)
            }
            Err(error) => Err(error)
        }
    }
}

async fn encode_file(path: &Path) -> IntegrationResult<String> {
    let bytes = tokio::fs::read(path).await?;
    debug!(path = %path.display(), size = bytes.len(), "Encoding file for upload");
    Ok(general_purpose::STANDARD.encode(bytes))
}

fn file_suffix(content_type: &str) -> &'static str {
    if is_binary(content_type) { ".pdf" } else { ".bin" }
}
