//! # Generated Document Polling
//!
//! Image generation is asynchronous on the service side: the POST to
//! `loan_images` answers with an item whose `file` links point at documents
//! that may not exist yet. Each link is then polled until the document
//! arrives, the service reports another error, or the attempt budget runs
//! out.
//!
//! ## State machine (per file link)
//!
//! ```text
//! Requesting --Submitted{sync}--> AwaitingGeneration{0}
//! Requesting --Submitted{async}-> Deferred
//! AwaitingGeneration{n} --NotReady--> AwaitingGeneration{n+1} | Exhausted{max}
//! AwaitingGeneration{n} --Received--> Ready{n}
//! AwaitingGeneration{n} --Rejected--> Failed{n}
//! AwaitingGeneration{n} --Cancelled-> Cancelled{n}
//! ```
//!
//! Terminal states absorb every further event. Only the not-ready code
//! counts as an attempt; any other error ends polling of that link at once.

use crate::session::{IMAGES_PATH, Session};
use crate::transport::FILE_ACCEPT;
use collection::{Datum, MEDIA_TYPE, TemplateWrapper};
use errors::{IntegrationError, IntegrationResult};
use reqwest::Method;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Request for generated review images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub review_id: i64,
    pub documents: Vec<String>,
    pub stack: Option<String>,
    /// Poll the returned file links until the documents arrive. When false
    /// the links are handed back unpolled.
    pub synchronous: bool
}

impl ImageRequest {
    #[must_use]
    pub fn new<I, S>(review_id: i64, documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        Self {
            review_id,
            documents: documents.into_iter().map(Into::into).collect(),
            stack: None,
            synchronous: true
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.synchronous = false;
        self
    }

    fn template_data(&self) -> Vec<Datum> {
        vec![
            Datum::new("review_id", self.review_id.to_string()),
            Datum::new("documents", self.documents.clone()),
            Datum::optional("stack", self.stack.clone())
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Requesting,
    /// Link returned without polling.
    Deferred,
    AwaitingGeneration { attempts: u32 },
    Ready {
        attempts: u32,
        /// `None` when the service answered with an envelope instead of a
        /// document.
        artifact: Option<PathBuf>
    },
    Exhausted { attempts: u32 },
    Failed { attempts: u32 },
    Cancelled { attempts: u32 }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Submitted { synchronous: bool },
    NotReady,
    Received(Option<PathBuf>),
    Rejected,
    Cancelled
}

impl PollState {
    /// Apply `event` to this state under a budget of `max_attempts`.
    #[must_use]
    pub fn handle(self, event: PollEvent, max_attempts: u32) -> Self {
        match (self, event) {
            (Self::Requesting, PollEvent::Submitted { synchronous: true }) => {
                Self::AwaitingGeneration { attempts: 0 }
            }
            (Self::Requesting, PollEvent::Submitted { synchronous: false }) => Self::Deferred,
            (Self::Requesting, PollEvent::Rejected) => Self::Failed { attempts: 0 },
            (Self::AwaitingGeneration { attempts }, PollEvent::NotReady) => {
                let attempts = attempts + 1;
                if attempts >= max_attempts {
                    Self::Exhausted { attempts }
                } else {
                    Self::AwaitingGeneration { attempts }
                }
            }
            (Self::AwaitingGeneration { attempts }, PollEvent::Received(artifact)) => {
                Self::Ready { attempts, artifact }
            }
            (Self::AwaitingGeneration { attempts }, PollEvent::Rejected) => Self::Failed { attempts },
            (Self::AwaitingGeneration { attempts }, PollEvent::Cancelled) => {
                Self::Cancelled { attempts }
            }
            (state, _) => state
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Requesting | Self::Deferred => 0,
            Self::AwaitingGeneration { attempts }
            | Self::Ready { attempts, .. }
            | Self::Exhausted { attempts }
            | Self::Failed { attempts }
            | Self::Cancelled { attempts } => *attempts
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Requesting | Self::AwaitingGeneration { .. })
    }
}

/// Terminal state reached for one file link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledFile {
    pub href: String,
    pub state: PollState,
    pub attempts: u32
}

impl PolledFile {
    fn new(href: String, state: PollState) -> Self {
        let attempts = state.attempts();
        Self {
            href,
            state,
            attempts
        }
    }

    #[must_use]
    pub fn artifact(&self) -> Option<&Path> {
        match &self.state {
            PollState::Ready {
                artifact: Some(path),
                ..
            } => Some(path),
            _ => None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub files: Vec<PolledFile>
}

impl GenerationReport {
    /// Paths of every document received.
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().filter_map(PolledFile::artifact)
    }

    /// Links handed back without polling.
    pub fn deferred_links(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .filter(|file| file.state == PollState::Deferred)
            .map(|file| file.href.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Session {
    /// Request generated images for a review, and in synchronous mode wait
    /// for every returned file link.
    ///
    /// The session result keeps the items of the POST response; documents
    /// received are added to the session's downloaded files.
    ///
    /// When errors are not raised, a link that fails or runs out of attempts
    /// is reported in its `Failed` or `Exhausted` state, the remaining links
    /// are still polled, and the first recorded error is left on the result.
    pub async fn request_review_images(
        &mut self,
        request: &ImageRequest
    ) -> IntegrationResult<GenerationReport> {
        self.request_review_images_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// As [`Self::request_review_images`]; cancelling `cancel` while waiting
    /// between polls aborts with [`IntegrationError::Cancelled`].
    pub async fn request_review_images_with_cancel(
        &mut self,
        request: &ImageRequest,
        cancel: &CancellationToken
    ) -> IntegrationResult<GenerationReport> {
        let outcome = self.generate(request, cancel).await;
        Ok(self.settle(outcome)?.unwrap_or_default())
    }

    async fn generate(
        &mut self,
        request: &ImageRequest,
        cancel: &CancellationToken
    ) -> IntegrationResult<GenerationReport> {
        self.begin();
        let body = TemplateWrapper::new(request.template_data()).to_vec()?;
        self.dispatch(Method::POST, IMAGES_PATH, Some(body), MEDIA_TYPE)
            .await?;
        let mut posted = self.result().clone();

        let links: Vec<String> = self
            .items()
            .iter()
            .flat_map(|item| item.file_links())
            .map(|link| link.href.clone())
            .collect();
        debug!(
            review_id = request.review_id,
            links = links.len(),
            synchronous = request.synchronous,
            "Image generation requested"
        );

        let mut report = GenerationReport::default();
        let mut recorded = None;
        for href in links {
            let state = PollState::Requesting.handle(
                PollEvent::Submitted {
                    synchronous: request.synchronous
                },
                self.polling.max_attempts
            );
            let state = match state {
                PollState::AwaitingGeneration { .. } => {
                    let (state, failure) = self.poll(&href, state, cancel).await;
                    if let Some(error) = failure
                        && self.settle::<()>(Err(error))?.is_none()
                    {
                        recorded = recorded.or_else(|| self.error().cloned());
                    }
                    state
                }
                state => state
            };
            report.files.push(PolledFile::new(href, state));
        }

        // Polls overwrite the result; report the POST's items.
        if let Some(error) = recorded {
            posted.success = false;
            posted.error = Some(error);
        }
        self.restore_result(posted);
        Ok(report)
    }

    /// Drive one link to a terminal state. The failure that ended polling,
    /// if any, is returned alongside the state.
    async fn poll(
        &mut self,
        href: &str,
        mut state: PollState,
        cancel: &CancellationToken
    ) -> (PollState, Option<IntegrationError>) {
        let max_attempts = self.polling.max_attempts;
        let interval = self.polling.interval();
        let mut last_error = None;
        let mut rejection = None;

        while !state.is_terminal() {
            let event = tokio::select! {
                biased;
                () = cancel.cancelled() => PollEvent::Cancelled,
                () = tokio::time::sleep(interval) => {
                    match self.fetch_once(href).await {
                        Ok(artifact) => PollEvent::Received(artifact),
                        Err(error) if error.is_not_ready() => {
                            last_error = error.service_error().cloned();
                            PollEvent::NotReady
                        }
                        Err(error) => {
                            warn!(href, attempts = state.attempts(), error = %error, "Polling aborted");
                            rejection = Some(error);
                            PollEvent::Rejected
                        }
                    }
                }
            };
            state = state.handle(event, max_attempts);
            debug!(href, state = ?state, "Polled generated document");
        }

        let failure = match &state {
            PollState::Ready { attempts, .. } => {
                info!(href, attempts, "Generated document ready");
                None
            }
            PollState::Exhausted { attempts } => {
                warn!(href, attempts, "Generated document not ready, giving up");
                Some(IntegrationError::ResourceNotReady {
                    href: href.to_string(),
                    attempts: *attempts,
                    error: last_error
                })
            }
            PollState::Cancelled { attempts } => {
                info!(href, attempts, "Polling cancelled");
                Some(IntegrationError::Cancelled {
                    href: href.to_string(),
                    attempts: *attempts
                })
            }
            _ => rejection
        };
        (state, failure)
    }

    async fn fetch_once(&mut self, href: &str) -> IntegrationResult<Option<PathBuf>> {
        self.dispatch(Method::GET, href, None, FILE_ACCEPT).await
    }
}
