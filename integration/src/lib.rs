//! # Loan Review Integration Client
//!
//! Signed Collection+JSON client for the loan review service.
//!
//! - [`Signer`]: HMAC-SHA1 request signatures (`Authorization: AD ...`)
//! - [`Transport`]: signed requests and response classification
//! - [`Session`]: the service operations, the error policy and the
//!   downloaded files
//! - Image generation: [`Session::request_review_images`] posts the request
//!   and polls every returned file link
//!
//! ## Usage
//! ```rust,no_run
//! use integration::{ImageRequest, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = config::resolve_config(None)?;
//!     let mut session = Session::new(config)?;
//!
//!     let reviews = session.find_reviews("0012345").await?;
//!     println!("{} reviews", reviews.items.len());
//!
//!     let report = session
//!         .request_review_images(&ImageRequest::new(42, ["1003"]))
//!         .await?;
//!     for path in report.artifacts() {
//!         println!("received {}", path.display());
//!     }
//!
//!     session.close()?;
//!     Ok(())
//! }
//! ```

mod artifacts;
mod poller;
mod session;
mod signer;
mod transport;

pub use artifacts::ArtifactStore;
pub use poller::{GenerationReport, ImageRequest, PollEvent, PollState, PolledFile};
pub use session::{AI_PATH, IMAGES_PATH, REVIEWS_PATH, Session, SessionResult};
pub use signer::{AUTH_SCHEME, Signature, Signer, canonical_string, http_date};
pub use transport::{FILE_ACCEPT, Outcome, PDF_MEDIA_TYPE, RawResponse, Transport, is_binary};

pub use collection::MEDIA_TYPE;
pub use errors::{ErrorKind, IntegrationError, IntegrationResult};
pub use tokio_util::sync::CancellationToken;
