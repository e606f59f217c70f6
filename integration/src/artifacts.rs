//! # Downloaded Artifacts
//!
//! Files received from the service are written to uniquely named temporary
//! files owned by the session. Each file is deleted exactly once: by
//! [`ArtifactStore::release`], or when the store is dropped.

use errors::IntegrationResult;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

const ARTIFACT_PREFIX: &str = "review-";

#[derive(Debug, Default)]
pub struct ArtifactStore {
    dir: Option<PathBuf>,
    files: Vec<TempPath>
}

impl ArtifactStore {
    /// Files are created in `dir`, or the system temp dir when `None`.
    #[must_use]
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            files: Vec::new()
        }
    }

    /// Write `bytes` to a fresh file and track it.
    pub async fn persist(&mut self, bytes: &[u8], suffix: &str) -> IntegrationResult<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(ARTIFACT_PREFIX).suffix(suffix);
        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?
        };
        let path = file.into_temp_path();

        tokio::fs::write(&path, bytes).await?;

        let location = path.to_path_buf();
        debug!(path = %location.display(), size = bytes.len(), "Stored downloaded file");
        self.files.push(path);
        Ok(location)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|path| &**path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Delete every tracked file. Files already removed by someone else are
    /// skipped; the first other failure is returned after all deletions
    /// have been attempted.
    pub fn release(&mut self) -> io::Result<()> {
        let mut first_error = None;
        for path in self.files.drain(..) {
            let location = path.to_path_buf();
            match path.close() {
                Ok(()) => debug!(path = %location.display(), "Deleted downloaded file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %location.display(), "Downloaded file already removed");
                }
                Err(e) => {
                    warn!(path = %location.display(), error = %e, "Failed to delete downloaded file");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
