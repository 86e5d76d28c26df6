//! Document loading
//!
//! Loaders turn a filesystem path into ordered page texts. They are blocking,
//! so [`DocumentReader`] runs them on the blocking pool with a bounded
//! timeout. A retry always re-opens the path from scratch.

use crate::error::AnalyzerError;
use crate::normalize::normalize;
use crate::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod pdf;
pub use pdf::PdfLoader;

/// Raw page texts of a document, in page order
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub pages: Vec<String>,
}

/// A document after whitespace normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub path: PathBuf,
    pub page_count: usize,
    pub text: String,
    pub content_hash: String,
}

impl NormalizedDocument {
    pub fn from_loaded(document: LoadedDocument) -> Self {
        let text = normalize(&document.pages);
        let content_hash = content_hash(&text);

        Self {
            path: document.path,
            page_count: document.pages.len(),
            text,
            content_hash,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// SHA-256 of the normalized text, hex encoded
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Synchronous source of page texts
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<LoadedDocument>;
}

/// Runs a loader off the async runtime with a timeout and bounded retries
#[derive(Clone)]
pub struct DocumentReader {
    loader: Arc<dyn DocumentLoader>,
    timeout: Duration,
    max_attempts: u32,
}

impl DocumentReader {
    pub fn new(loader: Arc<dyn DocumentLoader>, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            loader,
            timeout,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Load page texts. Only timeouts are retried; unreadable documents fail
    /// on the first attempt.
    pub async fn load(&self, path: &Path) -> Result<LoadedDocument> {
        for attempt in 1..=self.max_attempts {
            let loader = Arc::clone(&self.loader);
            let owned_path = path.to_path_buf();

            debug!(path = %path.display(), attempt, "Opening document");

            let handle = tokio::task::spawn_blocking(move || loader.load(&owned_path));

            match tokio::time::timeout(self.timeout, handle).await {
                Ok(Ok(result)) => return result,
                Ok(Err(join_error)) => {
                    return Err(AnalyzerError::ExecutionError(format!(
                        "Document loader task failed: {}",
                        join_error
                    )));
                }
                Err(_) => {
                    warn!(
                        path = %path.display(),
                        attempt,
                        max_attempts = self.max_attempts,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Document load timed out"
                    );
                }
            }
        }

        Err(AnalyzerError::DocumentTimeout {
            path: path.to_path_buf(),
            attempts: self.max_attempts,
        })
    }

    /// Load and normalize a document
    pub async fn read_normalized(&self, path: &Path) -> Result<NormalizedDocument> {
        let loaded = self.load(path).await?;
        let document = NormalizedDocument::from_loaded(loaded);

        info!(
            path = %path.display(),
            page_count = document.page_count,
            chars = document.text.len(),
            "Document normalized"
        );

        Ok(document)
    }
}
