//! Seams to the host platform: rendering, network, downloads and timers.
//!
//! Everything runs on one cooperative executor, so none of these futures are
//! required to be `Send`.

use async_trait::async_trait;
use shared_types::{PageSize, SignedDocument};
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a host collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status when the failure came from a response
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// The rendered page whose on-screen size can be measured
pub trait RenderedSurface {
    /// Current pixel size of the rendered page, or `None` while nothing has
    /// been laid out yet
    fn bounding_size(&self) -> Option<PageSize>;
}

/// Retrieves the original PDF
#[async_trait(?Send)]
pub trait DocumentFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// Persists signed documents
#[async_trait(?Send)]
pub trait SignedDocumentStore {
    /// Upload `{ signedPdf, originalFileName, docId }`; no retries
    async fn save(&self, document: &SignedDocument) -> Result<(), TransportError>;
}

/// Hands the signed bytes to the user
pub trait DownloadSink {
    fn offer(&self, document: &SignedDocument) -> Result<(), TransportError>;
}

/// Cooperative delay
#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, delay: Duration);
}
