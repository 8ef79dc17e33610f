//! Error taxonomy for the signing pipeline

use shared_pdf::PdfError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignError {
    /// The rendered page never reported a usable size; a fallback was used
    #[error("Rendered page could not be measured after {attempts} attempts")]
    RenderTimeout { attempts: u32 },

    #[error("Page geometry not ready: PDF and rendered page sizes are both required")]
    GeometryNotReady,

    #[error(
        "Signature footprint {width}x{height}pt does not fit on a {page_width}x{page_height}pt page"
    )]
    FootprintExceedsPage {
        width: f64,
        height: f64,
        page_width: f64,
        page_height: f64,
    },

    #[error("Failed to fetch PDF from {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Failed to decode: {0}")]
    DecodeFailed(String),

    #[error("Page index {index} out of range (document has {page_count} pages)")]
    PageIndexOutOfRange { index: usize, page_count: usize },

    #[error("Missing required data: {0}")]
    MissingData(&'static str),

    #[error("A signing operation is already in progress")]
    AlreadyProcessing,

    #[error("Failed to save signed document: {0}")]
    PersistFailed(String),

    #[error("Failed to offer download: {0}")]
    DownloadFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SignError {
    /// Whether the current sign attempt has to be abandoned
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SignError::RenderTimeout { .. })
    }
}

impl From<PdfError> for SignError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::PageIndexOutOfRange { index, page_count } => {
                SignError::PageIndexOutOfRange { index, page_count }
            }
            other => SignError::DecodeFailed(other.to_string()),
        }
    }
}
