//! Document signing core logic
//!
//! Places a captured signature on a rendered PDF page and burns it into the
//! document: page geometry is read from the PDF and measured on screen, the
//! dragged overlay position is mapped into PDF points, and the PNG is drawn
//! onto the page. Host concerns (rendering, network, downloads, timers) are
//! reached through the traits in [`collaborators`].

pub mod collaborators;
pub mod config;
pub mod coords;
pub mod embed;
pub mod error;
pub mod geometry;
pub mod retry;
pub mod session;
pub mod signature;

#[cfg(test)]
mod test_support;

pub use collaborators::{
    DocumentFetcher, DownloadSink, RenderedSurface, SignedDocumentStore, Sleeper, TransportError,
};
pub use config::{MeasureConfig, ServiceEndpoints, SigningConfig};
pub use coords::{canvas_to_pdf, Transform};
pub use embed::{embed_signature, fetch_source, PdfSource};
pub use error::SignError;
pub use geometry::{measure_rendered_size, read_pdf_page_size, Measurement};
pub use retry::{poll_with_fallback, Polled, RetryPolicy};
pub use session::{FinishTicket, Placement, SigningSession};
pub use signature::SignatureImage;

pub use shared_types::{
    DocumentRef, DragStop, EmbedRequest, PageGeometry, PageSize, PdfPoint, ScreenPoint,
    SignatureField, SignedDocument,
};
