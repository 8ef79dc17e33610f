//! Signing session state and the finish flow
//!
//! A session owns the mutable state of one signing page: the two page
//! frames, the captured signature and the draggable field. UI events mutate
//! it between suspension points; [`SigningSession::begin_finish`] snapshots
//! everything the embed needs into a [`FinishTicket`] so dragging can carry
//! on while the document is being signed.

use crate::collaborators::{DocumentFetcher, DownloadSink, SignedDocumentStore};
use crate::config::SigningConfig;
use crate::coords::Transform;
use crate::embed::{embed_signature, fetch_source, PdfSource};
use crate::error::SignError;
use crate::geometry::{read_pdf_page_size, Measurement};
use crate::signature::SignatureImage;
use shared_pdf::PdfDocument;
use shared_types::{
    DocumentRef, DragStop, EmbedRequest, PageGeometry, PageSize, PdfPoint, SignatureField,
    SignedDocument,
};
use std::cell::Cell;
use std::rc::Rc;

/// Result of a drag stop: the clamped field and where it lands in the PDF
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub field: SignatureField,
    pub pdf: PdfPoint,
}

pub struct SigningSession {
    document: DocumentRef,
    config: SigningConfig,
    source: PdfSource,
    geometry: PageGeometry,
    signature: Option<SignatureImage>,
    field: Option<SignatureField>,
    in_flight: Rc<Cell<bool>>,
}

impl SigningSession {
    /// Start a session for `document`; the original is fetched from the
    /// configured uploads endpoint
    pub fn new(document: DocumentRef, config: SigningConfig) -> Result<Self, SignError> {
        config.validate()?;
        if document.file_name.is_empty() {
            return Err(SignError::MissingData("document file name"));
        }
        let source = PdfSource::Url(config.endpoints.document_url(&document.file_name));
        tracing::info!(doc_id = %document.doc_id, file = %document.file_name, "signing session started");
        Ok(Self {
            document,
            config,
            source,
            geometry: PageGeometry::new(),
            signature: None,
            field: None,
            in_flight: Rc::new(Cell::new(false)),
        })
    }

    /// Embed into these bytes instead of fetching the original
    pub fn with_source_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.source = PdfSource::Bytes(bytes);
        self
    }

    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    pub fn source(&self) -> &PdfSource {
        &self.source
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn signature(&self) -> Option<&SignatureImage> {
        self.signature.as_ref()
    }

    pub fn field(&self) -> Option<&SignatureField> {
        self.field.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.get()
    }

    /// The renderer finished loading the document: read the target page's
    /// size in points. Only the first load populates the PDF frame.
    pub fn on_pdf_loaded(&mut self, pdf_bytes: &[u8]) -> Result<PageSize, SignError> {
        let doc = PdfDocument::from_bytes(pdf_bytes)?;
        let size = read_pdf_page_size(&doc, self.config.page_index)?;
        Ok(self.set_pdf_size(size))
    }

    /// Record the page size reported by the renderer. Returns the size in
    /// effect, which is the first one ever recorded.
    pub fn set_pdf_size(&mut self, size: PageSize) -> PageSize {
        if !self.geometry.set_pdf_size(size) {
            tracing::debug!("PDF page size already recorded, ignoring reload");
        }
        self.geometry.pdf_size().unwrap_or(size)
    }

    /// Record a fresh measurement of the rendered page.
    ///
    /// Returns the non-fatal [`SignError::RenderTimeout`] when the fallback
    /// size was used so the caller can surface reduced accuracy.
    pub fn on_surface_measured(&mut self, measurement: &Measurement) -> Option<SignError> {
        self.geometry.set_screen_size(measurement.size());
        self.ensure_field();
        measurement.timeout()
    }

    /// Store a newly captured signature. Any existing field is replaced by a
    /// fresh, centered one.
    pub fn set_signature(&mut self, signature: SignatureImage) -> Option<&SignatureField> {
        self.signature = Some(signature);
        self.field = None;
        self.ensure_field();
        self.field.as_ref()
    }

    /// Apply a drag stop to the field and report its PDF position
    pub fn on_drag_stop(&mut self, stop: DragStop) -> Result<Placement, SignError> {
        let screen = self
            .geometry
            .screen_size()
            .ok_or(SignError::GeometryNotReady)?;
        let field = self
            .field
            .as_ref()
            .ok_or(SignError::MissingData("signature field"))?
            .apply_drag_stop(stop, screen, self.config.field_size_px);

        // The field only moves once its PDF position is known
        let pdf = self.pdf_position_of(&field)?;
        tracing::debug!(x = field.x, y = field.y, pdf_x = pdf.x, pdf_y = pdf.y, "field moved");
        self.field = Some(field.clone());
        Ok(Placement { field, pdf })
    }

    /// Where the field currently lands on the PDF page
    pub fn pdf_position(&self) -> Result<PdfPoint, SignError> {
        let field = self
            .field
            .as_ref()
            .ok_or(SignError::MissingData("signature field"))?;
        self.pdf_position_of(field)
    }

    fn pdf_position_of(&self, field: &SignatureField) -> Result<PdfPoint, SignError> {
        Transform::new(&self.geometry)?.canvas_to_pdf(
            field.position(),
            self.config.field_size_px,
            self.config.signature_size_pt,
        )
    }

    /// Validate the session and take the in-flight guard.
    ///
    /// Fails with [`SignError::AlreadyProcessing`] while another finish is
    /// running. The guard is released when the ticket (or its run future)
    /// is dropped.
    pub fn begin_finish(&self) -> Result<FinishTicket, SignError> {
        let signature = self
            .signature
            .as_ref()
            .ok_or(SignError::MissingData("signature"))?;
        if self.field.is_none() {
            return Err(SignError::MissingData("signature field"));
        }
        let position = self.pdf_position()?;
        let guard = InFlightGuard::acquire(&self.in_flight)?;

        Ok(FinishTicket {
            source: self.source.clone(),
            signature_png: signature.png_bytes().to_vec(),
            page_index: self.config.page_index,
            position,
            size: self.config.signature_size_pt,
            file_name: self.config.signed_file_name(&self.document.file_name),
            document: self.document.clone(),
            _guard: guard,
        })
    }

    fn ensure_field(&mut self) {
        if self.field.is_some() {
            return;
        }
        let (Some(signature), Some(screen)) = (&self.signature, self.geometry.screen_size())
        else {
            return;
        };
        if !self.geometry.is_complete() {
            return;
        }
        let field = SignatureField::centered(
            screen,
            self.config.field_size_px,
            signature.data_url().to_string(),
        );
        tracing::debug!(id = %field.id, x = field.x, y = field.y, "signature field placed");
        self.field = Some(field);
    }
}

/// Marks a finish as running for as long as it lives
struct InFlightGuard {
    flag: Rc<Cell<bool>>,
}

impl InFlightGuard {
    fn acquire(flag: &Rc<Cell<bool>>) -> Result<Self, SignError> {
        if flag.replace(true) {
            return Err(SignError::AlreadyProcessing);
        }
        Ok(Self {
            flag: Rc::clone(flag),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Everything needed to sign, captured when the finish started
pub struct FinishTicket {
    source: PdfSource,
    signature_png: Vec<u8>,
    page_index: usize,
    position: PdfPoint,
    size: PageSize,
    file_name: String,
    document: DocumentRef,
    _guard: InFlightGuard,
}

impl FinishTicket {
    pub fn position(&self) -> PdfPoint {
        self.position
    }

    /// Fetch, embed, offer the download, then persist.
    ///
    /// The upload only happens after the download was offered; an upload
    /// failure does not take the download back.
    pub async fn run<F, S, D>(
        self,
        fetcher: &F,
        store: &S,
        downloads: &D,
    ) -> Result<SignedDocument, SignError>
    where
        F: DocumentFetcher + ?Sized,
        S: SignedDocumentStore + ?Sized,
        D: DownloadSink + ?Sized,
    {
        let doc_id = self.document.doc_id.clone();
        let result = self.execute(fetcher, store, downloads).await;
        match &result {
            Ok(signed) => {
                tracing::info!(%doc_id, file = %signed.file_name, "document signed and saved")
            }
            Err(e) => tracing::error!(%doc_id, error = %e, "signing failed"),
        }
        result
    }

    async fn execute<F, S, D>(
        self,
        fetcher: &F,
        store: &S,
        downloads: &D,
    ) -> Result<SignedDocument, SignError>
    where
        F: DocumentFetcher + ?Sized,
        S: SignedDocumentStore + ?Sized,
        D: DownloadSink + ?Sized,
    {
        let source_pdf = fetch_source(&self.source, fetcher).await?;
        let bytes = embed_signature(&EmbedRequest {
            source_pdf,
            signature_png: self.signature_png,
            page_index: self.page_index,
            x: self.position.x,
            y: self.position.y,
            width: self.size.width,
            height: self.size.height,
        })?;

        let signed = SignedDocument {
            bytes,
            file_name: self.file_name,
            original_file_name: self.document.file_name,
            doc_id: self.document.doc_id,
        };

        downloads
            .offer(&signed)
            .map_err(|e| SignError::DownloadFailed(e.to_string()))?;
        store
            .save(&signed)
            .await
            .map_err(|e| SignError::PersistFailed(e.to_string()))?;
        Ok(signed)
    }
}
