use serde::{Deserialize, Serialize};

/// Width and height of a page frame.
///
/// Units depend on the frame: PDF points for the document, CSS pixels for the
/// rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// US Letter in points
    pub const fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Both dimensions are finite and strictly positive
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// True when `inner` fits inside this frame in both dimensions
    pub fn contains(&self, inner: PageSize) -> bool {
        inner.width <= self.width && inner.height <= self.height
    }
}

/// Top-left-origin pixel position on the rendered page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bottom-left-origin position in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfPoint {
    pub x: f64,
    pub y: f64,
}

impl PdfPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The two coordinate frames of the page being signed.
///
/// The PDF frame is read once from page metadata and never changes afterwards.
/// The screen frame is re-measured whenever the rendered layout may have
/// shifted. Transforms only run once both are known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pdf: Option<PageSize>,
    screen: Option<PageSize>,
}

impl PageGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry with both frames already known
    pub fn complete(pdf: PageSize, screen: PageSize) -> Self {
        Self {
            pdf: Some(pdf),
            screen: Some(screen),
        }
    }

    /// Record the page size in points. Only the first call takes effect;
    /// returns whether this call populated the frame.
    pub fn set_pdf_size(&mut self, size: PageSize) -> bool {
        if self.pdf.is_some() {
            return false;
        }
        self.pdf = Some(size);
        true
    }

    /// Record (or replace) the rendered size in pixels
    pub fn set_screen_size(&mut self, size: PageSize) {
        self.screen = Some(size);
    }

    pub fn pdf_size(&self) -> Option<PageSize> {
        self.pdf
    }

    pub fn screen_size(&self) -> Option<PageSize> {
        self.screen
    }

    pub fn is_complete(&self) -> bool {
        self.frames().is_some()
    }

    /// `(pdf, screen)` when both frames are populated with positive sizes
    pub fn frames(&self) -> Option<(PageSize, PageSize)> {
        match (self.pdf, self.screen) {
            (Some(pdf), Some(screen)) if pdf.is_positive() && screen.is_positive() => {
                Some((pdf, screen))
            }
            _ => None,
        }
    }
}

/// Where a drag of the signature overlay came to rest, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragStop {
    pub x: f64,
    pub y: f64,
}

/// The draggable overlay showing where the signature will land.
///
/// `x`/`y` are the overlay's top-left corner in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureField {
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// `data:image/png;base64,...` URL of the signature image
    pub image_data: String,
}

impl SignatureField {
    /// Create a field centered on the rendered page with a fresh id
    pub fn centered(screen: PageSize, footprint: PageSize, image_data: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            x: ((screen.width - footprint.width) / 2.0).max(0.0),
            y: ((screen.height - footprint.height) / 2.0).max(0.0),
            image_data,
        }
    }

    /// Move the field to where a drag stopped, kept inside
    /// `[0, screen.width - footprint.width] x [0, screen.height - footprint.height]`.
    pub fn apply_drag_stop(&self, stop: DragStop, screen: PageSize, footprint: PageSize) -> Self {
        let max_x = (screen.width - footprint.width).max(0.0);
        let max_y = (screen.height - footprint.height).max(0.0);
        Self {
            x: stop.x.clamp(0.0, max_x),
            y: stop.y.clamp(0.0, max_y),
            ..self.clone()
        }
    }

    pub fn position(&self) -> ScreenPoint {
        ScreenPoint::new(self.x, self.y)
    }
}

/// Everything needed to burn a signature into one page.
///
/// Positions and sizes are PDF points; `x`/`y` is the image's lower-left
/// corner, measured from the lower-left corner of the page's MediaBox.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedRequest {
    pub source_pdf: Vec<u8>,
    /// PNG-encoded signature
    pub signature_png: Vec<u8>,
    /// 0-based
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The document a signing session works on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub doc_id: String,
    pub file_name: String,
}

/// A freshly signed PDF together with the metadata needed to store it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDocument {
    pub bytes: Vec<u8>,
    /// Name offered for download and used for the upload part
    pub file_name: String,
    pub original_file_name: String,
    pub doc_id: String,
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: a drag stop always leaves the field fully on screen
        #[test]
        fn drag_stop_stays_in_bounds(
            w in 200.0f64..2000.0,
            h in 100.0f64..2000.0,
            x in -5000.0f64..5000.0,
            y in -5000.0f64..5000.0,
        ) {
            let screen = PageSize::new(w, h);
            let footprint = PageSize::new(150.0, 50.0);
            let start = SignatureField::centered(screen, footprint, String::new());
            let moved = start.apply_drag_stop(DragStop { x, y }, screen, footprint);

            prop_assert!(moved.x >= 0.0 && moved.x <= w - 150.0);
            prop_assert!(moved.y >= 0.0 && moved.y <= h - 50.0);
        }
    }
}
