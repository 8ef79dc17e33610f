//! Coordinate transformation from the rendered page (top-left origin, pixels)
//! to PDF page space (bottom-left origin, points)
//!
//! PDF positions are relative to the MediaBox's lower-left corner; the
//! embedder adds the MediaBox origin when drawing.

use crate::error::SignError;
use shared_types::{PageGeometry, PageSize, PdfPoint, ScreenPoint};

/// Screen-to-PDF mapping for one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pdf: PageSize,
    screen: PageSize,
}

impl Transform {
    /// Build a transform from a fully populated geometry
    pub fn new(geometry: &PageGeometry) -> Result<Self, SignError> {
        let (pdf, screen) = geometry.frames().ok_or(SignError::GeometryNotReady)?;
        Ok(Self { pdf, screen })
    }

    /// `(scale_x, scale_y)`; the axes scale independently
    pub fn scale_factors(&self) -> (f64, f64) {
        (
            self.pdf.width / self.screen.width,
            self.pdf.height / self.screen.height,
        )
    }

    /// Map the top-left corner of an on-screen field to the bottom-left
    /// corner of the image in PDF space.
    ///
    /// `field_px` is the on-screen overlay size; `out_pt` is the size the
    /// image will be drawn at. The result is clamped so the drawn image
    /// stays on the page.
    pub fn canvas_to_pdf(
        &self,
        point: ScreenPoint,
        field_px: PageSize,
        out_pt: PageSize,
    ) -> Result<PdfPoint, SignError> {
        if !self.pdf.contains(out_pt) {
            return Err(SignError::FootprintExceedsPage {
                width: out_pt.width,
                height: out_pt.height,
                page_width: self.pdf.width,
                page_height: self.pdf.height,
            });
        }

        let (scale_x, scale_y) = self.scale_factors();
        let raw_x = point.x * scale_x;
        // Flip the y axis and anchor on the field's bottom edge
        let raw_y = (self.screen.height - point.y - field_px.height) * scale_y;

        let x = raw_x.min(self.pdf.width - out_pt.width).max(0.0);
        let y = raw_y.max(0.0).min(self.pdf.height - out_pt.height);

        if x != raw_x || y != raw_y {
            tracing::debug!(raw_x, raw_y, x, y, "signature position clamped to page");
        }
        Ok(PdfPoint::new(x, y))
    }
}

/// One-shot form of [`Transform::canvas_to_pdf`]
pub fn canvas_to_pdf(
    geometry: &PageGeometry,
    point: ScreenPoint,
    field_px: PageSize,
    out_pt: PageSize,
) -> Result<PdfPoint, SignError> {
    Transform::new(geometry)?.canvas_to_pdf(point, field_px, out_pt)
}
