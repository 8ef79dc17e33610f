//! Page geometry: the page's size in points and its rendered size in pixels

use crate::collaborators::{RenderedSurface, Sleeper};
use crate::config::MeasureConfig;
use crate::error::SignError;
use crate::retry::{poll_with_fallback, Polled};
use shared_pdf::PdfDocument;
use shared_types::PageSize;

/// Native size of a page in points at 100% scale
pub fn read_pdf_page_size(doc: &PdfDocument, page_index: usize) -> Result<PageSize, SignError> {
    let size = doc.page_size(page_index)?;
    if !size.is_positive() {
        return Err(SignError::DecodeFailed(format!(
            "page {} has an empty MediaBox",
            page_index
        )));
    }
    tracing::debug!(page_index, width = size.width, height = size.height, "PDF page size");
    Ok(size)
}

/// Result of measuring the rendered page
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Rendered(PageSize),
    /// The page never reported a positive size; `size` is the configured fallback
    Fallback { size: PageSize, attempts: u32 },
}

impl Measurement {
    pub fn size(&self) -> PageSize {
        match self {
            Measurement::Rendered(size) | Measurement::Fallback { size, .. } => *size,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Measurement::Fallback { .. })
    }

    /// The degraded-accuracy signal, if the fallback was used
    pub fn timeout(&self) -> Option<SignError> {
        match self {
            Measurement::Rendered(_) => None,
            Measurement::Fallback { attempts, .. } => Some(SignError::RenderTimeout {
                attempts: *attempts,
            }),
        }
    }
}

/// Measure the rendered page, polling until it reports a positive size.
///
/// Rendering may lag behind the request, so the surface is probed up to
/// `config.retry.max_attempts` times. If it never settles the configured
/// fallback is used; alignment may then be off, but the user is not blocked.
pub async fn measure_rendered_size<R, S>(
    surface: &R,
    config: &MeasureConfig,
    sleeper: &S,
) -> Measurement
where
    R: RenderedSurface + ?Sized,
    S: Sleeper + ?Sized,
{
    let polled = poll_with_fallback(
        &config.retry,
        sleeper,
        |_| surface.bounding_size().filter(PageSize::is_positive),
        config.fallback,
    )
    .await;

    match polled {
        Polled::Ready { value, attempts } => {
            tracing::debug!(
                width = value.width,
                height = value.height,
                attempts,
                "rendered page measured"
            );
            Measurement::Rendered(value)
        }
        Polled::Exhausted { fallback, attempts } => {
            tracing::warn!(
                attempts,
                width = fallback.width,
                height = fallback.height,
                "rendered page never reported a size, using fallback"
            );
            Measurement::Fallback {
                size: fallback,
                attempts,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSleeper, ScriptedSurface};
    use pretty_assertions::assert_eq;
    use shared_pdf::parser::fixtures;

    #[test]
    fn test_read_pdf_page_size() {
        let doc = PdfDocument::from_bytes(&fixtures::pdf_with_pages(&[(612, 792)])).unwrap();
        assert_eq!(read_pdf_page_size(&doc, 0).unwrap(), PageSize::new(612.0, 792.0));
    }

    #[test]
    fn test_read_pdf_page_size_out_of_range() {
        let doc = PdfDocument::from_bytes(&fixtures::letter_pdf()).unwrap();
        assert_eq!(
            read_pdf_page_size(&doc, 5),
            Err(SignError::PageIndexOutOfRange {
                index: 5,
                page_count: 1
            })
        );
    }

    #[test]
    fn test_read_pdf_page_size_rejects_empty_media_box() {
        let doc = PdfDocument::from_bytes(&fixtures::pdf_with_pages(&[(0, 792)])).unwrap();
        assert!(matches!(
            read_pdf_page_size(&doc, 0),
            Err(SignError::DecodeFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_measure_waits_for_layout() {
        let surface = ScriptedSurface::new(vec![
            None,
            Some(PageSize::new(0.0, 0.0)),
            Some(PageSize::new(600.0, 777.0)),
        ]);
        let sleeper = RecordingSleeper::default();

        let measurement =
            measure_rendered_size(&surface, &MeasureConfig::default(), &sleeper).await;

        assert_eq!(measurement, Measurement::Rendered(PageSize::new(600.0, 777.0)));
        assert_eq!(measurement.timeout(), None);
        assert_eq!(surface.probes(), 3);
    }

    #[tokio::test]
    async fn test_measure_falls_back_after_ten_attempts() {
        let surface = ScriptedSurface::default();
        let sleeper = RecordingSleeper::default();

        let measurement =
            measure_rendered_size(&surface, &MeasureConfig::default(), &sleeper).await;

        assert_eq!(
            measurement,
            Measurement::Fallback {
                size: PageSize::new(600.0, 800.0),
                attempts: 10
            }
        );
        assert!(measurement.is_fallback());
        assert_eq!(measurement.size(), PageSize::new(600.0, 800.0));
        assert_eq!(
            measurement.timeout(),
            Some(SignError::RenderTimeout { attempts: 10 })
        );
        assert_eq!(surface.probes(), 10);
    }

    #[tokio::test]
    async fn test_zero_height_is_not_a_measurement() {
        let surface = ScriptedSurface::new(vec![Some(PageSize::new(600.0, 0.0))]);
        let sleeper = RecordingSleeper::default();
        let mut config = MeasureConfig::default();
        config.retry.max_attempts = 2;

        let measurement = measure_rendered_size(&surface, &config, &sleeper).await;
        assert!(measurement.is_fallback());
    }
}
