//! Burning a signature image into a page of the source PDF

use crate::collaborators::DocumentFetcher;
use crate::error::SignError;
use shared_pdf::stamp::ImageRect;
use shared_pdf::{decode_png, PdfDocument};
use shared_types::{EmbedRequest, PageSize};

/// Where the original document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfSource {
    /// Fetched on demand
    Url(String),
    /// Already in memory
    Bytes(Vec<u8>),
}

/// Resolve a source to raw PDF bytes
pub async fn fetch_source<F>(source: &PdfSource, fetcher: &F) -> Result<Vec<u8>, SignError>
where
    F: DocumentFetcher + ?Sized,
{
    match source {
        PdfSource::Bytes(bytes) => Ok(bytes.clone()),
        PdfSource::Url(url) => {
            tracing::debug!(%url, "fetching source PDF");
            let bytes = fetcher.fetch(url).await.map_err(|e| SignError::FetchFailed {
                url: url.clone(),
                reason: match e.status {
                    Some(status) => format!("HTTP {}: {}", status, e.message),
                    None => e.message,
                },
            })?;
            tracing::info!(%url, bytes = bytes.len(), "source PDF fetched");
            Ok(bytes)
        }
    }
}

/// Draw the signature onto the requested page and return the new PDF bytes.
///
/// `request.x`/`request.y` are relative to the lower-left corner of the
/// page's MediaBox; the MediaBox origin is added when drawing. The position is
/// clamped again against the page's own size first, so a request computed
/// against stale geometry still lands on the visible page. The source bytes
/// are never modified.
pub fn embed_signature(request: &EmbedRequest) -> Result<Vec<u8>, SignError> {
    let mut pdf = PdfDocument::from_bytes(&request.source_pdf)?;
    let [origin_x, origin_y, page_width, page_height] = pdf.media_box(request.page_index)?;
    let page = PageSize::new(page_width, page_height);

    if request.width > page.width || request.height > page.height {
        return Err(SignError::FootprintExceedsPage {
            width: request.width,
            height: request.height,
            page_width: page.width,
            page_height: page.height,
        });
    }

    let image = decode_png(&request.signature_png)?;
    let image_id = image.add_to(pdf.doc_mut())?;

    let x = request.x.min(page.width - request.width).max(0.0);
    let y = request.y.min(page.height - request.height).max(0.0);
    if x != request.x || y != request.y {
        tracing::debug!(
            requested_x = request.x,
            requested_y = request.y,
            x,
            y,
            "embed position re-clamped"
        );
    }
    let rect = ImageRect {
        x: origin_x + x,
        y: origin_y + y,
        width: request.width,
        height: request.height,
    };

    pdf.draw_image(request.page_index, image_id, rect)?;
    let bytes = pdf.save_to_bytes()?;

    tracing::info!(
        page_index = request.page_index,
        x = rect.x,
        y = rect.y,
        bytes = bytes.len(),
        "signature embedded"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{tiny_png, StaticFetcher};
    use lopdf::content::Content;
    use lopdf::Document;
    use pretty_assertions::assert_eq;
    use shared_pdf::parser::fixtures;

    fn request(x: f64, y: f64) -> EmbedRequest {
        EmbedRequest {
            source_pdf: fixtures::letter_pdf(),
            signature_png: tiny_png(),
            page_index: 0,
            x,
            y,
            width: 150.0,
            height: 50.0,
        }
    }

    fn page_content(bytes: &[u8]) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap()
    }

    #[test]
    fn test_embed_draws_on_page() {
        let signed = embed_signature(&request(102.0, 129.45)).unwrap();
        let content = page_content(&signed);
        assert!(content.contains("150 0 0 50 102 129.45 cm"));
        assert!(content.contains("/Sig0 Do"));

        let doc = Document::load_mem(&signed).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let ops: Vec<String> = Content::decode(&doc.get_page_content(page_id).unwrap())
            .unwrap()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect();
        assert_eq!(ops.first().map(String::as_str), Some("q"));
        assert_eq!(ops.last().map(String::as_str), Some("Q"));
    }

    #[test]
    fn test_embed_is_deterministic() {
        let req = request(10.0, 10.0);
        assert_eq!(embed_signature(&req).unwrap(), embed_signature(&req).unwrap());
    }

    #[test]
    fn test_embed_reclamps_position() {
        let signed = embed_signature(&request(900.0, -40.0)).unwrap();
        assert!(page_content(&signed).contains("150 0 0 50 462 0 cm"));
    }

    #[test]
    fn test_full_page_footprint_at_origin() {
        let req = EmbedRequest {
            width: 612.0,
            height: 792.0,
            ..request(0.0, 0.0)
        };
        let signed = embed_signature(&req).unwrap();
        assert!(page_content(&signed).contains("612 0 0 792 0 0 cm"));
    }

    #[test]
    fn test_offset_media_box_shifts_the_stamp() {
        let source = fixtures::pdf_with_media_boxes(&[[100, 100, 712, 892]]);
        let req = EmbedRequest {
            source_pdf: source.clone(),
            ..request(0.0, 0.0)
        };
        assert!(page_content(&embed_signature(&req).unwrap()).contains("150 0 0 50 100 100 cm"));

        let req = EmbedRequest {
            source_pdf: source,
            ..request(900.0, 900.0)
        };
        assert!(page_content(&embed_signature(&req).unwrap()).contains("150 0 0 50 562 842 cm"));
    }

    #[test]
    fn test_page_index_out_of_range() {
        let req = EmbedRequest {
            page_index: 5,
            ..request(0.0, 0.0)
        };
        assert_eq!(
            embed_signature(&req),
            Err(SignError::PageIndexOutOfRange {
                index: 5,
                page_count: 1
            })
        );
    }

    #[test]
    fn test_oversized_footprint() {
        let req = EmbedRequest {
            width: 700.0,
            ..request(0.0, 0.0)
        };
        assert!(matches!(
            embed_signature(&req),
            Err(SignError::FootprintExceedsPage { .. })
        ));
    }

    #[test]
    fn test_bad_inputs_fail_to_decode() {
        let req = EmbedRequest {
            signature_png: b"not a png".to_vec(),
            ..request(0.0, 0.0)
        };
        assert!(matches!(embed_signature(&req), Err(SignError::DecodeFailed(_))));

        let req = EmbedRequest {
            source_pdf: b"not a pdf".to_vec(),
            ..request(0.0, 0.0)
        };
        assert!(matches!(embed_signature(&req), Err(SignError::DecodeFailed(_))));
    }

    #[test]
    fn test_second_page() {
        let req = EmbedRequest {
            source_pdf: fixtures::pdf_with_pages(&[(612, 792), (595, 842)]),
            page_index: 1,
            ..request(500.0, 800.0)
        };
        let signed = embed_signature(&req).unwrap();
        let doc = Document::load_mem(&signed).unwrap();
        let second = *doc.get_pages().get(&2).unwrap();
        let content = String::from_utf8(doc.get_page_content(second).unwrap()).unwrap();
        assert!(content.contains("150 0 0 50 445 792 cm"));
    }

    #[tokio::test]
    async fn test_fetch_source_from_bytes_skips_fetcher() {
        let fetcher = StaticFetcher::failing(404);
        let bytes = fetch_source(&PdfSource::Bytes(vec![1, 2, 3]), &fetcher)
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(fetcher.requested.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_source_reports_url() {
        let fetcher = StaticFetcher::failing(404);
        let url = "http://localhost:5000/uploads/missing.pdf".to_string();
        let err = fetch_source(&PdfSource::Url(url.clone()), &fetcher)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SignError::FetchFailed {
                url,
                reason: "HTTP 404: Not Found".to_string()
            }
        );
    }
}
