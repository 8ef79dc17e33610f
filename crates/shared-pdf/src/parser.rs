//! PDF parsing and page lookup using lopdf

use crate::error::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use shared_types::PageSize;

/// Inherited page attributes are looked up at most this many levels up the
/// page tree, which also guards against `/Parent` cycles.
const MAX_TREE_DEPTH: usize = 32;

/// Editable in-memory PDF
pub struct PdfDocument {
    pub(crate) doc: Document,
}

impl PdfDocument {
    /// Load a PDF from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
        Ok(Self { doc })
    }

    /// Get the number of pages
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Object id of the page at a 0-based index
    pub fn page_id(&self, page_index: usize) -> Result<ObjectId, PdfError> {
        let pages = self.doc.get_pages();
        let page_count = pages.len();
        page_index
            .checked_add(1)
            .and_then(|n| u32::try_from(n).ok())
            .and_then(|page_num| pages.get(&page_num).copied())
            .ok_or(PdfError::PageIndexOutOfRange {
                index: page_index,
                page_count,
            })
    }

    /// Page size in points at 100% scale, from the page's MediaBox
    pub fn page_size(&self, page_index: usize) -> Result<PageSize, PdfError> {
        let [_, _, width, height] = self.media_box(page_index)?;
        Ok(PageSize::new(width, height))
    }

    /// Page MediaBox as `[x, y, width, height]`.
    ///
    /// Falls back to US Letter when neither the page nor any ancestor
    /// declares one.
    pub fn media_box(&self, page_index: usize) -> Result<[f64; 4], PdfError> {
        let page_id = self.page_id(page_index)?;
        match self.inherited_attribute(page_id, b"MediaBox")? {
            Some(media_box) => self.parse_rect(media_box),
            None => {
                tracing::debug!(page_index, "no MediaBox on page tree, assuming US Letter");
                let letter = PageSize::letter();
                Ok([0.0, 0.0, letter.width, letter.height])
            }
        }
    }

    /// Look up an attribute on a page, walking `/Parent` links for
    /// inheritable keys such as MediaBox and Resources.
    pub(crate) fn inherited_attribute(
        &self,
        page_id: ObjectId,
        key: &[u8],
    ) -> Result<Option<&Object>, PdfError> {
        let mut node = self.dictionary(page_id)?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return Ok(Some(value));
            }
            match node.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent_id) => node = self.dictionary(parent_id)?,
                Err(_) => return Ok(None),
            }
        }
        Ok(None)
    }

    /// Resolve an object id that must point at a dictionary
    pub(crate) fn dictionary(&self, id: ObjectId) -> Result<&Dictionary, PdfError> {
        self.doc
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|e| PdfError::Structure(format!("object {} {}: {}", id.0, id.1, e)))
    }

    /// Parse a PDF rectangle array into [x, y, width, height]
    fn parse_rect(&self, obj: &Object) -> Result<[f64; 4], PdfError> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .and_then(Object::as_array)
                .map_err(|e| PdfError::Structure(format!("MediaBox reference: {}", e)))?,
            _ => return Err(PdfError::Structure("MediaBox is not an array".to_string())),
        };

        if arr.len() != 4 {
            return Err(PdfError::Structure(format!(
                "MediaBox has {} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (i, obj) in arr.iter().enumerate() {
            values[i] = self.extract_number(obj)?;
        }

        // Corners may be given in any order
        let x = values[0].min(values[2]);
        let y = values[1].min(values[3]);
        Ok([
            x,
            y,
            (values[2] - values[0]).abs(),
            (values[3] - values[1]).abs(),
        ])
    }

    /// Extract a number from a PDF object
    fn extract_number(&self, obj: &Object) -> Result<f64, PdfError> {
        match obj {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r as f64),
            Object::Reference(id) => {
                let resolved = self
                    .doc
                    .get_object(*id)
                    .map_err(|e| PdfError::Structure(format!("Failed to resolve: {}", e)))?;
                self.extract_number(resolved)
            }
            _ => Err(PdfError::Structure(
                "Expected number in rectangle".to_string(),
            )),
        }
    }

    /// Get mutable access to the internal document
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Serialize the document
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, PdfError> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::Save(e.to_string()))?;
        Ok(buffer)
    }
}

/// Minimal in-memory PDFs for tests across the workspace
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures {
    use lopdf::{dictionary, Document, Object, Stream};

    /// A PDF with one page per entry in `sizes`, each with a tiny content stream
    pub fn pdf_with_pages(sizes: &[(i64, i64)]) -> Vec<u8> {
        let boxes: Vec<[i64; 4]> = sizes.iter().map(|&(w, h)| [0, 0, w, h]).collect();
        pdf_with_media_boxes(&boxes)
    }

    /// Like [`pdf_with_pages`] but with explicit `[llx lly urx ury]` MediaBoxes
    pub fn pdf_with_media_boxes(boxes: &[[i64; 4]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for &[llx, lly, urx, ury] in boxes {
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                b"0 0 1 rg 10 10 50 50 re f".to_vec(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![llx.into(), lly.into(), urx.into(), ury.into()],
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("fixture PDF serializes");
        buffer
    }

    /// Single US Letter page
    pub fn letter_pdf() -> Vec<u8> {
        pdf_with_pages(&[(612, 792)])
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn rect(corners: [i64; 4]) -> Object {
        Object::Array(corners.iter().map(|&v| Object::Integer(v)).collect())
    }

    proptest! {
        /// Property: a MediaBox normalizes to the same rect whichever corners come first
        #[test]
        fn rect_corner_order_is_normalized(
            x0 in -2000i64..2000,
            y0 in -2000i64..2000,
            x1 in -2000i64..2000,
            y1 in -2000i64..2000,
        ) {
            let pdf = PdfDocument { doc: Document::with_version("1.7") };
            let forward = pdf.parse_rect(&rect([x0, y0, x1, y1])).unwrap();
            let swapped = pdf.parse_rect(&rect([x1, y1, x0, y0])).unwrap();

            prop_assert_eq!(forward, swapped);
            prop_assert_eq!(forward[0], x0.min(x1) as f64);
            prop_assert_eq!(forward[1], y0.min(y1) as f64);
            prop_assert_eq!(forward[2], (x1 - x0).abs() as f64);
            prop_assert_eq!(forward[3], (y1 - y0).abs() as f64);
        }
    }
}
