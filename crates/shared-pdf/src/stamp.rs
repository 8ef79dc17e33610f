//! Drawing image XObjects onto existing pages

use crate::error::PdfError;
use crate::parser::PdfDocument;
use lopdf::{Dictionary, Object, ObjectId, Stream};

/// Where a resource dictionary lives relative to the page
enum Slot {
    /// Stored directly in the parent dictionary (or absent)
    Inline,
    /// Indirect object, possibly shared with other pages
    Indirect(ObjectId),
}

/// Placement of an image on a page, in PDF points with a lower-left anchor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfDocument {
    /// Draw a registered image XObject on a page, scaled to fill `rect`.
    ///
    /// The page's existing content is wrapped in `q`/`Q` so whatever graphics
    /// state it leaves behind cannot move the image.
    pub fn draw_image(
        &mut self,
        page_index: usize,
        image_id: ObjectId,
        rect: ImageRect,
    ) -> Result<String, PdfError> {
        let page_id = self.page_id(page_index)?;
        let name = self.register_xobject(page_id, image_id)?;

        let drawing = format!(
            "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
            fmt_num(rect.width),
            fmt_num(rect.height),
            fmt_num(rect.x),
            fmt_num(rect.y),
            name
        );

        let mut contents = self.page_contents(page_id)?;
        if contents.is_empty() {
            contents.push(self.add_content_stream(drawing.into_bytes()));
        } else {
            let open = self.add_content_stream(b"q\n".to_vec());
            let close = self.add_content_stream(format!("\nQ\n{}", drawing).into_bytes());
            contents.insert(0, open);
            contents.push(close);
        }

        self.page_dictionary_mut(page_id)?
            .set("Contents", Object::Array(contents));

        tracing::debug!(page_index, xobject = %name, ?rect, "image drawn on page");
        Ok(name)
    }

    /// Add `image_id` to the page's `/XObject` resources under a fresh name
    fn register_xobject(
        &mut self,
        page_id: ObjectId,
        image_id: ObjectId,
    ) -> Result<String, PdfError> {
        let (resources_slot, mut resources) = self.page_resources(page_id)?;

        let (xobjects_slot, mut xobjects) = match resources.get(b"XObject") {
            Ok(Object::Reference(id)) => (Slot::Indirect(*id), self.dictionary(*id)?.clone()),
            Ok(Object::Dictionary(dict)) => (Slot::Inline, dict.clone()),
            _ => (Slot::Inline, Dictionary::new()),
        };

        let name = (0..)
            .map(|n| format!("Sig{}", n))
            .find(|candidate| !xobjects.has(candidate.as_bytes()))
            .unwrap_or_else(|| "Sig".to_string());
        xobjects.set(name.clone(), Object::Reference(image_id));

        match xobjects_slot {
            Slot::Indirect(id) => {
                self.doc.objects.insert(id, Object::Dictionary(xobjects));
            }
            Slot::Inline => resources.set("XObject", Object::Dictionary(xobjects)),
        }

        match resources_slot {
            Slot::Indirect(id) => {
                self.doc.objects.insert(id, Object::Dictionary(resources));
            }
            Slot::Inline => {
                self.page_dictionary_mut(page_id)?
                    .set("Resources", Object::Dictionary(resources));
            }
        }

        Ok(name)
    }

    /// The page's resource dictionary and where to write it back.
    ///
    /// Inherited resources are copied onto the page so other pages sharing
    /// the ancestor are left untouched.
    fn page_resources(&self, page_id: ObjectId) -> Result<(Slot, Dictionary), PdfError> {
        let page = self.dictionary(page_id)?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Ok((Slot::Indirect(*id), self.dictionary(*id)?.clone())),
            Ok(Object::Dictionary(dict)) => Ok((Slot::Inline, dict.clone())),
            _ => {
                let inherited = match self.inherited_attribute(page_id, b"Resources")? {
                    Some(Object::Reference(id)) => self.dictionary(*id)?.clone(),
                    Some(Object::Dictionary(dict)) => dict.clone(),
                    _ => Dictionary::new(),
                };
                Ok((Slot::Inline, inherited))
            }
        }
    }

    /// Content stream references of a page, flattening an indirect array
    fn page_contents(&self, page_id: ObjectId) -> Result<Vec<Object>, PdfError> {
        let page = self.dictionary(page_id)?;
        let contents = match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                Ok(_) => vec![Object::Reference(*id)],
                Err(e) => return Err(PdfError::Structure(format!("page contents: {}", e))),
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Ok(contents)
    }

    fn add_content_stream(&mut self, content: Vec<u8>) -> Object {
        Object::Reference(self.doc.add_object(Stream::new(Dictionary::new(), content)))
    }

    fn page_dictionary_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary, PdfError> {
        self.doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfError::Structure(format!("page {} {}: {}", page_id.0, page_id.1, e)))
    }
}

/// Content-stream number: fixed precision without trailing zeros
fn fmt_num(value: f64) -> String {
    let s = format!("{:.4}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{decode_png, encode_png};
    use crate::parser::fixtures;
    use lopdf::content::Content;
    use lopdf::{dictionary, Document};
    use pretty_assertions::assert_eq;

    fn doc_with_image() -> (PdfDocument, ObjectId) {
        let mut pdf = PdfDocument::from_bytes(&fixtures::letter_pdf()).unwrap();
        let png = encode_png(1, 1, png::ColorType::Rgb, &[0, 0, 0]);
        let image_id = decode_png(&png).unwrap().add_to(pdf.doc_mut()).unwrap();
        (pdf, image_id)
    }

    fn rect() -> ImageRect {
        ImageRect {
            x: 102.0,
            y: 129.45,
            width: 150.0,
            height: 50.0,
        }
    }

    fn operators(doc: &Document, page_id: ObjectId) -> Vec<String> {
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content)
            .unwrap()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect()
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(150.0), "150");
        assert_eq!(fmt_num(129.45), "129.45");
        assert_eq!(fmt_num(0.0), "0");
        assert_eq!(fmt_num(-0.00001), "0");
        assert_eq!(fmt_num(1.0 / 3.0), "0.3333");
    }

    #[test]
    fn test_draw_image_registers_xobject_and_draws() {
        let (mut pdf, image_id) = doc_with_image();
        let name = pdf.draw_image(0, image_id, rect()).unwrap();
        assert_eq!(name, "Sig0");

        let page_id = pdf.page_id(0).unwrap();
        let page = pdf.dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(
            xobjects.get(b"Sig0").unwrap().as_reference().unwrap(),
            image_id
        );

        // q <original> Q q cm Do Q
        assert_eq!(
            operators(&pdf.doc, page_id),
            vec!["q", "rg", "re", "f", "Q", "q", "cm", "Do", "Q"]
        );
    }

    #[test]
    fn test_cm_operands_follow_rect() {
        let (mut pdf, image_id) = doc_with_image();
        pdf.draw_image(0, image_id, rect()).unwrap();

        let page_id = pdf.page_id(0).unwrap();
        let content = pdf.doc.get_page_content(page_id).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.contains("150 0 0 50 102 129.45 cm"), "{}", text);
        assert!(text.contains("/Sig0 Do"), "{}", text);
    }

    #[test]
    fn test_second_image_gets_distinct_name() {
        let (mut pdf, image_id) = doc_with_image();
        assert_eq!(pdf.draw_image(0, image_id, rect()).unwrap(), "Sig0");
        assert_eq!(pdf.draw_image(0, image_id, rect()).unwrap(), "Sig1");
    }

    #[test]
    fn test_draw_on_missing_page() {
        let (mut pdf, image_id) = doc_with_image();
        assert_eq!(
            pdf.draw_image(3, image_id, rect()),
            Err(PdfError::PageIndexOutOfRange {
                index: 3,
                page_count: 1
            })
        );
    }

    #[test]
    fn test_indirect_resources_are_updated_in_place() {
        let (mut pdf, image_id) = doc_with_image();
        let page_id = pdf.page_id(0).unwrap();
        let font_id = pdf.doc.add_object(dictionary! { "Type" => "Font" });
        let resources_id = pdf.doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        pdf.page_dictionary_mut(page_id)
            .unwrap()
            .set("Resources", Object::Reference(resources_id));

        pdf.draw_image(0, image_id, rect()).unwrap();

        let resources = pdf.dictionary(resources_id).unwrap();
        assert!(resources.has(b"Font"));
        assert!(resources.get(b"XObject").unwrap().as_dict().unwrap().has(b"Sig0"));
    }

    #[test]
    fn test_stamped_document_round_trips_through_save() {
        let (mut pdf, image_id) = doc_with_image();
        pdf.draw_image(0, image_id, rect()).unwrap();
        let bytes = pdf.save_to_bytes().unwrap();

        let reloaded = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.page_count(), 1);
        let page_id = reloaded.page_id(0).unwrap();
        assert!(operators(&reloaded.doc, page_id).contains(&"Do".to_string()));
    }
}
