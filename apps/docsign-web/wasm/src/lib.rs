//! DocSign - browser signing page
//!
//! Exposes a [`SignSession`] to JavaScript: feed it the loaded PDF, let it
//! measure the rendered page, hand it the captured signature, report drag
//! stops, then call `finish()` to embed, download and upload.

use docsign_core::{
    measure_rendered_size, DocumentRef, DragStop, Measurement, PageSize, PdfPoint,
    SignError, SignatureField, SignatureImage, SigningConfig, SigningSession,
};
use js_sys::{Object, Promise, Reflect};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::Element;

pub mod dom;
pub mod download;
pub mod logging;
pub mod net;
pub mod timer;

use dom::ElementSurface;
use download::BrowserDownloads;
use net::{HttpFetcher, HttpStore};
use timer::TimeoutSleeper;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::DEBUG);
    tracing::info!("DocSign WASM initialized");
}

fn to_js(err: SignError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn size_to_js(size: PageSize) -> Result<JsValue, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &"width".into(), &size.width.into())?;
    Reflect::set(&obj, &"height".into(), &size.height.into())?;
    Ok(obj.into())
}

fn field_to_js(field: &SignatureField) -> Result<Object, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &"id".into(), &field.id.clone().into())?;
    Reflect::set(&obj, &"x".into(), &field.x.into())?;
    Reflect::set(&obj, &"y".into(), &field.y.into())?;
    Reflect::set(&obj, &"imageData".into(), &field.image_data.clone().into())?;
    Ok(obj)
}

fn set_pdf_point(obj: &Object, point: PdfPoint) -> Result<(), JsValue> {
    Reflect::set(obj, &"pdfX".into(), &point.x.into())?;
    Reflect::set(obj, &"pdfY".into(), &point.y.into())?;
    Ok(())
}

/// Signing state for one document on the public signing page
#[wasm_bindgen]
pub struct SignSession {
    inner: Rc<RefCell<SigningSession>>,
}

#[wasm_bindgen]
impl SignSession {
    /// `config_json` may be omitted or contain any subset of the settings
    #[wasm_bindgen(constructor)]
    pub fn new(
        doc_id: &str,
        file_name: &str,
        config_json: Option<String>,
    ) -> Result<SignSession, JsValue> {
        let config = match config_json {
            Some(json) => SigningConfig::from_json(&json).map_err(to_js)?,
            None => SigningConfig::default(),
        };
        let session = SigningSession::new(
            DocumentRef {
                doc_id: doc_id.to_string(),
                file_name: file_name.to_string(),
            },
            config,
        )
        .map_err(to_js)?;
        Ok(Self {
            inner: Rc::new(RefCell::new(session)),
        })
    }

    /// URL the viewer should load the original from
    #[wasm_bindgen(getter, js_name = documentUrl)]
    pub fn document_url(&self) -> String {
        let session = self.inner.borrow();
        session
            .config()
            .endpoints
            .document_url(&session.document().file_name)
    }

    /// Read the target page size from the loaded PDF bytes
    #[wasm_bindgen(js_name = onPdfLoaded)]
    pub fn on_pdf_loaded(&self, pdf_bytes: &[u8]) -> Result<JsValue, JsValue> {
        let size = self
            .inner
            .borrow_mut()
            .on_pdf_loaded(pdf_bytes)
            .map_err(to_js)?;
        size_to_js(size)
    }

    /// Record the page size when the viewer already parsed the document
    #[wasm_bindgen(js_name = setPdfSize)]
    pub fn set_pdf_size(&self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        let size = self
            .inner
            .borrow_mut()
            .set_pdf_size(PageSize::new(width, height));
        size_to_js(size)
    }

    /// Measure the rendered page inside `container`.
    ///
    /// Resolves to `{ width, height, fallback }`; `fallback` is true when the
    /// page never reported a size and the configured default was used.
    pub fn measure(&self, container: Element) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let config = inner.borrow().config().measure.clone();
            let surface = ElementSurface::new(container);
            let measurement: Measurement =
                measure_rendered_size(&surface, &config, &TimeoutSleeper).await;

            if let Some(warning) = inner.borrow_mut().on_surface_measured(&measurement) {
                tracing::warn!(%warning, "signature placement may be inaccurate");
            }

            let obj = size_to_js(measurement.size())?;
            Reflect::set(&obj, &"fallback".into(), &measurement.is_fallback().into())?;
            Ok(obj)
        })
    }

    /// Store the signature pad output and place the field.
    ///
    /// Returns the field, or `null` until the page has been measured.
    #[wasm_bindgen(js_name = setSignature)]
    pub fn set_signature(&self, data_url: &str) -> Result<JsValue, JsValue> {
        let image = SignatureImage::from_data_url(data_url).map_err(to_js)?;
        match self.inner.borrow_mut().set_signature(image) {
            Some(field) => Ok(field_to_js(field)?.into()),
            None => Ok(JsValue::NULL),
        }
    }

    /// Current field, or `null`
    #[wasm_bindgen(getter)]
    pub fn field(&self) -> Result<JsValue, JsValue> {
        match self.inner.borrow().field() {
            Some(field) => Ok(field_to_js(field)?.into()),
            None => Ok(JsValue::NULL),
        }
    }

    /// Apply a drag stop; resolves the clamped field plus `pdfX`/`pdfY`
    #[wasm_bindgen(js_name = onDragStop)]
    pub fn on_drag_stop(&self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        let placement = self
            .inner
            .borrow_mut()
            .on_drag_stop(DragStop { x, y })
            .map_err(to_js)?;
        let obj = field_to_js(&placement.field)?;
        set_pdf_point(&obj, placement.pdf)?;
        Ok(obj.into())
    }

    #[wasm_bindgen(getter, js_name = isProcessing)]
    pub fn is_processing(&self) -> bool {
        self.inner.borrow().is_processing()
    }

    /// Embed the signature, download the result and upload it.
    ///
    /// Rejects immediately with a message if required data is missing or a
    /// finish is already running.
    pub fn finish(&self) -> Promise {
        let (ticket, save_url) = {
            let session = self.inner.borrow();
            (
                session.begin_finish(),
                session.config().endpoints.save_url(),
            )
        };
        let ticket = match ticket {
            Ok(ticket) => ticket,
            Err(e) => return Promise::reject(&to_js(e)),
        };

        future_to_promise(async move {
            let position = ticket.position();
            let signed = ticket
                .run(&HttpFetcher, &HttpStore::new(save_url), &BrowserDownloads)
                .await
                .map_err(to_js)?;

            let obj = Object::new();
            Reflect::set(&obj, &"success".into(), &true.into())?;
            Reflect::set(&obj, &"fileName".into(), &signed.file_name.into())?;
            set_pdf_point(&obj, position)?;
            Ok(obj.into())
        })
    }
}
