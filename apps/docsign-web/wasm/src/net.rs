//! `fetch`-based document retrieval and signed document upload

use async_trait::async_trait;
use docsign_core::{DocumentFetcher, SignedDocument, SignedDocumentStore, TransportError};
use js_sys::{Array, Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, FormData, Request, RequestInit, RequestMode, Response};

fn js_error(value: JsValue) -> TransportError {
    TransportError::new(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

async fn send(request: &Request) -> Result<Response, TransportError> {
    let window = web_sys::window().ok_or_else(|| TransportError::new("No window"))?;
    let response = JsFuture::from(window.fetch_with_request(request))
        .await
        .map_err(js_error)?;
    let response: Response = response.dyn_into().map_err(js_error)?;
    if !response.ok() {
        return Err(TransportError::with_status(
            response.status(),
            response.status_text(),
        ));
    }
    Ok(response)
}

/// PDF bytes wrapped in a Blob
pub fn pdf_blob(bytes: &[u8]) -> Result<Blob, JsValue> {
    let parts = Array::new();
    parts.push(&Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type("application/pdf");
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
}

/// Downloads originals with a plain GET
pub struct HttpFetcher;

#[async_trait(?Send)]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);
        let request = Request::new_with_str_and_init(url, &opts).map_err(js_error)?;

        let response = send(&request).await?;
        let buffer = JsFuture::from(response.array_buffer().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

/// Posts signed documents as multipart form data
pub struct HttpStore {
    save_url: String,
}

impl HttpStore {
    pub fn new(save_url: impl Into<String>) -> Self {
        Self {
            save_url: save_url.into(),
        }
    }

    fn form(document: &SignedDocument) -> Result<FormData, JsValue> {
        let form = FormData::new()?;
        form.append_with_blob_and_filename(
            "signedPdf",
            &pdf_blob(&document.bytes)?,
            &document.file_name,
        )?;
        form.append_with_str("originalFileName", &document.original_file_name)?;
        form.append_with_str("docId", &document.doc_id)?;
        Ok(form)
    }
}

#[async_trait(?Send)]
impl SignedDocumentStore for HttpStore {
    async fn save(&self, document: &SignedDocument) -> Result<(), TransportError> {
        let form = Self::form(document).map_err(js_error)?;
        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        opts.set_body(&form.into());
        let request = Request::new_with_str_and_init(&self.save_url, &opts).map_err(js_error)?;

        let response = send(&request).await?;
        let json = JsFuture::from(response.json().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        let success = Reflect::get(&json, &"success".into())
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !success {
            return Err(TransportError::with_status(
                response.status(),
                "Failed to save to server.",
            ));
        }
        Ok(())
    }
}
