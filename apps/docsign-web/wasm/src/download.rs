//! Offering the signed PDF as a browser download

use crate::net::pdf_blob;
use docsign_core::{DownloadSink, SignedDocument, TransportError};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlAnchorElement, Url};

/// Delay before an object URL is revoked, so the browser can start reading it
const REVOKE_DELAY_MS: i32 = 1000;

/// A `blob:` URL that is revoked when dropped
pub struct ObjectUrl {
    url: String,
}

impl ObjectUrl {
    pub fn for_pdf(bytes: &[u8]) -> Result<Self, JsValue> {
        let blob = pdf_blob(bytes)?;
        let url = Url::create_object_url_with_blob(&blob)?;
        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let url = std::mem::take(&mut self.url);
        let Some(window) = web_sys::window() else {
            let _ = Url::revoke_object_url(&url);
            return;
        };
        let pending = url.clone();
        let revoke = Closure::once_into_js(move || {
            let _ = Url::revoke_object_url(&pending);
        });
        let scheduled = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            revoke.unchecked_ref(),
            REVOKE_DELAY_MS,
        );
        if scheduled.is_err() {
            let _ = Url::revoke_object_url(&url);
        }
    }
}

/// Clicks a temporary `<a download>` pointing at an object URL
pub struct BrowserDownloads;

impl BrowserDownloads {
    fn click(document: &SignedDocument) -> Result<(), JsValue> {
        let object_url = ObjectUrl::for_pdf(&document.bytes)?;
        let page = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("No document")?;
        let link: HtmlAnchorElement = page.create_element("a")?.dyn_into()?;
        link.set_href(object_url.as_str());
        link.set_download(&document.file_name);
        link.click();
        Ok(())
    }
}

impl DownloadSink for BrowserDownloads {
    fn offer(&self, document: &SignedDocument) -> Result<(), TransportError> {
        Self::click(document).map_err(|e| {
            TransportError::new(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
        })
    }
}
