//! In-memory collaborators for unit tests

use crate::collaborators::{
    DocumentFetcher, DownloadSink, RenderedSurface, SignedDocumentStore, Sleeper, TransportError,
};
use async_trait::async_trait;
use shared_types::{PageSize, SignedDocument};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

/// 1x1 opaque black PNG
pub fn tiny_png() -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, 1, 1);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[0, 0, 0, 255]).unwrap();
    }
    out
}

#[derive(Default)]
pub struct RecordingSleeper {
    delays: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.borrow_mut().push(delay);
    }
}

/// Returns queued sizes one probe at a time, then `None`
#[derive(Default)]
pub struct ScriptedSurface {
    sizes: RefCell<VecDeque<Option<PageSize>>>,
    probes: Cell<u32>,
}

impl ScriptedSurface {
    pub fn new(sizes: Vec<Option<PageSize>>) -> Self {
        Self {
            sizes: RefCell::new(sizes.into()),
            probes: Cell::new(0),
        }
    }

    pub fn probes(&self) -> u32 {
        self.probes.get()
    }
}

impl RenderedSurface for ScriptedSurface {
    fn bounding_size(&self) -> Option<PageSize> {
        self.probes.set(self.probes.get() + 1);
        self.sizes.borrow_mut().pop_front().flatten()
    }
}

pub struct StaticFetcher {
    pub result: Result<Vec<u8>, TransportError>,
    pub requested: RefCell<Vec<String>>,
}

impl StaticFetcher {
    pub fn ok(bytes: Vec<u8>) -> Self {
        Self {
            result: Ok(bytes),
            requested: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            result: Err(TransportError::with_status(status, "Not Found")),
            requested: RefCell::new(Vec::new()),
        }
    }
}

#[async_trait(?Send)]
impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.requested.borrow_mut().push(url.to_string());
        self.result.clone()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub fail: bool,
    pub saved: RefCell<Vec<SignedDocument>>,
}

#[async_trait(?Send)]
impl SignedDocumentStore for MemoryStore {
    async fn save(&self, document: &SignedDocument) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::with_status(500, "Failed to save to server."));
        }
        self.saved.borrow_mut().push(document.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDownloads {
    pub offered: RefCell<Vec<SignedDocument>>,
}

impl DownloadSink for MemoryDownloads {
    fn offer(&self, document: &SignedDocument) -> Result<(), TransportError> {
        self.offered.borrow_mut().push(document.clone());
        Ok(())
    }
}
