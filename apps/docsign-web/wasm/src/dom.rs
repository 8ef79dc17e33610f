//! Measuring the rendered page in the DOM

use docsign_core::{PageSize, RenderedSurface};
use web_sys::Element;

/// Inset applied to the container when the page canvas is not mounted yet
const CONTAINER_INSET_PX: f64 = 20.0;

/// The element that hosts the rendered page canvas
pub struct ElementSurface {
    container: Element,
}

impl ElementSurface {
    pub fn new(container: Element) -> Self {
        Self { container }
    }
}

impl RenderedSurface for ElementSurface {
    fn bounding_size(&self) -> Option<PageSize> {
        let size = match self.container.query_selector("canvas") {
            Ok(Some(canvas)) => {
                let rect = canvas.get_bounding_client_rect();
                PageSize::new(rect.width(), rect.height())
            }
            _ => {
                let rect = self.container.get_bounding_client_rect();
                PageSize::new(
                    rect.width() - CONTAINER_INSET_PX,
                    rect.height() - CONTAINER_INSET_PX,
                )
            }
        };
        size.is_positive().then_some(size)
    }
}
