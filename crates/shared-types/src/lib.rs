pub mod types;

pub use types::{
    DocumentRef, DragStop, EmbedRequest, PageGeometry, PageSize, PdfPoint, ScreenPoint,
    SignatureField, SignedDocument,
};
