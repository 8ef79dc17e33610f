//! Shared PDF handling utilities
//!
//! Parsing, page geometry lookup, PNG image embedding and page stamping on
//! top of lopdf.

pub mod error;
pub mod image;
pub mod parser;
pub mod stamp;

pub use error::PdfError;
pub use image::{decode_png, DecodedImage};
pub use parser::PdfDocument;
