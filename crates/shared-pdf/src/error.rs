use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Invalid PNG image: {0}")]
    Image(String),

    #[error("Page index {index} out of range (document has {page_count} pages)")]
    PageIndexOutOfRange { index: usize, page_count: usize },

    #[error("Malformed PDF structure: {0}")]
    Structure(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),
}
