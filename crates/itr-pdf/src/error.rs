use itr_core::DocumentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),

    #[error("Page {0} not found")]
    MissingPage(usize),
}

impl From<PdfError> for DocumentError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::Parse(msg) => DocumentError::Read(msg),
            PdfError::MissingPage(page) => DocumentError::Read(format!("page {page} not found")),
            PdfError::Save(msg) => DocumentError::Write(msg),
        }
    }
}
