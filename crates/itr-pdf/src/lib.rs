//! PDF collaborator for the ITR engine.
//!
//! [`PdfDocument`] turns a PDF into the positioned-token view the core
//! consumes; [`PdfAnnotator`] implements the core's annotation sink over
//! lopdf annotations and writes the annotated copy.

pub mod annot;
pub mod error;
pub mod text;

pub use annot::PdfAnnotator;
pub use error::PdfError;
pub use text::PdfDocument;
