//! Abstract positioned-text view of a source document.
//!
//! The core never parses a document format itself; a collaborator hands
//! it ordered text tokens with bounding boxes, one sequence per page.

use serde::{Deserialize, Serialize};

use crate::geom::BoundingBox;

/// One positioned text token on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    pub text: String,
    pub bounds: BoundingBox,
}

impl TextToken {
    pub fn new(text: impl Into<String>, bounds: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }
}

/// Read-side collaborator interface.
pub trait DocumentSource {
    fn page_count(&self) -> usize;

    /// Tokens of one page, in reading order. Pages out of range yield an
    /// empty slice.
    fn page_tokens(&self, page: usize) -> &[TextToken];

    /// Page width and height in points.
    fn page_size(&self, page: usize) -> (f64, f64);
}

/// Concatenated token text of one page, tokens joined by a single space.
///
/// Extraction patterns run against this string so a match may span token
/// boundaries.
pub fn page_text<D: DocumentSource + ?Sized>(doc: &D, page: usize) -> String {
    let tokens = doc.page_tokens(page);
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len() + 1).sum());
    for token in tokens {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&token.text);
    }
    out
}
