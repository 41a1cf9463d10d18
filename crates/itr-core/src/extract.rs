//! Raw identifier extraction from a record set's text.

use regex::Regex;

use crate::document::{page_text, DocumentSource};
use crate::record::PageRange;

/// First match of the key pattern over the record set's pages, scanning
/// page order then token order. Capture group 1 wins when present,
/// otherwise the whole match.
///
/// `None` routes the record set straight to unmatched; the matcher is
/// never invoked with an empty key.
pub fn extract_identifier<D: DocumentSource>(
    doc: &D,
    pages: PageRange,
    pattern: &Regex,
) -> Option<String> {
    let last = pages.end.min(doc.page_count().saturating_sub(1));
    for page in pages.start..=last {
        let text = page_text(doc, page);
        if let Some(captures) = pattern.captures(&text) {
            let matched = captures
                .get(1)
                .or_else(|| captures.get(0))
                .map(|m| m.as_str().trim().to_string());
            if let Some(raw) = matched {
                if !raw.is_empty() {
                    return Some(raw);
                }
            }
        }
    }
    None
}
