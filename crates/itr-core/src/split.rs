//! Page partitioning into record sets.

use regex::Regex;

use crate::document::{page_text, DocumentSource};
use crate::preset::CompiledPreset;
use crate::record::{PageRange, RecordSet};

/// Splitting strategy, derived from a compiled preset.
pub enum SplitStrategy<'a> {
    /// Consecutive groups of exactly this many pages. A trailing partial
    /// group is still emitted, flagged incomplete.
    FixedPages(usize),
    /// A new record set opens on every page whose text matches.
    Marker(&'a Regex),
}

impl CompiledPreset {
    pub fn split_strategy(&self) -> SplitStrategy<'_> {
        match &self.marker_pattern {
            Some(marker) => SplitStrategy::Marker(marker),
            // compile() guarantees pages_per_set is set otherwise
            None => SplitStrategy::FixedPages(self.preset.record.pages_per_set.unwrap_or(1)),
        }
    }
}

/// Partition a document's pages into ordered record sets, indexed from 0.
/// Ranges are contiguous, increasing and non-overlapping; every page
/// belongs to exactly one record set.
pub fn split_document<D: DocumentSource>(
    doc_id: &str,
    doc: &D,
    strategy: &SplitStrategy<'_>,
) -> Vec<RecordSet> {
    let page_count = doc.page_count();
    if page_count == 0 {
        return Vec::new();
    }
    match strategy {
        SplitStrategy::FixedPages(per_set) => fixed_pages(doc_id, page_count, *per_set),
        SplitStrategy::Marker(marker) => by_marker(doc_id, doc, marker),
    }
}

fn fixed_pages(doc_id: &str, page_count: usize, per_set: usize) -> Vec<RecordSet> {
    let mut records = Vec::with_capacity(page_count.div_ceil(per_set));
    let mut start = 0;
    while start < page_count {
        let end = (start + per_set - 1).min(page_count - 1);
        let incomplete = end - start + 1 < per_set;
        records.push(RecordSet::new(
            doc_id,
            records.len(),
            PageRange::new(start, end),
            incomplete,
        ));
        start = end + 1;
    }
    records
}

fn by_marker<D: DocumentSource>(doc_id: &str, doc: &D, marker: &Regex) -> Vec<RecordSet> {
    let page_count = doc.page_count();
    let starts: Vec<usize> =
        (0..page_count).filter(|&p| marker.is_match(&page_text(doc, p))).collect();

    // Pages before the first marker are a fragment without a marker of
    // their own; emit them as an incomplete leading record set rather
    // than dropping them.
    let mut records = Vec::new();
    if starts.first() != Some(&0) {
        let end = starts.first().map(|&s| s - 1).unwrap_or(page_count - 1);
        records.push(RecordSet::new(doc_id, 0, PageRange::new(0, end), true));
    }
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).map(|&next| next - 1).unwrap_or(page_count - 1);
        records.push(RecordSet::new(
            doc_id,
            records.len(),
            PageRange::new(start, end),
            false,
        ));
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentSource, TextToken};
    use crate::geom::BoundingBox;

    struct Pages(Vec<Vec<TextToken>>);

    impl Pages {
        fn blank(count: usize) -> Self {
            Pages(vec![Vec::new(); count])
        }

        fn with_text(texts: &[&str]) -> Self {
            Pages(
                texts
                    .iter()
                    .map(|t| vec![TextToken::new(*t, BoundingBox::new(0.0, 0.0, 10.0, 10.0))])
                    .collect(),
            )
        }
    }

    impl DocumentSource for Pages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_tokens(&self, page: usize) -> &[TextToken] {
            self.0.get(page).map(Vec::as_slice).unwrap_or(&[])
        }

        fn page_size(&self, _page: usize) -> (f64, f64) {
            (612.0, 792.0)
        }
    }

    fn ranges(records: &[RecordSet]) -> Vec<(usize, usize, bool)> {
        records.iter().map(|r| (r.pages.start, r.pages.end, r.incomplete)).collect()
    }

    #[test]
    fn test_fixed_eleven_pages_by_four() {
        let records = split_document("doc", &Pages::blank(11), &SplitStrategy::FixedPages(4));
        assert_eq!(
            ranges(&records),
            vec![(0, 3, false), (4, 7, false), (8, 10, true)]
        );
        assert_eq!(records[2].index, 2);
    }

    #[test]
    fn test_fixed_exact_multiple_has_no_incomplete() {
        let records = split_document("doc", &Pages::blank(8), &SplitStrategy::FixedPages(4));
        assert_eq!(ranges(&records), vec![(0, 3, false), (4, 7, false)]);
    }

    #[test]
    fn test_fixed_empty_document() {
        let records = split_document("doc", &Pages::blank(0), &SplitStrategy::FixedPages(4));
        assert!(records.is_empty());
    }

    #[test]
    fn test_marker_opens_groups() {
        let marker = Regex::new("ITR No").unwrap();
        let pages = Pages::with_text(&["ITR No 1", "body", "ITR No 2", "body", "body"]);
        let records = split_document("doc", &pages, &SplitStrategy::Marker(&marker));
        assert_eq!(ranges(&records), vec![(0, 1, false), (2, 4, false)]);
    }

    #[test]
    fn test_marker_leading_fragment_flagged() {
        let marker = Regex::new("ITR No").unwrap();
        let pages = Pages::with_text(&["cover", "ITR No 1", "body"]);
        let records = split_document("doc", &pages, &SplitStrategy::Marker(&marker));
        assert_eq!(ranges(&records), vec![(0, 0, true), (1, 2, false)]);
    }

    #[test]
    fn test_marker_absent_yields_single_fragment() {
        let marker = Regex::new("ITR No").unwrap();
        let pages = Pages::with_text(&["a", "b"]);
        let records = split_document("doc", &pages, &SplitStrategy::Marker(&marker));
        assert_eq!(ranges(&records), vec![(0, 1, true)]);
    }
}
