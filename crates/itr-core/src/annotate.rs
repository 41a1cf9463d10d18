//! Committing resolved values and marks through an annotation sink.
//!
//! The sink is a write-side collaborator; this module decides what goes
//! where and how big, the sink decides how to draw it. Every drawn
//! object carries a stable name derived from its record and field so a
//! re-run replaces the previous object instead of stacking a duplicate.

use regex::Regex;

use crate::document::DocumentSource;
use crate::geom::BoundingBox;
use crate::layout::fit_text;
use crate::preset::Preset;
use crate::record::{FieldStatus, RecordSet};
use crate::region::{self, RegionClass};

/// Write-side collaborator interface, implemented over a concrete PDF
/// library outside the core.
pub trait AnnotationSink {
    /// Replace-or-create a text annotation filling `bounds` on `page`.
    fn draw_text(
        &mut self,
        page: usize,
        bounds: BoundingBox,
        lines: &[String],
        font_size: f64,
        name: &str,
    );

    /// Outlined box for calibration overlays, colored by class.
    fn draw_outline(&mut self, page: usize, bounds: BoundingBox, class: RegionClass, name: &str);

    /// Check glyph centered in `bounds`.
    fn draw_check(&mut self, page: usize, bounds: BoundingBox, glyph_size: f64, name: &str);
}

/// Outcome of committing one record set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitStats {
    pub written: usize,
    /// Fields whose value had to be truncated at the floor size.
    pub overflowed: Vec<String>,
}

fn annotation_name(kind: &str, record_index: usize, detail: &str) -> String {
    format!("itr-{kind}-{record_index}-{detail}")
}

/// Render every resolved field with a located region into its box.
///
/// Values that cannot fit after shrink and wrap are written truncated
/// and flagged on the field outcome; nothing is dropped silently.
pub fn commit_record<S: AnnotationSink>(
    sink: &mut S,
    preset: &Preset,
    record: &mut RecordSet,
) -> CommitStats {
    let mut stats = CommitStats::default();
    let pages = record.pages;

    for outcome in &mut record.fields {
        if outcome.status != FieldStatus::Resolved {
            continue;
        }
        let Some(region) = region::locate(&preset.regions, &outcome.field, pages) else {
            continue;
        };
        let Some(value) = outcome.value.as_deref() else {
            continue;
        };

        let fitted = fit_text(
            value,
            &region.bounds,
            preset.text.font_size,
            preset.text.min_font_size,
        );
        sink.draw_text(
            region.page,
            region.bounds,
            &fitted.lines,
            fitted.font_size,
            &annotation_name("field", record.index, &outcome.field),
        );
        stats.written += 1;
        if fitted.truncated {
            outcome.overflow = true;
            stats.overflowed.push(outcome.field.clone());
            tracing::warn!(
                record = record.index,
                field = %outcome.field,
                "value truncated at minimum font size"
            );
        }
    }

    stats
}

/// Draw every configured region of every record set as an outlined box,
/// without touching any values.
pub fn render_calibration<S: AnnotationSink>(
    sink: &mut S,
    preset: &Preset,
    records: &[RecordSet],
) -> usize {
    let mut drawn = 0;
    for record in records {
        for (field, region) in region::locate_all(&preset.regions, record.pages) {
            sink.draw_outline(
                region.page,
                region.bounds,
                region.class,
                &annotation_name("cal", record.index, field),
            );
            drawn += 1;
        }
    }
    drawn
}

/// Glyph size used when stamping a check into a box.
fn check_glyph_size(bounds: &BoundingBox) -> f64 {
    0.8 * bounds.width().min(bounds.height())
}

/// Stamp the check glyph into every configured CheckTarget region of
/// every record set.
pub fn mark_check_targets<S: AnnotationSink>(
    sink: &mut S,
    preset: &Preset,
    records: &[RecordSet],
) -> usize {
    let mut marked = 0;
    for record in records {
        for (field, region) in region::locate_all(&preset.regions, record.pages) {
            if region.class != RegionClass::CheckTarget {
                continue;
            }
            sink.draw_check(
                region.page,
                region.bounds,
                check_glyph_size(&region.bounds),
                &annotation_name("check", record.index, field),
            );
            marked += 1;
        }
    }
    marked
}

/// Not-applicable cells discovered by scanning page tokens for the
/// configured anchor pattern. Returned in page order then token order.
pub fn discover_check_anchors<D: DocumentSource>(
    doc: &D,
    pattern: &Regex,
) -> Vec<(usize, BoundingBox)> {
    let mut anchors = Vec::new();
    for page in 0..doc.page_count() {
        for token in doc.page_tokens(page) {
            if pattern.is_match(&token.text) {
                anchors.push((page, token.bounds));
            }
        }
    }
    anchors
}

/// Stamp a check over each discovered anchor box.
pub fn mark_anchors<S: AnnotationSink>(sink: &mut S, anchors: &[(usize, BoundingBox)]) -> usize {
    for (i, (page, bounds)) in anchors.iter().enumerate() {
        sink.draw_check(
            *page,
            *bounds,
            check_glyph_size(bounds),
            &format!("itr-na-{page}-{i}"),
        );
    }
    anchors.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextToken;
    use crate::preset::test_support::basic_preset;
    use crate::record::{FieldOutcome, PageRange};

    /// Sink that records draw calls, replacing by name like a real one.
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<(String, usize, String)>,
    }

    impl RecordingSink {
        fn push(&mut self, name: &str, page: usize, payload: String) {
            if let Some(existing) = self.calls.iter_mut().find(|(n, _, _)| n == name) {
                *existing = (name.to_string(), page, payload);
            } else {
                self.calls.push((name.to_string(), page, payload));
            }
        }
    }

    impl AnnotationSink for RecordingSink {
        fn draw_text(
            &mut self,
            page: usize,
            _bounds: BoundingBox,
            lines: &[String],
            font_size: f64,
            name: &str,
        ) {
            self.push(name, page, format!("text:{}@{font_size}", lines.join("\\n")));
        }

        fn draw_outline(
            &mut self,
            page: usize,
            _bounds: BoundingBox,
            class: RegionClass,
            name: &str,
        ) {
            self.push(name, page, format!("outline:{class:?}"));
        }

        fn draw_check(&mut self, page: usize, _bounds: BoundingBox, glyph_size: f64, name: &str) {
            self.push(name, page, format!("check:{glyph_size}"));
        }
    }

    fn resolved_record(value: &str) -> RecordSet {
        let mut record = RecordSet::new("doc.pdf", 0, PageRange::new(0, 1), false);
        record.fields = vec![FieldOutcome::resolved("MODEL", value)];
        record
    }

    #[test]
    fn test_commit_writes_resolved_field() {
        let preset = basic_preset();
        let mut sink = RecordingSink::default();
        let mut record = resolved_record("X200");

        let stats = commit_record(&mut sink, &preset, &mut record);
        assert_eq!(stats.written, 1);
        assert!(stats.overflowed.is_empty());
        assert_eq!(sink.calls.len(), 1);
        assert_eq!(sink.calls[0].0, "itr-field-0-MODEL");
        assert_eq!(sink.calls[0].1, 0);
    }

    #[test]
    fn test_commit_twice_is_idempotent() {
        let preset = basic_preset();
        let mut sink = RecordingSink::default();
        let mut record = resolved_record("X200");

        commit_record(&mut sink, &preset, &mut record);
        let after_first = sink.calls.clone();
        commit_record(&mut sink, &preset, &mut record);
        assert_eq!(sink.calls, after_first);
    }

    #[test]
    fn test_commit_empty_const_writes_blank() {
        let preset = basic_preset();
        let mut sink = RecordingSink::default();
        let mut record = resolved_record("");

        let stats = commit_record(&mut sink, &preset, &mut record);
        assert_eq!(stats.written, 1);
        assert_eq!(sink.calls[0].2, "text:@9");
    }

    #[test]
    fn test_commit_flags_overflow() {
        let mut preset = basic_preset();
        // A box too small for the value even at the floor size.
        preset.regions.get_mut("MODEL").unwrap().bounds = BoundingBox::new(0.0, 0.0, 18.0, 7.0);
        let mut sink = RecordingSink::default();
        let mut record = resolved_record("A VERY LONG VALUE THAT CANNOT FIT ANYWHERE");

        let stats = commit_record(&mut sink, &preset, &mut record);
        assert_eq!(stats.overflowed, vec!["MODEL"]);
        assert!(record.fields[0].overflow);
        // The truncated remainder is still written.
        assert_eq!(stats.written, 1);
    }

    #[test]
    fn test_commit_skips_unresolved() {
        let preset = basic_preset();
        let mut sink = RecordingSink::default();
        let mut record = RecordSet::new("doc.pdf", 0, PageRange::new(0, 1), false);
        record.fields = vec![FieldOutcome::with_status("MODEL", FieldStatus::Unresolved)];

        let stats = commit_record(&mut sink, &preset, &mut record);
        assert_eq!(stats.written, 0);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn test_calibration_draws_outlines_only() {
        let preset = basic_preset();
        let mut sink = RecordingSink::default();
        let records = vec![
            RecordSet::new("doc.pdf", 0, PageRange::new(0, 1), false),
            RecordSet::new("doc.pdf", 1, PageRange::new(2, 3), false),
        ];

        let drawn = render_calibration(&mut sink, &preset, &records);
        assert_eq!(drawn, 2);
        assert_eq!(sink.calls[0].2, "outline:Field");
        assert_eq!(sink.calls[1].1, 2);
    }

    #[test]
    fn test_discover_and_mark_anchors() {
        struct OnePage(Vec<TextToken>);
        impl DocumentSource for OnePage {
            fn page_count(&self) -> usize {
                1
            }
            fn page_tokens(&self, page: usize) -> &[TextToken] {
                if page == 0 {
                    &self.0
                } else {
                    &[]
                }
            }
            fn page_size(&self, _page: usize) -> (f64, f64) {
                (612.0, 792.0)
            }
        }

        let doc = OnePage(vec![
            TextToken::new("N/A", BoundingBox::new(10.0, 10.0, 30.0, 22.0)),
            TextToken::new("value", BoundingBox::new(40.0, 10.0, 80.0, 22.0)),
            TextToken::new("N/A", BoundingBox::new(90.0, 10.0, 110.0, 22.0)),
        ]);
        let pattern = Regex::new(r"^N/A$").unwrap();

        let anchors = discover_check_anchors(&doc, &pattern);
        assert_eq!(anchors.len(), 2);

        let mut sink = RecordingSink::default();
        assert_eq!(mark_anchors(&mut sink, &anchors), 2);
        // Re-marking replaces rather than duplicates.
        mark_anchors(&mut sink, &anchors);
        assert_eq!(sink.calls.len(), 2);
    }
}
