//! Per-document pipeline and the parallel batch driver.
//!
//! Within one document, record sets move through Split → Extract →
//! Match → Resolve → Locate in order. Documents are independent; the
//! driver fans them out over scoped threads sharing only the compiled
//! preset, the ledger index and a mutex-guarded report builder.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use crate::document::DocumentSource;
use crate::error::DocumentError;
use crate::extract::extract_identifier;
use crate::ledger::LedgerIndex;
use crate::manual::ManualStore;
use crate::matcher::resolve_match;
use crate::preset::CompiledPreset;
use crate::record::RecordSet;
use crate::report::{BatchReport, ReportBuilder};
use crate::resolve::{apply_region_status, resolve_fields};
use crate::rules::RuleRegistry;
use crate::split::split_document;

/// Everything a document worker needs, shared immutably across threads.
pub struct PipelineContext<'a> {
    pub preset: &'a CompiledPreset,
    pub index: &'a LedgerIndex,
    pub manual: &'a ManualStore,
    pub rules: &'a RuleRegistry,
}

/// Run one document through resolution. The returned record sets are
/// ready for region lookup and writing; no side effects happen here.
pub fn process_document<D: DocumentSource>(
    ctx: &PipelineContext<'_>,
    doc_id: &str,
    doc: &D,
) -> Vec<RecordSet> {
    let strategy = ctx.preset.split_strategy();
    let mut records = split_document(doc_id, doc, &strategy);
    tracing::info!(doc = %doc_id, records = records.len(), "document split");

    for record in &mut records {
        record.raw_key = extract_identifier(doc, record.pages, &ctx.preset.key_pattern);
        match &record.raw_key {
            Some(raw) => {
                record.match_state = resolve_match(raw, ctx.preset, ctx.index);
            }
            // No identifier: straight to unmatched, matcher skipped.
            None => {
                tracing::debug!(doc = %doc_id, record = record.index, "no identifier found");
            }
        }
        resolve_fields(&ctx.preset.preset, ctx.manual, ctx.rules, record, false);
        apply_region_status(&ctx.preset.preset, record);
    }

    records
}

/// Report access handed to batch workers; appends are serialized behind
/// one lock and re-ordered deterministically at finish.
pub struct ReportHandle<'a> {
    builder: &'a Mutex<ReportBuilder>,
    doc_order: usize,
}

impl ReportHandle<'_> {
    /// Record a resolved record set, before any writing starts.
    pub fn append_record(&self, record: &RecordSet) {
        self.lock().append_record(self.doc_order, record);
    }

    /// Flag a row after the writer truncated one of its values.
    pub fn flag_overflow(&self, doc_id: &str, record_index: usize) {
        self.lock().flag_overflow(doc_id, record_index);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReportBuilder> {
        // Poisoning only happens if another worker panicked; at that
        // point the batch is lost anyway.
        self.builder.lock().expect("report lock poisoned")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Worker thread cap; clamped to the number of documents.
    pub jobs: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

/// Fan documents out over worker threads and collect one report.
///
/// The worker opens, processes and writes a single document, reporting
/// record sets through the handle as they resolve. A worker error marks
/// that document failed and the batch continues. Cancellation is
/// cooperative: an in-flight document completes, queued documents are
/// skipped.
pub fn run_batch<F>(
    doc_ids: &[String],
    options: BatchOptions,
    cancel: &AtomicBool,
    worker: F,
) -> BatchReport
where
    F: Fn(&str, &ReportHandle<'_>) -> Result<(), DocumentError> + Sync,
{
    let builder = Mutex::new(ReportBuilder::new());
    let next = AtomicUsize::new(0);
    let jobs = options.jobs.clamp(1, doc_ids.len().max(1));

    thread::scope(|scope| {
        for _ in 0..jobs {
            scope.spawn(|| loop {
                if cancel.load(Ordering::SeqCst) {
                    break;
                }
                let i = next.fetch_add(1, Ordering::SeqCst);
                let Some(doc_id) = doc_ids.get(i) else {
                    break;
                };
                let handle = ReportHandle {
                    builder: &builder,
                    doc_order: i,
                };
                if let Err(error) = worker(doc_id, &handle) {
                    tracing::warn!(doc = %doc_id, %error, "document failed");
                    handle.lock().record_failure(i, doc_id, &error);
                }
            });
        }
    });

    builder
        .into_inner()
        .expect("report lock poisoned")
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextToken;
    use crate::geom::BoundingBox;
    use crate::ledger::RawRow;
    use crate::preset::test_support::{basic_preset, compiled};
    use crate::record::{FieldStatus, PageRange};

    struct Pages(Vec<Vec<TextToken>>);

    impl Pages {
        fn with_text(texts: &[&str]) -> Self {
            Pages(
                texts
                    .iter()
                    .map(|t| {
                        if t.is_empty() {
                            Vec::new()
                        } else {
                            vec![TextToken::new(*t, BoundingBox::new(0.0, 0.0, 10.0, 10.0))]
                        }
                    })
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

    fn ledger_index(preset: &CompiledPreset) -> LedgerIndex {
        LedgerIndex::build(
            vec![RawRow::new(
                2,
                vec![
                    ("Tag".to_string(), "A-1".to_string()),
                    ("Model".to_string(), "X200".to_string()),
                ],
            )],
            preset,
        )
        .unwrap()
    }

    #[test]
    fn test_process_document_end_to_end() {
        let preset = compiled(basic_preset());
        let index = ledger_index(&preset);
        let manual = ManualStore::new();
        let rules = RuleRegistry::with_builtins();
        let ctx = PipelineContext {
            preset: &preset,
            index: &index,
            manual: &manual,
            rules: &rules,
        };

        // Two record sets of two pages; the first carries the tag.
        let doc = Pages::with_text(&["TAG: a-1", "", "no tag here", ""]);
        let records = process_document(&ctx, "doc.pdf", &doc);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pages, PageRange::new(0, 1));
        assert_eq!(records[0].raw_key.as_deref(), Some("a-1"));
        assert!(records[0].match_state.is_matched());
        assert_eq!(records[0].fields[0].value.as_deref(), Some("X200"));
        assert_eq!(records[0].fields[0].status, FieldStatus::Resolved);

        assert!(records[1].raw_key.is_none());
        assert!(!records[1].match_state.is_matched());
        assert_eq!(records[1].fields[0].status, FieldStatus::Unresolved);
    }

    #[test]
    fn test_run_batch_continues_past_failed_document() {
        let preset = compiled(basic_preset());
        let index = ledger_index(&preset);
        let manual = ManualStore::new();
        let rules = RuleRegistry::with_builtins();

        let docs: Vec<String> =
            ["a.pdf", "corrupt.pdf", "c.pdf"].iter().map(|s| s.to_string()).collect();
        let cancel = AtomicBool::new(false);

        let report = run_batch(&docs, BatchOptions { jobs: 2 }, &cancel, |doc_id, handle| {
            if doc_id == "corrupt.pdf" {
                return Err(DocumentError::Read("bad xref table".to_string()));
            }
            let ctx = PipelineContext {
                preset: &preset,
                index: &index,
                manual: &manual,
                rules: &rules,
            };
            let doc = Pages::with_text(&["TAG: a-1", ""]);
            for record in process_document(&ctx, doc_id, &doc) {
                handle.append_record(&record);
            }
            Ok(())
        });

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].doc_id, "corrupt.pdf");
        assert_eq!(report.summary.matched, 2);
        // Deterministic ordering by document input order.
        assert_eq!(report.rows[0].doc_id, "a.pdf");
        assert_eq!(report.rows[1].doc_id, "c.pdf");
    }

    #[test]
    fn test_cancel_skips_queued_documents() {
        let docs: Vec<String> = (0..8).map(|i| format!("doc-{i}.pdf")).collect();
        let cancel = AtomicBool::new(false);

        let report = run_batch(&docs, BatchOptions { jobs: 1 }, &cancel, |_, _| {
            // First document requests cancellation; the rest are skipped.
            cancel.store(true, Ordering::SeqCst);
            Ok(())
        });

        assert!(report.rows.is_empty());
        assert!(report.failures.is_empty());
    }
}
