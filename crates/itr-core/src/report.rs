//! Audit report accumulation.
//!
//! Rows are appended as record sets complete resolution, before any
//! writing happens, so a usable report exists even when a later write
//! fails. The final report is deterministically ordered by document
//! input order, then record index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::record::RecordSet;

/// One row of the audit table, one per record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub doc_id: String,
    pub record_index: usize,
    /// 1-based page label, e.g. `"5-8"`.
    pub page_range: String,
    /// Identifier as found in the document; empty when none.
    pub raw_key: String,
    pub matched: bool,
    /// Normalized candidate the ledger row was found under; empty when
    /// unmatched.
    pub matched_key: String,
    /// A candidate hit multiple ledger rows.
    pub ambiguous: bool,
    /// Trailing partial record set (or marker-less fragment).
    pub incomplete: bool,
    pub unresolved_count: usize,
    pub unresolved_fields: Vec<String>,
    /// A value was truncated at the minimum font size.
    pub overflow: bool,
}

impl ReportRow {
    fn from_record(record: &RecordSet) -> Self {
        let unresolved_fields = record.unresolved_fields();
        Self {
            doc_id: record.doc_id.clone(),
            record_index: record.index,
            page_range: record.pages.label(),
            raw_key: record.raw_key.clone().unwrap_or_default(),
            matched: record.match_state.is_matched(),
            matched_key: record.match_state.matched_key().unwrap_or("").to_string(),
            ambiguous: record.match_state.is_ambiguous(),
            incomplete: record.incomplete,
            unresolved_count: unresolved_fields.len(),
            unresolved_fields,
            overflow: record.any_overflow(),
        }
    }
}

/// A document that could not be read or written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedDocument {
    pub doc_id: String,
    pub error: String,
}

/// Batch-level aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_records: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
    pub incomplete: usize,
    pub overflowed: usize,
    pub failed_documents: usize,
    /// Unresolved occurrences per field name across the batch.
    pub unresolved_by_field: BTreeMap<String, usize>,
}

/// The finished report handed to the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub rows: Vec<ReportRow>,
    pub failures: Vec<FailedDocument>,
    pub summary: BatchSummary,
    pub generated_at: String,
}

/// Accumulates rows out of order (documents may finish in any order) and
/// sorts once at the end.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    rows: Vec<(usize, ReportRow)>,
    failures: Vec<(usize, FailedDocument)>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row for a record set that completed resolution.
    pub fn append_record(&mut self, doc_order: usize, record: &RecordSet) {
        self.rows.push((doc_order, ReportRow::from_record(record)));
    }

    /// Mark a previously appended row as overflowed; called by the
    /// writer after committing.
    pub fn flag_overflow(&mut self, doc_id: &str, record_index: usize) {
        if let Some((_, row)) = self
            .rows
            .iter_mut()
            .find(|(_, r)| r.doc_id == doc_id && r.record_index == record_index)
        {
            row.overflow = true;
        }
    }

    pub fn record_failure(&mut self, doc_order: usize, doc_id: &str, error: &DocumentError) {
        self.failures.push((
            doc_order,
            FailedDocument {
                doc_id: doc_id.to_string(),
                error: error.to_string(),
            },
        ));
    }

    /// Sort deterministically and compute the aggregates.
    pub fn finish(mut self) -> BatchReport {
        self.rows
            .sort_by(|(a_doc, a), (b_doc, b)| (a_doc, a.record_index).cmp(&(b_doc, b.record_index)));
        self.failures.sort_by_key(|(order, _)| *order);

        let rows: Vec<ReportRow> = self.rows.into_iter().map(|(_, row)| row).collect();
        let failures: Vec<FailedDocument> =
            self.failures.into_iter().map(|(_, failure)| failure).collect();

        let mut summary = BatchSummary {
            total_records: rows.len(),
            failed_documents: failures.len(),
            ..BatchSummary::default()
        };
        for row in &rows {
            if row.matched {
                summary.matched += 1;
            } else if row.ambiguous {
                summary.ambiguous += 1;
            } else {
                summary.unmatched += 1;
            }
            if row.incomplete {
                summary.incomplete += 1;
            }
            if row.overflow {
                summary.overflowed += 1;
            }
            for field in &row.unresolved_fields {
                *summary.unresolved_by_field.entry(field.clone()).or_default() += 1;
            }
        }

        BatchReport {
            rows,
            failures,
            summary,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
