//! Record-set state threaded through the pipeline stages.
//!
//! A [`RecordSet`] is created by the splitter and enriched in place by
//! the extractor, matcher and resolver. Once written it is terminal.

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerRow;

/// Absolute, inclusive page range of one record set within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn page_count(&self) -> usize {
        self.end - self.start + 1
    }

    /// Whether a record-relative page offset falls inside this range.
    /// False for offsets truncated away by an incomplete trailing set.
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start + offset <= self.end
    }

    /// Human-facing 1-based label, e.g. `"5-8"`.
    pub fn label(&self) -> String {
        if self.start == self.end {
            format!("{}", self.start + 1)
        } else {
            format!("{}-{}", self.start + 1, self.end + 1)
        }
    }
}

/// Match resolution for one record set.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MatchState {
    /// No identifier, or no candidate resolved to exactly one row.
    #[default]
    Unmatched,
    /// Exactly one ledger row, found under `key`.
    Matched { key: String, row: LedgerRow },
    /// A candidate hit more than one ledger row. Never resolved by an
    /// arbitrary pick.
    Ambiguous { key: String, row_numbers: Vec<u32> },
}

impl MatchState {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchState::Matched { .. })
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, MatchState::Ambiguous { .. })
    }

    pub fn matched_row(&self) -> Option<&LedgerRow> {
        match self {
            MatchState::Matched { row, .. } => Some(row),
            _ => None,
        }
    }

    /// The candidate key that matched, if any.
    pub fn matched_key(&self) -> Option<&str> {
        match self {
            MatchState::Matched { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Resolution status of one (record set, field) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldStatus {
    Resolved,
    Unresolved,
    /// Awaiting a human-captured value; not an error.
    ManualPending,
    /// Resolved but with nowhere to write it.
    SkippedNoRegion,
}

/// One resolved (or not) field of a record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldOutcome {
    pub field: String,
    pub value: Option<String>,
    pub status: FieldStatus,
    /// Set by the writer when the value had to be truncated at the
    /// minimum font size.
    pub overflow: bool,
    /// True when the value came from the manual store; such values are
    /// never overwritten by a re-resolve unless reset is requested.
    pub from_manual: bool,
}

impl FieldOutcome {
    pub fn resolved(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: Some(value.into()),
            status: FieldStatus::Resolved,
            overflow: false,
            from_manual: false,
        }
    }

    pub fn with_status(field: impl Into<String>, status: FieldStatus) -> Self {
        Self {
            field: field.into(),
            value: None,
            status,
            overflow: false,
            from_manual: false,
        }
    }
}

/// One logical multi-page unit within a document.
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub doc_id: String,
    /// 0-based position within the document.
    pub index: usize,
    pub pages: PageRange,
    /// Trailing group with fewer pages than configured, or a marker-less
    /// leading fragment under the marker strategy.
    pub incomplete: bool,
    /// Identifier text exactly as found in the document.
    pub raw_key: Option<String>,
    pub match_state: MatchState,
    /// One outcome per preset field mapping, in preset order.
    pub fields: Vec<FieldOutcome>,
}

impl RecordSet {
    pub fn new(doc_id: impl Into<String>, index: usize, pages: PageRange, incomplete: bool) -> Self {
        Self {
            doc_id: doc_id.into(),
            index,
            pages,
            incomplete,
            raw_key: None,
            match_state: MatchState::Unmatched,
            fields: Vec::new(),
        }
    }

    /// Fields counted as unresolved for reporting: anything still waiting
    /// for a value, whether from the ledger or from a human.
    pub fn unresolved_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| matches!(f.status, FieldStatus::Unresolved | FieldStatus::ManualPending))
            .map(|f| f.field.clone())
            .collect()
    }

    pub fn any_overflow(&self) -> bool {
        self.fields.iter().any(|f| f.overflow)
    }
}
