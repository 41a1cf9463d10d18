//! Ledger rows and the normalized-key index.
//!
//! Duplicate keys are a fact of life in hand-maintained ledgers. The
//! index keeps every colliding row and leaves the decision to the
//! matcher, which reports an explicit ambiguous outcome instead of
//! silently keeping the last row written.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::normalize::normalize_header;
use crate::preset::CompiledPreset;

/// One raw spreadsheet row as handed over by the ledger reader: cells in
/// column order, headers exactly as written in the sheet.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    /// 1-based spreadsheet row, for diagnostics.
    pub row_number: u32,
    pub cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(row_number: u32, cells: Vec<(String, String)>) -> Self {
        Self { row_number, cells }
    }
}

/// A ledger row after normalization. Never mutated after the index is
/// built; a rebuild discards and reconstructs.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    /// Original 1-based spreadsheet row.
    pub row_number: u32,
    /// Normalized identifier this row is indexed under.
    pub key: String,
    columns: Vec<(String, String)>,
}

impl LedgerRow {
    /// Cell under a normalized column name.
    pub fn get(&self, normalized_column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(header, _)| header == normalized_column)
            .map(|(_, value)| value.as_str())
    }

    /// (normalized header, cell) pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

/// Read-only multi-valued index from normalized key to ledger rows.
#[derive(Debug, Default)]
pub struct LedgerIndex {
    rows: Vec<LedgerRow>,
    buckets: HashMap<String, Vec<usize>>,
}

impl LedgerIndex {
    /// Normalize headers and keys once and bucket every row.
    ///
    /// Rows with a blank identifier cell are skipped; they can never
    /// match. A ledger whose header row lacks the configured key column
    /// entirely is a configuration error.
    pub fn build(raw: Vec<RawRow>, preset: &CompiledPreset) -> Result<Self, ConfigError> {
        let key_header = normalize_header(&preset.preset.ledger.key_column);
        let mut rows = Vec::with_capacity(raw.len());
        let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
        let mut saw_key_column = raw.is_empty();

        for raw_row in raw {
            let columns: Vec<(String, String)> = raw_row
                .cells
                .into_iter()
                .map(|(header, value)| (normalize_header(&header), value))
                .collect();

            let key_cell = columns
                .iter()
                .find(|(header, _)| *header == key_header)
                .map(|(_, value)| value.as_str());
            if key_cell.is_some() {
                saw_key_column = true;
            }

            let key = preset.normalize_key(key_cell.unwrap_or(""));
            if key.is_empty() {
                continue;
            }

            let row = LedgerRow {
                row_number: raw_row.row_number,
                key: key.clone(),
                columns,
            };
            buckets.entry(key).or_default().push(rows.len());
            rows.push(row);
        }

        if !saw_key_column {
            return Err(ConfigError::MissingKeyColumn(
                preset.preset.ledger.key_column.clone(),
            ));
        }

        tracing::info!(rows = rows.len(), keys = buckets.len(), "ledger index built");
        Ok(Self { rows, buckets })
    }

    /// Rows indexed under a normalized key, in ledger order. Zero matches
    /// is a valid outcome, not an error.
    pub fn resolve(&self, normalized_key: &str) -> Vec<&LedgerRow> {
        self.buckets
            .get(normalized_key)
            .map(|bucket| bucket.iter().map(|&i| &self.rows[i]).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
