//! Ledger reading over calamine.

use std::path::Path;

use calamine::{open_workbook_auto, DataType, Reader};

use itr_core::RawRow;

use crate::ExcelError;

/// Read the ledger sheet into ordered raw rows.
///
/// `header_row` is 1-based, matching what a user reads off the Excel
/// UI. Headers are taken verbatim (the core normalizes them); trailing
/// blank header cells are trimmed off, and rows with no content at all
/// are skipped. Each returned row keeps its real 1-based sheet row
/// number for diagnostics.
pub fn read_ledger(path: &Path, sheet: &str, header_row: u32) -> Result<Vec<RawRow>, ExcelError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ExcelError::Open(format!("{}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|_| ExcelError::MissingSheet(sheet.to_string()))?;

    let header_idx = header_row.saturating_sub(1) as usize;
    let headers = range
        .rows()
        .nth(header_idx)
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_string().unwrap_or_default())
                .collect::<Vec<String>>()
        })
        .ok_or(ExcelError::HeaderRowOutOfRange(header_row))?;

    let mut trim = headers.len();
    while trim > 0 && headers[trim - 1].trim().is_empty() {
        trim -= 1;
    }
    let headers: Vec<String> = headers.into_iter().take(trim).collect();

    let mut rows = Vec::new();
    for (offset, row) in range.rows().enumerate().skip(header_idx + 1) {
        let cells: Vec<(String, String)> = headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let value = row
                    .get(col)
                    .and_then(|cell| cell.as_string())
                    .unwrap_or_default();
                (header.clone(), value)
            })
            .collect();
        if cells.iter().all(|(_, value)| value.trim().is_empty()) {
            continue;
        }
        rows.push(RawRow::new(offset as u32 + 1, cells));
    }

    tracing::info!(
        path = %path.display(),
        sheet,
        rows = rows.len(),
        "ledger read"
    );
    Ok(rows)
}
