//! Audit report writing over rust_xlsxwriter.
//!
//! Two sheets: `Records` carries one row per record set in deterministic
//! batch order; `Summary` carries the aggregates, per-field unresolved
//! counts and failed documents.

use std::path::Path;

use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};

use itr_core::BatchReport;

use crate::ExcelError;

const RECORD_HEADERS: &[&str] = &[
    "Document",
    "Record",
    "Pages",
    "Raw Tag",
    "Matched",
    "Matched Key",
    "Ambiguous",
    "Incomplete",
    "Unresolved Count",
    "Unresolved Fields",
    "Overflow",
];

/// Drop control characters that upset sheet XML; tabs and newlines stay.
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| c == '\t' || c == '\n' || c == '\r' || (c as u32 >= 0x20 && c as u32 != 0x7F))
        .collect()
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x2563EB))
        .set_font_color(Color::RGB(0xFFFFFF))
}

pub fn write_report(path: &Path, report: &BatchReport) -> Result<(), ExcelError> {
    write_report_inner(path, report)
        .map_err(|e| ExcelError::Write(format!("{}: {e}", path.display())))
}

fn write_report_inner(path: &Path, report: &BatchReport) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();

    let records = workbook.add_worksheet();
    records.set_name("Records")?;
    write_records_sheet(records, report)?;

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    write_summary_sheet(summary, report)?;

    workbook.save(path)?;
    tracing::info!(path = %path.display(), rows = report.rows.len(), "report written");
    Ok(())
}

fn write_records_sheet(sheet: &mut Worksheet, report: &BatchReport) -> Result<(), XlsxError> {
    let header = header_format();
    for (col, title) in RECORD_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (i, row) in report.rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, sanitize_cell(&row.doc_id))?;
        sheet.write_number(r, 1, row.record_index as f64 + 1.0)?;
        sheet.write_string(r, 2, &row.page_range)?;
        sheet.write_string(r, 3, sanitize_cell(&row.raw_key))?;
        sheet.write_boolean(r, 4, row.matched)?;
        sheet.write_string(r, 5, sanitize_cell(&row.matched_key))?;
        sheet.write_boolean(r, 6, row.ambiguous)?;
        sheet.write_boolean(r, 7, row.incomplete)?;
        sheet.write_number(r, 8, row.unresolved_count as f64)?;
        sheet.write_string(r, 9, sanitize_cell(&row.unresolved_fields.join(", ")))?;
        sheet.write_boolean(r, 10, row.overflow)?;
    }

    sheet.set_column_width(0, 32)?;
    sheet.set_column_width(3, 20)?;
    sheet.set_column_width(5, 20)?;
    sheet.set_column_width(9, 40)?;
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, report: &BatchReport) -> Result<(), XlsxError> {
    let header = header_format();
    let summary = &report.summary;

    sheet.write_string_with_format(0, 0, "Batch Summary", &header)?;
    sheet.write_string_with_format(0, 1, "Count", &header)?;
    let totals: &[(&str, usize)] = &[
        ("Record sets", summary.total_records),
        ("Matched", summary.matched),
        ("Unmatched", summary.unmatched),
        ("Ambiguous", summary.ambiguous),
        ("Incomplete", summary.incomplete),
        ("Overflowed", summary.overflowed),
        ("Failed documents", summary.failed_documents),
    ];
    for (i, (label, count)) in totals.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, *label)?;
        sheet.write_number(r, 1, *count as f64)?;
    }

    let mut r = totals.len() as u32 + 2;
    sheet.write_string_with_format(r, 0, "Unresolved Field", &header)?;
    sheet.write_string_with_format(r, 1, "Occurrences", &header)?;
    for (field, count) in &summary.unresolved_by_field {
        r += 1;
        sheet.write_string(r, 0, sanitize_cell(field))?;
        sheet.write_number(r, 1, *count as f64)?;
    }

    if !report.failures.is_empty() {
        r += 2;
        sheet.write_string_with_format(r, 0, "Failed Document", &header)?;
        sheet.write_string_with_format(r, 1, "Error", &header)?;
        for failure in &report.failures {
            r += 1;
            sheet.write_string(r, 0, sanitize_cell(&failure.doc_id))?;
            sheet.write_string(r, 1, sanitize_cell(&failure.error))?;
        }
    }

    sheet.write_string(r + 2, 0, &format!("Generated at {}", report.generated_at))?;
    sheet.set_column_width(0, 32)?;
    sheet.set_column_width(1, 40)?;
    Ok(())
}
