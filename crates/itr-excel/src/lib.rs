//! Excel collaborator for the ITR engine: ledger reading and report
//! writing. The core never sees a spreadsheet, only ordered raw rows in
//! and report rows out.

pub mod ledger;
pub mod report;

use thiserror::Error;

pub use ledger::read_ledger;
pub use report::write_report;

#[derive(Error, Debug)]
pub enum ExcelError {
    #[error("Failed to open workbook: {0}")]
    Open(String),

    #[error("Sheet '{0}' not found")]
    MissingSheet(String),

    #[error("Header row {0} is past the end of the sheet")]
    HeaderRowOutOfRange(u32),

    #[error("Failed to write report: {0}")]
    Write(String),
}
