//! Batch output layout.
//!
//! Filled copies land under `<output-root>/<mode>/filled/<batch>/`,
//! calibration/test renders under `<output-root>/<mode>/test/<batch>/`
//! and the report under `<report-root>/<mode>/<batch>/report.xlsx`,
//! where `<batch>` is a local timestamp.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const MODE_AUTOFILL: &str = "itr_autofill";
pub const MODE_NA_CHECK: &str = "na_check";

pub fn batch_stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn filled_dir(output_root: &Path, mode: &str, batch: &str) -> PathBuf {
    output_root.join(mode).join("filled").join(batch)
}

pub fn test_dir(output_root: &Path, mode: &str, batch: &str) -> PathBuf {
    output_root.join(mode).join("test").join(batch)
}

pub fn report_path(report_root: &Path, mode: &str, batch: &str) -> PathBuf {
    report_root.join(mode).join(batch).join("report.xlsx")
}

/// Output file name for a source document; falls back to a stable name
/// when the path has no file component.
pub fn output_name(document: &Path) -> String {
    document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string())
}
