use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "itrfill",
    version,
    about = "ITR form autofill and NA-check tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fill ITR documents from an Excel ledger and write report.xlsx
    Fill(FillArgs),
    /// Draw calibration boxes for every configured region
    Calibrate(CalibrateArgs),
    /// Stamp check marks into not-applicable cells
    CheckNa(CheckNaArgs),
    /// Validate a preset without touching any document
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FillArgs {
    /// Preset JSON path
    #[arg(long)]
    pub preset: PathBuf,

    /// Ledger workbook (.xlsx)
    #[arg(long)]
    pub ledger: PathBuf,

    /// Manual values JSON, keyed by document path as passed on the
    /// command line
    #[arg(long)]
    pub manual: Option<PathBuf>,

    #[arg(long, default_value = "output")]
    pub output_root: PathBuf,

    #[arg(long, default_value = "report")]
    pub report_root: PathBuf,

    /// Worker threads; defaults to the available parallelism
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Source documents
    #[arg(required = true)]
    pub documents: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CalibrateArgs {
    #[arg(long)]
    pub preset: PathBuf,

    #[arg(long, default_value = "output")]
    pub output_root: PathBuf,

    #[arg(required = true)]
    pub documents: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckNaArgs {
    #[arg(long)]
    pub preset: PathBuf,

    #[arg(long, default_value = "output")]
    pub output_root: PathBuf,

    /// Draw outlines instead of check marks, for verification
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[arg(required = true)]
    pub documents: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub preset: PathBuf,

    /// Optionally verify the key column against a real ledger
    #[arg(long)]
    pub ledger: Option<PathBuf>,
}
