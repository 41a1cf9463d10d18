//! The autofill batch: split, match, resolve, write, report.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use tracing::info;

use itr_core::annotate::commit_record;
use itr_core::pipeline::{process_document, run_batch, BatchOptions, PipelineContext};
use itr_core::{DocumentError, LedgerIndex, ManualStore, RuleRegistry};
use itr_pdf::{PdfAnnotator, PdfDocument};

use crate::cli::FillArgs;
use crate::paths::{self, MODE_AUTOFILL};

pub fn run(args: FillArgs) -> Result<()> {
    let rules = RuleRegistry::with_builtins();
    let preset = super::load_preset(&args.preset, &rules)?;

    let raw_rows = itr_excel::read_ledger(
        &args.ledger,
        &preset.preset.ledger.sheet,
        preset.preset.ledger.header_row,
    )
    .with_context(|| format!("failed to read ledger: {}", args.ledger.display()))?;
    let index = LedgerIndex::build(raw_rows, &preset).context("failed to build ledger index")?;

    let manual = match &args.manual {
        Some(path) => ManualStore::load(path)
            .with_context(|| format!("failed to load manual values: {}", path.display()))?,
        None => ManualStore::new(),
    };

    let batch = paths::batch_stamp();
    let filled_dir = paths::filled_dir(&args.output_root, MODE_AUTOFILL, &batch);
    let report_path = paths::report_path(&args.report_root, MODE_AUTOFILL, &batch);
    paths::ensure_dir(&filled_dir)?;
    if let Some(parent) = report_path.parent() {
        paths::ensure_dir(parent)?;
    }

    let jobs = args.jobs.unwrap_or_else(|| {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    });
    let doc_ids: Vec<String> =
        args.documents.iter().map(|p| p.display().to_string()).collect();
    let cancel = AtomicBool::new(false);

    info!(batch = %batch, documents = doc_ids.len(), jobs, "starting autofill batch");

    let ctx = PipelineContext {
        preset: &preset,
        index: &index,
        manual: &manual,
        rules: &rules,
    };
    let report = run_batch(&doc_ids, BatchOptions { jobs }, &cancel, |doc_id, handle| {
        let path = Path::new(doc_id);
        let source = PdfDocument::load(path).map_err(DocumentError::from)?;
        let mut records = process_document(&ctx, doc_id, &source);

        // Report rows exist from here on, even if writing fails below.
        for record in &records {
            handle.append_record(record);
        }

        let mut annotator = PdfAnnotator::from_source(source);
        for record in &mut records {
            let stats = commit_record(&mut annotator, &ctx.preset.preset, record);
            if !stats.overflowed.is_empty() {
                handle.flag_overflow(doc_id, record.index);
            }
        }

        let out_path = filled_dir.join(paths::output_name(path));
        annotator.save_copy(&out_path).map_err(DocumentError::from)?;
        info!(doc = %doc_id, out = %out_path.display(), "document written");
        Ok(())
    });

    itr_excel::write_report(&report_path, &report)
        .with_context(|| format!("failed to write report: {}", report_path.display()))?;

    let summary = &report.summary;
    println!(
        "{} record sets: {} matched, {} unmatched, {} ambiguous, {} overflowed",
        summary.total_records,
        summary.matched,
        summary.unmatched,
        summary.ambiguous,
        summary.overflowed
    );
    if summary.failed_documents > 0 {
        println!("{} document(s) failed; see report", summary.failed_documents);
    }
    println!("filled: {}", filled_dir.display());
    println!("report: {}", report_path.display());
    Ok(())
}
