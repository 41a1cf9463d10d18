//! NA mode: stamp a check into not-applicable cells.
//!
//! Targets come from two places: CheckTarget regions configured in the
//! preset, and cells discovered by scanning page tokens for the
//! preset's anchor pattern. A dry run draws outlines instead of marks.

use anyhow::{Context, Result};
use tracing::info;

use itr_core::annotate::{
    discover_check_anchors, mark_anchors, mark_check_targets, AnnotationSink,
};
use itr_core::split::split_document;
use itr_core::{RegionClass, RuleRegistry};
use itr_pdf::{PdfAnnotator, PdfDocument};

use crate::cli::CheckNaArgs;
use crate::paths::{self, MODE_NA_CHECK};

pub fn run(args: CheckNaArgs) -> Result<()> {
    let rules = RuleRegistry::with_builtins();
    let preset = super::load_preset(&args.preset, &rules)?;

    let batch = paths::batch_stamp();
    let out_dir = if args.dry_run {
        paths::test_dir(&args.output_root, MODE_NA_CHECK, &batch)
    } else {
        paths::filled_dir(&args.output_root, MODE_NA_CHECK, &batch)
    };
    paths::ensure_dir(&out_dir)?;

    for document in &args.documents {
        let source = PdfDocument::load(document)
            .with_context(|| format!("failed to read document: {}", document.display()))?;
        let records = split_document(
            &document.display().to_string(),
            &source,
            &preset.split_strategy(),
        );
        let anchors = match &preset.check_anchor {
            Some(pattern) => discover_check_anchors(&source, pattern),
            None => Vec::new(),
        };

        let mut annotator = PdfAnnotator::from_source(source);
        let mut marked = 0;
        if args.dry_run {
            // Outline what would be marked, in the CheckTarget color.
            for (i, (page, bounds)) in anchors.iter().enumerate() {
                annotator.draw_outline(
                    *page,
                    *bounds,
                    RegionClass::CheckTarget,
                    &format!("itr-na-test-{page}-{i}"),
                );
                marked += 1;
            }
            marked += itr_core::annotate::render_calibration(
                &mut annotator,
                &preset.preset,
                &records,
            );
        } else {
            marked += mark_anchors(&mut annotator, &anchors);
            marked += mark_check_targets(&mut annotator, &preset.preset, &records);
        }

        let out_path = out_dir.join(paths::output_name(document));
        annotator
            .save_copy(&out_path)
            .with_context(|| format!("failed to write marked copy: {}", out_path.display()))?;
        info!(
            doc = %document.display(),
            marks = marked,
            dry_run = args.dry_run,
            out = %out_path.display(),
            "NA pass written"
        );
    }

    println!(
        "{}: {}",
        if args.dry_run { "NA test renders" } else { "NA marked copies" },
        out_dir.display()
    );
    Ok(())
}
