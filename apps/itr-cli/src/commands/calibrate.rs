//! Calibration renders: outlined boxes for every configured region, so
//! placement can be verified before a real run. No values are written.

use anyhow::{Context, Result};
use tracing::info;

use itr_core::annotate::render_calibration;
use itr_core::split::split_document;
use itr_core::RuleRegistry;
use itr_pdf::{PdfAnnotator, PdfDocument};

use crate::cli::CalibrateArgs;
use crate::paths::{self, MODE_AUTOFILL};

pub fn run(args: CalibrateArgs) -> Result<()> {
    let rules = RuleRegistry::with_builtins();
    let preset = super::load_preset(&args.preset, &rules)?;

    let batch = paths::batch_stamp();
    let test_dir = paths::test_dir(&args.output_root, MODE_AUTOFILL, &batch);
    paths::ensure_dir(&test_dir)?;

    for document in &args.documents {
        let source = PdfDocument::load(document)
            .with_context(|| format!("failed to read document: {}", document.display()))?;
        let records = split_document(
            &document.display().to_string(),
            &source,
            &preset.split_strategy(),
        );

        let mut annotator = PdfAnnotator::from_source(source);
        let drawn = render_calibration(&mut annotator, &preset.preset, &records);

        let out_path = test_dir.join(paths::output_name(document));
        annotator
            .save_copy(&out_path)
            .with_context(|| format!("failed to write calibration copy: {}", out_path.display()))?;
        info!(doc = %document.display(), boxes = drawn, out = %out_path.display(), "calibration written");
    }

    println!("calibration renders: {}", test_dir.display());
    Ok(())
}
