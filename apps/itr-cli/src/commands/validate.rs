//! Preset validation without touching any document.

use anyhow::{Context, Result};

use itr_core::{LedgerIndex, RuleRegistry};

use crate::cli::ValidateArgs;

pub fn run(args: ValidateArgs) -> Result<()> {
    let rules = RuleRegistry::with_builtins();
    let preset = super::load_preset(&args.preset, &rules)?;

    if let Some(ledger) = &args.ledger {
        let raw_rows = itr_excel::read_ledger(
            ledger,
            &preset.preset.ledger.sheet,
            preset.preset.ledger.header_row,
        )
        .with_context(|| format!("failed to read ledger: {}", ledger.display()))?;
        let index = LedgerIndex::build(raw_rows, &preset)
            .context("ledger does not fit this preset")?;
        println!("ledger ok: {} rows indexed", index.len());
    }

    println!(
        "preset ok: '{}', {} fields, {} regions",
        preset.preset.name,
        preset.preset.fields.len(),
        preset.preset.regions.len()
    );
    Ok(())
}
