pub mod calibrate;
pub mod check_na;
pub mod fill;
pub mod validate;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use itr_core::{CompiledPreset, Preset, RuleRegistry};

/// Load and compile a preset, failing fast before any document work.
pub fn load_preset(path: &Path, rules: &RuleRegistry) -> Result<CompiledPreset> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read preset: {}", path.display()))?;
    let preset = Preset::from_json(&json)
        .with_context(|| format!("failed to parse preset: {}", path.display()))?;
    preset
        .compile(rules)
        .with_context(|| format!("invalid preset: {}", path.display()))
}
