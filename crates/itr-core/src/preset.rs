//! Preset schema and compile-time validation.
//!
//! A preset is authored as JSON and deserialized as-is; [`Preset::compile`]
//! turns it into a [`CompiledPreset`] with every pattern built and every
//! reference checked. An invalid preset is a fatal [`ConfigError`], never
//! silently patched.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::normalize::{normalize_key, normalize_key_collapsed};
use crate::region::RegionTemplate;
use crate::rules::RuleRegistry;

/// Where a field's value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSource {
    /// Ledger column, named as written in the spreadsheet header.
    Ledger { column: String },
    /// Captured per record set in the manual-value store before a run.
    Manual,
    /// Fixed literal, possibly empty.
    Const { value: String },
    /// Named pure function from the rule registry.
    Rule { rule: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    pub name: String,
    #[serde(flatten)]
    pub source: FieldSource,
}

/// Where the ledger's headers and identifier column live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    pub sheet: String,
    /// 1-based row holding the column headers.
    pub header_row: u32,
    /// Header of the identifier column, as written in the spreadsheet.
    pub key_column: String,
}

/// How pages group into record sets. Exactly one of the two must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordStrategy {
    #[serde(default)]
    pub pages_per_set: Option<usize>,
    #[serde(default)]
    pub marker_pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSettings {
    #[serde(default = "TextSettings::default_font_size")]
    pub font_size: f64,
    #[serde(default = "TextSettings::default_min_font_size")]
    pub min_font_size: f64,
}

impl TextSettings {
    fn default_font_size() -> f64 {
        9.0
    }

    fn default_min_font_size() -> f64 {
        5.0
    }
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            font_size: Self::default_font_size(),
            min_font_size: Self::default_min_font_size(),
        }
    }
}

/// Immutable run configuration, straight from the preset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub ledger: LedgerSettings,
    pub record: RecordStrategy,
    /// Regex extracting the raw identifier from record text. Capture
    /// group 1 wins when present, otherwise the whole match.
    pub key_pattern: String,
    /// Candidate-reduction patterns, in priority order. Each produces at
    /// most one reduced candidate by deleting its matches from the
    /// normalized key.
    #[serde(default)]
    pub key_strip_patterns: Vec<String>,
    /// Collapse internal whitespace runs when normalizing keys.
    #[serde(default)]
    pub collapse_key_whitespace: bool,
    pub fields: Vec<FieldMapping>,
    #[serde(default)]
    pub regions: BTreeMap<String, RegionTemplate>,
    /// NA mode: token pattern marking a not-applicable cell.
    #[serde(default)]
    pub check_anchor_pattern: Option<String>,
    #[serde(default)]
    pub text: TextSettings,
}

impl Preset {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate everything that can fail and build the regexes.
    pub fn compile(self, rules: &RuleRegistry) -> Result<CompiledPreset, ConfigError> {
        if self.fields.is_empty() {
            return Err(ConfigError::NoFields);
        }

        let mut seen = HashSet::new();
        for mapping in &self.fields {
            if !seen.insert(mapping.name.as_str()) {
                return Err(ConfigError::DuplicateField(mapping.name.clone()));
            }
            if let FieldSource::Rule { rule } = &mapping.source {
                if !rules.contains(rule) {
                    return Err(ConfigError::UnknownRule(rule.clone()));
                }
            }
        }

        match (&self.record.pages_per_set, &self.record.marker_pattern) {
            (Some(0), _) => return Err(ConfigError::ZeroRecordPages),
            (Some(_), None) | (None, Some(_)) => {}
            _ => return Err(ConfigError::BadRecordStrategy),
        }

        for (field, template) in &self.regions {
            if template.bounds.is_empty() {
                return Err(ConfigError::EmptyRegionBox(field.clone()));
            }
        }

        if self.text.min_font_size > self.text.font_size {
            return Err(ConfigError::BadFontSizes {
                min: self.text.min_font_size,
                default: self.text.font_size,
            });
        }

        let key_pattern = compile_pattern("key", &self.key_pattern)?;
        let strip_patterns = self
            .key_strip_patterns
            .iter()
            .map(|p| compile_pattern("key strip", p))
            .collect::<Result<Vec<_>, _>>()?;
        let marker_pattern = self
            .record
            .marker_pattern
            .as_deref()
            .map(|p| compile_pattern("record marker", p))
            .transpose()?;
        let check_anchor = self
            .check_anchor_pattern
            .as_deref()
            .map(|p| compile_pattern("check anchor", p))
            .transpose()?;

        Ok(CompiledPreset {
            preset: self,
            key_pattern,
            strip_patterns,
            marker_pattern,
            check_anchor,
        })
    }
}

fn compile_pattern(what: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::BadPattern { what, source })
}

/// A validated preset with every pattern ready to run.
#[derive(Debug)]
pub struct CompiledPreset {
    pub preset: Preset,
    pub key_pattern: Regex,
    pub strip_patterns: Vec<Regex>,
    pub marker_pattern: Option<Regex>,
    pub check_anchor: Option<Regex>,
}

impl CompiledPreset {
    /// Key normalization as configured: case-folded and trimmed, with
    /// internal whitespace optionally collapsed.
    pub fn normalize_key(&self, raw: &str) -> String {
        if self.preset.collapse_key_whitespace {
            normalize_key_collapsed(raw)
        } else {
            normalize_key(raw)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::geom::BoundingBox;
    use crate::region::RegionClass;

    /// A two-pages-per-set preset with a MODEL ledger field on page 0,
    /// used across module tests.
    pub fn basic_preset() -> Preset {
        let mut regions = BTreeMap::new();
        regions.insert(
            "MODEL".to_string(),
            RegionTemplate {
                page: 0,
                bounds: BoundingBox::new(100.0, 700.0, 260.0, 718.0),
                class: RegionClass::Field,
            },
        );
        Preset {
            name: "basic".to_string(),
            ledger: LedgerSettings {
                sheet: "Sheet1".to_string(),
                header_row: 1,
                key_column: "Tag".to_string(),
            },
            record: RecordStrategy {
                pages_per_set: Some(2),
                marker_pattern: None,
            },
            key_pattern: r"TAG:\s*(\S+)".to_string(),
            key_strip_patterns: vec![r"-EX$".to_string()],
            collapse_key_whitespace: false,
            fields: vec![FieldMapping {
                name: "MODEL".to_string(),
                source: FieldSource::Ledger {
                    column: "Model".to_string(),
                },
            }],
            regions,
            check_anchor_pattern: None,
            text: TextSettings::default(),
        }
    }

    pub fn compiled(preset: Preset) -> CompiledPreset {
        preset
            .compile(&crate::rules::RuleRegistry::with_builtins())
            .expect("test preset compiles")
    }
}
