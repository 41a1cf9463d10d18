//! Per-field value resolution.

use crate::manual::ManualStore;
use crate::normalize::normalize_header;
use crate::preset::{FieldSource, Preset};
use crate::record::{FieldOutcome, FieldStatus, RecordSet};
use crate::region;
use crate::rules::RuleRegistry;

/// Resolve every configured field of a record set, in preset order.
///
/// A previously captured manual value survives a re-resolve untouched
/// unless `reset_manual` is set; everything else is recomputed from
/// scratch.
pub fn resolve_fields(
    preset: &Preset,
    manual: &ManualStore,
    rules: &RuleRegistry,
    record: &mut RecordSet,
    reset_manual: bool,
) {
    let mut outcomes = Vec::with_capacity(preset.fields.len());

    for mapping in &preset.fields {
        let outcome = match &mapping.source {
            FieldSource::Ledger { column } => {
                let normalized_column = normalize_header(column);
                match record
                    .match_state
                    .matched_row()
                    .and_then(|row| row.get(&normalized_column))
                {
                    Some(value) => FieldOutcome::resolved(&mapping.name, value),
                    // Unmatched record or missing column: explicitly
                    // unresolved, never a silent blank.
                    None => FieldOutcome::with_status(&mapping.name, FieldStatus::Unresolved),
                }
            }
            FieldSource::Manual => {
                let kept = (!reset_manual)
                    .then(|| {
                        record.fields.iter().find(|f| {
                            f.field == mapping.name && f.from_manual && f.value.is_some()
                        })
                    })
                    .flatten();
                match kept {
                    Some(previous) => previous.clone(),
                    None => match manual.get(&record.doc_id, record.index, &mapping.name) {
                        Some(value) => {
                            let mut outcome = FieldOutcome::resolved(&mapping.name, value);
                            outcome.from_manual = true;
                            outcome
                        }
                        None => {
                            FieldOutcome::with_status(&mapping.name, FieldStatus::ManualPending)
                        }
                    },
                }
            }
            FieldSource::Const { value } => FieldOutcome::resolved(&mapping.name, value),
            FieldSource::Rule { rule } => {
                match rules.eval(rule, record, record.match_state.matched_row()) {
                    Some(value) => FieldOutcome::resolved(&mapping.name, value),
                    None => FieldOutcome::with_status(&mapping.name, FieldStatus::Unresolved),
                }
            }
        };
        outcomes.push(outcome);
    }

    record.fields = outcomes;
}

/// Demote resolved fields that have nowhere to go.
///
/// Runs after resolution so the report can distinguish "no value" from
/// "value with no region". Other fields keep writing; a missing region
/// never blocks its siblings.
pub fn apply_region_status(preset: &Preset, record: &mut RecordSet) {
    let pages = record.pages;
    for outcome in &mut record.fields {
        if outcome.status == FieldStatus::Resolved
            && region::locate(&preset.regions, &outcome.field, pages).is_none()
        {
            outcome.status = FieldStatus::SkippedNoRegion;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerIndex, RawRow};
    use crate::matcher::resolve_match;
    use crate::preset::test_support::{basic_preset, compiled};
    use crate::preset::FieldMapping;
    use crate::record::{PageRange, RecordSet};

    fn matched_record(preset: &crate::preset::CompiledPreset) -> RecordSet {
        let index = LedgerIndex::build(
            vec![RawRow::new(
                2,
                vec![
                    ("Tag".to_string(), "A-1".to_string()),
                    ("Model".to_string(), "X200".to_string()),
                ],
            )],
            preset,
        )
        .unwrap();
        let mut record = RecordSet::new("doc.pdf", 0, PageRange::new(0, 1), false);
        record.raw_key = Some("a-1".to_string());
        record.match_state = resolve_match("a-1", preset, &index);
        record
    }

    #[test]
    fn test_ledger_field_resolves_from_matched_row() {
        let preset = compiled(basic_preset());
        let mut record = matched_record(&preset);
        resolve_fields(&preset.preset, &ManualStore::new(), &RuleRegistry::with_builtins(), &mut record, false);

        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.fields[0].status, FieldStatus::Resolved);
        assert_eq!(record.fields[0].value.as_deref(), Some("X200"));
    }

    #[test]
    fn test_ledger_field_unresolved_when_unmatched() {
        let preset = compiled(basic_preset());
        let mut record = RecordSet::new("doc.pdf", 0, PageRange::new(0, 1), false);
        resolve_fields(&preset.preset, &ManualStore::new(), &RuleRegistry::with_builtins(), &mut record, false);

        assert_eq!(record.fields[0].status, FieldStatus::Unresolved);
        assert_eq!(record.fields[0].value, None);
    }

    #[test]
    fn test_ledger_field_unresolved_on_missing_column() {
        let mut preset = basic_preset();
        preset.fields[0].source = crate::preset::FieldSource::Ledger {
            column: "No Such Column".to_string(),
        };
        let preset = compiled(preset);
        let mut record = matched_record(&preset);
        resolve_fields(&preset.preset, &ManualStore::new(), &RuleRegistry::with_builtins(), &mut record, false);

        assert_eq!(record.fields[0].status, FieldStatus::Unresolved);
    }

    #[test]
    fn test_const_empty_string_is_resolved() {
        let mut preset = basic_preset();
        preset.fields = vec![FieldMapping {
            name: "REMARK".to_string(),
            source: FieldSource::Const {
                value: String::new(),
            },
        }];
        let preset = compiled(preset);
        let mut record = RecordSet::new("doc.pdf", 0, PageRange::new(0, 1), false);
        resolve_fields(&preset.preset, &ManualStore::new(), &RuleRegistry::with_builtins(), &mut record, false);

        assert_eq!(record.fields[0].status, FieldStatus::Resolved);
        assert_eq!(record.fields[0].value.as_deref(), Some(""));
    }

    #[test]
    fn test_manual_pending_then_filled() {
        let mut preset = basic_preset();
        preset.fields = vec![FieldMapping {
            name: "SERIAL".to_string(),
            source: FieldSource::Manual,
        }];
        let preset = compiled(preset);
        let rules = RuleRegistry::with_builtins();

        let mut record = RecordSet::new("doc.pdf", 0, PageRange::new(0, 1), false);
        resolve_fields(&preset.preset, &ManualStore::new(), &rules, &mut record, false);
        assert_eq!(record.fields[0].status, FieldStatus::ManualPending);

        let mut store = ManualStore::new();
        store.set("doc.pdf", 0, "SERIAL", "SN-7");
        resolve_fields(&preset.preset, &store, &rules, &mut record, false);
        assert_eq!(record.fields[0].value.as_deref(), Some("SN-7"));
        assert!(record.fields[0].from_manual);
    }

    #[test]
    fn test_manual_value_survives_re_resolve() {
        let mut preset = basic_preset();
        preset.fields = vec![FieldMapping {
            name: "SERIAL".to_string(),
            source: FieldSource::Manual,
        }];
        let preset = compiled(preset);
        let rules = RuleRegistry::with_builtins();

        let mut first = ManualStore::new();
        first.set("doc.pdf", 0, "SERIAL", "SN-7");
        let mut record = RecordSet::new("doc.pdf", 0, PageRange::new(0, 1), false);
        resolve_fields(&preset.preset, &first, &rules, &mut record, false);

        // Re-resolve against an empty store: the captured value stays.
        resolve_fields(&preset.preset, &ManualStore::new(), &rules, &mut record, false);
        assert_eq!(record.fields[0].value.as_deref(), Some("SN-7"));

        // Unless a reset is explicitly requested.
        resolve_fields(&preset.preset, &ManualStore::new(), &rules, &mut record, true);
        assert_eq!(record.fields[0].status, FieldStatus::ManualPending);
    }

    #[test]
    fn test_rule_field_resolves() {
        let mut preset = basic_preset();
        preset.fields = vec![FieldMapping {
            name: "SEQ".to_string(),
            source: FieldSource::Rule {
                rule: "record-number".to_string(),
            },
        }];
        let preset = compiled(preset);
        let mut record = RecordSet::new("doc.pdf", 4, PageRange::new(8, 9), false);
        resolve_fields(&preset.preset, &ManualStore::new(), &RuleRegistry::with_builtins(), &mut record, false);

        assert_eq!(record.fields[0].value.as_deref(), Some("5"));
    }

    #[test]
    fn test_region_status_demotes_resolved_without_region() {
        let mut preset = basic_preset();
        preset.fields.push(FieldMapping {
            name: "NOWHERE".to_string(),
            source: FieldSource::Const {
                value: "x".to_string(),
            },
        });
        let preset = compiled(preset);
        let mut record = matched_record(&preset);
        resolve_fields(&preset.preset, &ManualStore::new(), &RuleRegistry::with_builtins(), &mut record, false);
        apply_region_status(&preset.preset, &mut record);

        assert_eq!(record.fields[0].status, FieldStatus::Resolved);
        assert_eq!(record.fields[1].status, FieldStatus::SkippedNoRegion);
        // The value itself is kept for the report's benefit.
        assert_eq!(record.fields[1].value.as_deref(), Some("x"));
    }
}
