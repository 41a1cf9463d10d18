//! Candidate generation and ledger resolution.
//!
//! The raw identifier is normalized, then reduced once per configured
//! strip pattern, in preset priority order. The first candidate that
//! resolves to exactly one ledger row wins. A candidate that resolves to
//! several rows stops the scan with an ambiguous outcome; falling
//! through to a weaker candidate would hide a real ledger conflict.

use crate::ledger::LedgerIndex;
use crate::preset::CompiledPreset;
use crate::record::MatchState;

/// Candidate keys for a raw identifier, strongest first, deduplicated.
pub fn candidates(raw: &str, preset: &CompiledPreset) -> Vec<String> {
    let primary = preset.normalize_key(raw);
    if primary.is_empty() {
        return Vec::new();
    }

    let mut out = vec![primary.clone()];
    for strip in &preset.strip_patterns {
        let reduced = preset.normalize_key(&strip.replace_all(&primary, ""));
        if !reduced.is_empty() && !out.contains(&reduced) {
            out.push(reduced);
        }
    }
    out
}

/// Resolve a raw identifier against the ledger index.
pub fn resolve_match(raw: &str, preset: &CompiledPreset, index: &LedgerIndex) -> MatchState {
    for candidate in candidates(raw, preset) {
        let rows = index.resolve(&candidate);
        match rows.len() {
            0 => continue,
            1 => {
                return MatchState::Matched {
                    key: candidate,
                    row: rows[0].clone(),
                }
            }
            _ => {
                tracing::warn!(key = %candidate, rows = rows.len(), "ambiguous ledger key");
                return MatchState::Ambiguous {
                    key: candidate,
                    row_numbers: rows.iter().map(|r| r.row_number).collect(),
                };
            }
        }
    }
    MatchState::Unmatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerIndex, RawRow};
    use crate::preset::test_support::{basic_preset, compiled};

    fn raw_row(row_number: u32, tag: &str, model: &str) -> RawRow {
        RawRow::new(
            row_number,
            vec![
                ("Tag".to_string(), tag.to_string()),
                ("Model".to_string(), model.to_string()),
            ],
        )
    }

    #[test]
    fn test_candidates_strongest_first() {
        let preset = compiled(basic_preset());
        assert_eq!(
            candidates("627-30-skt-01-Ex", &preset),
            vec!["627-30-SKT-01-EX".to_string(), "627-30-SKT-01".to_string()]
        );
    }

    #[test]
    fn test_candidates_skip_noop_strips() {
        let preset = compiled(basic_preset());
        assert_eq!(candidates("627-30-SKT-01", &preset), vec!["627-30-SKT-01".to_string()]);
    }

    #[test]
    fn test_suffix_tolerant_match() {
        // Ledger holds the stripped form; the document carries a
        // trailing qualifier and different casing.
        let preset = compiled(basic_preset());
        let index = LedgerIndex::build(vec![raw_row(2, "627-30-SKT-01", "X200")], &preset).unwrap();

        let state = resolve_match("627-30-skt-01-Ex", &preset, &index);
        assert_eq!(state.matched_key(), Some("627-30-SKT-01"));
        assert_eq!(state.matched_row().unwrap().get("MODEL"), Some("X200"));
    }

    #[test]
    fn test_exact_match_beats_stripped() {
        let preset = compiled(basic_preset());
        let index = LedgerIndex::build(
            vec![raw_row(2, "A-1-EX", "exact"), raw_row(3, "A-1", "stripped")],
            &preset,
        )
        .unwrap();

        let state = resolve_match("a-1-ex", &preset, &index);
        assert_eq!(state.matched_row().unwrap().get("MODEL"), Some("exact"));
    }

    #[test]
    fn test_duplicate_key_is_ambiguous_not_picked() {
        let preset = compiled(basic_preset());
        let index = LedgerIndex::build(
            vec![raw_row(2, "A-1", "X"), raw_row(7, "a-1 ", "Y")],
            &preset,
        )
        .unwrap();

        match resolve_match("A-1", &preset, &index) {
            MatchState::Ambiguous { key, row_numbers } => {
                assert_eq!(key, "A-1");
                assert_eq!(row_numbers, vec![2, 7]);
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_ambiguity_does_not_fall_through() {
        // The primary candidate collides; a weaker candidate would match
        // uniquely but must not be consulted.
        let preset = compiled(basic_preset());
        let index = LedgerIndex::build(
            vec![
                raw_row(2, "A-1-EX", "X"),
                raw_row(3, "A-1-EX", "Y"),
                raw_row(4, "A-1", "Z"),
            ],
            &preset,
        )
        .unwrap();

        assert!(resolve_match("A-1-EX", &preset, &index).is_ambiguous());
    }

    #[test]
    fn test_unmatched() {
        let preset = compiled(basic_preset());
        let index = LedgerIndex::build(vec![raw_row(2, "B-9", "X")], &preset).unwrap();
        assert_eq!(resolve_match("A-1", &preset, &index), MatchState::Unmatched);
    }
}
