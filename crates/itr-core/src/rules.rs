//! Named pure functions usable as field sources.
//!
//! A rule sees the record set and the matched ledger row (if any) and
//! returns a value, or `None` when it cannot produce one. Rule names are
//! checked at preset compile time so a typo fails before any document is
//! processed, not mid-batch.

use std::collections::HashMap;

use crate::ledger::LedgerRow;
use crate::record::RecordSet;

type RuleFn = Box<dyn Fn(&RecordSet, Option<&LedgerRow>) -> Option<String> + Send + Sync>;

#[derive(Default)]
pub struct RuleRegistry {
    rules: HashMap<String, RuleFn>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in rules:
    /// `record-number`, `page-range`, `raw-tag`, `matched-key`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("record-number", |record, _| Some((record.index + 1).to_string()));
        registry.register("page-range", |record, _| Some(record.pages.label()));
        registry.register("raw-tag", |record, _| record.raw_key.clone());
        registry.register("matched-key", |record, _| {
            record.match_state.matched_key().map(str::to_string)
        });
        registry
    }

    pub fn register<F>(&mut self, name: &str, rule: F)
    where
        F: Fn(&RecordSet, Option<&LedgerRow>) -> Option<String> + Send + Sync + 'static,
    {
        self.rules.insert(name.to_string(), Box::new(rule));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Evaluate a rule. Unknown names return `None`, but a compiled
    /// preset never references one.
    pub fn eval(&self, name: &str, record: &RecordSet, row: Option<&LedgerRow>) -> Option<String> {
        self.rules.get(name).and_then(|rule| rule(record, row))
    }
}
