//! Pre-populated manual field values.
//!
//! The core never solicits input mid-run. Human-corrected values (a
//! serial number read off the unit, say) are captured ahead of a run and
//! read from this store, keyed by document id, record index and field
//! name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// document id -> record index -> field name -> value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManualStore {
    entries: BTreeMap<String, BTreeMap<usize, BTreeMap<String, String>>>,
}

impl ManualStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::ManualValues(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&json)
            .map_err(|e| ConfigError::ManualValues(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ManualValues(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| ConfigError::ManualValues(format!("{}: {e}", path.display())))
    }

    pub fn get(&self, doc_id: &str, record_index: usize, field: &str) -> Option<&str> {
        self.entries
            .get(doc_id)?
            .get(&record_index)?
            .get(field)
            .map(String::as_str)
    }

    pub fn set(
        &mut self,
        doc_id: impl Into<String>,
        record_index: usize,
        field: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.entries
            .entry(doc_id.into())
            .or_default()
            .entry(record_index)
            .or_default()
            .insert(field.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_absent() {
        let store = ManualStore::new();
        assert_eq!(store.get("doc", 0, "SERIAL"), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut store = ManualStore::new();
        store.set("doc.pdf", 3, "SERIAL", "SN-0042");
        assert_eq!(store.get("doc.pdf", 3, "SERIAL"), Some("SN-0042"));
        assert_eq!(store.get("doc.pdf", 2, "SERIAL"), None);
        assert_eq!(store.get("other.pdf", 3, "SERIAL"), None);
    }

    #[test]
    fn test_json_round_trip() {
        let mut store = ManualStore::new();
        store.set("a.pdf", 0, "SERIAL", "SN-1");
        store.set("a.pdf", 1, "REMARK", "replaced");

        let json = serde_json::to_string(&store).unwrap();
        let back: ManualStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("a.pdf", 0, "SERIAL"), Some("SN-1"));
        assert_eq!(back.get("a.pdf", 1, "REMARK"), Some("replaced"));
    }
}
