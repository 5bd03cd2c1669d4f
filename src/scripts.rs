//! User-authored verb override scripts.
//!
//! A custom script replaces the builtin effect of one (concept, verb, target)
//! cell. The store is keyed by a sanitized triple so keys stay safe as plain
//! identifiers: `/` in a concept name (e.g. `Nothing/Everything`) becomes
//! `Or`. The exchange shape is a flat JSON object, key → source text.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One (concept, verb, target) cell, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub row: String,
    pub verb: String,
    pub col: String,
}

impl Triple {
    pub fn new(row: &str, verb: &str, col: &str) -> Self {
        Self {
            row: row.to_string(),
            verb: verb.to_string(),
            col: col.to_string(),
        }
    }

    /// Identifier-safe store key for this triple.
    pub fn key(&self) -> String {
        format!(
            "{}_{}_{}",
            sanitize_fragment(&self.row),
            sanitize_fragment(&self.verb),
            sanitize_fragment(&self.col)
        )
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} -> {}", self.row, self.verb, self.col)
    }
}

/// Make one key fragment identifier-safe.
pub fn sanitize_fragment(s: &str) -> String {
    s.replace('/', "Or")
}

/// Script source text keyed by sanitized triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptOverrideStore(pub BTreeMap<String, String>);

impl ScriptOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, triple: &Triple, source: impl Into<String>) {
        self.0.insert(triple.key(), source.into());
    }

    pub fn get(&self, triple: &Triple) -> Option<&str> {
        self.0.get(&triple.key()).map(String::as_str)
    }

    pub fn remove(&mut self, triple: &Triple) -> Option<String> {
        self.0.remove(&triple.key())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_slash_concepts() {
        let triple = Triple::new("Self", "Is Realized by", "Nothing/Everything");
        assert_eq!(triple.key(), "Self_Is Realized by_NothingOrEverything");
    }

    #[test]
    fn test_store_lookup_by_triple() {
        let mut store = ScriptOverrideStore::new();
        let triple = Triple::new("Self", "Seeks", "Unity");
        store.insert(&triple, "scene.log(\"custom\");");

        assert_eq!(store.get(&triple), Some("scene.log(\"custom\");"));
        assert_eq!(store.get(&Triple::new("Self", "Seeks", "Mastery")), None);
    }

    #[test]
    fn test_json_round_trip_preserves_mapping() {
        let mut store = ScriptOverrideStore::new();
        store.insert(&Triple::new("Self", "Seeks", "Unity"), "scene.log(\"a\");");
        store.insert(
            &Triple::new("Logic", "Is the Foundation Of", "Nothing/Everything"),
            "scene.log(\"b\");",
        );

        let json = serde_json::to_string(&store).unwrap();
        let reloaded: ScriptOverrideStore = serde_json::from_str(&json).unwrap();
        assert_eq!(store, reloaded);
    }
}
