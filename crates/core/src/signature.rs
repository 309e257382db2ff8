//! Content-addressed fingerprints of filter definitions, and the registry
//! of fingerprints recorded by the previous run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::filter::FilterGroup;

/// SHA-256 hex digest of a tag name plus its canonicalized conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Fingerprint `group`. Column order and value order do not matter;
    /// renaming the tag or editing any condition changes the result.
    pub fn of(group: &FilterGroup) -> Self {
        let content = format!("{}:{}", group.tag, canonical_conditions(group));
        Self(format!("{:x}", Sha256::digest(content.as_bytes())))
    }

    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{"col": ["a", "b"], ...}` with sorted keys and sorted value arrays.
fn canonical_conditions(group: &FilterGroup) -> String {
    let mut object = serde_json::Map::new();
    for (column, values) in group.conditions_map() {
        let values = values.into_iter().map(serde_json::Value::String).collect();
        object.insert(column, serde_json::Value::Array(values));
    }
    serde_json::Value::Object(object).to_string()
}

/// Persisted `signature -> tag name` mapping describing the last run's tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagRegistry {
    entries: BTreeMap<Signature, String>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry describing exactly `groups`.
    pub fn from_groups(groups: &[FilterGroup]) -> Self {
        let entries = groups
            .iter()
            .map(|g| (Signature::of(g), g.tag.clone()))
            .collect();
        Self { entries }
    }

    pub fn insert(&mut self, signature: Signature, tag: impl Into<String>) {
        self.entries.insert(signature, tag.into());
    }

    pub fn contains(&self, signature: &Signature) -> bool {
        self.entries.contains_key(signature)
    }

    pub fn tag_names(&self) -> BTreeSet<&str> {
        self.entries.values().map(String::as_str).collect()
    }

    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Signature, &str)> {
        self.entries.iter().map(|(s, t)| (s, t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
