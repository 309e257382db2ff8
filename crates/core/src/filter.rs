use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One equality/set-membership test: the row's value in `column` must be
/// one of `values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub values: BTreeSet<String>,
}

impl Condition {
    pub fn new<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}

/// A named filter definition ("tag"). A row matches when every condition
/// holds. Conditions keep their definition order for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub tag: String,
    pub conditions: Vec<Condition>,
}

impl FilterGroup {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), conditions: Vec::new() }
    }

    /// Builder used by tests and the config loader. Each column may appear
    /// in one condition only; the engine rejects groups that repeat one.
    pub fn with_condition<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.push(Condition::new(column, values));
        self
    }

    /// Order-independent view of the conditions, as stored in history records.
    pub fn conditions_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for cond in &self.conditions {
            map.entry(cond.column.clone())
                .or_default()
                .extend(cond.values.iter().cloned());
        }
        map.into_iter()
            .map(|(column, values)| (column, values.into_iter().collect()))
            .collect()
    }
}
