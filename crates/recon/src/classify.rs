//! Tag signature tracking: compare the configured filter groups against the
//! registry written by the last run.

use std::collections::BTreeSet;

use serde::Serialize;
use tagtrend_core::{FilterGroup, Signature, TagRegistry};

/// Per-tag classification relative to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagStatus {
    /// Same tag name and conditions as last run.
    Unchanged,
    /// Brand-new tag, renamed tag, or edited conditions.
    NewOrChanged,
}

impl std::fmt::Display for TagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::NewOrChanged => write!(f, "new_or_changed"),
        }
    }
}

pub fn tag_status(group: &FilterGroup, last: &TagRegistry) -> TagStatus {
    if last.contains(&Signature::of(group)) {
        TagStatus::Unchanged
    } else {
        TagStatus::NewOrChanged
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagChanges {
    /// Tags whose exact tag+conditions pair was not seen last run.
    pub changed_or_new: BTreeSet<String>,
    /// Tag names present last run and absent now.
    pub removed: BTreeSet<String>,
    /// Registry signatures with no current counterpart. Every edit or
    /// rename produces one; informational only.
    pub orphaned_signatures: usize,
}

impl TagChanges {
    /// Whether historical snapshots must be re-evaluated.
    pub fn needs_history(&self) -> bool {
        !self.changed_or_new.is_empty()
    }

    /// Whether the registry no longer describes the configured tags.
    pub fn registry_stale(&self) -> bool {
        self.needs_history() || !self.removed.is_empty() || self.orphaned_signatures > 0
    }
}

/// Classify `groups` against `last`.
///
/// A tag is new-or-changed iff its signature is absent from the registry.
/// A tag is removed iff its name appears in the registry and in no current
/// group.
pub fn classify(groups: &[FilterGroup], last: &TagRegistry) -> TagChanges {
    let current: BTreeSet<Signature> = groups.iter().map(Signature::of).collect();

    let changed_or_new = groups
        .iter()
        .filter(|g| tag_status(g, last) == TagStatus::NewOrChanged)
        .map(|g| g.tag.clone())
        .collect();

    let present: BTreeSet<&str> = groups.iter().map(|g| g.tag.as_str()).collect();
    let removed = last
        .tag_names()
        .into_iter()
        .filter(|name| !present.contains(name))
        .map(str::to_string)
        .collect();

    let orphaned_signatures = last.signatures().filter(|s| !current.contains(*s)).count();

    TagChanges {
        changed_or_new,
        removed,
        orphaned_signatures,
    }
}
