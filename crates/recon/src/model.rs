use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Outcome of one tag (or one of its conditions) on one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The tag produced a record.
    Matched { count: u64 },
    /// A condition's column is missing from the snapshot; the condition was ignored.
    Skipped { column: String },
    /// Every condition was skipped; no record was produced.
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub sheet_id: String,
    pub date: NaiveDate,
    pub tag: String,
    pub outcome: Outcome,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = format!("[{}@{}] {}", self.sheet_id, self.date, self.tag);
        match &self.outcome {
            Outcome::Matched { count } => write!(f, "{prefix}: matched count = {count}"),
            Outcome::Skipped { column } => {
                write!(f, "{prefix}: column '{column}' not found, condition skipped")
            }
            Outcome::Invalid => write!(f, "{prefix}: invalid query, all conditions skipped"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub table_id: String,
    pub today: NaiveDate,
    pub target_sheets: Vec<String>,
    pub changed_or_new: Vec<String>,
    pub removed: Vec<String>,
    /// Whether historical snapshots were re-evaluated.
    pub history_recomputed: bool,
    /// Records dropped because their tag was removed.
    pub purged: usize,
    /// Freshly computed records merged this run.
    pub records_written: usize,
    /// Size of the history store after the merge.
    pub total_records: usize,
    pub registry_updated: bool,
    pub diagnostics: Vec<Diagnostic>,
}
