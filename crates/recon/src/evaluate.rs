//! Filter evaluation: one filter group against one snapshot.

use tagtrend_core::{FilterGroup, HistoryRecord, SheetData, SnapshotKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// At least one condition applied. `skipped` lists columns that were
    /// missing from the snapshot and therefore ignored.
    Matched {
        record: HistoryRecord,
        skipped: Vec<String>,
    },
    /// Every condition referenced a missing column.
    Invalid { skipped: Vec<String> },
}

impl Evaluation {
    pub fn skipped(&self) -> &[String] {
        match self {
            Self::Matched { skipped, .. } | Self::Invalid { skipped } => skipped,
        }
    }

    pub fn into_record(self) -> Option<HistoryRecord> {
        match self {
            Self::Matched { record, .. } => Some(record),
            Self::Invalid { .. } => None,
        }
    }
}

/// Count the rows of `data` matched by `group`.
///
/// The row mask starts all-true and is narrowed by each condition whose
/// column exists. A group whose every condition is skipped (including a
/// group with no conditions) produces no record.
pub fn evaluate(key: &SnapshotKey, data: &SheetData, group: &FilterGroup) -> Evaluation {
    let mut visible_mask = vec![true; data.row_count()];
    let mut skipped = Vec::new();

    for cond in &group.conditions {
        let Some(col) = data.column_index(&cond.column) else {
            log::debug!(
                "{}: column '{}' not in {}@{}",
                group.tag,
                cond.column,
                key.sheet_id,
                key.date_str()
            );
            skipped.push(cond.column.clone());
            continue;
        };
        for (row, visible) in visible_mask.iter_mut().enumerate() {
            if *visible && !cond.allows(data.cell(row, col)) {
                *visible = false;
            }
        }
    }

    if skipped.len() == group.conditions.len() {
        return Evaluation::Invalid { skipped };
    }

    let matched_count = visible_mask.iter().filter(|&&v| v).count() as u64;
    Evaluation::Matched {
        record: HistoryRecord {
            table_id: key.table_id.clone(),
            sheet_id: key.sheet_id.clone(),
            date: key.date,
            tag: group.tag.clone(),
            conditions: group.conditions_map(),
            matched_count,
        },
        skipped,
    }
}
