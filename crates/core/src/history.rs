use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Matched-row count of one tag on one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub table_id: String,
    pub sheet_id: String,
    pub date: NaiveDate,
    pub tag: String,
    /// The tag's conditions at evaluation time.
    pub conditions: BTreeMap<String, Vec<String>>,
    pub matched_count: u64,
}

impl HistoryRecord {
    pub fn key(&self) -> HistoryKey {
        HistoryKey {
            table_id: self.table_id.clone(),
            sheet_id: self.sheet_id.clone(),
            date: self.date,
            tag: self.tag.clone(),
        }
    }
}

/// Identity of a history record. The store holds at most one record per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistoryKey {
    pub table_id: String,
    pub sheet_id: String,
    pub date: NaiveDate,
    pub tag: String,
}
