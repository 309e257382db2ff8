use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names plus string-normalized rows for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetData {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Index of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell value, or "" for short (ragged) rows.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Identifies one snapshot: a sheet of a table as it was on a date.
/// Ordering is by table, sheet, then date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub table_id: String,
    pub sheet_id: String,
    pub date: NaiveDate,
}

impl SnapshotKey {
    pub fn new(table_id: impl Into<String>, sheet_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            table_id: table_id.into(),
            sheet_id: sheet_id.into(),
            date,
        }
    }

    /// `YYYY-MM-DD`, lexicographically sortable.
    pub fn date_str(&self) -> String {
        self.date.format(crate::DATE_FORMAT).to_string()
    }
}
