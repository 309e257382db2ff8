// In-memory stores and source, for tests and embedding.

use std::collections::BTreeMap;

use crate::error::{SourceError, StoreError};
use crate::history::HistoryRecord;
use crate::signature::TagRegistry;
use crate::snapshot::{SheetData, SnapshotKey};
use crate::store::{HistoryStore, RegistryStore, SheetSource, SnapshotStore};

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: BTreeMap<SnapshotKey, SheetData>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn write_snapshot(&mut self, key: &SnapshotKey, data: &SheetData) -> Result<(), StoreError> {
        self.snapshots.insert(key.clone(), data.clone());
        Ok(())
    }

    fn list_snapshots(&self, table_id: &str, sheet_id: &str) -> Result<Vec<SnapshotKey>, StoreError> {
        // BTreeMap order is (table, sheet, date), so this is already date-sorted.
        Ok(self
            .snapshots
            .keys()
            .filter(|k| k.table_id == table_id && k.sheet_id == sheet_id)
            .cloned()
            .collect())
    }

    fn read_snapshot(&self, key: &SnapshotKey) -> Result<SheetData, StoreError> {
        self.snapshots
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::MissingSnapshot {
                table_id: key.table_id.clone(),
                sheet_id: key.sheet_id.clone(),
                date: key.date_str(),
            })
    }
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Vec<HistoryRecord>,
    /// Number of times `save` was called.
    pub saves: usize,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<HistoryRecord>) -> Self {
        Self { records, saves: 0 }
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn save(&mut self, records: &[HistoryRecord]) -> Result<(), StoreError> {
        self.records = records.to_vec();
        self.saves += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRegistryStore {
    registry: TagRegistry,
    /// Number of times `save` was called.
    pub saves: usize,
}

impl MemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }
}

impl RegistryStore for MemoryRegistryStore {
    fn load(&self) -> Result<TagRegistry, StoreError> {
        Ok(self.registry.clone())
    }

    fn save(&mut self, registry: &TagRegistry) -> Result<(), StoreError> {
        self.registry = registry.clone();
        self.saves += 1;
        Ok(())
    }
}

/// A fixed set of named sheets.
#[derive(Debug, Clone)]
pub struct MemorySource {
    table_id: String,
    sheets: Vec<(String, SheetData)>,
}

impl MemorySource {
    pub fn new(table_id: impl Into<String>) -> Self {
        Self { table_id: table_id.into(), sheets: Vec::new() }
    }

    /// Add or replace a sheet, keeping first-insertion order.
    pub fn set_sheet(&mut self, name: impl Into<String>, data: SheetData) {
        let name = name.into();
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = data,
            None => self.sheets.push((name, data)),
        }
    }

    pub fn with_sheet(mut self, name: impl Into<String>, data: SheetData) -> Self {
        self.set_sheet(name, data);
        self
    }
}

impl SheetSource for MemorySource {
    fn table_id(&self) -> &str {
        &self.table_id
    }

    fn sheet_names(&self) -> Result<Vec<String>, SourceError> {
        if self.sheets.is_empty() {
            return Err(SourceError::Empty(self.table_id.clone()));
        }
        Ok(self.sheets.iter().map(|(n, _)| n.clone()).collect())
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, SourceError> {
        self.sheets
            .iter()
            .find(|(n, _)| n == sheet)
            .map(|(_, d)| d.clone())
            .ok_or_else(|| SourceError::UnknownSheet {
                sheet: sheet.to_string(),
                available: self.sheets.iter().map(|(n, _)| n.clone()).collect(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn snapshot_overwrite_and_listing() {
        let mut store = MemorySnapshotStore::new();
        let day1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let data = |v: &str| SheetData::new(vec!["a".into()], vec![vec![v.into()]]);

        store.write_snapshot(&SnapshotKey::new("t", "s", day2), &data("x")).unwrap();
        store.write_snapshot(&SnapshotKey::new("t", "s", day1), &data("y")).unwrap();
        store.write_snapshot(&SnapshotKey::new("t", "other", day1), &data("z")).unwrap();
        store.write_snapshot(&SnapshotKey::new("t", "s", day2), &data("w")).unwrap();

        let listed = store.list_snapshots("t", "s").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].date, day1);
        assert_eq!(listed[1].date, day2);
        assert_eq!(store.read_snapshot(&listed[1]).unwrap().cell(0, 0), "w");
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let store = MemorySnapshotStore::new();
        let key = SnapshotKey::new("t", "s", NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(matches!(
            store.read_snapshot(&key),
            Err(StoreError::MissingSnapshot { .. })
        ));
    }

    #[test]
    fn source_unknown_sheet_lists_available() {
        let mut source = MemorySource::new("t").with_sheet("Orders", SheetData::default());
        let err = source.read_sheet("Nope").unwrap_err();
        assert_eq!(err.to_string(), "sheet 'Nope' not found (available: Orders)");
    }
}
