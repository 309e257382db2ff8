//! Persistence and source seams injected into the reconciliation engine.
//!
//! None of these are safe to share between concurrent runs; a run owns
//! its stores exclusively from start to finish.

use crate::error::{SourceError, StoreError};
use crate::history::HistoryRecord;
use crate::signature::TagRegistry;
use crate::snapshot::{SheetData, SnapshotKey};

/// Dated, immutable copies of sheet data.
pub trait SnapshotStore {
    /// Write (or overwrite) the snapshot for `key`.
    fn write_snapshot(&mut self, key: &SnapshotKey, data: &SheetData) -> Result<(), StoreError>;

    /// All snapshots of one sheet, sorted by date ascending.
    fn list_snapshots(&self, table_id: &str, sheet_id: &str) -> Result<Vec<SnapshotKey>, StoreError>;

    fn read_snapshot(&self, key: &SnapshotKey) -> Result<SheetData, StoreError>;
}

/// The full set of history records, read and written as a whole.
pub trait HistoryStore {
    /// Load every record. Implementations decide how to recover from a
    /// corrupt backing document; an absent one is an empty store.
    fn load(&self) -> Result<Vec<HistoryRecord>, StoreError>;

    /// Replace the stored set with `records`. Must not leave a partially
    /// written store behind on failure.
    fn save(&mut self, records: &[HistoryRecord]) -> Result<(), StoreError>;
}

/// The last run's signature -> tag mapping.
pub trait RegistryStore {
    /// An absent registry is an empty one.
    fn load(&self) -> Result<TagRegistry, StoreError>;

    fn save(&mut self, registry: &TagRegistry) -> Result<(), StoreError>;
}

/// The tabular source being tracked.
pub trait SheetSource {
    /// Identifier of the table (workbook) the sheets belong to.
    fn table_id(&self) -> &str;

    /// Sheet names in source order.
    fn sheet_names(&self) -> Result<Vec<String>, SourceError>;

    /// Read one sheet with every cell normalized to a string.
    fn read_sheet(&mut self, sheet: &str) -> Result<SheetData, SourceError>;
}
