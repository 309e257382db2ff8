//! History document: a JSON array of records, sorted by key.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tagtrend_core::{HistoryRecord, HistoryStore, StoreError};

use crate::atomic::write_atomic;

/// Older documents held a single record object rather than an array.
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryDocument {
    Records(Vec<HistoryRecord>),
    Single(HistoryRecord),
}

pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonHistoryStore {
    /// A document that cannot be parsed is logged and read as empty, so the
    /// next save rebuilds it from the snapshots that are still cached.
    fn load(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<HistoryDocument>(&text) {
            Ok(HistoryDocument::Records(records)) => Ok(records),
            Ok(HistoryDocument::Single(record)) => Ok(vec![record]),
            Err(e) => {
                log::warn!(
                    "history file {} is unreadable ({}); starting from empty history",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, records: &[HistoryRecord]) -> Result<(), StoreError> {
        let mut sorted = records.to_vec();
        sorted.sort_by_key(HistoryRecord::key);
        let json = serde_json::to_string_pretty(&sorted).map_err(|e| StoreError::Encode {
            what: "history",
            message: e.to_string(),
        })?;
        write_atomic(&self.path, json.as_bytes())?;
        log::debug!("history saved: {} record(s) to {}", sorted.len(), self.path.display());
        Ok(())
    }
}
