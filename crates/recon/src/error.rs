use tagtrend_core::{SourceError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// The tabular source could not be read.
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    /// Snapshot, history, or registry I/O failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// No filter groups were supplied.
    #[error("no filter groups configured")]
    NoFilterGroups,
    /// Two filter groups share a tag name.
    #[error("duplicate tag: {0}")]
    DuplicateTag(String),
    /// One filter group lists the same column in two conditions.
    #[error("tag '{tag}' has more than one condition on column '{column}'")]
    DuplicateColumn { tag: String, column: String },
    /// None of the target sheets has any snapshot.
    #[error("no snapshots found for table '{table_id}' (sheets: {})", sheets.join(", "))]
    NoSnapshots { table_id: String, sheets: Vec<String> },
}
