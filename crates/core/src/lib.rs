//! `tagtrend-core`: shared data model and persistence seams.
//!
//! Everything the reconciliation engine reads or writes goes through the
//! traits in [`store`]; file-backed implementations live in `tagtrend-io`,
//! in-memory ones in [`memory`].

pub mod error;
pub mod filter;
pub mod history;
pub mod memory;
pub mod signature;
pub mod snapshot;
pub mod store;
pub mod value;

pub use error::{SourceError, StoreError};
pub use filter::{Condition, FilterGroup};
pub use history::{HistoryKey, HistoryRecord};
pub use signature::{Signature, TagRegistry};
pub use snapshot::{SheetData, SnapshotKey};
pub use store::{HistoryStore, RegistryStore, SheetSource, SnapshotStore};

/// Date format used for snapshot keys and history records.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
