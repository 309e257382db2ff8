// File I/O: tabular sources and the persisted state of a tracking run

pub mod atomic;
pub mod csv;
pub mod history_file;
pub mod registry_file;
pub mod snapshot_dir;
pub mod xlsx;

pub use history_file::JsonHistoryStore;
pub use registry_file::TomlRegistryStore;
pub use snapshot_dir::FileSnapshotStore;
pub use xlsx::WorkbookSource;
