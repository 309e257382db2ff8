use std::path::PathBuf;

use thiserror::Error;

/// Failure reading or writing persisted state (snapshots, history, registry).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error, with the path that was being touched.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A persisted document exists but cannot be decoded.
    #[error("{}: cannot parse: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    /// In-memory state could not be encoded for writing.
    #[error("cannot encode {what}: {message}")]
    Encode { what: &'static str, message: String },
    /// A snapshot handle refers to a snapshot that does not exist.
    #[error("no snapshot for {table_id}/{sheet_id} on {date}")]
    MissingSnapshot {
        table_id: String,
        sheet_id: String,
        date: String,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse { path: path.into(), message: message.to_string() }
    }
}

/// Failure reading the tabular source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be opened at all.
    #[error("cannot open source '{locator}': {message}")]
    Open { locator: String, message: String },
    /// The source opened but holds no sheets.
    #[error("source '{0}' contains no sheets")]
    Empty(String),
    /// The requested sheet does not exist in the source.
    #[error("sheet '{sheet}' not found (available: {})", available.join(", "))]
    UnknownSheet { sheet: String, available: Vec<String> },
    /// The sheet exists but could not be read.
    #[error("cannot read sheet '{sheet}': {message}")]
    Read { sheet: String, message: String },
}
