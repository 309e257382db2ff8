//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error (unspecified)                        |
//! | 2    | CLI usage error (bad args)                         |
//! | 3    | Config missing, unparsable, or invalid             |
//! | 4    | Source unreadable, or selected sheet not found     |
//! | 5    | Snapshot cache, history, or registry I/O failed    |
//! | 6    | No snapshots available for any target sheet        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the error mapping below

use tagtrend_config::ConfigError;
use tagtrend_core::{SourceError, StoreError};
use tagtrend_recon::ReconError;

use crate::CliError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing subcommand.
pub const EXIT_USAGE: u8 = 2;

/// Config file missing, unparsable, or failing validation.
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// Source cannot be opened or read, or the selected sheet does not exist.
pub const EXIT_SOURCE: u8 = 4;

/// Persisted state (snapshots, history, registry) cannot be read or written.
pub const EXIT_STATE_IO: u8 = 5;

/// No snapshot exists for any target sheet.
pub const EXIT_NO_SNAPSHOTS: u8 = 6;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Source(_) => EXIT_SOURCE,
        ReconError::Store(_) => EXIT_STATE_IO,
        ReconError::NoFilterGroups
        | ReconError::DuplicateTag(_)
        | ReconError::DuplicateColumn { .. } => EXIT_CONFIG_INVALID,
        ReconError::NoSnapshots { .. } => EXIT_NO_SNAPSHOTS,
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Read { .. } => Some(format!(
                "create {} or pass --config <path>",
                tagtrend_config::DEFAULT_CONFIG_FILE
            )),
            _ => None,
        };
        Self { code: EXIT_CONFIG_INVALID, message: err.to_string(), hint }
    }
}

impl From<SourceError> for CliError {
    fn from(err: SourceError) -> Self {
        Self { code: EXIT_SOURCE, message: err.to_string(), hint: None }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self { code: EXIT_STATE_IO, message: err.to_string(), hint: None }
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::NoSnapshots { .. } => {
                Some("check that the snapshot cache directory is writable".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}
