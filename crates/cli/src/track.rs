//! `tagtrend run`, `tagtrend validate`, `tagtrend signatures`.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tagtrend_config::Config;
use tagtrend_core::{RegistryStore, SheetSource, Signature, SnapshotStore, SourceError};
use tagtrend_io::{FileSnapshotStore, JsonHistoryStore, TomlRegistryStore, WorkbookSource};
use tagtrend_recon::{classify, tag_status, RunOptions, Stores, TagStatus};

use crate::exit_codes::EXIT_USAGE;
use crate::{local_today, print_json, CliError};

pub fn cmd_run(
    config_path: &Path,
    date: Option<NaiveDate>,
    sheet: Option<String>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = Config::load(config_path)?;
    let today = date.unwrap_or_else(local_today);

    let mut source = WorkbookSource::open(&config.source)?;
    let mut snapshots = FileSnapshotStore::new(&config.state.cache_dir);
    let mut history = JsonHistoryStore::new(&config.state.history_file);
    let mut registry = TomlRegistryStore::new(&config.state.registry_file);

    let sheet = sheet.or(config.sheet.clone());
    if today < local_today() {
        refuse_past_overwrite(&source, &snapshots, sheet.as_deref(), today)?;
    }

    let mut options = RunOptions::new(today);
    if let Some(sheet) = sheet {
        options = options.with_sheet(sheet);
    }

    let report = tagtrend_recon::run(
        &config.filter_groups,
        &mut source,
        Stores {
            snapshots: &mut snapshots,
            history: &mut history,
            registry: &mut registry,
        },
        &options,
    )?;

    for diagnostic in &report.diagnostics {
        eprintln!("{diagnostic}");
    }
    if json_output {
        print_json(&report)?;
    }
    eprintln!("wrote {} record(s)", report.records_written);
    Ok(())
}

/// A backdated run may fill a missing day but never replace a cached one.
fn refuse_past_overwrite(
    source: &WorkbookSource,
    snapshots: &FileSnapshotStore,
    sheet: Option<&str>,
    date: NaiveDate,
) -> Result<(), CliError> {
    let targets = match sheet {
        Some(sheet) => vec![sheet.to_string()],
        None => source.sheet_names()?,
    };
    for sheet in &targets {
        let cached = snapshots.list_snapshots(source.table_id(), sheet)?;
        if cached.iter().any(|key| key.date == date) {
            return Err(CliError {
                code: EXIT_USAGE,
                message: format!(
                    "snapshot of '{sheet}' for {} already exists; past snapshots are immutable",
                    date.format(tagtrend_core::DATE_FORMAT)
                ),
                hint: Some("omit --date to refresh today's snapshot".to_string()),
            });
        }
    }
    Ok(())
}

pub fn cmd_validate(config_path: &Path) -> Result<(), CliError> {
    let config = Config::load(config_path)?;
    let source = WorkbookSource::open(&config.source)?;
    let available = source.sheet_names()?;

    let targets = match &config.sheet {
        Some(sheet) if !available.contains(sheet) => {
            return Err(SourceError::UnknownSheet { sheet: sheet.clone(), available }.into());
        }
        Some(sheet) => vec![sheet.clone()],
        None => available,
    };

    eprintln!(
        "valid: {} filter group(s) over '{}' (sheets: {})",
        config.filter_groups.len(),
        source.table_id(),
        targets.join(", "),
    );
    Ok(())
}

#[derive(Serialize)]
struct SignatureRow {
    tag: String,
    signature: Signature,
    status: TagStatus,
}

#[derive(Serialize)]
struct SignatureListing {
    tags: Vec<SignatureRow>,
    removed: Vec<String>,
}

/// Classify the configured tags against the stored registry without running.
pub fn cmd_signatures(config_path: &Path, json_output: bool) -> Result<(), CliError> {
    let config = Config::load(config_path)?;
    let registry = TomlRegistryStore::new(&config.state.registry_file).load()?;
    let changes = classify(&config.filter_groups, &registry);

    let listing = SignatureListing {
        tags: config
            .filter_groups
            .iter()
            .map(|group| SignatureRow {
                tag: group.tag.clone(),
                signature: Signature::of(group),
                status: tag_status(group, &registry),
            })
            .collect(),
        removed: changes.removed.into_iter().collect(),
    };

    if json_output {
        return print_json(&listing);
    }

    for row in &listing.tags {
        println!("{:<15} {}  {}", row.status.to_string(), row.signature, row.tag);
    }
    for tag in &listing.removed {
        println!("{:<15} {:<64}  {}", "removed", "-", tag);
    }
    Ok(())
}
