use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tagtrend_core::{
    FilterGroup, HistoryKey, HistoryRecord, HistoryStore, RegistryStore, SheetSource, SnapshotKey,
    SnapshotStore, TagRegistry,
};

use crate::classify::{classify, TagChanges};
use crate::error::ReconError;
use crate::evaluate::{evaluate, Evaluation};
use crate::model::{Diagnostic, Outcome, RunReport};

/// Store handles a run reads from and commits to.
pub struct Stores<'a> {
    pub snapshots: &'a mut dyn SnapshotStore,
    pub history: &'a mut dyn HistoryStore,
    pub registry: &'a mut dyn RegistryStore,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Sheet to track; `None` tracks every sheet in the source.
    pub sheet: Option<String>,
    /// The date today's snapshot and records are filed under.
    pub today: NaiveDate,
}

impl RunOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self { sheet: None, today }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        let sheet = sheet.into();
        self.sheet = if sheet.is_empty() { None } else { Some(sheet) };
        self
    }
}

/// Run one reconciliation pass.
///
/// Refreshes today's snapshot of every target sheet, classifies the filter
/// groups against the registry, recomputes today's records for all tags and
/// historical records for new or changed tags, purges removed tags, and
/// commits the merged history (then the registry, if any tag was added,
/// changed, or removed).
/// Nothing is committed to the history or registry unless every step
/// before the commit succeeded.
pub fn run(
    groups: &[FilterGroup],
    source: &mut dyn SheetSource,
    stores: Stores<'_>,
    options: &RunOptions,
) -> Result<RunReport, ReconError> {
    check_groups(groups)?;

    let table_id = source.table_id().to_string();
    let today = options.today;

    // Refresh: read every target sheet before writing any snapshot, so a
    // sheet that fails to read leaves the cache untouched.
    let target_sheets = match &options.sheet {
        Some(sheet) => vec![sheet.clone()],
        None => source.sheet_names()?,
    };
    let mut refreshed = Vec::with_capacity(target_sheets.len());
    for sheet in &target_sheets {
        refreshed.push((SnapshotKey::new(&table_id, sheet, today), source.read_sheet(sheet)?));
    }
    for (key, data) in &refreshed {
        stores.snapshots.write_snapshot(key, data)?;
        log::info!(
            "refreshed snapshot {}/{}@{} ({} rows)",
            key.table_id,
            key.sheet_id,
            key.date_str(),
            data.row_count()
        );
    }
    drop(refreshed);

    // Classify
    let last = stores.registry.load()?;
    let changes = classify(groups, &last);
    log_changes(&changes);

    // Removal purge
    let mut history = stores.history.load()?;
    let purged = purge_removed(&mut history, &changes.removed);

    // Evaluate
    let mut snapshots: BTreeMap<&str, Vec<SnapshotKey>> = BTreeMap::new();
    for sheet in &target_sheets {
        let keys = stores.snapshots.list_snapshots(&table_id, sheet)?;
        if !keys.is_empty() {
            snapshots.insert(sheet.as_str(), keys);
        }
    }
    if snapshots.is_empty() {
        return Err(ReconError::NoSnapshots {
            table_id,
            sheets: target_sheets,
        });
    }

    let mut evaluator = Evaluator::new(&*stores.snapshots);
    evaluator.compute_today(&snapshots, groups, today)?;
    if changes.needs_history() {
        log::info!("recomputing history for {} tag(s)", changes.changed_or_new.len());
        let changed: Vec<&FilterGroup> = groups
            .iter()
            .filter(|g| changes.changed_or_new.contains(&g.tag))
            .collect();
        evaluator.compute_history(&snapshots, &changed, today)?;
    } else {
        log::info!("no new or changed tags, computing today only");
    }
    let Evaluator { fresh, diagnostics, .. } = evaluator;

    // Merge
    let scope = MergeScope {
        table_id: &table_id,
        target_sheets: target_sheets.iter().map(String::as_str).collect(),
        current_tags: groups.iter().map(|g| g.tag.as_str()).collect(),
        changed_or_new: &changes.changed_or_new,
        today,
    };
    let records_written = fresh.len();
    let merged = merge(history, fresh, &scope);
    let total_records = merged.len();
    stores.history.save(&merged)?;

    // Registry update
    let history_recomputed = changes.needs_history();
    let registry_updated = changes.registry_stale();
    if registry_updated {
        stores.registry.save(&TagRegistry::from_groups(groups))?;
    }

    Ok(RunReport {
        table_id,
        today,
        target_sheets,
        changed_or_new: changes.changed_or_new.into_iter().collect(),
        removed: changes.removed.into_iter().collect(),
        history_recomputed,
        purged,
        records_written,
        total_records,
        registry_updated,
        diagnostics,
    })
}

fn check_groups(groups: &[FilterGroup]) -> Result<(), ReconError> {
    if groups.is_empty() {
        return Err(ReconError::NoFilterGroups);
    }
    let mut seen = BTreeSet::new();
    for g in groups {
        if !seen.insert(g.tag.as_str()) {
            return Err(ReconError::DuplicateTag(g.tag.clone()));
        }
        // Repeated columns would intersect at evaluation but union in the signature.
        let mut columns = BTreeSet::new();
        for cond in &g.conditions {
            if !columns.insert(cond.column.as_str()) {
                return Err(ReconError::DuplicateColumn {
                    tag: g.tag.clone(),
                    column: cond.column.clone(),
                });
            }
        }
    }
    Ok(())
}

fn log_changes(changes: &TagChanges) {
    for tag in &changes.changed_or_new {
        log::info!("tag '{tag}' is new or changed");
    }
    for tag in &changes.removed {
        log::info!("tag '{tag}' was removed, purging its history");
    }
    if changes.orphaned_signatures > 0 {
        log::debug!("{} registry signature(s) no longer configured", changes.orphaned_signatures);
    }
}

/// Drop every record of a removed tag, on every table, sheet, and date.
fn purge_removed(history: &mut Vec<HistoryRecord>, removed: &BTreeSet<String>) -> usize {
    if removed.is_empty() {
        return 0;
    }
    let before = history.len();
    history.retain(|r| !removed.contains(&r.tag));
    before - history.len()
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

struct Evaluator<'s> {
    snapshots: &'s dyn SnapshotStore,
    fresh: Vec<HistoryRecord>,
    diagnostics: Vec<Diagnostic>,
}

impl<'s> Evaluator<'s> {
    fn new(snapshots: &'s dyn SnapshotStore) -> Self {
        Self {
            snapshots,
            fresh: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Every group against today's snapshot of each sheet that has one.
    fn compute_today(
        &mut self,
        snapshots: &BTreeMap<&str, Vec<SnapshotKey>>,
        groups: &[FilterGroup],
        today: NaiveDate,
    ) -> Result<(), ReconError> {
        let all: Vec<&FilterGroup> = groups.iter().collect();
        for keys in snapshots.values() {
            if let Some(key) = keys.iter().find(|k| k.date == today) {
                self.evaluate_snapshot(key, &all)?;
            }
        }
        Ok(())
    }

    /// `groups` against every snapshot other than today's.
    fn compute_history(
        &mut self,
        snapshots: &BTreeMap<&str, Vec<SnapshotKey>>,
        groups: &[&FilterGroup],
        today: NaiveDate,
    ) -> Result<(), ReconError> {
        for keys in snapshots.values() {
            for key in keys.iter().filter(|k| k.date != today) {
                self.evaluate_snapshot(key, groups)?;
            }
        }
        Ok(())
    }

    fn evaluate_snapshot(&mut self, key: &SnapshotKey, groups: &[&FilterGroup]) -> Result<(), ReconError> {
        let data = self.snapshots.read_snapshot(key)?;
        for group in groups {
            let eval = evaluate(key, &data, group);
            for column in eval.skipped() {
                log::warn!(
                    "{}/{}@{}: tag '{}' condition on missing column '{}' skipped",
                    key.table_id,
                    key.sheet_id,
                    key.date_str(),
                    group.tag,
                    column
                );
                self.diagnose(key, &group.tag, Outcome::Skipped { column: column.clone() });
            }
            match eval {
                Evaluation::Matched { record, .. } => {
                    self.diagnose(key, &group.tag, Outcome::Matched { count: record.matched_count });
                    self.fresh.push(record);
                }
                Evaluation::Invalid { .. } => {
                    log::warn!(
                        "{}/{}@{}: tag '{}' has no applicable conditions, no record",
                        key.table_id,
                        key.sheet_id,
                        key.date_str(),
                        group.tag
                    );
                    self.diagnose(key, &group.tag, Outcome::Invalid);
                }
            }
        }
        Ok(())
    }

    fn diagnose(&mut self, key: &SnapshotKey, tag: &str, outcome: Outcome) {
        self.diagnostics.push(Diagnostic {
            sheet_id: key.sheet_id.clone(),
            date: key.date,
            tag: tag.to_string(),
            outcome,
        });
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// The key space recomputed this run.
struct MergeScope<'a> {
    table_id: &'a str,
    target_sheets: BTreeSet<&'a str>,
    current_tags: BTreeSet<&'a str>,
    changed_or_new: &'a BTreeSet<String>,
    today: NaiveDate,
}

impl MergeScope<'_> {
    /// Whether `record` belongs to the recomputed key space and must be
    /// replaced by (or dropped in favor of) freshly computed values.
    fn covers(&self, record: &HistoryRecord) -> bool {
        if record.table_id != self.table_id || !self.target_sheets.contains(record.sheet_id.as_str()) {
            return false;
        }
        if record.date == self.today {
            self.current_tags.contains(record.tag.as_str())
        } else {
            self.changed_or_new.contains(&record.tag)
        }
    }
}

/// Replace the covered part of `history` with `fresh`.
///
/// Records outside the scope keep their stored values. The result holds at
/// most one record per key and is sorted by key.
fn merge(history: Vec<HistoryRecord>, fresh: Vec<HistoryRecord>, scope: &MergeScope<'_>) -> Vec<HistoryRecord> {
    let mut by_key: BTreeMap<HistoryKey, HistoryRecord> = BTreeMap::new();
    let mut duplicates = 0usize;
    for record in history.into_iter().filter(|r| !scope.covers(r)) {
        if by_key.insert(record.key(), record).is_some() {
            duplicates += 1;
        }
    }
    if duplicates > 0 {
        log::warn!("dropped {duplicates} duplicate history record(s)");
    }
    for record in fresh {
        by_key.insert(record.key(), record);
    }
    by_key.into_values().collect()
}
