//! Snapshot cache on disk: `<root>/<table>/<sheet>/<YYYY-MM-DD>.csv`, with
//! table and sheet names percent-encoded.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tagtrend_core::{SheetData, SnapshotKey, SnapshotStore, StoreError, DATE_FORMAT};

use crate::atomic::write_atomic;

pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sheet_dir(&self, table_id: &str, sheet_id: &str) -> PathBuf {
        self.root
            .join(encode_component(table_id))
            .join(encode_component(sheet_id))
    }

    pub fn path_for(&self, key: &SnapshotKey) -> PathBuf {
        self.sheet_dir(&key.table_id, &key.sheet_id)
            .join(format!("{}.csv", key.date_str()))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn write_snapshot(&mut self, key: &SnapshotKey, data: &SheetData) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let bytes = crate::csv::export_to_bytes(data).map_err(|message| StoreError::Encode {
            what: "snapshot",
            message,
        })?;
        write_atomic(&path, &bytes)?;
        log::debug!("snapshot written: {}", path.display());
        Ok(())
    }

    fn list_snapshots(&self, table_id: &str, sheet_id: &str) -> Result<Vec<SnapshotKey>, StoreError> {
        let dir = self.sheet_dir(table_id, sheet_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&dir, e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match NaiveDate::parse_from_str(stem, DATE_FORMAT) {
                Ok(date) => keys.push(SnapshotKey::new(table_id, sheet_id, date)),
                Err(_) => log::debug!("ignoring non-snapshot file {}", path.display()),
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn read_snapshot(&self, key: &SnapshotKey) -> Result<SheetData, StoreError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(StoreError::MissingSnapshot {
                table_id: key.table_id.clone(),
                sheet_id: key.sheet_id.clone(),
                date: key.date_str(),
            });
        }
        crate::csv::import_with_delimiter(&path, b',').map_err(|message| StoreError::parse(&path, message))
    }
}

/// Percent-encode a table or sheet name into a single path component.
///
/// `%`, path separators, characters Windows rejects, and control characters
/// become `%XX` per UTF-8 byte, so distinct names never share a directory.
fn encode_component(name: &str) -> String {
    match name {
        // A literal '%' always encodes to "%25", so a bare "%" is free.
        "" => return "%".to_string(),
        "." => return "%2E".to_string(),
        ".." => return "%2E%2E".to_string(),
        _ => {}
    }
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => push_escaped(&mut out, c),
            c if c.is_control() => push_escaped(&mut out, c),
            c => out.push(c),
        }
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    for byte in c.encode_utf8(&mut buf).bytes() {
        out.push_str(&format!("%{byte:02X}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn data(n: &str) -> SheetData {
        SheetData::new(vec!["region".into(), "n".into()], vec![vec!["east".into(), n.into()]])
    }

    #[test]
    fn write_list_read() {
        let dir = tempdir().unwrap();
        let mut store = FileSnapshotStore::new(dir.path().join("cache"));

        store.write_snapshot(&SnapshotKey::new("orders", "Sheet1", day(10)), &data("3")).unwrap();
        store.write_snapshot(&SnapshotKey::new("orders", "Sheet1", day(2)), &data("1")).unwrap();
        store.write_snapshot(&SnapshotKey::new("orders", "Other", day(5)), &data("9")).unwrap();

        let keys = store.list_snapshots("orders", "Sheet1").unwrap();
        let dates: Vec<_> = keys.iter().map(|k| k.date).collect();
        assert_eq!(dates, vec![day(2), day(10)]);

        assert_eq!(store.read_snapshot(&keys[1]).unwrap(), data("3"));
        assert!(dir.path().join("cache/orders/Sheet1/2026-03-10.csv").is_file());
    }

    #[test]
    fn same_day_write_overwrites() {
        let dir = tempdir().unwrap();
        let mut store = FileSnapshotStore::new(dir.path());
        let key = SnapshotKey::new("orders", "Sheet1", day(10));

        store.write_snapshot(&key, &data("1")).unwrap();
        store.write_snapshot(&key, &data("2")).unwrap();

        assert_eq!(store.list_snapshots("orders", "Sheet1").unwrap().len(), 1);
        assert_eq!(store.read_snapshot(&key).unwrap(), data("2"));
    }

    #[test]
    fn missing_dir_lists_nothing_and_stray_files_are_ignored() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        assert!(store.list_snapshots("orders", "Sheet1").unwrap().is_empty());

        let sheet_dir = dir.path().join("orders/Sheet1");
        fs::create_dir_all(&sheet_dir).unwrap();
        fs::write(sheet_dir.join("notes.csv"), "a\n").unwrap();
        fs::write(sheet_dir.join("2026-03-01.csv.tmp"), "a\n").unwrap();
        fs::write(sheet_dir.join("2026-03-01.csv"), "a\n").unwrap();

        let keys = store.list_snapshots("orders", "Sheet1").unwrap();
        assert_eq!(keys, vec![SnapshotKey::new("orders", "Sheet1", day(1))]);
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let err = store.read_snapshot(&SnapshotKey::new("orders", "Sheet1", day(1))).unwrap_err();
        assert!(matches!(err, StoreError::MissingSnapshot { .. }));
    }

    #[test]
    fn awkward_sheet_names_stay_inside_the_root() {
        let dir = tempdir().unwrap();
        let mut store = FileSnapshotStore::new(dir.path());
        let key = SnapshotKey::new("orders", "Q1/Q2", day(1));
        store.write_snapshot(&key, &data("1")).unwrap();

        assert!(dir.path().join("orders/Q1%2FQ2/2026-03-01.csv").is_file());
        assert_eq!(store.list_snapshots("orders", "Q1/Q2").unwrap(), vec![key]);
        assert_eq!(encode_component(".."), "%2E%2E");
        assert_eq!(encode_component(""), "%");
        assert_eq!(encode_component("tab\there"), "tab%09here");
    }

    #[test]
    fn names_differing_only_in_reserved_chars_do_not_collide() {
        let dir = tempdir().unwrap();
        let mut store = FileSnapshotStore::new(dir.path());
        let pipe = SnapshotKey::new("orders", "A|B", day(1));
        let underscore = SnapshotKey::new("orders", "A_B", day(1));
        let escaped = SnapshotKey::new("orders", "A%7CB", day(1));

        store.write_snapshot(&pipe, &data("1")).unwrap();
        store.write_snapshot(&underscore, &data("2")).unwrap();
        store.write_snapshot(&escaped, &data("3")).unwrap();

        assert_eq!(store.read_snapshot(&pipe).unwrap(), data("1"));
        assert_eq!(store.read_snapshot(&underscore).unwrap(), data("2"));
        assert_eq!(store.read_snapshot(&escaped).unwrap(), data("3"));
        assert_eq!(store.list_snapshots("orders", "A|B").unwrap(), vec![pipe]);
        assert_eq!(store.list_snapshots("orders", "A_B").unwrap(), vec![underscore]);
    }
}
