// Whole-file replacement: write a sibling .tmp file, then rename over the target.

use std::fs;
use std::path::{Path, PathBuf};

use tagtrend_core::StoreError;

/// Sibling temp path: `history.json` -> `history.json.tmp`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `contents`, creating parent directories as needed.
/// Readers see either the old file or the new one, never a partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let tmp_path = temp_path(path);
    fs::write(&tmp_path, contents).map_err(|e| StoreError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(
            temp_path(Path::new("result/history.json")),
            PathBuf::from("result/history.json.tmp")
        );
    }

    #[test]
    fn write_creates_parents_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/state.toml");

        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert!(!temp_path(&path).exists());
    }
}
