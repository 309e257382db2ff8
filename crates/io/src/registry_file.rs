//! Tag registry document: a flat TOML table of `signature = "tag"`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tagtrend_core::{RegistryStore, StoreError, TagRegistry};

use crate::atomic::write_atomic;

pub struct TomlRegistryStore {
    path: PathBuf,
}

impl TomlRegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistryStore for TomlRegistryStore {
    fn load(&self) -> Result<TagRegistry, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TagRegistry::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        toml::from_str(&text).map_err(|e| StoreError::parse(&self.path, e))
    }

    fn save(&mut self, registry: &TagRegistry) -> Result<(), StoreError> {
        let text = toml::to_string(registry).map_err(|e| StoreError::Encode {
            what: "tag registry",
            message: e.to_string(),
        })?;
        write_atomic(&self.path, text.as_bytes())?;
        log::debug!("tag registry saved: {} entr(ies) to {}", registry.len(), self.path.display());
        Ok(())
    }
}
