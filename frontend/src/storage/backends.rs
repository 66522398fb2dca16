//! Concrete storage backends.

use super::StorageBackend;
use crate::errors::StorageError;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

/// Process-local key/value area.
///
/// Used as the ephemeral scope and throughout tests.
#[derive(Debug)]
pub struct MemoryStorage {
    name: String,
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Key/value area persisted as one JSON object in a file.
///
/// Every operation goes to disk so that several handles on the same file see
/// each other's writes. Writes replace the file atomically through a uniquely
/// named sibling temp file. A corrupt file fails reads and is overwritten by the next write.
#[derive(Debug)]
pub struct JsonFileStorage {
    name: String,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStorage {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(StorageError::io(&self.path, err)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|err| StorageError::corrupt(self.path.display().to_string(), err))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;

        let json = serde_json::to_vec_pretty(map)?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(|err| StorageError::io(parent, err))?;
        tmp.write_all(&json)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|err| StorageError::io(tmp.path(), err))?;
        tmp.persist(&self.path)
            .map_err(|err| StorageError::io(&self.path, err.error))?;
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Corrupt { location, reason }) => {
                warn!(%location, %reason, "overwriting corrupt storage file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        if apply(&mut map) {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

impl StorageBackend for JsonFileStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|map| map.remove(key).is_some())
    }
}
