//! File-backed persistence.
//!
//! The whole record lives in one small TOML file of string keys. Every
//! mutation rewrites the file through a temp file + rename so a crash never
//! leaves a half-written table behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{PersistenceError, PersistenceStore};

/// Persistence backed by a TOML file.
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    io_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. The file is not touched
    /// until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        toml::from_str(&contents).map_err(|e| {
            PersistenceError::Corrupt(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Table to modify. An unparseable file is replaced rather than kept,
    /// so the flag reports whether a rewrite is due regardless of changes.
    fn table_for_write(&self) -> Result<(BTreeMap<String, String>, bool), PersistenceError> {
        match self.read_table() {
            Ok(table) => Ok((table, false)),
            Err(PersistenceError::Corrupt(reason)) => {
                tracing::warn!("Replacing corrupt session file: {}", reason);
                Ok((BTreeMap::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_table(&self, table: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
        let contents = toml::to_string(table)
            .map_err(|e| PersistenceError::Corrupt(format!("failed to serialize: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl PersistenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let _guard = self.io_lock.lock();
        Ok(self.read_table()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let _guard = self.io_lock.lock();
        let (mut table, _) = self.table_for_write()?;
        table.insert(key.to_string(), value.to_string());
        self.write_table(&table)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let _guard = self.io_lock.lock();
        let (mut table, replaced) = self.table_for_write()?;
        if table.remove(key).is_none() && !replaced {
            return Ok(());
        }
        self.write_table(&table)
    }
}
