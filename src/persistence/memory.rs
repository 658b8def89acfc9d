use std::collections::HashMap;

use parking_lot::RwLock;

use super::{PersistenceError, PersistenceStore};

#[derive(Debug, Default)]
struct Faults {
    fail_reads: bool,
    /// Successful `set` calls left before every later `set` fails
    writes_before_failure: Option<u32>,
    /// Number of upcoming `remove` calls that fail
    failing_removes: u32,
}

/// In-memory persistence with injectable faults.
///
/// Faults are off by default, so a fresh `MemoryStore` behaves like a
/// reliable store that forgets everything on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    faults: RwLock<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.entries.write();
            for (k, v) in entries {
                map.insert(k.into(), v.into());
            }
        }
        store
    }

    /// Make every subsequent `get` fail.
    pub fn fail_reads(&self) {
        self.faults.write().fail_reads = true;
    }

    /// Allow `n` more successful writes, then fail every `set`.
    pub fn fail_writes_after(&self, n: u32) {
        self.faults.write().writes_before_failure = Some(n);
    }

    /// Fail the next `n` calls to `remove`.
    pub fn fail_removes(&self, n: u32) {
        self.faults.write().failing_removes = n;
    }

    /// Clear all injected faults.
    pub fn heal(&self) {
        *self.faults.write() = Faults::default();
    }

    /// Snapshot of the stored entries.
    pub fn entries(&self) -> HashMap<String, String> {
        self.entries.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        if self.faults.read().fail_reads {
            return Err(PersistenceError::Unavailable(format!("read of '{}' failed", key)));
        }
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        {
            let mut faults = self.faults.write();
            if let Some(remaining) = faults.writes_before_failure.as_mut() {
                if *remaining == 0 {
                    return Err(PersistenceError::Unavailable(format!(
                        "write of '{}' failed",
                        key
                    )));
                }
                *remaining -= 1;
            }
        }
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        {
            let mut faults = self.faults.write();
            if faults.failing_removes > 0 {
                faults.failing_removes -= 1;
                return Err(PersistenceError::Unavailable(format!(
                    "remove of '{}' failed",
                    key
                )));
            }
        }
        self.entries.write().remove(key);
        Ok(())
    }
}
