//! Key-value persistence for the session record.
//!
//! The session store never touches storage directly; it goes through the
//! [`PersistenceStore`] trait so the backing medium can be swapped:
//!
//! - [`MemoryStore`]: process-local map with fault injection, used by tests
//!   and by the shell's `--memory` mode
//! - [`FileStore`]: a TOML string table on disk, written atomically
//!
//! All values are strings. Implementations may fail on any call; callers
//! decide how to degrade.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Authenticated flag; `"true"` when a record is committed.
pub const KEY_IS_LOGGED_IN: &str = "isLoggedIn";
pub const KEY_USER_EMAIL: &str = "userEmail";
pub const KEY_USER_ROLE: &str = "userRole";
pub const KEY_USER_ID: &str = "userId";

/// The four keys that make up one session record.
pub const SESSION_KEYS: [&str; 4] = [KEY_IS_LOGGED_IN, KEY_USER_EMAIL, KEY_USER_ROLE, KEY_USER_ID];

/// Persistence-layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// String-valued key-value store holding the session record across reloads.
///
/// # Contract
/// - `get` returns `Ok(None)` for an absent key
/// - `remove` on an absent key succeeds
/// - every call may fail; nothing here retries
pub trait PersistenceStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}
