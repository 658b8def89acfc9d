//! Session store: the single writer of session state.
//!
//! Owns the in-memory [`SessionState`] and the persisted four-field record.
//!
//! # Record invariant
//! The record is all-or-nothing. Writes put `isLoggedIn` last so an
//! interrupted write never looks committed; clears remove it first. A
//! failed write is followed by a clear (retried up to `clear_attempts`
//! times), and bootstrap discards anything that is not a complete,
//! well-formed record.
//!
//! # Locking
//! `login`, `logout` and `settle` hold the state write lock across their
//! storage calls, so a bootstrap result can never overwrite or clear a record
//! written by a login that finished first.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

use super::role::Role;
use super::session::{Session, SessionState};
use crate::error::Result;
use crate::persistence::{
    PersistenceError, PersistenceStore, KEY_IS_LOGGED_IN, KEY_USER_EMAIL, KEY_USER_ID,
    KEY_USER_ROLE, SESSION_KEYS,
};

pub const DEFAULT_CLEAR_ATTEMPTS: u32 = 3;

/// Why bootstrap could not read the persisted record.
///
/// Surfaced to the shell separately from the session state so a storage
/// fault is not mistaken for a logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BootstrapFailure {
    #[error("Session storage could not be read: {0}")]
    Unreadable(String),

    #[error("Session bootstrap was interrupted: {0}")]
    Interrupted(String),
}

/// Result of reading the persisted record, before it is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapRead {
    Session(Session),
    Absent,
    /// Some fields present, or values that do not form a valid session
    Malformed(String),
    Failed(BootstrapFailure),
}

pub struct SessionStore {
    persistence: Arc<dyn PersistenceStore>,
    state: RwLock<SessionState>,
    bootstrap_failure: RwLock<Option<BootstrapFailure>>,
    clear_attempts: u32,
}

impl SessionStore {
    pub fn new(persistence: Arc<dyn PersistenceStore>) -> Self {
        Self {
            persistence,
            state: RwLock::new(SessionState::Loading),
            bootstrap_failure: RwLock::new(None),
            clear_attempts: DEFAULT_CLEAR_ATTEMPTS,
        }
    }

    /// Override how many times a partial record is cleared before giving up.
    pub fn with_clear_attempts(mut self, attempts: u32) -> Self {
        self.clear_attempts = attempts.max(1);
        self
    }

    /// Read the persisted record and commit it.
    ///
    /// Never fails: unreadable storage resolves to `Unauthenticated` and is
    /// reported through [`bootstrap_failure`](Self::bootstrap_failure).
    pub async fn bootstrap(&self) -> SessionState {
        let read = self.load_persisted().await;
        self.settle(read)
    }

    /// Read the four fields on the blocking pool without touching in-memory state.
    pub async fn load_persisted(&self) -> BootstrapRead {
        let persistence = Arc::clone(&self.persistence);
        let joined = tokio::task::spawn_blocking(move || read_record(persistence.as_ref())).await;

        match joined {
            Ok(Ok(read)) => read,
            // Unparseable storage is a malformed record: clear it, don't keep failing
            Ok(Err(PersistenceError::Corrupt(reason))) => BootstrapRead::Malformed(reason),
            Ok(Err(e)) => BootstrapRead::Failed(BootstrapFailure::Unreadable(e.to_string())),
            Err(e) => BootstrapRead::Failed(BootstrapFailure::Interrupted(e.to_string())),
        }
    }

    /// Commit a bootstrap read.
    ///
    /// Only applies while the state is still `Loading`; a login or logout
    /// that ran first wins and the read is dropped.
    pub fn settle(&self, read: BootstrapRead) -> SessionState {
        let mut state = self.state.write();
        if !state.is_loading() {
            tracing::debug!(
                "Bootstrap result superseded; session already {}",
                state.label()
            );
            return state.clone();
        }

        let next = match read {
            BootstrapRead::Session(session) => {
                tracing::info!(
                    "Restored session for {} ({})",
                    session.email(),
                    session.role()
                );
                SessionState::Authenticated(session)
            }
            BootstrapRead::Absent => SessionState::Unauthenticated,
            BootstrapRead::Malformed(reason) => {
                tracing::warn!("Discarding malformed session record: {}", reason);
                self.clear_record();
                SessionState::Unauthenticated
            }
            BootstrapRead::Failed(failure) => {
                tracing::warn!("Session bootstrap failed: {}", failure);
                *self.bootstrap_failure.write() = Some(failure);
                SessionState::Unauthenticated
            }
        };

        *state = next.clone();
        next
    }

    /// Start a session and persist it.
    ///
    /// The in-memory state is updated before this returns even if storage
    /// fails; only invalid input is an error.
    pub fn login(&self, email: &str, role: Role, id: &str) -> Result<Session> {
        let session = Session::new(id, email, role)?;

        let mut state = self.state.write();
        if let Err(e) = self.write_record(&session) {
            tracing::warn!(
                "Failed to persist session for {}: {}; clearing partial record",
                session.email(),
                e
            );
            self.clear_record();
        }

        *state = SessionState::Authenticated(session.clone());
        *self.bootstrap_failure.write() = None;
        tracing::info!("Logged in {} as {}", session.email(), session.role());
        Ok(session)
    }

    /// End the session. Safe to call repeatedly.
    pub fn logout(&self) {
        let mut state = self.state.write();
        self.clear_record();

        match std::mem::replace(&mut *state, SessionState::Unauthenticated) {
            SessionState::Authenticated(session) => {
                tracing::info!("Logged out {}", session.email());
            }
            previous => {
                tracing::debug!("Logout with no active session (was {})", previous.label());
            }
        }
    }

    /// Snapshot of the current state.
    pub fn get_session(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn bootstrap_failure(&self) -> Option<BootstrapFailure> {
        self.bootstrap_failure.read().clone()
    }

    fn write_record(&self, session: &Session) -> std::result::Result<(), PersistenceError> {
        self.persistence.set(KEY_USER_ID, session.id())?;
        self.persistence.set(KEY_USER_EMAIL, session.email())?;
        self.persistence.set(KEY_USER_ROLE, session.role().as_str())?;
        // Commit marker goes last
        self.persistence.set(KEY_IS_LOGGED_IN, "true")
    }

    /// Remove all four fields, retrying on failure. Returns whether the
    /// record is known to be gone.
    fn clear_record(&self) -> bool {
        for attempt in 1..=self.clear_attempts {
            let mut clean = true;
            for key in SESSION_KEYS {
                if let Err(e) = self.persistence.remove(key) {
                    tracing::warn!(attempt = attempt, "Failed to remove '{}': {}", key, e);
                    clean = false;
                }
            }
            if clean {
                return true;
            }
        }

        tracing::error!(
            "Gave up clearing the session record after {} attempts; bootstrap will discard leftovers",
            self.clear_attempts
        );
        false
    }
}

fn read_record(
    persistence: &dyn PersistenceStore,
) -> std::result::Result<BootstrapRead, PersistenceError> {
    let flag = persistence.get(KEY_IS_LOGGED_IN)?;
    let email = persistence.get(KEY_USER_EMAIL)?;
    let role = persistence.get(KEY_USER_ROLE)?;
    let id = persistence.get(KEY_USER_ID)?;

    let read = match (flag, email, role, id) {
        (None, None, None, None) => BootstrapRead::Absent,
        (Some(flag), Some(email), Some(role), Some(id)) if flag == "true" => {
            match role.parse::<Role>() {
                Ok(role) => match Session::new(id, email, role) {
                    Ok(session) => BootstrapRead::Session(session),
                    Err(e) => BootstrapRead::Malformed(e.to_string()),
                },
                Err(e) => BootstrapRead::Malformed(e.to_string()),
            }
        }
        (flag, email, role, id) => BootstrapRead::Malformed(format!(
            "incomplete record (isLoggedIn={:?}, userEmail set={}, userRole set={}, userId set={})",
            flag,
            email.is_some(),
            role.is_some(),
            id.is_some()
        )),
    };
    Ok(read)
}
