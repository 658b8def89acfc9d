//! Session provider: lifecycle wrapper around [`SessionStore`].
//!
//! The provider owns the bootstrap task and broadcasts every session-state
//! change on a watch channel. Consumers (the route guard, the shell) read
//! snapshots and never touch the store directly.
//!
//! ```text
//!   activate() ──spawn──> load_persisted() ──> [lifecycle lock] settle + publish
//!                                                   │
//!   teardown() ─────────> [lifecycle lock] TornDown ┘ (result discarded)
//! ```
//!
//! Commit and teardown both run under the lifecycle lock, so once
//! `teardown` returns no further state transition is published.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use super::policy;
use super::role::Role;
use super::session::{Session, SessionState};
use super::store::{BootstrapFailure, BootstrapRead, SessionStore};
use crate::error::{LeaddeskError, Result};
use crate::persistence::PersistenceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// Created, bootstrap not yet issued
    Idle,
    Bootstrapping,
    Active,
    TornDown,
}

pub struct SessionProvider {
    store: Arc<SessionStore>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    state_tx: Arc<watch::Sender<SessionState>>,
    bootstrap_task: Mutex<Option<JoinHandle<()>>>,
    /// Wakes `settled` waiters on teardown
    closed: Notify,
}

impl SessionProvider {
    pub fn new(store: Arc<SessionStore>) -> Self {
        let (state_tx, _) = watch::channel(store.get_session());
        Self {
            store,
            lifecycle: Arc::new(Mutex::new(Lifecycle::Idle)),
            state_tx: Arc::new(state_tx),
            bootstrap_task: Mutex::new(None),
            closed: Notify::new(),
        }
    }

    /// Convenience constructor over a bare persistence backend.
    pub fn with_persistence(persistence: Arc<dyn PersistenceStore>) -> Self {
        Self::new(Arc::new(SessionStore::new(persistence)))
    }

    /// Issue bootstrap on first activation. Later calls are no-ops.
    ///
    /// # Errors
    /// `NoRuntime` when called outside a tokio runtime, `ProviderClosed`
    /// after teardown.
    pub fn activate(&self) -> Result<()> {
        let mut phase = self.lifecycle.lock();
        match *phase {
            Lifecycle::Idle => {}
            Lifecycle::TornDown => return Err(LeaddeskError::ProviderClosed),
            Lifecycle::Bootstrapping | Lifecycle::Active => return Ok(()),
        }

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| LeaddeskError::NoRuntime(e.to_string()))?;

        let store = Arc::clone(&self.store);
        let lifecycle = Arc::clone(&self.lifecycle);
        let state_tx = Arc::clone(&self.state_tx);

        let task = handle.spawn(async move {
            let read = store.load_persisted().await;
            commit_bootstrap(&store, &lifecycle, &state_tx, read);
        });

        *phase = Lifecycle::Bootstrapping;
        *self.bootstrap_task.lock() = Some(task);
        tracing::debug!("Session bootstrap issued");
        Ok(())
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Receive every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Wait until bootstrap (or an earlier login/logout) resolves the state.
    ///
    /// Returns the current state, possibly still `Loading`, once the
    /// provider is torn down.
    pub async fn settled(&self) -> SessionState {
        let mut rx = self.subscribe();
        let closed = self.closed.notified();
        tokio::pin!(closed);
        closed.as_mut().enable();

        if self.is_torn_down() {
            return self.state();
        }

        let settled = tokio::select! {
            resolved = rx.wait_for(|state| !state.is_loading()) => match resolved {
                Ok(state) => state.clone(),
                // Sender lives as long as self, so this only happens mid-drop
                Err(_) => self.state(),
            },
            _ = &mut closed => self.state(),
        };
        settled
    }

    pub fn login(&self, email: &str, role: Role, id: &str) -> Result<Session> {
        let _phase = self.guard_open()?;
        let session = self.store.login(email, role, id)?;
        self.state_tx.send_replace(self.store.get_session());
        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        let _phase = self.guard_open()?;
        self.store.logout();
        self.state_tx.send_replace(self.store.get_session());
        Ok(())
    }

    /// Whether the current session may see `path`. False unless authenticated.
    pub fn has_access(&self, path: &str) -> bool {
        match self.state() {
            SessionState::Authenticated(session) => policy::has_access(session.role(), path),
            SessionState::Loading | SessionState::Unauthenticated => false,
        }
    }

    pub fn bootstrap_failure(&self) -> Option<BootstrapFailure> {
        self.store.bootstrap_failure()
    }

    pub fn is_torn_down(&self) -> bool {
        *self.lifecycle.lock() == Lifecycle::TornDown
    }

    /// Stop the provider. An outstanding bootstrap is aborted and its result
    /// discarded. Idempotent.
    pub fn teardown(&self) {
        let mut phase = self.lifecycle.lock();
        if *phase == Lifecycle::TornDown {
            return;
        }
        *phase = Lifecycle::TornDown;

        if let Some(task) = self.bootstrap_task.lock().take() {
            if !task.is_finished() {
                tracing::debug!("Aborting outstanding session bootstrap");
            }
            task.abort();
        }
        self.closed.notify_waiters();
    }

    /// Hold the lifecycle lock for a mutation, failing after teardown.
    fn guard_open(&self) -> Result<parking_lot::MutexGuard<'_, Lifecycle>> {
        let phase = self.lifecycle.lock();
        if *phase == Lifecycle::TornDown {
            return Err(LeaddeskError::ProviderClosed);
        }
        Ok(phase)
    }
}

/// Settle and publish a bootstrap read unless the provider was torn down.
fn commit_bootstrap(
    store: &SessionStore,
    lifecycle: &Mutex<Lifecycle>,
    state_tx: &watch::Sender<SessionState>,
    read: BootstrapRead,
) {
    let mut phase = lifecycle.lock();
    if *phase == Lifecycle::TornDown {
        tracing::debug!("Provider torn down during bootstrap; discarding result");
        return;
    }
    let state = store.settle(read);
    *phase = Lifecycle::Active;
    state_tx.send_replace(state);
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{
        MemoryStore, PersistenceError, KEY_IS_LOGGED_IN, KEY_USER_EMAIL, KEY_USER_ID,
        KEY_USER_ROLE,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Persistence whose reads block until released.
    struct GatedStore {
        inner: MemoryStore,
        open: AtomicBool,
    }

    impl GatedStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                open: AtomicBool::new(false),
            }
        }

        fn release(&self) {
            self.open.store(true, Ordering::SeqCst);
        }
    }

    impl PersistenceStore for GatedStore {
        fn get(&self, key: &str) -> std::result::Result<Option<String>, PersistenceError> {
            while !self.open.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(2));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> std::result::Result<(), PersistenceError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> std::result::Result<(), PersistenceError> {
            self.inner.remove(key)
        }
    }

    fn admin_record() -> MemoryStore {
        MemoryStore::with_entries([
            (KEY_IS_LOGGED_IN, "true"),
            (KEY_USER_EMAIL, "admin@x.com"),
            (KEY_USER_ROLE, "admin"),
            (KEY_USER_ID, "ADM001"),
        ])
    }

    #[tokio::test]
    async fn test_loading_until_bootstrap_resolves() {
        let gated = Arc::new(GatedStore::new(admin_record()));
        let provider = SessionProvider::with_persistence(gated.clone());

        provider.activate().unwrap();
        assert_eq!(provider.state(), SessionState::Loading);
        assert!(!provider.has_access("/dashboard"));

        gated.release();
        let state = provider.settled().await;

        assert_eq!(state.role(), Role::Admin);
        assert!(provider.has_access("/dashboard"));
    }

    #[tokio::test]
    async fn test_activate_is_idempotent() {
        let provider = SessionProvider::with_persistence(Arc::new(MemoryStore::new()));
        provider.activate().unwrap();
        provider.activate().unwrap();

        assert_eq!(provider.settled().await, SessionState::Unauthenticated);
    }

    #[test]
    fn test_activate_outside_runtime_fails() {
        let provider = SessionProvider::with_persistence(Arc::new(MemoryStore::new()));
        assert!(matches!(
            provider.activate(),
            Err(LeaddeskError::NoRuntime(_))
        ));
    }

    #[tokio::test]
    async fn test_teardown_discards_outstanding_bootstrap() {
        let gated = Arc::new(GatedStore::new(admin_record()));
        let provider = SessionProvider::with_persistence(gated.clone());
        let mut rx = provider.subscribe();

        provider.activate().unwrap();
        provider.teardown();
        gated.release();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.state(), SessionState::Loading);
        assert!(!rx.has_changed().unwrap());
        assert!(provider.is_torn_down());
    }

    #[tokio::test]
    async fn test_settled_returns_when_torn_down_mid_bootstrap() {
        let gated = Arc::new(GatedStore::new(admin_record()));
        let provider = SessionProvider::with_persistence(gated.clone());
        provider.activate().unwrap();

        let (state, _) = tokio::join!(provider.settled(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            provider.teardown();
        });
        assert_eq!(state, SessionState::Loading);

        // Already torn down: returns immediately
        assert_eq!(provider.settled().await, SessionState::Loading);
        gated.release();
    }

    #[tokio::test]
    async fn test_no_mutation_after_teardown() {
        let provider = SessionProvider::with_persistence(Arc::new(MemoryStore::new()));
        provider.teardown();
        provider.teardown();

        assert!(matches!(
            provider.login("a@x.com", Role::Admin, "A1"),
            Err(LeaddeskError::ProviderClosed)
        ));
        assert!(matches!(provider.logout(), Err(LeaddeskError::ProviderClosed)));
        assert!(matches!(provider.activate(), Err(LeaddeskError::ProviderClosed)));
    }

    #[tokio::test]
    async fn test_login_publishes_and_survives_late_bootstrap() {
        let gated = Arc::new(GatedStore::new(MemoryStore::new()));
        let provider = SessionProvider::with_persistence(gated.clone());
        let mut rx = provider.subscribe();
        provider.activate().unwrap();

        let session = provider
            .login("inbox@x.com", Role::RelationshipManagerInbox, "RMI001")
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            *rx.borrow_and_update(),
            SessionState::Authenticated(session.clone())
        );

        gated.release();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.state(), SessionState::Authenticated(session));
        assert!(provider.has_access("/lead-details/42"));
        assert!(!provider.has_access("/reports"));
    }

    #[tokio::test]
    async fn test_logout_publishes_unauthenticated() {
        let provider = SessionProvider::with_persistence(Arc::new(admin_record()));
        provider.activate().unwrap();
        provider.settled().await;

        provider.logout().unwrap();
        provider.logout().unwrap();

        assert_eq!(provider.state(), SessionState::Unauthenticated);
        assert!(!provider.has_access("/dashboard"));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_is_exposed() {
        let memory = admin_record();
        memory.fail_reads();
        let provider = SessionProvider::with_persistence(Arc::new(memory));
        provider.activate().unwrap();

        assert_eq!(provider.settled().await, SessionState::Unauthenticated);
        assert!(provider.bootstrap_failure().is_some());
    }
}
