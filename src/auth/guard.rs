//! Route guard: reconciles the current path with the session state.
//!
//! [`evaluate`] is the pure transition function. [`RouteGuard`] adds the
//! side effect (redirect through a [`Navigator`]) and remembers what it has
//! already done so a redirect fires at most once per (path, state) pair.
//! [`RouteGuard::run`] drives it from the two watch channels that make up
//! its inputs.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use super::policy::{default_route_for, has_access};
use super::session::SessionState;
use crate::navigation::Navigator;

/// Outcome of one guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GuardState {
    /// Session unresolved: render nothing, redirect nowhere
    AwaitingSession,
    Denied { redirect_to: String },
    Allowed,
    /// The login page renders regardless of session
    LoginException,
}

impl GuardState {
    pub fn renders_children(&self) -> bool {
        matches!(self, GuardState::Allowed | GuardState::LoginException)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardState::Denied { redirect_to } => Some(redirect_to),
            _ => None,
        }
    }
}

/// The guard's transition function. Order matters: the login path is
/// checked before the session, and `Loading` before `Unauthenticated`.
pub fn evaluate(path: &str, session: &SessionState, login_path: &str) -> GuardState {
    if path == login_path {
        return GuardState::LoginException;
    }

    match session {
        SessionState::Loading => GuardState::AwaitingSession,
        SessionState::Unauthenticated => GuardState::Denied {
            redirect_to: login_path.to_string(),
        },
        SessionState::Authenticated(s) if has_access(s.role(), path) => GuardState::Allowed,
        SessionState::Authenticated(s) => GuardState::Denied {
            redirect_to: default_route_for(s.role()).to_string(),
        },
    }
}

/// What the guard decided for one (path, session) input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardOutcome {
    pub path: String,
    pub session: &'static str,
    #[serde(flatten)]
    pub state: GuardState,
    /// A navigation call was issued during this evaluation
    pub navigated: bool,
}

pub struct RouteGuard {
    login_path: String,
    navigator: Arc<dyn Navigator>,
    last_input: Option<(String, SessionState)>,
    redirect_issued: bool,
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            login_path: login_path.into(),
            navigator,
            last_input: None,
            redirect_issued: false,
        }
    }

    /// Evaluate and apply side effects.
    ///
    /// A redirect is issued only the first time a given (path, state) pair
    /// is seen. If navigation fails the pair stays un-issued and the next
    /// reconcile with the same inputs tries again.
    pub fn reconcile(&mut self, path: &str, session: &SessionState) -> GuardOutcome {
        let state = evaluate(path, session, &self.login_path);

        let unchanged = matches!(
            &self.last_input,
            Some((last_path, last_session)) if last_path == path && last_session == session
        );
        if !unchanged {
            self.last_input = Some((path.to_string(), session.clone()));
            self.redirect_issued = false;
        }

        let mut navigated = false;
        if let Some(target) = state.redirect_target() {
            if self.redirect_issued {
                tracing::debug!("Redirect {} -> {} already issued", path, target);
            } else {
                match self.navigator.navigate(target) {
                    Ok(()) => {
                        self.redirect_issued = true;
                        navigated = true;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Redirect {} -> {} failed, will retry: {}",
                            path,
                            target,
                            e
                        );
                    }
                }
            }
        }

        tracing::debug!(
            target: "leaddesk::guard",
            "path={} session={} -> {:?}",
            path,
            session.label(),
            state
        );

        GuardOutcome {
            path: path.to_string(),
            session: session.label(),
            state,
            navigated,
        }
    }

    /// Re-evaluate whenever the path or the session changes, publishing each
    /// outcome. Returns when either input closes or the outcome receiver is
    /// dropped.
    pub async fn run(
        mut self,
        mut path_rx: watch::Receiver<String>,
        mut session_rx: watch::Receiver<SessionState>,
        outcome_tx: mpsc::UnboundedSender<GuardOutcome>,
    ) {
        loop {
            let path = path_rx.borrow_and_update().clone();
            let session = session_rx.borrow_and_update().clone();

            let outcome = self.reconcile(&path, &session);
            if outcome_tx.send(outcome).is_err() {
                break;
            }

            tokio::select! {
                changed = path_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Route guard stopped");
    }
}
