//! Login flow: verify credentials, start the session, land on the role's
//! default route.
//!
//! Credential checking sits behind [`IdentityVerifier`] so a real backend
//! can replace the reference table without touching the policy, the store
//! or the guard.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::policy::default_route_for;
use super::provider::SessionProvider;
use super::role::Role;
use super::session::{Session, SessionState};
use crate::error::LeaddeskError;
use crate::navigation::Navigator;

/// Identity returned by a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub id: String,
    pub role: Role,
}

/// Checks an email/password pair.
///
/// `None` means the credentials were not accepted. Implementations should
/// not distinguish "unknown email" from "wrong password" to the caller.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> Option<VerifiedIdentity>;
}

/// One row of an account table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

impl Account {
    pub fn new(id: &str, email: &str, password: &str, role: Role) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        }
    }
}

/// Verifier over a fixed in-memory account table.
pub struct StaticAccountVerifier {
    accounts: Vec<Account>,
}

impl StaticAccountVerifier {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// The illustrative accounts shipped with the dashboard.
    pub fn reference() -> Self {
        Self::new(reference_accounts())
    }
}

pub fn reference_accounts() -> Vec<Account> {
    vec![
        Account::new("ADM001", "admin@leaddesk.local", "admin123", Role::Admin),
        Account::new(
            "RM001",
            "rm@leaddesk.local",
            "rm123",
            Role::RelationshipManager,
        ),
        Account::new(
            "RMI001",
            "inbox@leaddesk.local",
            "inbox123",
            Role::RelationshipManagerInbox,
        ),
    ]
}

#[async_trait]
impl IdentityVerifier for StaticAccountVerifier {
    async fn verify(&self, email: &str, password: &str) -> Option<VerifiedIdentity> {
        self.accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email) && a.password == password)
            .filter(|a| a.role.is_authenticated())
            .map(|a| VerifiedIdentity {
                id: a.id.clone(),
                role: a.role,
            })
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Session(#[from] LeaddeskError),
}

pub struct LoginFlow {
    verifier: Arc<dyn IdentityVerifier>,
    provider: Arc<SessionProvider>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl LoginFlow {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        provider: Arc<SessionProvider>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            provider,
            navigator,
            login_path: login_path.into(),
        }
    }

    /// Verify, log in, then navigate to the role's default route.
    ///
    /// The session is committed before navigation, so whatever renders next
    /// already sees it. A failed navigation is logged and left to the guard.
    pub async fn submit(&self, email: &str, password: &str) -> Result<Session, LoginError> {
        let email = email.trim();
        let Some(identity) = self.verifier.verify(email, password).await else {
            tracing::info!("Rejected login for {}", email);
            return Err(LoginError::InvalidCredentials);
        };

        let session = self.provider.login(email, identity.role, &identity.id)?;

        let target = default_route_for(session.role());
        if let Err(e) = self.navigator.navigate(target) {
            tracing::warn!("Post-login navigation to {} failed: {}", target, e);
        }
        Ok(session)
    }

    /// Send an already-authenticated user off the login page. Returns whether
    /// a redirect was issued.
    pub fn leave_login_page(&self, current_path: &str) -> bool {
        if current_path != self.login_path {
            return false;
        }
        let SessionState::Authenticated(session) = self.provider.state() else {
            return false;
        };

        let target = default_route_for(session.role());
        match self.navigator.navigate(target) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Redirect off login page to {} failed: {}", target, e);
                false
            }
        }
    }
}
