use serde::Serialize;

use super::role::Role;
use crate::error::{LeaddeskError, Result};

/// An authenticated identity bound to a role.
///
/// Fields are private: a session is never edited in place, only replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    id: String,
    email: String,
    role: Role,
}

impl Session {
    /// Build a session, rejecting empty identifiers and `Role::None`.
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Result<Self> {
        let id = id.into();
        let email = email.into();

        if id.trim().is_empty() {
            return Err(LeaddeskError::InvalidSession("user id is empty".to_string()));
        }
        if email.trim().is_empty() {
            return Err(LeaddeskError::InvalidSession("email is empty".to_string()));
        }
        if !role.is_authenticated() {
            return Err(LeaddeskError::InvalidSession(
                "a session cannot carry role 'none'".to_string(),
            ));
        }

        Ok(Self { id, email, role })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// What is known about the current session.
///
/// `Loading` means "not yet known" and must never be read as
/// `Unauthenticated`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Role of the authenticated session, `Role::None` otherwise.
    pub fn role(&self) -> Role {
        self.session().map(Session::role).unwrap_or_default()
    }

    /// Short label for logs and shell output.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated(_) => "authenticated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_rejects_blank_fields() {
        assert!(Session::new("", "rm@x.com", Role::RelationshipManager).is_err());
        assert!(Session::new("RM001", "  ", Role::RelationshipManager).is_err());
        assert!(Session::new("RM001", "rm@x.com", Role::None).is_err());
    }

    #[test]
    fn test_session_accessors() {
        let session = Session::new("RM001", "rm@x.com", Role::RelationshipManager).unwrap();
        assert_eq!(session.id(), "RM001");
        assert_eq!(session.email(), "rm@x.com");
        assert_eq!(session.role(), Role::RelationshipManager);
    }

    #[test]
    fn test_loading_is_not_unauthenticated() {
        let loading = SessionState::Loading;
        assert!(loading.is_loading());
        assert_ne!(loading, SessionState::Unauthenticated);
        assert_eq!(loading.role(), Role::None);
        assert_eq!(SessionState::default(), SessionState::Loading);
    }

    #[test]
    fn test_state_serializes_with_status_tag() {
        let session = Session::new("ADM001", "admin@x.com", Role::Admin).unwrap();
        let json = serde_json::to_value(SessionState::Authenticated(session)).unwrap();
        assert_eq!(json["status"], "authenticated");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["id"], "ADM001");

        let json = serde_json::to_value(SessionState::Loading).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "loading" }));
    }
}
