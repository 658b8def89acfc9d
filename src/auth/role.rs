use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Authorization identity attached to a session.
///
/// `None` means no authenticated identity; a session never carries it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    RelationshipManager,
    RelationshipManagerInbox,
    #[default]
    None,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::RelationshipManager,
        Role::RelationshipManagerInbox,
        Role::None,
    ];

    /// Stable string form used in the persisted record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::RelationshipManager => "relationship_manager",
            Role::RelationshipManagerInbox => "relationship_manager_inbox",
            Role::None => "none",
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Role::None)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
