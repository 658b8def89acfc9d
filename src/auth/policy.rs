//! Role → route access policy.
//!
//! Pure functions over a static rule table. Adding a role means adding one
//! arm to [`rules_for`] and one to [`default_route_for`]; the compiler
//! flags any arm left out.

use super::role::Role;

pub const DASHBOARD: &str = "/dashboard";
pub const RM_LEADS: &str = "/rm-leads";
pub const REPORTS: &str = "/reports";
pub const RM_INBOX: &str = "/rm-inbox";
pub const LEAD_DETAILS_PREFIX: &str = "/lead-details/";

/// A single route predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    /// Every path
    Any,
    /// Path equals this value
    Exact(&'static str),
    /// Path starts with this value
    Prefix(&'static str),
}

impl AccessRule {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            AccessRule::Any => true,
            AccessRule::Exact(p) => path == *p,
            AccessRule::Prefix(p) => path.starts_with(p),
        }
    }
}

const ADMIN_RULES: &[AccessRule] = &[AccessRule::Any];

const RELATIONSHIP_MANAGER_RULES: &[AccessRule] = &[
    AccessRule::Exact(RM_LEADS),
    AccessRule::Exact(REPORTS),
    AccessRule::Prefix(LEAD_DETAILS_PREFIX),
];

const RELATIONSHIP_MANAGER_INBOX_RULES: &[AccessRule] = &[
    AccessRule::Exact(RM_INBOX),
    AccessRule::Prefix(LEAD_DETAILS_PREFIX),
];

/// The static rule set for a role. Empty for `Role::None`.
pub fn rules_for(role: Role) -> &'static [AccessRule] {
    match role {
        Role::Admin => ADMIN_RULES,
        Role::RelationshipManager => RELATIONSHIP_MANAGER_RULES,
        Role::RelationshipManagerInbox => RELATIONSHIP_MANAGER_INBOX_RULES,
        Role::None => &[],
    }
}

/// Whether `role` may see `path`. Fails closed.
pub fn has_access(role: Role, path: &str) -> bool {
    rules_for(role).iter().any(|rule| rule.matches(path))
}

/// Same as [`has_access`] for a role still in string form; unknown names are denied.
pub fn has_access_for_name(role: &str, path: &str) -> bool {
    role.parse::<Role>()
        .map(|role| has_access(role, path))
        .unwrap_or(false)
}

/// Landing route for a role. Shared by the guard's denial redirect and the
/// login flow's success redirect.
pub fn default_route_for(role: Role) -> &'static str {
    match role {
        Role::RelationshipManager => RM_LEADS,
        Role::RelationshipManagerInbox => RM_INBOX,
        Role::Admin | Role::None => DASHBOARD,
    }
}
