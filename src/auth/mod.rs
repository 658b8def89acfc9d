//! Session and access control for the dashboard.
//!
//! Leaves first:
//!
//! - [`policy`]: pure role → route rules and per-role landing routes
//! - [`store`]: the single writer of session state and its persisted record
//! - [`provider`]: bootstrap lifecycle and change broadcast over the store
//! - [`guard`]: the route guard state machine
//! - [`login`]: credential verification and the post-login redirect
//!
//! ```text
//! RouteGuard <── SessionProvider <── SessionStore <── PersistenceStore
//!     │
//!     └──> policy::has_access / default_route_for
//! ```

pub mod guard;
pub mod login;
pub mod policy;
pub mod provider;
mod role;
mod session;
pub mod store;

pub use guard::{evaluate, GuardOutcome, GuardState, RouteGuard};
pub use login::{
    reference_accounts, Account, IdentityVerifier, LoginError, LoginFlow, StaticAccountVerifier,
    VerifiedIdentity,
};
pub use policy::{default_route_for, has_access, AccessRule};
pub use provider::SessionProvider;
pub use role::{Role, UnknownRole};
pub use session::{Session, SessionState};
pub use store::{BootstrapFailure, BootstrapRead, SessionStore};
