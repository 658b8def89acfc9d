//! Session, role policy and route guard core for the lead management
//! dashboard.
//!
//! - [`auth`]: roles, access policy, session store and provider, route guard,
//!   login flow
//! - [`persistence`]: key/value storage for the session record
//! - [`navigation`]: the navigator seam and an in-memory history
//! - [`settings`]: TOML configuration
//! - `cli`: headless shell (feature `cli`)

pub mod auth;
pub mod error;
pub mod navigation;
pub mod persistence;
pub mod settings;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{LeaddeskError, Result};
