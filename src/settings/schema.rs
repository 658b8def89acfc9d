//! Settings schema definitions for leaddesk configuration.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::auth::{Account, Role};
use crate::auth::store::DEFAULT_CLEAR_ATTEMPTS;

/// Root settings structure.
///
/// Loaded from `~/.leaddesk/settings.toml` with environment variable interpolation support.
/// Version field enables future migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaddeskSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Route configuration
    pub routes: RouteSettings,

    /// Session record storage
    pub storage: StorageSettings,

    /// Logging configuration
    pub logging: LoggingSettings,

    /// Account table for the built-in verifier; empty uses the reference accounts
    #[serde(default)]
    pub accounts: Vec<AccountSettings>,
}

/// Route configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    /// Path of the login screen (exempt from the guard)
    pub login_path: String,

    /// Path the shell opens at startup
    pub start_path: String,
}

/// Where the session record is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

/// Session record storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// "file" | "memory"
    pub backend: StorageBackend,

    /// Session file path (supports $ENV_VAR syntax); defaults to ~/.leaddesk/session.toml
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<String>,

    /// How many times a partial record is cleared before giving up
    pub clear_attempts: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// tracing-subscriber filter directive, used when RUST_LOG is unset
    pub filter: String,
}

/// One configured account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSettings {
    pub id: String,
    pub email: String,
    /// Password (supports $ENV_VAR syntax); never serialized back out
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

impl From<&AccountSettings> for Account {
    fn from(settings: &AccountSettings) -> Self {
        Account::new(
            &settings.id,
            &settings.email,
            &settings.password,
            settings.role,
        )
    }
}

// =============================================================================
// Default implementations
// =============================================================================

impl Default for LeaddeskSettings {
    fn default() -> Self {
        Self {
            version: 1,
            routes: RouteSettings::default(),
            storage: StorageSettings::default(),
            logging: LoggingSettings::default(),
            accounts: Vec::new(),
        }
    }
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            start_path: "/dashboard".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            session_file: None,
            clear_attempts: DEFAULT_CLEAR_ATTEMPTS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "leaddesk=info".to_string(),
        }
    }
}
