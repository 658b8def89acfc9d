//! TOML settings for leaddesk.
//!
//! Settings are loaded from `~/.leaddesk/settings.toml` with environment
//! variable interpolation. The session file location also honours
//! `LEADDESK_SESSION_FILE` through [`get_with_env_fallback`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use leaddesk_lib::settings::SettingsManager;
//!
//! let manager = SettingsManager::new().await?;
//! let settings = manager.get().await;
//! let session_file = manager.session_file().await;
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_with_env_fallback, settings_path, SettingsManager};
pub use schema::{
    AccountSettings, LeaddeskSettings, LoggingSettings, RouteSettings, StorageBackend,
    StorageSettings,
};
