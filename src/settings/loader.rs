//! Settings loading and environment variable interpolation.
//!
//! `SettingsManager` reads `~/.leaddesk/settings.toml` (or an explicit path)
//! and resolves `$VAR` / `${VAR}` references. The file is only ever written
//! once, from the first-run template, so resolved secrets never reach disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::RwLock;

use super::schema::LeaddeskSettings;

/// Embedded template for first-run generation.
const TEMPLATE: &str = include_str!("template.toml");

/// Env var consulted when `storage.session_file` is not set.
pub const SESSION_FILE_ENV: &str = "LEADDESK_SESSION_FILE";

fn leaddesk_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".leaddesk")
}

/// Default location of the settings file.
pub fn settings_path() -> PathBuf {
    leaddesk_dir().join("settings.toml")
}

/// Default location of the persisted session record.
pub fn default_session_file() -> PathBuf {
    leaddesk_dir().join("session.toml")
}

pub struct SettingsManager {
    /// Cached settings (with env vars resolved)
    settings: RwLock<LeaddeskSettings>,

    path: PathBuf,
}

impl SettingsManager {
    /// Load from the default location.
    pub async fn new() -> Result<Self> {
        Self::with_path(settings_path()).await
    }

    /// Load from `path`; a missing file yields defaults.
    pub async fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = Self::load_from_path(&path).await?;

        Ok(Self {
            settings: RwLock::new(settings),
            path,
        })
    }

    async fn load_from_path(path: &Path) -> Result<LeaddeskSettings> {
        if !path.exists() {
            tracing::debug!("Settings file not found at {:?}, using defaults", path);
            return Ok(LeaddeskSettings::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;

        let mut settings: LeaddeskSettings =
            toml::from_str(&contents).context("Failed to deserialize settings")?;

        Self::resolve_env_vars(&mut settings);

        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Resolve $ENV_VAR references in string fields.
    fn resolve_env_vars(settings: &mut LeaddeskSettings) {
        if let Some(v) = settings.storage.session_file.as_mut() {
            if let Some(resolved) = resolve_env_ref(v) {
                *v = resolved;
            }
        }

        for account in settings.accounts.iter_mut() {
            if let Some(resolved) = resolve_env_ref(&account.password) {
                account.password = resolved;
            }
        }
    }

    pub async fn get(&self) -> LeaddeskSettings {
        self.settings.read().await.clone()
    }

    /// Look up a setting by dot-notation key (e.g. "routes.login_path").
    pub async fn get_value(&self, key: &str) -> Result<serde_json::Value> {
        let settings = self.settings.read().await;
        let json = serde_json::to_value(&*settings)?;

        let mut current = &json;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow::anyhow!("Setting '{}' not found", key))?;
        }

        Ok(current.clone())
    }

    /// Where the session record lives: setting, then env, then default.
    pub async fn session_file(&self) -> PathBuf {
        let settings = self.settings.read().await;
        get_with_env_fallback(&settings.storage.session_file, &[SESSION_FILE_ENV], None)
            .map(PathBuf::from)
            .unwrap_or_else(default_session_file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the commented template if no settings file exists yet.
    ///
    /// Returns `true` if a new file was created.
    pub async fn ensure_settings_file(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Temp file + rename so a crash never leaves a half-written file
        let temp_path = self.path.with_extension("toml.tmp");
        tokio::fs::write(&temp_path, TEMPLATE).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        tracing::info!("Generated settings template at {:?}", self.path);
        Ok(true)
    }
}

/// Resolve a $ENV_VAR or ${ENV_VAR} reference.
///
/// Returns `None` if the value is not a reference or the variable is unset.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let name = trimmed.strip_prefix('$')?;
    let name = name
        .strip_prefix('{')
        .and_then(|n| n.strip_suffix('}'))
        .unwrap_or(name);

    std::env::var(name).ok()
}

/// Get a setting value with environment variable fallback.
///
/// Priority order:
/// 1. Settings value (if set and non-empty)
/// 2. Environment variable (first match from list)
/// 3. Default value
pub fn get_with_env_fallback(
    setting: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    if let Some(v) = setting {
        if !v.is_empty() {
            return Some(v.clone());
        }
    }

    env_vars
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
        .or(default)
}
