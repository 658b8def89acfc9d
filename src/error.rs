use serde::Serialize;
use thiserror::Error;

use crate::navigation::NavigationError;
use crate::persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum LeaddeskError {
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Session provider has been torn down")]
    ProviderClosed,

    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),
}

// Errors cross the shell boundary as plain strings
impl Serialize for LeaddeskError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LeaddeskError>;
