//! Navigation abstraction.
//!
//! The route guard and the login flow are the only callers of
//! [`Navigator::navigate`]. The shell uses [`History`], an in-memory router
//! that records visited paths and publishes the current one on a watch
//! channel so the guard can react to path changes.
//!
//! ```text
//! +-------------+  navigate()  +---------+  watch<String>  +------------+
//! | RouteGuard  | -----------> | History | --------------> | RouteGuard |
//! | LoginFlow   |              |         |                 |   ::run    |
//! +-------------+              +---------+                 +------------+
//! ```

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::watch;

/// Navigation-specific errors
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Navigation target must be an absolute path: '{0}'")]
    InvalidTarget(String),

    #[error("Navigation rejected: {0}")]
    Rejected(String),
}

/// Pushes or replaces the current route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str) -> Result<(), NavigationError>;
}

/// Reduce a navigation target to its canonical path.
///
/// Drops any `?query` or `#fragment`; the remaining path must start with `/`.
/// `.` and empty segments are dropped and `..` pops its parent (never past
/// the root), so the result is the path a URL-resolving router would render.
pub fn normalize_path(raw: &str) -> Result<String, NavigationError> {
    let trimmed = raw.trim();
    let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    let path = &trimmed[..end];

    if !path.starts_with('/') {
        return Err(NavigationError::InvalidTarget(raw.to_string()));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    Ok(format!("/{}", segments.join("/")))
}

/// Most entries [`History`] keeps; older ones are dropped first.
pub const HISTORY_LIMIT: usize = 256;

/// In-memory router history, bounded to [`HISTORY_LIMIT`] entries.
pub struct History {
    entries: RwLock<Vec<String>>,
    current_tx: watch::Sender<String>,
}

impl History {
    /// Start a history at `initial`. An invalid initial target falls back to `/`.
    pub fn new(initial: &str) -> Self {
        let initial = normalize_path(initial).unwrap_or_else(|e| {
            tracing::warn!("{}; starting at '/'", e);
            "/".to_string()
        });
        let (current_tx, _) = watch::channel(initial.clone());
        Self {
            entries: RwLock::new(vec![initial]),
            current_tx,
        }
    }

    /// The path currently displayed.
    pub fn current(&self) -> String {
        self.current_tx.borrow().clone()
    }

    /// Subscribe to current-path changes.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.current_tx.subscribe()
    }

    /// The most recent visited paths, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.read().clone()
    }
}

impl Navigator for History {
    fn navigate(&self, path: &str) -> Result<(), NavigationError> {
        let path = normalize_path(path)?;
        tracing::debug!(target: "leaddesk::navigation", "navigate -> {}", path);
        {
            let mut entries = self.entries.write();
            if entries.len() >= HISTORY_LIMIT {
                let excess = entries.len() + 1 - HISTORY_LIMIT;
                entries.drain(..excess);
            }
            entries.push(path.clone());
        }
        self.current_tx.send_replace(path);
        Ok(())
    }
}
