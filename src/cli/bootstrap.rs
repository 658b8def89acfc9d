//! CLI bootstrap - wire settings, session storage, provider, history and
//! route guard together for shell usage.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use crate::auth::{
    Account, GuardOutcome, IdentityVerifier, LoginFlow, RouteGuard, SessionProvider,
    SessionStore, StaticAccountVerifier,
};
use crate::navigation::History;
use crate::persistence::{FileStore, MemoryStore, PersistenceStore};
use crate::settings::{LeaddeskSettings, SettingsManager, StorageBackend};

use super::args::Args;

/// Everything a shell command needs.
pub struct CliContext {
    pub settings_manager: Arc<SettingsManager>,

    /// Snapshot taken at startup
    pub settings: LeaddeskSettings,

    pub provider: Arc<SessionProvider>,

    pub history: Arc<History>,

    pub login_flow: LoginFlow,

    /// Guard decisions, drained after each command
    pub outcome_rx: mpsc::UnboundedReceiver<GuardOutcome>,

    guard_task: JoinHandle<()>,

    pub args: Args,
}

impl CliContext {
    /// Tear the provider down and stop the guard.
    pub async fn shutdown(self) -> Result<()> {
        self.provider.teardown();
        self.guard_task.abort();
        if let Err(e) = self.guard_task.await {
            if !e.is_cancelled() {
                tracing::warn!("Route guard task failed: {}", e);
            }
        }
        Ok(())
    }
}

/// Initialize the CLI context.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("[cli] Failed to load .env file: {}", e);
        }
    }

    let settings_manager = Arc::new(match &args.settings {
        Some(path) => SettingsManager::with_path(path)
            .await
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => SettingsManager::new()
            .await
            .context("Failed to initialize settings manager")?,
    });

    let settings = settings_manager.get().await;
    init_logging(&settings.logging.filter, args.verbose);

    // Only the default location gets a first-run template
    if args.settings.is_none() {
        if let Err(e) = settings_manager.ensure_settings_file().await {
            tracing::warn!("Failed to create settings template: {}", e);
        }
    }

    if args.verbose {
        eprintln!(
            "[cli] Settings loaded from {}",
            settings_manager.path().display()
        );
    }

    build_context(args, settings_manager).await
}

/// Assemble the context from loaded settings and wait for bootstrap.
pub async fn build_context(
    args: &Args,
    settings_manager: Arc<SettingsManager>,
) -> Result<CliContext> {
    let settings = settings_manager.get().await;

    let persistence: Arc<dyn PersistenceStore> =
        if args.memory || settings.storage.backend == StorageBackend::Memory {
            Arc::new(MemoryStore::new())
        } else {
            let path = settings_manager.session_file().await;
            if args.verbose {
                eprintln!("[cli] Session file: {}", path.display());
            }
            Arc::new(FileStore::new(path))
        };

    let store = SessionStore::new(persistence).with_clear_attempts(settings.storage.clear_attempts);
    let provider = Arc::new(SessionProvider::new(Arc::new(store)));

    let start = args
        .start
        .clone()
        .unwrap_or_else(|| settings.routes.start_path.clone());
    let history = Arc::new(History::new(&start));

    let login_flow = LoginFlow::new(
        verifier_for(&settings),
        provider.clone(),
        history.clone(),
        settings.routes.login_path.clone(),
    );

    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
    let guard = RouteGuard::new(settings.routes.login_path.clone(), history.clone());
    let guard_task = tokio::spawn(guard.run(history.subscribe(), provider.subscribe(), outcome_tx));

    provider
        .activate()
        .context("Failed to start session bootstrap")?;
    let state = provider.settled().await;
    tracing::debug!("Session bootstrap settled: {}", state.label());

    if let Some(failure) = provider.bootstrap_failure() {
        eprintln!("[cli] Warning: {}; starting signed out", failure);
    }

    // A restored session opened on the login page moves to its landing route
    login_flow.leave_login_page(&history.current());

    Ok(CliContext {
        settings_manager,
        settings,
        provider,
        history,
        login_flow,
        outcome_rx,
        guard_task,
        args: args.clone(),
    })
}

/// Configured accounts replace the reference table when present.
fn verifier_for(settings: &LeaddeskSettings) -> Arc<dyn IdentityVerifier> {
    if settings.accounts.is_empty() {
        return Arc::new(StaticAccountVerifier::reference());
    }
    let accounts = settings.accounts.iter().map(Account::from).collect();
    Arc::new(StaticAccountVerifier::new(accounts))
}

/// `RUST_LOG` wins; otherwise the configured filter, plus `leaddesk=debug`
/// when verbose.
fn log_filter(rust_log: Option<&str>, configured: &str, verbose: bool) -> String {
    match rust_log {
        Some(env) if !env.trim().is_empty() => env.to_string(),
        _ if verbose => format!("{},leaddesk=debug", configured),
        _ => configured.to_string(),
    }
}

fn init_logging(configured: &str, verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directives = log_filter(rust_log.as_deref(), configured, verbose);
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("[cli] Invalid log filter '{}': {}", directives, e);
        EnvFilter::new("leaddesk=info")
    });

    // Logs go to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{GuardState, Role, SessionState};
    use crate::settings::AccountSettings;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_log_filter_precedence() {
        assert_eq!(
            log_filter(Some("trace"), "leaddesk=info", true),
            "trace"
        );
        assert_eq!(log_filter(None, "leaddesk=info", false), "leaddesk=info");
        assert_eq!(
            log_filter(Some(""), "leaddesk=warn", true),
            "leaddesk=warn,leaddesk=debug"
        );
    }

    #[tokio::test]
    async fn test_verifier_prefers_configured_accounts() {
        let mut settings = LeaddeskSettings::default();
        assert!(verifier_for(&settings)
            .verify("admin@leaddesk.local", "admin123")
            .await
            .is_some());

        settings.accounts.push(AccountSettings {
            id: "RM042".to_string(),
            email: "pat@bank.example".to_string(),
            password: "pw".to_string(),
            role: Role::RelationshipManager,
        });
        let verifier = verifier_for(&settings);
        assert!(verifier
            .verify("admin@leaddesk.local", "admin123")
            .await
            .is_none());
        assert_eq!(
            verifier.verify("pat@bank.example", "pw").await.unwrap().id,
            "RM042"
        );
    }

    #[tokio::test]
    async fn test_build_context_starts_signed_out_and_redirects() {
        let dir = TempDir::new().unwrap();
        let manager = Arc::new(
            SettingsManager::with_path(dir.path().join("settings.toml"))
                .await
                .unwrap(),
        );
        let args = Args::parse_from(["leaddesk-cli", "--memory", "--start", "/reports"]);

        let mut ctx = build_context(&args, manager).await.unwrap();
        assert_eq!(ctx.provider.state(), SessionState::Unauthenticated);

        // Guard sees the settled session on /reports and sends it to /login
        loop {
            let outcome = ctx.outcome_rx.recv().await.unwrap();
            if outcome.state == GuardState::LoginException {
                assert_eq!(outcome.path, "/login");
                break;
            }
        }
        assert_eq!(ctx.history.current(), "/login");

        ctx.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_build_context_restores_file_session() {
        let dir = TempDir::new().unwrap();
        let session_file = dir.path().join("session.toml");
        std::fs::write(
            dir.path().join("settings.toml"),
            format!(
                "[storage]\nsession_file = \"{}\"\n",
                session_file.display()
            ),
        )
        .unwrap();
        std::fs::write(
            &session_file,
            "isLoggedIn = \"true\"\nuserEmail = \"inbox@leaddesk.local\"\nuserRole = \"relationship_manager_inbox\"\nuserId = \"RMI001\"\n",
        )
        .unwrap();

        let manager = Arc::new(
            SettingsManager::with_path(dir.path().join("settings.toml"))
                .await
                .unwrap(),
        );
        let args = Args::parse_from(["leaddesk-cli", "--start", "/login"]);

        let ctx = build_context(&args, manager).await.unwrap();

        assert_eq!(ctx.provider.state().role(), Role::RelationshipManagerInbox);
        assert_eq!(ctx.history.current(), "/rm-inbox");
        ctx.shutdown().await.unwrap();
    }
}
