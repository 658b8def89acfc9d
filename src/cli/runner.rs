//! CLI execution runner.
//!
//! Runs shell commands against the context and reports what the route guard
//! decided as a result.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::auth::LoginError;
use crate::navigation::Navigator;

use super::bootstrap::CliContext;
use super::output::{emit, print_help, ShellEvent};
use super::repl::ShellCommand;

/// How long the guard gets to react after a command before we stop waiting.
const GUARD_SETTLE: Duration = Duration::from_millis(50);

/// Parse and execute one line.
pub async fn execute_once(ctx: &mut CliContext, input: &str) -> Result<()> {
    match ShellCommand::parse(input) {
        ShellCommand::Empty | ShellCommand::Quit => Ok(()),
        command => execute_command(ctx, command).await,
    }
}

/// Execute a parsed command, then print the guard outcomes it caused.
pub async fn execute_command(ctx: &mut CliContext, command: ShellCommand) -> Result<()> {
    let json = ctx.args.json;

    match command {
        ShellCommand::Login { email, password } => {
            match ctx.login_flow.submit(&email, &password).await {
                Ok(session) => emit(&ShellEvent::LoggedIn { session }, json)?,
                Err(LoginError::InvalidCredentials) => emit(
                    &ShellEvent::LoginRejected {
                        message: LoginError::InvalidCredentials.to_string(),
                    },
                    json,
                )?,
                Err(e) => return Err(e).context("Login failed"),
            }
        }
        ShellCommand::Logout => {
            ctx.provider.logout()?;
            emit(&ShellEvent::LoggedOut, json)?;
        }
        ShellCommand::Go(path) => {
            ctx.history
                .navigate(&path)
                .with_context(|| format!("Cannot navigate to '{}'", path))?;
            let current = ctx.history.current();
            emit(&ShellEvent::Navigated { path: current.clone() }, json)?;
            ctx.login_flow.leave_login_page(&current);
        }
        ShellCommand::WhoAmI => emit(
            &ShellEvent::Status {
                path: ctx.history.current(),
                session: ctx.provider.state(),
                bootstrap_failure: ctx.provider.bootstrap_failure(),
            },
            json,
        )?,
        ShellCommand::Config(key) => {
            let value = ctx.settings_manager.get_value(&key).await?;
            emit(&ShellEvent::Config { key, value }, json)?;
        }
        ShellCommand::Help => print_help(),
        ShellCommand::Usage(usage) => anyhow::bail!("Usage: {}", usage),
        ShellCommand::Unknown(cmd) => anyhow::bail!("Unknown command: {} (try help)", cmd),
        ShellCommand::Empty | ShellCommand::Quit => {}
    }

    drain_outcomes(ctx).await
}

/// Print guard outcomes until the guard has been quiet for a moment.
async fn drain_outcomes(ctx: &mut CliContext) -> Result<()> {
    while let Ok(Some(outcome)) = tokio::time::timeout(GUARD_SETTLE, ctx.outcome_rx.recv()).await
    {
        emit(&ShellEvent::Guard(outcome), ctx.args.json)?;
    }
    Ok(())
}

/// Execute commands from a file, one per line.
///
/// Blank lines and `#` comments are skipped; `quit` ends the batch early.
/// Execution stops on the first error.
pub async fn execute_batch(ctx: &mut CliContext, file_path: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(file_path)
        .await
        .with_context(|| format!("Failed to read command file: {}", file_path.display()))?;

    let commands: Vec<(usize, ShellCommand)> = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, ShellCommand::parse(line)))
        .filter(|(_, command)| *command != ShellCommand::Empty)
        .collect();

    if commands.is_empty() {
        anyhow::bail!("No commands found in file: {}", file_path.display());
    }

    if ctx.args.verbose {
        eprintln!(
            "[batch] Executing {} command(s) from {}",
            commands.len(),
            file_path.display()
        );
    }

    for (line_no, command) in commands {
        if command == ShellCommand::Quit {
            break;
        }
        execute_command(ctx, command)
            .await
            .with_context(|| format!("{}:{}", file_path.display(), line_no))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, SessionState};
    use crate::cli::args::Args;
    use crate::cli::bootstrap::build_context;
    use crate::settings::SettingsManager;
    use clap::Parser;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn context(dir: &TempDir) -> CliContext {
        let manager = Arc::new(
            SettingsManager::with_path(dir.path().join("settings.toml"))
                .await
                .unwrap(),
        );
        let args = Args::parse_from(["leaddesk-cli", "--memory", "--start", "/login"]);
        let mut ctx = build_context(&args, manager).await.unwrap();
        drain_outcomes(&mut ctx).await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_login_lands_on_role_route() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir).await;

        execute_once(&mut ctx, "login rm@leaddesk.local rm123")
            .await
            .unwrap();

        assert_eq!(ctx.provider.state().role(), Role::RelationshipManager);
        assert_eq!(ctx.history.current(), "/rm-leads");
        ctx.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_login_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir).await;

        execute_once(&mut ctx, "login rm@leaddesk.local wrong")
            .await
            .unwrap();

        assert_eq!(ctx.provider.state(), SessionState::Unauthenticated);
        assert_eq!(ctx.history.current(), "/login");
        ctx.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_go_to_forbidden_route_is_redirected() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir).await;

        execute_once(&mut ctx, "login inbox@leaddesk.local inbox123")
            .await
            .unwrap();
        execute_once(&mut ctx, "go /reports").await.unwrap();

        assert_eq!(ctx.history.current(), "/rm-inbox");
        assert!(ctx.history.entries().ends_with(&[
            "/reports".to_string(),
            "/rm-inbox".to_string()
        ]));
        ctx.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_sends_user_to_login() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir).await;

        execute_once(&mut ctx, "login admin@leaddesk.local admin123")
            .await
            .unwrap();
        assert_eq!(ctx.history.current(), "/dashboard");

        execute_once(&mut ctx, "logout").await.unwrap();
        assert_eq!(ctx.provider.state(), SessionState::Unauthenticated);
        assert_eq!(ctx.history.current(), "/login");
        ctx.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_commands_are_errors() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir).await;

        assert!(execute_once(&mut ctx, "go reports").await.is_err());
        assert!(execute_once(&mut ctx, "config nope.nope").await.is_err());
        assert!(execute_once(&mut ctx, "fly /moon").await.is_err());
        assert!(execute_once(&mut ctx, "login only-email").await.is_err());
        ctx.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_runs_until_quit() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir).await;
        let script = dir.path().join("script.txt");
        std::fs::write(
            &script,
            "# sign in as admin\nlogin admin@leaddesk.local admin123\n\ngo /rm-inbox\nquit\nlogout\n",
        )
        .unwrap();

        execute_batch(&mut ctx, &script).await.unwrap();

        assert_eq!(ctx.provider.state().role(), Role::Admin);
        assert_eq!(ctx.history.current(), "/rm-inbox");
        ctx.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir).await;
        let script = dir.path().join("empty.txt");
        std::fs::write(&script, "# nothing\n\n").unwrap();

        assert!(execute_batch(&mut ctx, &script).await.is_err());
        ctx.shutdown().await.unwrap();
    }
}
