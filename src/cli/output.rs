//! CLI output handling.
//!
//! Every user-visible result of a shell command is a [`ShellEvent`]. In JSON
//! mode each event becomes one line on stdout with a timestamp; otherwise
//! it is rendered as a short human-readable line.

use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{BootstrapFailure, GuardOutcome, GuardState, Session, SessionState};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellEvent {
    /// The guard evaluated a (path, session) pair
    Guard(GuardOutcome),
    LoggedIn {
        session: Session,
    },
    LoggedOut,
    LoginRejected {
        message: String,
    },
    Navigated {
        path: String,
    },
    /// Answer to `whoami`
    Status {
        path: String,
        session: SessionState,
        #[serde(skip_serializing_if = "Option::is_none")]
        bootstrap_failure: Option<BootstrapFailure>,
    },
    Config {
        key: String,
        value: serde_json::Value,
    },
    Error {
        message: String,
    },
}

#[derive(Serialize)]
struct Stamped<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a ShellEvent,
}

/// Print one event in the selected output mode.
pub fn emit(event: &ShellEvent, json_mode: bool) -> Result<()> {
    let mut stdout = io::stdout();
    if json_mode {
        let line = serde_json::to_string(&Stamped {
            timestamp: Utc::now(),
            event,
        })?;
        writeln!(stdout, "{}", line)?;
    } else {
        writeln!(stdout, "{}", format_text(event))?;
    }
    stdout.flush()?;
    Ok(())
}

/// Human-readable rendering of an event.
pub fn format_text(event: &ShellEvent) -> String {
    match event {
        ShellEvent::Guard(outcome) => format_guard(outcome),
        ShellEvent::LoggedIn { session } => format!(
            "[session] logged in as {} ({}, {})",
            session.email(),
            session.role(),
            session.id()
        ),
        ShellEvent::LoggedOut => "[session] logged out".to_string(),
        ShellEvent::LoginRejected { message } => format!("[login] {}", message),
        ShellEvent::Navigated { path } => format!("[nav] {}", path),
        ShellEvent::Status {
            path,
            session,
            bootstrap_failure,
        } => {
            let who = match session {
                SessionState::Authenticated(s) => format!("{} ({})", s.email(), s.role()),
                other => other.label().to_string(),
            };
            let mut line = format!("[whoami] {} at {}", who, path);
            if let Some(failure) = bootstrap_failure {
                line.push_str(&format!(" [bootstrap: {}]", failure));
            }
            line
        }
        ShellEvent::Config { key, value } => format!("{} = {}", key, value),
        ShellEvent::Error { message } => format!("Error: {}", message),
    }
}

fn format_guard(outcome: &GuardOutcome) -> String {
    let verdict = match &outcome.state {
        GuardState::AwaitingSession => "waiting for session".to_string(),
        GuardState::Allowed => "render".to_string(),
        GuardState::LoginException => "render (login page)".to_string(),
        GuardState::Denied { redirect_to } if outcome.navigated => {
            format!("redirect -> {}", redirect_to)
        }
        GuardState::Denied { redirect_to } => format!("denied (redirect to {} pending)", redirect_to),
    };
    format!("[guard] {} [{}] {}", outcome.path, outcome.session, verdict)
}

pub fn print_help() {
    eprintln!("Commands:");
    eprintln!("  login <email> <password>   sign in and go to the role's landing page");
    eprintln!("  logout                     end the session");
    eprintln!("  go <path>                  navigate (the route guard decides what renders)");
    eprintln!("  whoami                     show the session and current path");
    eprintln!("  config <key>               show a setting, e.g. routes.login_path");
    eprintln!("  help                       this text");
    eprintln!("  quit | exit | q            leave the shell");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn outcome(path: &str, state: GuardState, navigated: bool) -> GuardOutcome {
        GuardOutcome {
            path: path.to_string(),
            session: "authenticated",
            state,
            navigated,
        }
    }

    #[test]
    fn test_format_guard_lines() {
        let allowed = ShellEvent::Guard(outcome("/reports", GuardState::Allowed, false));
        assert_eq!(
            format_text(&allowed),
            "[guard] /reports [authenticated] render"
        );

        let denied = ShellEvent::Guard(outcome(
            "/dashboard",
            GuardState::Denied {
                redirect_to: "/rm-leads".to_string(),
            },
            true,
        ));
        assert_eq!(
            format_text(&denied),
            "[guard] /dashboard [authenticated] redirect -> /rm-leads"
        );
    }

    #[test]
    fn test_format_status_with_session() {
        let session = Session::new("RM001", "rm@leaddesk.local", Role::RelationshipManager).unwrap();
        let event = ShellEvent::Status {
            path: "/rm-leads".to_string(),
            session: SessionState::Authenticated(session),
            bootstrap_failure: None,
        };
        assert_eq!(
            format_text(&event),
            "[whoami] rm@leaddesk.local (relationship_manager) at /rm-leads"
        );
    }

    #[test]
    fn test_json_line_is_tagged_and_stamped() {
        let event = ShellEvent::Guard(outcome(
            "/reports",
            GuardState::Denied {
                redirect_to: "/rm-inbox".to_string(),
            },
            true,
        ));
        let json = serde_json::to_value(Stamped {
            timestamp: Utc::now(),
            event: &event,
        })
        .unwrap();

        assert_eq!(json["type"], "guard");
        assert_eq!(json["state"], "denied");
        assert_eq!(json["redirect_to"], "/rm-inbox");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_status_json_omits_absent_bootstrap_failure() {
        let event = ShellEvent::Status {
            path: "/login".to_string(),
            session: SessionState::Unauthenticated,
            bootstrap_failure: None,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "status");
        assert_eq!(json["session"]["status"], "unauthenticated");
        assert!(json.get("bootstrap_failure").is_none());
    }
}
