//! Lightweight REPL for leaddesk-cli.
//!
//! Entered when no command is given via `-e` or `-f`. Each line is parsed
//! into a [`ShellCommand`] and handed to the runner.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use super::bootstrap::CliContext;
use super::output::{emit, print_help, ShellEvent};
use super::runner::execute_command;

/// Shell command variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Login { email: String, password: String },
    Logout,
    /// Navigate to a path
    Go(String),
    WhoAmI,
    /// Show a setting by dot-path
    Config(String),
    Help,
    Quit,
    /// Known command with the wrong arguments; carries the usage line
    Usage(&'static str),
    /// Unknown command (will show help)
    Unknown(String),
    /// Empty input or a `#` comment
    Empty,
}

impl ShellCommand {
    /// Parse one line of input.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return ShellCommand::Empty;
        }

        let mut words = trimmed.split_whitespace();
        let Some(head) = words.next() else {
            return ShellCommand::Empty;
        };
        let rest: Vec<&str> = words.collect();

        match (head.to_lowercase().as_str(), rest.as_slice()) {
            ("login", [email, password]) => ShellCommand::Login {
                email: (*email).to_string(),
                password: (*password).to_string(),
            },
            ("login", _) => ShellCommand::Usage("login <email> <password>"),
            ("logout", []) => ShellCommand::Logout,
            ("go", [path]) => ShellCommand::Go((*path).to_string()),
            ("go", _) => ShellCommand::Usage("go <path>"),
            ("whoami", []) => ShellCommand::WhoAmI,
            ("config", [key]) => ShellCommand::Config((*key).to_string()),
            ("config", _) => ShellCommand::Usage("config <key>"),
            ("help" | "?", _) => ShellCommand::Help,
            ("quit" | "exit" | "q", []) => ShellCommand::Quit,
            _ => ShellCommand::Unknown(trimmed.to_string()),
        }
    }
}

/// Run an interactive session until `quit` or EOF (Ctrl+D).
///
/// The prompt is only printed when stdin is a terminal, so piped input
/// produces clean output.
pub async fn run_repl(ctx: &mut CliContext) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let interactive = atty::is(atty::Stream::Stdin);

    if interactive {
        eprintln!("leaddesk-cli interactive mode");
        eprintln!("Type help for commands, quit to exit\n");
    }

    loop {
        if interactive {
            print!("{}> ", ctx.history.current());
            stdout.flush()?;
        }

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            if interactive {
                eprintln!();
            }
            break;
        }

        match ShellCommand::parse(&input) {
            ShellCommand::Empty => continue,
            ShellCommand::Quit => break,
            ShellCommand::Help => print_help(),
            ShellCommand::Unknown(cmd) => {
                eprintln!("Unknown command: {}", cmd);
                print_help();
            }
            command => {
                if let Err(e) = execute_command(ctx, command).await {
                    emit(
                        &ShellEvent::Error {
                            message: format!("{:#}", e),
                        },
                        ctx.args.json,
                    )?;
                }
            }
        }
    }

    Ok(())
}
