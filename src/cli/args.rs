//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for leaddesk-cli.

use clap::Parser;
use std::path::PathBuf;

/// leaddesk CLI - headless shell over the dashboard's session and route guard
#[derive(Parser, Debug, Clone)]
#[command(name = "leaddesk-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Settings file (default: ~/.leaddesk/settings.toml)
    #[arg(long, env = "LEADDESK_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Execute a single shell command and exit
    #[arg(short = 'e', long, conflicts_with = "file")]
    pub execute: Option<String>,

    /// Execute shell commands from a file (one per line) and exit
    #[arg(short = 'f', long, conflicts_with = "execute")]
    pub file: Option<PathBuf>,

    /// Keep the session in memory only, ignoring storage.backend
    #[arg(long)]
    pub memory: bool,

    /// Path to open at startup (overrides routes.start_path)
    #[arg(long)]
    pub start: Option<String>,

    /// Output events as JSON lines (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["leaddesk-cli"]);
        assert_eq!(args.execute, None);
        assert_eq!(args.start, None);
        assert!(!args.memory);
        assert!(!args.json);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_execute_flag() {
        let args = Args::parse_from(["leaddesk-cli", "-e", "go /reports"]);
        assert_eq!(args.execute, Some("go /reports".to_string()));
    }

    #[test]
    fn test_args_execute_conflicts_with_file() {
        let result = Args::try_parse_from(["leaddesk-cli", "-e", "whoami", "-f", "script.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_session_overrides() {
        let args = Args::parse_from([
            "leaddesk-cli",
            "--memory",
            "--start",
            "/rm-inbox",
            "--settings",
            "/tmp/ld.toml",
        ]);
        assert!(args.memory);
        assert_eq!(args.start, Some("/rm-inbox".to_string()));
        assert_eq!(args.settings, Some(PathBuf::from("/tmp/ld.toml")));
    }

    #[test]
    fn test_args_output_modes() {
        let args = Args::parse_from(["leaddesk-cli", "--json", "-v"]);
        assert!(args.json);
        assert!(args.verbose);
    }
}
