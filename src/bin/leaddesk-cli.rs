//! leaddesk CLI - headless shell for the dashboard's session and route guard
//!
//! # Usage
//!
//! ```bash
//! # Build the CLI binary
//! cargo build --bin leaddesk-cli
//!
//! # Run one command against a throwaway session
//! ./target/debug/leaddesk-cli --memory -e "login rm@leaddesk.local rm123"
//!
//! # Script a walk through the routes, JSON lines for parsing
//! ./target/debug/leaddesk-cli --memory --json -f walk.txt | jq .
//!
//! # Interactive REPL (when no -e or -f provided)
//! ./target/debug/leaddesk-cli
//! ```

use anyhow::Result;
use clap::Parser;

use leaddesk_lib::cli::{execute_batch, execute_once, initialize, run_repl, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut ctx = initialize(&args).await?;

    let result = if let Some(ref command) = args.execute {
        execute_once(&mut ctx, command).await
    } else if let Some(ref file) = args.file {
        execute_batch(&mut ctx, file).await
    } else {
        run_repl(&mut ctx).await
    };

    ctx.shutdown().await?;

    result
}
