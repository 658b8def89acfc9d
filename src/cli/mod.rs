//! Headless shell over the dashboard core.
//!
//! The CLI wires the same pieces a UI shell would: a [`SessionProvider`]
//! over the configured storage, an in-memory [`History`] router, and a
//! [`RouteGuard`] task watching both. Commands mutate the session or the
//! path; the guard's decisions are printed after each command.
//!
//! ```text
//! +---------+    +-----------------+    +------------+    +-----------+
//! | repl /  | -> | LoginFlow       | -> | RouteGuard | -> | output.rs |
//! | runner  |    | SessionProvider |    |   ::run    |    | text/JSON |
//! +---------+    | History         |    +------------+    +-----------+
//!                +-----------------+
//! ```
//!
//! When no command is given via `-e` or `-f`, the CLI enters the REPL.
//!
//! [`SessionProvider`]: crate::auth::SessionProvider
//! [`History`]: crate::navigation::History
//! [`RouteGuard`]: crate::auth::RouteGuard

mod args;
mod bootstrap;
mod output;
mod repl;
mod runner;

pub use args::Args;
pub use bootstrap::{build_context, initialize, CliContext};
pub use output::{emit, ShellEvent};
pub use repl::{run_repl, ShellCommand};
pub use runner::{execute_batch, execute_command, execute_once};
