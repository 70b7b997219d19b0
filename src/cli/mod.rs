//! # Command-Line Interface
//!
//! The `flow` binary: a thin driver over the engine for scripting and
//! inspection.
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `new` | Create a single-node sheet |
//! | `regions` | Show branch/convergence regions |
//! | `order` | Show the vertical navigation order |
//! | `check` | Validate structure; non-zero exit when invalid |
//! | `apply` | Run an edit script (see [`script`]) |
//! | `templates` | List configured templates |
//!
//! ## Output Formats
//!
//! All commands support `--format text|json`. Without the flag the global
//! config's `default_format` applies.
//!
//! ## Logging
//!
//! Engine events go to stderr through `tracing`. Set `FLOW_LOG` (for example
//! `FLOW_LOG=flowsheet=debug`) or pass `--verbose`.

mod app;
mod output;
pub mod script;
mod sheet_cmd;

pub use app::{run, Cli, Commands, LOG_ENV};
pub use output::{Output, OutputFormat};
