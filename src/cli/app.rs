//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::sheet_cmd;
use crate::storage::Config;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "FLOW_LOG";

#[derive(Parser)]
#[command(name = "flow")]
#[command(author, version, about = "Edit production flow sheets from the command line")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format, else text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a sheet with a single root node
    New {
        /// Sheet title
        title: String,

        /// Kind of the root node (operation, external, wait, qc, ...)
        #[arg(long, short)]
        kind: Option<String>,

        /// Title of the root node (defaults to the sheet title)
        #[arg(long)]
        root: Option<String>,

        /// Write the sheet here instead of printing it
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Show the branch/convergence regions of a sheet
    Regions {
        /// Path to the sheet JSON
        sheet: PathBuf,
    },

    /// Show the vertical navigation order of a sheet
    Order {
        /// Path to the sheet JSON
        sheet: PathBuf,
    },

    /// Validate a sheet's structure
    Check {
        /// Path to the sheet JSON
        sheet: PathBuf,
    },

    /// Run an edit script against a sheet
    Apply {
        /// Path to the sheet JSON
        sheet: PathBuf,

        /// Script with one edit command per line
        #[arg(long, short)]
        script: PathBuf,

        /// Write the result here instead of printing it
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// List configured templates
    Templates,
}

/// Installs the stderr log subscriber
///
/// `FLOW_LOG` takes a standard filter directive; `--verbose` forces debug.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;
    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format, cli.verbose);

    output.verbose("flow starting");
    if let Some(root) = &config.project_root {
        output.verbose_ctx("config", &format!("Project config at: {}", root.display()));
    }

    match cli.command {
        Commands::New {
            title,
            kind,
            root,
            out,
        } => {
            output.verbose_ctx("new", &format!("Creating sheet: {}", title));
            sheet_cmd::new(
                &output,
                &config,
                &title,
                kind.as_deref(),
                root.as_deref(),
                out.as_deref(),
            )?
        }

        Commands::Regions { sheet } => {
            output.verbose_ctx("regions", &format!("Reading: {}", sheet.display()));
            sheet_cmd::regions(&output, &sheet)?
        }

        Commands::Order { sheet } => {
            output.verbose_ctx("order", &format!("Reading: {}", sheet.display()));
            sheet_cmd::order(&output, &sheet)?
        }

        Commands::Check { sheet } => {
            output.verbose_ctx("check", &format!("Checking: {}", sheet.display()));
            sheet_cmd::check(&output, &sheet)?
        }

        Commands::Apply { sheet, script, out } => {
            output.verbose_ctx(
                "apply",
                &format!("Applying {} to {}", script.display(), sheet.display()),
            );
            sheet_cmd::apply(&output, &config, &sheet, &script, out.as_deref())?
        }

        Commands::Templates => sheet_cmd::templates(&output, &config)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
