//! Command-line interface for the convergence engine.
//!
//! Presentation only: every command loads the project, runs the walker,
//! converger, and evaluator through the shared helpers in [`common`], and
//! renders the statuses the engine produced. Nothing here decides how a
//! conflict is fixed.
//!
//! # Commands
//!
//! - `list` - print every converged dependency with its source, manager,
//!   recorded pin, and status
//! - `tree` - render the converged dependency tree
//!
//! # Global options
//!
//! - `-v/--verbose` - raise log verbosity (repeatable)
//! - `-q/--quiet` - errors only

pub mod common;
mod list;
mod tree;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Top-level CLI definition.
#[derive(Parser)]
#[command(name = "converge", version, about = "Converge a project's dependency graph")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List converged dependencies with their statuses
    List(list::ListCommand),
    /// Render the converged dependency tree
    Tree(tree::TreeCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub fn execute(self) -> Result<()> {
        init_tracing(self.verbose, self.quiet);

        match self.command {
            Commands::List(cmd) => cmd.execute(),
            Commands::Tree(cmd) => cmd.execute(),
        }
    }
}

/// Wire up tracing. `RUST_LOG` wins when set; otherwise the verbosity flags
/// pick the level.
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
