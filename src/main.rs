//! Converge CLI entry point.
//!
//! Handles command-line argument parsing, error display, and command
//! execution. The commands themselves live in [`converge_cli::cli`]; this
//! binary only wires parsing to execution and renders failures through the
//! user-friendly error path.

use anyhow::Result;
use clap::Parser;
use converge_cli::cli;
use converge_cli::core::error::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
