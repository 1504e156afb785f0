//! List converged dependencies with their statuses.
//!
//! The command walks, converges, and evaluates the project for one execution
//! context, then prints one block per dependency:
//!
//! ```text
//! * plug ^1.14 (registry package)
//!   locked at 1.14.2 (sha256:9d2f31)
//!   ok
//! ```
//!
//! Names given on the command line select a subset; a name absent from the
//! converged set is an error and the exit code is non-zero. `--all` disables
//! environment and target filtering entirely, so restricted dependencies
//! show up too.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::ProjectContext;
use crate::cache::ConvergenceCache;
use crate::converger::{self, Converged};
use crate::dep::{Dep, DepStatus};
use crate::lockfile::Lockfile;
use crate::walker::WalkContext;

/// Command to list converged dependencies.
#[derive(Args)]
pub struct ListCommand {
    /// Show only these dependencies
    ///
    /// Each name must exist in the converged set for the active environment
    /// and target; an unknown name fails with a non-zero exit code.
    names: Vec<String>,

    /// Include dependencies restricted to other environments or targets
    #[arg(long)]
    all: bool,

    /// Environment to converge for
    #[arg(long, default_value = "dev", value_name = "ENV")]
    env: String,

    /// Target to converge for
    #[arg(long, default_value = "host", value_name = "TARGET")]
    target: String,

    /// Output format (table, json)
    #[arg(short = 'f', long, default_value = "table")]
    format: String,

    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    project_dir: Option<PathBuf>,
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(self) -> Result<()> {
        let project = ProjectContext::load(self.project_dir.clone())?;
        let ctx = if self.all {
            WalkContext::all(&self.env, &self.target)
        } else {
            WalkContext::new(&self.env, &self.target)
        };

        let cache = ConvergenceCache::new();
        let converged = project.converge(&ctx, &cache)?;

        let selected: Vec<&Dep> = if self.names.is_empty() {
            converged.deps.iter().collect()
        } else {
            converger::filter_by_names(&converged, &self.names, &self.env)?
        };

        match self.format.as_str() {
            "json" => print_json(&selected, &converged)?,
            "table" => print_table(&selected, &converged, &project.lockfile),
            other => anyhow::bail!("Unknown format '{other}' (expected table or json)"),
        }

        Ok(())
    }
}

fn print_table(selected: &[&Dep], converged: &Converged, lockfile: &Lockfile) {
    if selected.is_empty() {
        println!("No dependencies for this environment and target.");
        return;
    }

    for dep in selected {
        print_dep(dep, lockfile);
    }

    if !converged.overridden.is_empty() {
        println!();
        println!("{}", "Overridden declarations:".bright_black());
        for dep in &converged.overridden {
            print_dep(dep, lockfile);
        }
    }
}

fn print_dep(dep: &Dep, lockfile: &Lockfile) {
    let manager =
        dep.manager.map(|manager| format!(" ({manager})")).unwrap_or_default();
    println!(
        "* {} {} ({}){}",
        dep.app.bold(),
        dep.requirement_display(),
        dep.scm.format(&dep.opts),
        manager
    );

    if let Some(pin) = dep.scm.format_lock(lockfile.entry(&dep.app)) {
        println!("  locked at {pin}");
    }

    let report = dep.status.report();
    let line = match &dep.status {
        DepStatus::Ok => report.green(),
        status if status.diverged() => report.red(),
        DepStatus::Overridden(_) => report.bright_black(),
        _ => report.yellow(),
    };
    println!("  {line}");
}

fn print_json(selected: &[&Dep], converged: &Converged) -> Result<()> {
    let output = serde_json::json!({
        "deps": selected.iter().map(|dep| dep_json(dep)).collect::<Vec<_>>(),
        "overridden": converged.overridden.iter().map(dep_json).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn dep_json(dep: &Dep) -> serde_json::Value {
    serde_json::json!({
        "app": dep.app,
        "requirement": dep.requirement.as_ref().map(ToString::to_string),
        "scm": dep.scm.name(),
        "source": dep.scm.format(&dep.opts),
        "manager": dep.manager.map(|manager| manager.to_string()),
        "status": dep.status.report(),
        "available": dep.available(),
        "top_level": dep.top_level,
        "from": dep.from.display().to_string(),
    })
}
