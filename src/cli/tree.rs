//! Render the converged dependency tree.
//!
//! Shows each top-level dependency with its transitive dependencies nested
//! under it, using box-drawing characters like `cargo tree`. An app that
//! already appeared earlier is marked with `(*)` and its subtree is not
//! repeated, which is also how diamond and cyclic declarations render.
//!
//! ```text
//! my_app
//! ├── phoenix ^1.7 (git)
//! │   ├── plug ^1.14 (registry) (*)
//! │   └── phoenix_html ^3.0 (registry)
//! └── plug ^1.14 (registry)
//!
//! (*) = already shown above
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::collections::HashSet;
use std::path::PathBuf;

use super::common::ProjectContext;
use crate::cache::ConvergenceCache;
use crate::dep::Dep;
use crate::walker::WalkContext;

/// Command to display the converged dependency tree.
#[derive(Args, Debug)]
pub struct TreeCommand {
    /// Maximum depth to display (unlimited if not specified)
    #[arg(short = 'd', long)]
    depth: Option<usize>,

    /// Include dependencies restricted to other environments or targets
    #[arg(long)]
    all: bool,

    /// Environment to converge for
    #[arg(long, default_value = "dev", value_name = "ENV")]
    env: String,

    /// Target to converge for
    #[arg(long, default_value = "host", value_name = "TARGET")]
    target: String,

    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    project_dir: Option<PathBuf>,
}

impl TreeCommand {
    /// Execute the tree command.
    pub fn execute(self) -> Result<()> {
        let project = ProjectContext::load(self.project_dir.clone())?;
        let ctx = if self.all {
            WalkContext::all(&self.env, &self.target)
        } else {
            WalkContext::new(&self.env, &self.target)
        };

        let cache = ConvergenceCache::new();
        let converged = project.converge(&ctx, &cache)?;

        println!("{}", project.config.name.bold());

        let top_level: Vec<&Dep> =
            converged.deps.iter().filter(|dep| dep.top_level).collect();
        let mut displayed = HashSet::new();
        let mut any_repeat = false;

        for (i, dep) in top_level.iter().enumerate() {
            let is_last = i == top_level.len() - 1;
            self.print_node(dep, "", is_last, &mut displayed, &mut any_repeat, 0);
        }

        if any_repeat {
            println!();
            println!("{}", "(*) = already shown above".bright_black());
        }

        Ok(())
    }

    fn print_node(
        &self,
        dep: &Dep,
        prefix: &str,
        is_last: bool,
        displayed: &mut HashSet<String>,
        any_repeat: &mut bool,
        current_depth: usize,
    ) {
        if let Some(max_depth) = self.depth
            && current_depth >= max_depth
        {
            return;
        }

        let repeat = displayed.contains(&dep.app);
        let connector = if is_last { "└── " } else { "├── " };
        let marker = if repeat {
            *any_repeat = true;
            " (*)".bright_black().to_string()
        } else {
            String::new()
        };

        println!(
            "{}{}{} {} ({}){}",
            prefix,
            connector,
            dep.app.cyan(),
            dep.requirement_display().bright_black(),
            dep.scm.name().bright_black(),
            marker
        );

        if repeat {
            return;
        }
        displayed.insert(dep.app.clone());

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        for (i, child) in dep.children.iter().enumerate() {
            let is_last_child = i == dep.children.len() - 1;
            self.print_node(
                child,
                &child_prefix,
                is_last_child,
                displayed,
                any_repeat,
                current_depth + 1,
            );
        }
    }
}
