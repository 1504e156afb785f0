//! Shared project loading and convergence plumbing for CLI commands.
//!
//! This is the glue the engine itself refuses to own: finding the project
//! configuration, gathering per-dependency evidence from disk, and threading
//! everything through the walker, converger, evaluator, and cache.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{CacheKey, ConvergenceCache};
use crate::config::{CONFIG_NAME, ProjectConfig};
use crate::converger::{self, Converged};
use crate::dep::Dep;
use crate::evaluator::{self, DepEvidence, EvalContext};
use crate::loader::FsSpecLoader;
use crate::lockfile::{LOCKFILE_NAME, Lockfile};
use crate::manifest::{BuildManifest, MANIFEST_NAME};
use crate::walker::{self, WalkContext};

/// A loaded project directory: configuration, lock file, and checkouts.
pub struct ProjectContext {
    /// Parsed root configuration
    pub config: ProjectConfig,
    /// Parsed lock file (empty when absent)
    pub lockfile: Lockfile,
    /// Dependency checkout directory (`deps/`)
    pub deps_dir: PathBuf,
}

impl ProjectContext {
    /// Load the project in `dir` (current directory when `None`).
    pub fn load(dir: Option<PathBuf>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let config = ProjectConfig::load(&dir.join(CONFIG_NAME))?;
        let lockfile = Lockfile::load(&dir.join(LOCKFILE_NAME))?;
        Ok(Self {
            config,
            lockfile,
            deps_dir: dir.join("deps"),
        })
    }

    /// Walk, converge, and evaluate the project for one context, going
    /// through the given cache.
    pub fn converge(
        &self,
        ctx: &WalkContext,
        cache: &ConvergenceCache,
    ) -> Result<Arc<Converged>> {
        let key = CacheKey::new(&self.config.name, &ctx.env, &ctx.target);
        let eval_ctx = current_eval_context();

        let result = cache.get_or_compute(&key, || {
            let loader = FsSpecLoader::new(&self.deps_dir);
            let forest = walker::walk(&self.config, ctx, &loader)?;
            let converged = converger::converge(&forest)?;
            let deps =
                evaluator::evaluate_all(&converged.deps, &eval_ctx, &|dep| {
                    Ok(self.gather_evidence(dep))
                });
            Ok(Converged {
                deps,
                overridden: converged.overridden,
            })
        })?;

        Ok(result)
    }

    /// Collect one dependency's on-disk evidence: checkout presence, lock
    /// entry, and build manifest.
    fn gather_evidence(&self, dep: &Dep) -> DepEvidence {
        let checkout = self.deps_dir.join(&dep.app);
        let manifest = match BuildManifest::load(&checkout.join(MANIFEST_NAME)) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!(app = %dep.app, error = %e, "ignoring unreadable build manifest");
                None
            }
        };
        DepEvidence {
            fetched: checkout.is_dir(),
            lock: self.lockfile.entry(&dep.app).cloned(),
            manifest,
        }
    }
}

/// The running toolchain, overridable for tests and wrapper scripts.
fn current_eval_context() -> EvalContext {
    EvalContext {
        toolchain_version: std::env::var("CONVERGE_TOOLCHAIN_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
        runtime_version: std::env::var("CONVERGE_RUNTIME_VERSION")
            .unwrap_or_else(|_| "unknown".to_string()),
    }
}
