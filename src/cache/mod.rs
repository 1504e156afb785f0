//! Convergence result cache.
//!
//! Convergence is deterministic for a fixed forest and context, so repeated
//! queries (and nested sub-project builds) reuse a cached result instead of
//! re-walking and re-converging. The cache is an explicit object owned by
//! the build context and passed by reference, keyed by
//! `(project identity, environment, target)`, never ambient state.
//!
//! Entries never expire on their own. Callers invalidate a key after any
//! action that could change the forest: a dependency added, the lock file
//! rewritten, a fetch performed.
//!
//! Concurrency: reads are lock-free through the sharded map; computes are
//! serialized per key through a slot mutex, so two concurrent
//! [`get_or_compute`](ConvergenceCache::get_or_compute) calls for the same
//! key run the closure once and the second caller observes the first's
//! result.

use dashmap::DashMap;
use std::sync::{Arc, Mutex};

use crate::converger::Converged;
use crate::core::ConvergeError;
use crate::dep::Dep;

/// Cache key: one converged result per project and execution context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Root project identity
    pub project: String,
    /// Environment the result was converged for
    pub env: String,
    /// Target the result was converged for
    pub target: String,
}

impl CacheKey {
    /// Build a key for one project and context.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        env: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            env: env.into(),
            target: target.into(),
        }
    }
}

type Slot = Arc<Mutex<Option<Arc<Converged>>>>;

/// Process-wide cache of fully-evaluated convergence results.
#[derive(Debug, Default)]
pub struct ConvergenceCache {
    entries: DashMap<CacheKey, Slot>,
}

impl ConvergenceCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `key`, computing and storing it on a
    /// miss.
    ///
    /// The compute closure runs at most once per key: concurrent callers for
    /// the same key block on the slot and then observe the stored result.
    /// A failing compute stores nothing, so the next caller retries.
    pub fn get_or_compute(
        &self,
        key: &CacheKey,
        compute: impl FnOnce() -> Result<Converged, ConvergeError>,
    ) -> Result<Arc<Converged>, ConvergeError> {
        let slot = self.entries.entry(key.clone()).or_default().clone();
        // The dashmap guard is dropped here; only the slot mutex is held
        // across the compute.
        let mut guard = slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(cached) = guard.as_ref() {
            tracing::debug!(project = %key.project, env = %key.env, target = %key.target, "convergence cache hit");
            return Ok(Arc::clone(cached));
        }

        let computed = Arc::new(compute()?);
        *guard = Some(Arc::clone(&computed));
        Ok(computed)
    }

    /// Drop the entry for `key`, if any.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    /// Look up the cached result for `key` without computing.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Converged>> {
        let slot = self.entries.get(key)?.clone();
        let guard = slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.as_ref().map(Arc::clone)
    }

    /// Child-mode read for a nested sub-project build.
    ///
    /// When a dependency is compiled as its own root, its dependency list is
    /// not re-walked: it is extracted from the already-cached top-level
    /// result. The sub-root's direct children become top-level (their
    /// `optional` flags are the ones the sub-root itself declared); deeper
    /// records have optionality stripped exactly as a fresh convergence
    /// would. A miss is fatal: the caller must have converged the top-level
    /// project first.
    pub fn get_subtree(
        &self,
        parent_key: &CacheKey,
        app: &str,
    ) -> Result<Converged, ConvergeError> {
        let cached = self.get(parent_key).ok_or_else(|| {
            ConvergeError::MissingParentConvergence {
                app: app.to_string(),
            }
        })?;

        let sub_root =
            cached.get(app).ok_or_else(|| ConvergeError::MissingParentConvergence {
                app: app.to_string(),
            })?;

        let mut deps = Vec::new();
        let mut seen = std::collections::HashSet::new();
        flatten_subtree(&sub_root.children, true, &mut seen, &mut deps);

        Ok(Converged {
            deps,
            overridden: Vec::new(),
        })
    }
}

fn flatten_subtree(
    children: &[Dep],
    top_level: bool,
    seen: &mut std::collections::HashSet<String>,
    out: &mut Vec<Dep>,
) {
    for child in children {
        if seen.insert(child.app.clone()) {
            let mut dep = child.clone();
            dep.top_level = top_level;
            if !top_level {
                dep.opts.optional = false;
            }
            out.push(dep);
        }
        flatten_subtree(&child.children, false, seen, out);
    }
}
