//! Tree walker: builds the dependency forest for one execution context.
//!
//! Starting at the root project, the walker loads each node's declared specs
//! through the [`SpecLoader`], filters them by environment and target, and
//! recurses into every surviving spec that is itself a project. The result
//! is an explicit forest of [`SpecNode`]s, never a recursion that trusts
//! acyclicity: re-visiting an app that already appears in the ancestor chain
//! cuts recursion off, and the duplicate spec reaches the converger as a
//! second declaration of the same app to be merged or flagged diverged.
//!
//! The loader is called at most once per distinct node identity; diamond
//! shapes reuse the memoized specs.

use std::collections::HashMap;

use crate::config::ProjectConfig;
use crate::core::ConvergeError;
use crate::dep::{Manager, RawDepSpec};
use crate::loader::SpecLoader;

/// The execution context a forest is built for.
#[derive(Debug, Clone)]
pub struct WalkContext {
    /// Active environment (e.g. `dev`, `test`, `prod`)
    pub env: String,
    /// Active target (e.g. `host`)
    pub target: String,
    /// Disable all environment and target filtering
    pub all: bool,
}

impl WalkContext {
    /// Context for one environment and target with filtering enabled.
    #[must_use]
    pub fn new(env: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            target: target.into(),
            all: false,
        }
    }

    /// Context with no filtering at all ("all" mode).
    #[must_use]
    pub fn all(env: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            target: target.into(),
            all: true,
        }
    }
}

/// One visited declaration and the subtree behind it.
#[derive(Debug, Clone)]
pub struct SpecNode {
    /// The declaration as loaded
    pub spec: RawDepSpec,
    /// The declaration's `only` restriction intersected with its ancestor
    /// chain's; `None` means unrestricted
    pub effective_only: Option<Vec<String>>,
    /// Same for `targets`
    pub effective_targets: Option<Vec<String>>,
    /// Manager evidence found among this node's artifacts
    pub manager_evidence: Vec<Manager>,
    /// Subtrees of the node's own surviving declarations; empty for leaves
    /// and for ancestor-chain cutoffs
    pub children: Vec<SpecNode>,
}

/// A walked dependency forest for one project and context.
#[derive(Debug, Clone)]
pub struct Forest {
    /// Root project name
    pub project: String,
    /// The root's surviving declarations, in declaration order
    pub deps: Vec<SpecNode>,
}

/// Walk the root project's dependencies into a forest.
///
/// Fails only with [`ConvergeError::ConfigLoad`]: a node whose configuration
/// cannot be loaded aborts the whole walk, no partial forest is returned.
pub fn walk(
    root: &ProjectConfig,
    ctx: &WalkContext,
    loader: &dyn SpecLoader,
) -> Result<Forest, ConvergeError> {
    let mut state = WalkState {
        loader,
        ctx,
        memo_children: HashMap::new(),
        memo_evidence: HashMap::new(),
    };

    let mut ancestors = vec![root.name.clone()];
    let deps = state.walk_specs(&root.deps, &mut ancestors, &None, &None)?;

    Ok(Forest {
        project: root.name.clone(),
        deps,
    })
}

struct WalkState<'a> {
    loader: &'a dyn SpecLoader,
    ctx: &'a WalkContext,
    memo_children: HashMap<String, Option<Vec<RawDepSpec>>>,
    memo_evidence: HashMap<String, Vec<Manager>>,
}

impl WalkState<'_> {
    fn walk_specs(
        &mut self,
        specs: &[RawDepSpec],
        ancestors: &mut Vec<String>,
        parent_only: &Option<Vec<String>>,
        parent_targets: &Option<Vec<String>>,
    ) -> Result<Vec<SpecNode>, ConvergeError> {
        let mut nodes = Vec::new();

        for spec in specs {
            if !self.enabled(spec) {
                tracing::debug!(
                    app = %spec.app,
                    env = %self.ctx.env,
                    target = %self.ctx.target,
                    "skipping restricted dependency"
                );
                continue;
            }

            let effective_only = intersect(parent_only, &spec.opts.only);
            let effective_targets = intersect(parent_targets, &spec.opts.targets);

            let children = if ancestors.contains(&spec.app) {
                // Already on the ancestor chain: hand the duplicate spec to
                // the converger without recursing again.
                tracing::debug!(app = %spec.app, "cycle cutoff, not recursing");
                Vec::new()
            } else if let Some(child_specs) = self.children_of(&spec.app)? {
                ancestors.push(spec.app.clone());
                let children =
                    self.walk_specs(&child_specs, ancestors, &effective_only, &effective_targets)?;
                ancestors.pop();
                children
            } else {
                Vec::new()
            };

            let manager_evidence = self.evidence_of(&spec.app);

            nodes.push(SpecNode {
                spec: spec.clone(),
                effective_only,
                effective_targets,
                manager_evidence,
                children,
            });
        }

        Ok(nodes)
    }

    fn enabled(&self, spec: &RawDepSpec) -> bool {
        if self.ctx.all {
            return true;
        }
        let env_ok = spec
            .opts
            .only
            .as_ref()
            .is_none_or(|only| only.iter().any(|e| *e == self.ctx.env));
        let target_ok = spec
            .opts
            .targets
            .as_ref()
            .is_none_or(|targets| targets.iter().any(|t| *t == self.ctx.target));
        env_ok && target_ok
    }

    fn children_of(&mut self, app: &str) -> Result<Option<Vec<RawDepSpec>>, ConvergeError> {
        if let Some(memoized) = self.memo_children.get(app) {
            return Ok(memoized.clone());
        }
        let loaded = self.loader.load_children(app)?;
        self.memo_children.insert(app.to_string(), loaded.clone());
        Ok(loaded)
    }

    fn evidence_of(&mut self, app: &str) -> Vec<Manager> {
        if let Some(memoized) = self.memo_evidence.get(app) {
            return memoized.clone();
        }
        let evidence = self.loader.manager_evidence(app);
        self.memo_evidence.insert(app.to_string(), evidence.clone());
        evidence
    }
}

/// Intersect two restrictions. `None` is unrestricted and absorbs nothing.
fn intersect(parent: &Option<Vec<String>>, child: &Option<Vec<String>>) -> Option<Vec<String>> {
    match (parent, child) {
        (None, None) => None,
        (Some(p), None) => Some(p.clone()),
        (None, Some(c)) => Some(c.clone()),
        (Some(p), Some(c)) => Some(c.iter().filter(|entry| p.contains(entry)).cloned().collect()),
    }
}
