//! Status evaluation: refines converged records against lock and build state.
//!
//! The converger leaves every mergeable dependency at `Unavailable`. This
//! module runs the per-dependency state machine that turns that into a
//! final status, consulting only values the caller already gathered: the
//! SCM's answer about the checkout, the parsed lock entry, and the parsed
//! build manifest. Every transition is a pure function; a fresh pass is
//! required after any fetch or compile changes the inputs.
//!
//! | Current | Condition | Next |
//! |---|---|---|
//! | diverged family | conflict unresolved | unchanged |
//! | unavailable | fetchable and not fetched | unchanged |
//! | available | lock mismatch, entry present | `LockMismatch` |
//! | available | lock mismatch, no entry | `NoLock` |
//! | available | lock outdated | `LockOutdated` |
//! | lock ok | manifest missing | `Compile` |
//! | lock ok | recorded toolchain/runtime differs | `VsnLock` |
//! | lock ok | recorded SCM differs | `ScmLock` |
//! | lock ok | stale build marker | `Compile` |
//! | lock ok | manifest matches | `Ok` |

use crate::core::ConvergeError;
use crate::dep::{Dep, DepStatus};
use crate::lockfile::LockEntry;
use crate::manifest::BuildManifest;
use crate::scm::LockStatus;

/// The currently-running toolchain, compared against recorded manifests.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Version of the build tool itself
    pub toolchain_version: String,
    /// Version of the language runtime
    pub runtime_version: String,
}

/// Everything the caller gathered about one dependency's on-disk state.
///
/// The engine performs no I/O; `fetched` is the SCM's answer about whether
/// a checkout exists, and the lock entry and manifest arrive pre-parsed.
#[derive(Debug, Clone, Default)]
pub struct DepEvidence {
    /// Whether a checkout of this dependency exists
    pub fetched: bool,
    /// The lock file entry for this app, if any
    pub lock: Option<LockEntry>,
    /// The build manifest recorded by the last successful compile, if any
    pub manifest: Option<BuildManifest>,
}

/// Run the state machine for one dependency, returning a new record.
///
/// Diverged and overridden records pass through unchanged; so does an
/// unavailable record whose fetchable SCM reports no checkout. Errors from
/// the SCM surface as [`ConvergeError::ScmQuery`] for the caller to isolate.
pub fn evaluate(
    dep: &Dep,
    evidence: &DepEvidence,
    ctx: &EvalContext,
) -> Result<Dep, ConvergeError> {
    if dep.status.diverged() || matches!(dep.status, DepStatus::Overridden(_)) {
        return Ok(dep.clone());
    }

    if dep.scm.fetchable() && !evidence.fetched {
        return Ok(with_status(dep, DepStatus::Unavailable));
    }

    let lock_status = dep
        .scm
        .lock_status(&dep.opts, dep.requirement.as_ref(), evidence.lock.as_ref())
        .map_err(|e| ConvergeError::ScmQuery {
            app: dep.app.clone(),
            scm: dep.scm.name().to_string(),
            reason: e.to_string(),
        })?;

    let status = match lock_status {
        LockStatus::Mismatch => {
            if evidence.lock.is_some() {
                DepStatus::LockMismatch
            } else {
                DepStatus::NoLock
            }
        }
        LockStatus::Outdated => DepStatus::LockOutdated,
        LockStatus::Ok => manifest_status(dep, evidence.manifest.as_ref(), ctx),
    };

    Ok(with_status(dep, status))
}

fn manifest_status(dep: &Dep, manifest: Option<&BuildManifest>, ctx: &EvalContext) -> DepStatus {
    let Some(manifest) = manifest else {
        return DepStatus::Compile;
    };

    if manifest.toolchain_version != ctx.toolchain_version
        || manifest.runtime_version != ctx.runtime_version
    {
        return DepStatus::VsnLock(format!(
            "{}/{}",
            manifest.toolchain_version, manifest.runtime_version
        ));
    }

    if manifest.scm != dep.scm.name() {
        return DepStatus::ScmLock(manifest.scm.clone());
    }

    if !manifest.fresh {
        return DepStatus::Compile;
    }

    DepStatus::Ok
}

fn with_status(dep: &Dep, status: DepStatus) -> Dep {
    let mut refined = dep.clone();
    refined.status = status;
    refined
}

/// Evaluate a whole converged list.
///
/// `gather` produces the evidence for one dependency; a collaborator error
/// there or in the SCM leaves that one record unchanged and is logged at
/// `warn`, so sibling dependencies still evaluate. Nested child records are
/// rewritten to carry the evaluated status of their app.
pub fn evaluate_all(
    deps: &[Dep],
    ctx: &EvalContext,
    gather: &dyn Fn(&Dep) -> Result<DepEvidence, ConvergeError>,
) -> Vec<Dep> {
    let mut evaluated: Vec<Dep> = deps
        .iter()
        .map(|dep| {
            let result = gather(dep).and_then(|evidence| evaluate(dep, &evidence, ctx));
            match result {
                Ok(refined) => refined,
                Err(e) => {
                    tracing::warn!(app = %dep.app, error = %e, "status evaluation incomplete");
                    dep.clone()
                }
            }
        })
        .collect();

    let statuses: std::collections::HashMap<String, DepStatus> =
        evaluated.iter().map(|dep| (dep.app.clone(), dep.status.clone())).collect();

    for dep in &mut evaluated {
        refresh_children(&mut dep.children, &statuses);
    }

    evaluated
}

fn refresh_children(
    children: &mut [Dep],
    statuses: &std::collections::HashMap<String, DepStatus>,
) {
    for child in children {
        if let Some(status) = statuses.get(&child.app) {
            child.status = status.clone();
        }
        refresh_children(&mut child.children, statuses);
    }
}
