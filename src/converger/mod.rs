//! Converger: merges a walked forest into one canonical dependency list.
//!
//! Every app that appears anywhere in the forest ends up as exactly one
//! [`Dep`] in the result, in depth-first parent-before-child discovery
//! order. Multiple declarations of the same app (diamond dependencies) are
//! reconciled in a fixed order:
//!
//! 1. A single declaration carrying `override = true` wins outright; losing
//!    declarations are retained with an `Overridden` status. Two competing
//!    overrides abort the run.
//! 2. Without an override, requirements must agree semantically. A conflict
//!    becomes `DivergedReq`, never an error, so listings can still show
//!    every dependency.
//! 3. Matching requirements can still diverge on environment or target
//!    restrictions (`DivergedOnly` / `DivergedTargets`): the canonical
//!    declaration's restriction must cover every consumer's.
//! 4. Matching requirements pointing at materially different sources, or
//!    with conflicting explicit managers, become `Diverged`.
//!
//! Mergeable declarations collapse into one record carrying the union of
//! their extra environment variables. The `optional` flag survives only when
//! a top-level declaration carries it; transitive optionality is stripped,
//! since deeper layers must already have been satisfied for the tree to
//! exist at all.

use std::collections::HashMap;

use crate::core::ConvergeError;
use crate::dep::{Dep, DepStatus, Manager};
use crate::scm;
use crate::walker::{Forest, SpecNode};

/// The outcome of converging one forest.
///
/// `deps` is the app-unique flat list in discovery order. `overridden`
/// retains declarations that lost to an override so reporting can show the
/// conflict; they are never part of the available subset.
#[derive(Debug, Clone, Default)]
pub struct Converged {
    /// One record per app, discovery order
    pub deps: Vec<Dep>,
    /// Declarations that lost to an override
    pub overridden: Vec<Dep>,
}

impl Converged {
    /// Look up a converged record by app name.
    #[must_use]
    pub fn get(&self, app: &str) -> Option<&Dep> {
        self.deps.iter().find(|dep| dep.app == app)
    }

    /// The subset fetch and compile steps may act on.
    pub fn available(&self) -> impl Iterator<Item = &Dep> {
        self.deps.iter().filter(|dep| dep.available())
    }
}

/// Converge a walked forest into a flat, app-unique dependency list.
///
/// Fails only on an ambiguous override
/// ([`ConvergeError::AmbiguousOverride`]); every other conflict is reported
/// through the record's status.
pub fn converge(forest: &Forest) -> Result<Converged, ConvergeError> {
    // Depth-first, parent-before-child: this order is the tie-break for
    // which declaration is "first" in every conflict message.
    let mut flat = Vec::new();
    flatten(&forest.deps, true, &mut flat);

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&FlatSpec<'_>>> = HashMap::new();
    for member in &flat {
        let app = member.node.spec.app.as_str();
        let group = groups.entry(app).or_default();
        if group.is_empty() {
            order.push(app);
        }
        group.push(member);
    }

    let mut winners: HashMap<String, (Dep, &SpecNode)> = HashMap::new();
    let mut overridden = Vec::new();

    for app in &order {
        let members = &groups[app];
        let resolved = resolve_group(app, members)?;
        winners.insert((*app).to_string(), (resolved.winner, resolved.winner_node));
        overridden.extend(resolved.losers);
    }

    // Second pass: attach children once every winner exists, so nested
    // records reflect the converged statuses rather than raw declarations.
    let flat_map: HashMap<&str, &Dep> =
        winners.iter().map(|(app, (dep, _))| (app.as_str(), dep)).collect();

    let mut deps = Vec::with_capacity(order.len());
    for app in &order {
        let (dep, node) = &winners[*app];
        let mut dep = dep.clone();
        dep.children = build_children(&node.children, &flat_map);
        deps.push(dep);
    }

    tracing::debug!(
        project = %forest.project,
        deps = deps.len(),
        overridden = overridden.len(),
        "converged dependency forest"
    );

    Ok(Converged {
        deps,
        overridden,
    })
}

/// Select converged records by explicit names.
///
/// A name absent from the converged set is an
/// [`ConvergeError::UnknownDependency`] carrying the active environment and
/// a closest-match suggestion. Recoverable: the convergence itself is
/// untouched.
pub fn filter_by_names<'a>(
    converged: &'a Converged,
    names: &[String],
    env: &str,
) -> Result<Vec<&'a Dep>, ConvergeError> {
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match converged.get(name) {
            Some(dep) => selected.push(dep),
            None => {
                return Err(ConvergeError::UnknownDependency {
                    name: name.clone(),
                    env: env.to_string(),
                    suggestion: suggest(name, converged),
                });
            }
        }
    }
    Ok(selected)
}

fn suggest(name: &str, converged: &Converged) -> Option<String> {
    converged
        .deps
        .iter()
        .map(|dep| (dep.app.as_str(), strsim::jaro_winkler(name, &dep.app)))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(app, _)| app.to_string())
}

struct FlatSpec<'a> {
    node: &'a SpecNode,
    top_level: bool,
}

fn flatten<'a>(nodes: &'a [SpecNode], top_level: bool, out: &mut Vec<FlatSpec<'a>>) {
    for node in nodes {
        out.push(FlatSpec {
            node,
            top_level,
        });
        flatten(&node.children, false, out);
    }
}

struct ResolvedGroup<'a> {
    winner: Dep,
    winner_node: &'a SpecNode,
    losers: Vec<Dep>,
}

fn resolve_group<'a>(
    app: &str,
    members: &[&FlatSpec<'a>],
) -> Result<ResolvedGroup<'a>, ConvergeError> {
    let top_level = members.iter().any(|m| m.top_level);
    // The optional flag only matters when the root itself declares it;
    // transitive optionality is stripped.
    let optional = members.iter().any(|m| m.top_level && m.node.spec.opts.optional);

    let overrides: Vec<&&FlatSpec<'_>> =
        members.iter().filter(|m| m.node.spec.opts.override_flag).collect();

    if overrides.len() > 1 {
        return Err(ConvergeError::AmbiguousOverride {
            app: app.to_string(),
            first: overrides[0].node.spec.from.display().to_string(),
            second: overrides[1].node.spec.from.display().to_string(),
        });
    }

    if let Some(winning) = overrides.first() {
        let mut winner = make_dep(winning.node, DepStatus::Unavailable);
        winner.top_level = top_level;
        winner.opts.optional = optional;

        let losers = members
            .iter()
            .filter(|m| !m.node.spec.opts.override_flag)
            .map(|m| {
                tracing::debug!(
                    app,
                    loser = %m.node.spec.from.display(),
                    winner = %winning.node.spec.from.display(),
                    "declaration overridden"
                );
                let mut loser = make_dep(m.node, DepStatus::Overridden(Box::new(winner.clone())));
                loser.top_level = m.top_level;
                loser
            })
            .collect();

        return Ok(ResolvedGroup {
            winner,
            winner_node: winning.node,
            losers,
        });
    }

    // No override: pick the canonical declaration (top-level preferred,
    // discovery order otherwise) and check every other member against it.
    let canonical = members.iter().find(|m| m.top_level).unwrap_or(&members[0]);

    let mut status = DepStatus::Unavailable;
    let mut system_env = canonical.node.spec.opts.system_env.clone();

    for member in members {
        if std::ptr::eq(*member, *canonical) {
            continue;
        }
        if let Some(divergence) = diverged(canonical, member) {
            status = divergence;
            break;
        }
        for entry in &member.node.spec.opts.system_env {
            if !system_env.contains(entry) {
                system_env.push(entry.clone());
            }
        }
    }

    let mut winner = make_dep(canonical.node, status);
    winner.top_level = top_level;
    winner.opts.optional = optional;
    winner.opts.system_env = system_env.clone();
    winner.system_env = system_env;

    Ok(ResolvedGroup {
        winner,
        winner_node: canonical.node,
        losers: Vec::new(),
    })
}

/// Check one member against the canonical declaration, returning the status
/// to surface when they cannot be merged.
fn diverged(canonical: &FlatSpec<'_>, member: &FlatSpec<'_>) -> Option<DepStatus> {
    let canonical_spec = &canonical.node.spec;
    let member_spec = &member.node.spec;

    if canonical_spec.requirement != member_spec.requirement {
        let observed = member_spec
            .requirement
            .as_ref()
            .map_or_else(|| "any".to_string(), ToString::to_string);
        return Some(DepStatus::DivergedReq {
            observed,
            other: Box::new(make_dep(member.node, DepStatus::Unavailable)),
        });
    }

    // The canonical restriction must cover every consumer's effective
    // restriction; narrowing silently would drop the dep from environments
    // that need it.
    if !covers(&canonical.node.effective_only, &member.node.effective_only) {
        return Some(DepStatus::DivergedOnly(Box::new(make_dep(
            member.node,
            DepStatus::Unavailable,
        ))));
    }

    if !covers(&canonical.node.effective_targets, &member.node.effective_targets) {
        return Some(DepStatus::DivergedTargets(Box::new(make_dep(
            member.node,
            DepStatus::Unavailable,
        ))));
    }

    let material_conflict = canonical_spec.opts.scm_fingerprint()
        != member_spec.opts.scm_fingerprint()
        || matches!(
            (canonical_spec.opts.manager, member_spec.opts.manager),
            (Some(a), Some(b)) if a != b
        );
    if material_conflict {
        return Some(DepStatus::Diverged(Box::new(make_dep(
            member.node,
            DepStatus::Unavailable,
        ))));
    }

    None
}

/// Does restriction `a` allow everything restriction `b` allows?
/// `None` is unrestricted: it covers everything and only `None` covers it.
fn covers(a: &Option<Vec<String>>, b: &Option<Vec<String>>) -> bool {
    match (a, b) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(a), Some(b)) => b.iter().all(|entry| a.contains(entry)),
    }
}

fn make_dep(node: &SpecNode, status: DepStatus) -> Dep {
    let spec = &node.spec;
    let manager = spec
        .opts
        .manager
        .or_else(|| infer_manager(&node.manager_evidence));
    Dep {
        app: spec.app.clone(),
        requirement: spec.requirement.clone(),
        status,
        scm: scm::select(&spec.opts),
        opts: spec.opts.clone(),
        manager,
        children: Vec::new(),
        top_level: false,
        from: spec.from.clone(),
        system_env: spec.opts.system_env.clone(),
    }
}

/// First positive match in priority order wins; no evidence leaves the
/// manager unset.
fn infer_manager(evidence: &[Manager]) -> Option<Manager> {
    Manager::INFERENCE_PRIORITY.into_iter().find(|manager| evidence.contains(manager))
}

/// Build per-parent child records from the forest structure, carrying the
/// converged status of each app but the immediate parent's declared
/// `optional` flag. Child-mode cache reads re-derive flags from these.
fn build_children(nodes: &[SpecNode], flat: &HashMap<&str, &Dep>) -> Vec<Dep> {
    nodes
        .iter()
        .filter_map(|node| {
            let converged = flat.get(node.spec.app.as_str())?;
            let mut dep = (*converged).clone();
            dep.top_level = false;
            dep.opts.optional = node.spec.opts.optional;
            dep.children = build_children(&node.children, flat);
            Some(dep)
        })
        .collect()
}
