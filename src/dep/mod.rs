//! Dependency records: raw declarations, normalized options, and statuses.
//!
//! Three types carry a dependency through the engine:
//!
//! - [`RawDepSpec`] is a single declaration as the spec loader produced it,
//!   immutable, one per `deps` entry in a configuration file.
//! - [`DepOpts`] is the typed option bag: a closed set of recognized keys plus
//!   a residual map of manager-specific extras that are passed through
//!   opaquely.
//! - [`Dep`] is the converged record: one per app in a convergence result,
//!   with a [`DepStatus`] that is always set before the record reaches a
//!   consumer.
//!
//! `Dep` records are value records. They are created fresh on every walk +
//! converge pass and never mutated afterwards; the status evaluator returns a
//! new record with an updated status rather than editing in place.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::scm::ScmRef;
use crate::version::Requirement;

/// Build manager for a dependency's own compilation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manager {
    /// A mix project
    Mix,
    /// A rebar3 project
    Rebar3,
    /// A plain Makefile build
    Make,
}

impl Manager {
    /// Inference priority when a dependency carries evidence for more than
    /// one manager. First positive match wins.
    pub const INFERENCE_PRIORITY: [Self; 3] = [Self::Mix, Self::Rebar3, Self::Make];

    /// The manager's name as written in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mix => "mix",
            Self::Rebar3 => "rebar3",
            Self::Make => "make",
        }
    }

    /// Parse a manager name from configuration.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mix" => Some(Self::Mix),
            "rebar3" => Some(Self::Rebar3),
            "make" => Some(Self::Make),
            _ => None,
        }
    }
}

impl fmt::Display for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized dependency options.
///
/// Recognized keys are typed fields; anything else a declaration carries
/// lands in `extra` and is passed through untouched for manager-specific
/// tooling to read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepOpts {
    /// Build output directory override
    pub build: Option<PathBuf>,
    /// Checkout destination override
    pub dest: Option<PathBuf>,
    /// Environment the dependency itself is compiled in
    pub env: Option<String>,
    /// Environments this dependency is restricted to; `None` means all
    pub only: Option<Vec<String>>,
    /// Targets this dependency is restricted to; `None` means all
    pub targets: Option<Vec<String>>,
    /// Marks this declaration as authoritative over conflicting ones
    pub override_flag: bool,
    /// Tolerate the dependency being missing (top-level only, see converger)
    pub optional: bool,
    /// Extra environment variables for the dependency's build
    pub system_env: Vec<(String, String)>,
    /// Explicit build manager, skipping inference
    pub manager: Option<Manager>,
    /// Git repository URL
    pub git: Option<String>,
    /// Pinned git revision
    pub rev: Option<String>,
    /// Git branch to track
    pub branch: Option<String>,
    /// Git tag to pin
    pub tag: Option<String>,
    /// Local path source
    pub path: Option<PathBuf>,
    /// Registry name for registry-sourced dependencies
    pub registry: Option<String>,
    /// Unrecognized keys, passed through opaquely
    pub extra: BTreeMap<String, toml::Value>,
}

impl DepOpts {
    /// A compact description of the SCM class and its pins, used to decide
    /// whether two declarations point at the same source.
    ///
    /// Two declarations with equal requirements still diverge when their
    /// fingerprints differ (different git URL, git vs path, and so on).
    #[must_use]
    pub fn scm_fingerprint(&self) -> String {
        if let Some(git) = &self.git {
            let pin = self
                .rev
                .as_deref()
                .or(self.tag.as_deref())
                .or(self.branch.as_deref())
                .unwrap_or("");
            format!("git:{git}#{pin}")
        } else if let Some(path) = &self.path {
            format!("path:{}", path.display())
        } else {
            format!("registry:{}", self.registry.as_deref().unwrap_or("default"))
        }
    }
}

/// Status of a converged dependency.
///
/// The converger assigns `Unavailable` or one of the diverged family; the
/// status evaluator refines available entries into the lock and build
/// statuses. A status is never left unset.
#[derive(Debug, Clone, PartialEq)]
pub enum DepStatus {
    /// Fetched, locked, and built against the current environment
    Ok,
    /// Not yet fetched, or conflict unresolved from an earlier pass
    Unavailable,
    /// Lost to a declaration carrying `override = true`; the boxed record
    /// is the winner
    Overridden(Box<Dep>),
    /// Requirements for the same app do not agree; `observed` is the
    /// conflicting requirement, the boxed record its declaration
    DivergedReq {
        /// The requirement that failed to match, as written
        observed: String,
        /// The conflicting declaration
        other: Box<Dep>,
    },
    /// Same requirement but materially different sources or managers
    Diverged(Box<Dep>),
    /// Environment restrictions do not cover every consumer
    DivergedOnly(Box<Dep>),
    /// Target restrictions do not cover every consumer
    DivergedTargets(Box<Dep>),
    /// The checkout does not match the pin recorded in the lock file
    LockMismatch,
    /// The pin recorded in the lock file no longer satisfies the declaration
    LockOutdated,
    /// Fetchable dependency with no lock file entry
    NoLock,
    /// Fetched and locked but the build is missing or stale
    Compile,
    /// Built with a different toolchain version (recorded version inside)
    VsnLock(String),
    /// Built from sources fetched by a different SCM (recorded name inside)
    ScmLock(String),
}

impl DepStatus {
    /// Whether the dependency is part of the available subset used by fetch
    /// and compile steps. Diverged and overridden records are retained for
    /// reporting but never acted on.
    #[must_use]
    pub fn available(&self) -> bool {
        !matches!(
            self,
            Self::Unavailable
                | Self::Overridden(_)
                | Self::DivergedReq { .. }
                | Self::Diverged(_)
                | Self::DivergedOnly(_)
                | Self::DivergedTargets(_)
        )
    }

    /// Whether this is one of the diverged family of statuses.
    #[must_use]
    pub fn diverged(&self) -> bool {
        matches!(
            self,
            Self::DivergedReq { .. }
                | Self::Diverged(_)
                | Self::DivergedOnly(_)
                | Self::DivergedTargets(_)
        )
    }

    /// Human status line for listings.
    #[must_use]
    pub fn report(&self) -> String {
        match self {
            Self::Ok => "ok".to_string(),
            Self::Unavailable => "the dependency is not available, fetch it first".to_string(),
            Self::Overridden(winner) => format!(
                "the dependency is overridden by the declaration in {}",
                winner.from.display()
            ),
            Self::DivergedReq {
                observed,
                other,
            } => format!(
                "conflicting requirement {observed} declared in {}",
                other.from.display()
            ),
            Self::Diverged(other) => format!(
                "the declaration in {} points at a different source",
                other.from.display()
            ),
            Self::DivergedOnly(other) => format!(
                "the `only` restriction declared in {} does not cover every consumer",
                other.from.display()
            ),
            Self::DivergedTargets(other) => format!(
                "the `targets` restriction declared in {} does not cover every consumer",
                other.from.display()
            ),
            Self::LockMismatch => {
                "the checkout does not match the pin in the lock file".to_string()
            }
            Self::LockOutdated => {
                "the pin in the lock file no longer satisfies the declaration".to_string()
            }
            Self::NoLock => "the dependency is not locked, fetch it to record a pin".to_string(),
            Self::Compile => "the dependency build is missing or stale, compile it".to_string(),
            Self::VsnLock(recorded) => format!(
                "the dependency was built with toolchain {recorded}, which differs from the current one"
            ),
            Self::ScmLock(recorded) => format!(
                "the dependency was fetched with {recorded}, which differs from the configured SCM"
            ),
        }
    }
}

/// One declared dependency spec as the spec loader produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDepSpec {
    /// Declared app name
    pub app: String,
    /// Declared requirement, if any
    pub requirement: Option<Requirement>,
    /// Declared options
    pub opts: DepOpts,
    /// Configuration file the declaration came from
    pub from: PathBuf,
}

/// A converged dependency record.
///
/// Exactly one `Dep` exists per app within a convergence result's flat list.
/// Records are immutable after construction; the evaluator copies on write.
#[derive(Debug, Clone, PartialEq)]
pub struct Dep {
    /// App name, the unique key within a converged result
    pub app: String,
    /// Winning requirement, if any was declared
    pub requirement: Option<Requirement>,
    /// Current status; always set
    pub status: DepStatus,
    /// Normalized winning options
    pub opts: DepOpts,
    /// Resolved fetch strategy for this app
    pub scm: ScmRef,
    /// Build manager, explicit or inferred; `None` when no evidence exists
    pub manager: Option<Manager>,
    /// This dep's own declared dependencies, recursively converged
    pub children: Vec<Dep>,
    /// True only if declared directly by the root project
    pub top_level: bool,
    /// Configuration location responsible for the winning definition
    pub from: PathBuf,
    /// Merged extra environment variables from every declaration
    pub system_env: Vec<(String, String)>,
}

impl Dep {
    /// Whether this dependency is in the available subset.
    #[must_use]
    pub fn available(&self) -> bool {
        self.status.available()
    }

    /// The requirement rendered for listings, or `"any"` when unconstrained.
    #[must_use]
    pub fn requirement_display(&self) -> String {
        self.requirement.as_ref().map_or_else(|| "any".to_string(), ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scm;

    fn dep(app: &str, from: &str) -> Dep {
        let opts = DepOpts::default();
        Dep {
            app: app.to_string(),
            requirement: None,
            status: DepStatus::Unavailable,
            scm: scm::select(&opts),
            opts,
            manager: None,
            children: Vec::new(),
            top_level: false,
            from: PathBuf::from(from),
            system_env: Vec::new(),
        }
    }

    #[test]
    fn test_manager_names_round_trip() {
        for manager in Manager::INFERENCE_PRIORITY {
            assert_eq!(Manager::from_name(manager.as_str()), Some(manager));
        }
        assert_eq!(Manager::from_name("gradle"), None);
    }

    #[test]
    fn test_status_availability() {
        assert!(DepStatus::Ok.available());
        assert!(DepStatus::Compile.available());
        assert!(DepStatus::NoLock.available());
        assert!(!DepStatus::Unavailable.available());

        let other = Box::new(dep("a", "deps/b/converge.toml"));
        assert!(!DepStatus::Overridden(other.clone()).available());
        assert!(
            !DepStatus::DivergedReq {
                observed: "~2.0".to_string(),
                other: other.clone(),
            }
            .available()
        );
        assert!(DepStatus::Diverged(other).diverged());
    }

    #[test]
    fn test_status_reports_name_declaration_sites() {
        let other = Box::new(dep("a", "deps/b/converge.toml"));
        let report = DepStatus::DivergedReq {
            observed: "~2.0".to_string(),
            other,
        }
        .report();
        assert!(report.contains("~2.0"));
        assert!(report.contains("deps/b/converge.toml"));
    }

    #[test]
    fn test_scm_fingerprint_distinguishes_sources() {
        let git_a = DepOpts {
            git: Some("https://example.com/a.git".to_string()),
            ..Default::default()
        };
        let git_b = DepOpts {
            git: Some("https://example.com/b.git".to_string()),
            ..Default::default()
        };
        let path = DepOpts {
            path: Some(PathBuf::from("../a")),
            ..Default::default()
        };
        let registry = DepOpts::default();

        assert_ne!(git_a.scm_fingerprint(), git_b.scm_fingerprint());
        assert_ne!(git_a.scm_fingerprint(), path.scm_fingerprint());
        assert_ne!(path.scm_fingerprint(), registry.scm_fingerprint());

        let pinned = DepOpts {
            git: Some("https://example.com/a.git".to_string()),
            tag: Some("v1.0.0".to_string()),
            ..Default::default()
        };
        assert_ne!(git_a.scm_fingerprint(), pinned.scm_fingerprint());
    }
}
