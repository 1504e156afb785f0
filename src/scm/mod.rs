//! SCM capability interface.
//!
//! The engine never performs source-control I/O. It talks to every fetch
//! strategy through the [`Scm`] trait: can this dependency be fetched at all,
//! does the checkout agree with the lock file pin, and how should the source
//! and pin be rendered in listings. Implementations answer from the declared
//! options and the parsed lock entry alone; the fetchers that actually
//! retrieve source trees live outside this crate.
//!
//! Three strategies ship here, chosen from a declaration's options by
//! [`select`]: [`GitScm`] for `git = "..."` declarations, [`PathScm`] for
//! `path = "..."` declarations, and [`RegistryScm`] for everything else.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::core::ConvergeError;
use crate::dep::DepOpts;
use crate::lockfile::LockEntry;
use crate::version::Requirement;

mod git;
mod path;
mod registry;

pub use git::GitScm;
pub use path::PathScm;
pub use registry::RegistryScm;

/// Result of comparing declared options against the lock file pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    /// The pin agrees with the declaration
    Ok,
    /// The pin does not correspond to the declaration (or there is no pin)
    Mismatch,
    /// The pin corresponds but no longer satisfies the declaration
    Outdated,
}

/// Capability interface for a fetch strategy.
///
/// All methods are pure functions of the declared options and parsed lock
/// data. Errors from collaborators surface as [`ConvergeError::ScmQuery`]
/// and are isolated to the one dependency being evaluated.
pub trait Scm: fmt::Debug + Send + Sync {
    /// Short name used in lock entries and diagnostics (`"git"`, `"path"`,
    /// `"registry"`).
    fn name(&self) -> &'static str;

    /// Whether this strategy fetches sources at all. Path dependencies
    /// return false: their sources are always present and never locked.
    fn fetchable(&self) -> bool;

    /// Compare declared options (and requirement, where the strategy pins by
    /// version) against the recorded lock entry.
    fn lock_status(
        &self,
        opts: &DepOpts,
        requirement: Option<&Requirement>,
        lock: Option<&LockEntry>,
    ) -> Result<LockStatus, ConvergeError>;

    /// Render the source for listings, e.g. the repository URL.
    fn format(&self, opts: &DepOpts) -> String;

    /// Render the recorded pin for listings, if the strategy records one.
    fn format_lock(&self, lock: Option<&LockEntry>) -> Option<String>;
}

/// Shared handle to an SCM implementation.
///
/// Dependency records are value records compared in tests and diagnostics;
/// trait objects have no structural equality, so the handle compares by
/// strategy name.
#[derive(Clone)]
pub struct ScmRef(Arc<dyn Scm>);

impl ScmRef {
    /// Wrap an SCM implementation in a shared handle.
    pub fn new(scm: impl Scm + 'static) -> Self {
        Self(Arc::new(scm))
    }
}

impl Deref for ScmRef {
    type Target = dyn Scm;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for ScmRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScmRef({})", self.0.name())
    }
}

impl PartialEq for ScmRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name() == other.0.name()
    }
}

impl Eq for ScmRef {}

/// Pick the fetch strategy for a declaration from its options.
///
/// A `git` option selects [`GitScm`], a `path` option selects [`PathScm`],
/// anything else falls back to [`RegistryScm`]. Declarations carrying both
/// `git` and `path` are treated as git; the walker never produces such a
/// spec from well-formed configuration.
#[must_use]
pub fn select(opts: &DepOpts) -> ScmRef {
    if opts.git.is_some() {
        ScmRef::new(GitScm)
    } else if opts.path.is_some() {
        ScmRef::new(PathScm)
    } else {
        ScmRef::new(RegistryScm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_select_by_opts() {
        let git = DepOpts {
            git: Some("https://example.com/a.git".to_string()),
            ..Default::default()
        };
        assert_eq!(select(&git).name(), "git");

        let path = DepOpts {
            path: Some(PathBuf::from("../a")),
            ..Default::default()
        };
        assert_eq!(select(&path).name(), "path");

        assert_eq!(select(&DepOpts::default()).name(), "registry");
    }

    #[test]
    fn test_scm_ref_equality_by_name() {
        assert_eq!(ScmRef::new(GitScm), ScmRef::new(GitScm));
        assert_ne!(ScmRef::new(GitScm), ScmRef::new(PathScm));
    }
}
