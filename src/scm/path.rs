//! Path fetch strategy: local directories that are never fetched or locked.

use super::{LockStatus, Scm};
use crate::core::ConvergeError;
use crate::dep::DepOpts;
use crate::lockfile::LockEntry;
use crate::version::Requirement;

/// Path-sourced dependencies, declared with `path = "..."`. Their sources
/// live inside (or next to) the project, so there is nothing to fetch and
/// nothing to pin.
#[derive(Debug, Clone, Copy)]
pub struct PathScm;

impl Scm for PathScm {
    fn name(&self) -> &'static str {
        "path"
    }

    fn fetchable(&self) -> bool {
        false
    }

    fn lock_status(
        &self,
        opts: &DepOpts,
        _requirement: Option<&Requirement>,
        lock: Option<&LockEntry>,
    ) -> Result<LockStatus, ConvergeError> {
        match lock {
            // Path deps normally have no lock entry
            None => Ok(LockStatus::Ok),
            Some(entry) => {
                let declared = opts.path.as_ref().map(|p| p.display().to_string());
                if entry.scm == self.name() && entry.path == declared {
                    Ok(LockStatus::Ok)
                } else {
                    // A stale entry from when this app came from git or a
                    // registry
                    Ok(LockStatus::Mismatch)
                }
            }
        }
    }

    fn format(&self, opts: &DepOpts) -> String {
        opts.path
            .as_ref()
            .map_or_else(|| "<missing path>".to_string(), |p| p.display().to_string())
    }

    fn format_lock(&self, _lock: Option<&LockEntry>) -> Option<String> {
        None
    }
}
