//! Git fetch strategy: pure comparisons of declared git options against the
//! lock file pin.

use super::{LockStatus, Scm};
use crate::core::ConvergeError;
use crate::dep::DepOpts;
use crate::lockfile::LockEntry;
use crate::version::Requirement;

/// Git-sourced dependencies, declared with `git = "URL"` plus an optional
/// `rev`, `tag`, or `branch` pin.
#[derive(Debug, Clone, Copy)]
pub struct GitScm;

impl Scm for GitScm {
    fn name(&self) -> &'static str {
        "git"
    }

    fn fetchable(&self) -> bool {
        true
    }

    fn lock_status(
        &self,
        opts: &DepOpts,
        _requirement: Option<&Requirement>,
        lock: Option<&LockEntry>,
    ) -> Result<LockStatus, ConvergeError> {
        let Some(entry) = lock else {
            return Ok(LockStatus::Mismatch);
        };

        if entry.scm != self.name() {
            return Ok(LockStatus::Mismatch);
        }

        if entry.url.as_deref() != opts.git.as_deref() {
            return Ok(LockStatus::Mismatch);
        }

        let Some(locked_rev) = entry.rev.as_deref() else {
            return Ok(LockStatus::Mismatch);
        };

        // An explicit rev or tag pin must agree with the locked revision.
        // Branch declarations track a moving head, which only a fetch can
        // compare, so they pass here.
        if let Some(pin) = opts.rev.as_deref().or(opts.tag.as_deref())
            && !revision_matches(pin, locked_rev)
        {
            return Ok(LockStatus::Outdated);
        }

        Ok(LockStatus::Ok)
    }

    fn format(&self, opts: &DepOpts) -> String {
        let url = opts.git.as_deref().unwrap_or("<missing url>");
        if let Some(branch) = &opts.branch {
            format!("{url} - {branch}")
        } else if let Some(tag) = &opts.tag {
            format!("{url} - {tag}")
        } else {
            url.to_string()
        }
    }

    fn format_lock(&self, lock: Option<&LockEntry>) -> Option<String> {
        let entry = lock?;
        let rev = entry.rev.as_deref()?;
        // Abbreviate full hashes the way git porcelain does
        if rev.len() >= 12 && rev.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(rev[..7].to_string())
        } else {
            Some(rev.to_string())
        }
    }
}

/// A tag pin like `v1.0.0` never equals a revision hash textually; treat a
/// pin as matching when it equals the locked revision or either abbreviates
/// the other.
fn revision_matches(pin: &str, locked: &str) -> bool {
    pin == locked || locked.starts_with(pin) || pin.starts_with(locked)
}
