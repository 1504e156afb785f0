//! Registry fetch strategy: versioned packages pinned by the lock file.

use super::{LockStatus, Scm};
use crate::core::ConvergeError;
use crate::dep::DepOpts;
use crate::lockfile::LockEntry;
use crate::version::Requirement;

/// Registry-sourced dependencies, the default strategy when a declaration
/// carries neither `git` nor `path`. The lock entry pins an exact version
/// and checksum; the pin is outdated once the declared requirement stops
/// accepting it.
#[derive(Debug, Clone, Copy)]
pub struct RegistryScm;

impl Scm for RegistryScm {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn fetchable(&self) -> bool {
        true
    }

    fn lock_status(
        &self,
        _opts: &DepOpts,
        requirement: Option<&Requirement>,
        lock: Option<&LockEntry>,
    ) -> Result<LockStatus, ConvergeError> {
        let Some(entry) = lock else {
            return Ok(LockStatus::Mismatch);
        };

        if entry.scm != self.name() {
            return Ok(LockStatus::Mismatch);
        }

        let Some(locked_version) = entry.version.as_deref() else {
            return Ok(LockStatus::Mismatch);
        };

        if let Some(requirement) = requirement
            && !requirement.matches_str(locked_version)
        {
            return Ok(LockStatus::Outdated);
        }

        Ok(LockStatus::Ok)
    }

    fn format(&self, opts: &DepOpts) -> String {
        match opts.registry.as_deref() {
            Some(registry) => format!("{registry} package"),
            None => "package".to_string(),
        }
    }

    fn format_lock(&self, lock: Option<&LockEntry>) -> Option<String> {
        let entry = lock?;
        let version = entry.version.as_deref()?;
        match entry.checksum.as_deref() {
            Some(checksum) => Some(format!("{version} ({checksum})")),
            None => Some(version.to_string()),
        }
    }
}
