//! Lock file reading and writing.
//!
//! The lock file (`converge.lock`) records one pinned reference per app: the
//! exact revision, registry version, or path recorded the last time the
//! dependency was fetched. The engine treats entries as opaque parsed values;
//! it compares them against declared options through the SCM capability but
//! never interprets them beyond equality.
//!
//! # Format
//!
//! ```toml
//! version = 1
//!
//! [deps.plug]
//! scm = "registry"
//! version = "1.14.2"
//! checksum = "sha256:9d2f31..."
//!
//! [deps.phoenix]
//! scm = "git"
//! url = "https://github.com/example/phoenix.git"
//! rev = "a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b0"
//! ```
//!
//! The lock file is generated by the fetch step (outside this engine) and
//! should be committed to version control so every environment converges
//! against the same pins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::ConvergeError;

/// Current lock file format version.
pub const LOCKFILE_VERSION: u32 = 1;

/// Default lock file name next to the project configuration.
pub const LOCKFILE_NAME: &str = "converge.lock";

/// One pinned reference recorded for an app.
///
/// Which fields are populated depends on the SCM that wrote the entry:
/// git entries carry `url` and `rev`, registry entries carry `version` and
/// `checksum`, path entries carry `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Name of the SCM that recorded this entry
    pub scm: String,

    /// Repository URL (git entries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Pinned revision (git entries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Pinned registry version (registry entries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Source path (path entries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Content checksum recorded at fetch time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Parsed lock file: a map from app name to its pinned reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lockfile {
    /// Lock file format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Pinned entries keyed by app name
    #[serde(default)]
    pub deps: BTreeMap<String, LockEntry>,
}

const fn default_version() -> u32 {
    LOCKFILE_VERSION
}

impl Lockfile {
    /// Create an empty lock file at the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: LOCKFILE_VERSION,
            deps: BTreeMap::new(),
        }
    }

    /// Load a lock file from disk.
    ///
    /// A missing file is not an error: convergence runs fine without a lock
    /// file, every fetchable dependency just reports `nolock`. Parse failures
    /// surface as [`ConvergeError::LockIo`].
    pub fn load(path: &Path) -> Result<Self, ConvergeError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConvergeError::LockIo {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let lockfile: Self =
            toml::from_str(&content).map_err(|e| ConvergeError::LockIo {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if lockfile.version > LOCKFILE_VERSION {
            return Err(ConvergeError::LockIo {
                path: path.display().to_string(),
                reason: format!(
                    "lock file version {} is newer than supported version {LOCKFILE_VERSION}",
                    lockfile.version
                ),
            });
        }

        Ok(lockfile)
    }

    /// Write the lock file to disk.
    pub fn save(&self, path: &Path) -> Result<(), ConvergeError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Look up the pinned entry for an app.
    #[must_use]
    pub fn entry(&self, app: &str) -> Option<&LockEntry> {
        self.deps.get(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lockfile = Lockfile::load(&dir.path().join("converge.lock")).unwrap();
        assert_eq!(lockfile.version, LOCKFILE_VERSION);
        assert!(lockfile.deps.is_empty());
    }

    #[test]
    fn test_parse_entries() {
        let content = r#"
version = 1

[deps.plug]
scm = "registry"
version = "1.14.2"
checksum = "sha256:9d2f31"

[deps.phoenix]
scm = "git"
url = "https://github.com/example/phoenix.git"
rev = "a1b2c3d"
"#;
        let lockfile: Lockfile = toml::from_str(content).unwrap();
        assert_eq!(lockfile.deps.len(), 2);

        let plug = lockfile.entry("plug").unwrap();
        assert_eq!(plug.scm, "registry");
        assert_eq!(plug.version.as_deref(), Some("1.14.2"));

        let phoenix = lockfile.entry("phoenix").unwrap();
        assert_eq!(phoenix.scm, "git");
        assert_eq!(phoenix.rev.as_deref(), Some("a1b2c3d"));
        assert!(lockfile.entry("absent").is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("converge.lock");

        let mut lockfile = Lockfile::new();
        lockfile.deps.insert(
            "cowboy".to_string(),
            LockEntry {
                scm: "registry".to_string(),
                url: None,
                rev: None,
                version: Some("2.10.0".to_string()),
                path: None,
                checksum: Some("sha256:beef".to_string()),
            },
        );
        lockfile.save(&path).unwrap();

        let loaded = Lockfile::load(&path).unwrap();
        assert_eq!(loaded.entry("cowboy"), lockfile.entry("cowboy"));
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("converge.lock");
        std::fs::write(&path, "version = 99\n").unwrap();

        let err = Lockfile::load(&path).unwrap_err();
        assert!(err.to_string().contains("converge.lock"));
    }
}
