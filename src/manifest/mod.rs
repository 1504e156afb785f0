//! Per-dependency build manifest.
//!
//! After a dependency compiles, the build step records a small manifest next
//! to its artifacts: the toolchain and runtime versions it was built with,
//! the SCM that fetched it, and whether the build marker is still current.
//! The status evaluator compares these recorded values against the running
//! environment purely by equality; it never inspects artifacts itself.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::ConvergeError;

/// Default manifest location relative to a dependency's build directory.
pub const MANIFEST_NAME: &str = ".converge/manifest.toml";

/// Parsed build manifest for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Toolchain version the dependency was last built with
    pub toolchain_version: String,

    /// Runtime version the dependency was last built with
    pub runtime_version: String,

    /// Name of the SCM that fetched the sources that were built
    pub scm: String,

    /// Whether the build marker is still current relative to the sources.
    /// The build step maintains this; a stale marker means recompilation.
    #[serde(default)]
    pub fresh: bool,
}

impl BuildManifest {
    /// Load a build manifest from disk.
    ///
    /// Returns `Ok(None)` when the file does not exist (the dependency has
    /// never been built); a present-but-unparseable manifest is
    /// [`ConvergeError::ManifestParse`].
    pub fn load(path: &Path) -> Result<Option<Self>, ConvergeError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let manifest = toml::from_str(&content).map_err(|e| ConvergeError::ManifestParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(manifest))
    }
}
