//! Spec loading: the seam between the engine and declaration parsing.
//!
//! The tree walker asks a [`SpecLoader`] for each project node's declared
//! dependency specs and for the build-manager evidence found among the
//! node's artifacts. Everything behind the trait is replaceable; the walker
//! itself never touches the filesystem.
//!
//! [`FsSpecLoader`] is the production implementation, reading each
//! dependency's `converge.toml` out of the checkout directory.
//! [`StaticLoader`] serves tests and embedders that already hold the specs
//! in memory.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::{CONFIG_NAME, ProjectConfig};
use crate::core::ConvergeError;
use crate::dep::{Manager, RawDepSpec};

/// Provides declared dependency specs per project node.
///
/// Node identity is the app name; the walker guarantees at most one
/// [`load_children`](Self::load_children) call per distinct node.
pub trait SpecLoader {
    /// Load the dependency specs a node declares.
    ///
    /// Returns `Ok(None)` when the node is not itself a compilable project
    /// (no configuration of its own). A configuration that exists but cannot
    /// be loaded is a [`ConvergeError::ConfigLoad`], fatal to the walk.
    fn load_children(&self, app: &str) -> Result<Option<Vec<RawDepSpec>>, ConvergeError>;

    /// Build-manager evidence found among the node's artifacts, unordered.
    /// The converger applies the inference priority.
    fn manager_evidence(&self, app: &str) -> Vec<Manager>;
}

/// Loads specs from dependency checkouts under a `deps/` directory.
#[derive(Debug, Clone)]
pub struct FsSpecLoader {
    deps_dir: PathBuf,
}

impl FsSpecLoader {
    /// Create a loader over the given checkout directory.
    #[must_use]
    pub fn new(deps_dir: impl Into<PathBuf>) -> Self {
        Self {
            deps_dir: deps_dir.into(),
        }
    }

    /// The checkout directory for one app.
    #[must_use]
    pub fn checkout_dir(&self, app: &str) -> PathBuf {
        self.deps_dir.join(app)
    }
}

impl SpecLoader for FsSpecLoader {
    fn load_children(&self, app: &str) -> Result<Option<Vec<RawDepSpec>>, ConvergeError> {
        let config_path = self.checkout_dir(app).join(CONFIG_NAME);
        if !config_path.exists() {
            return Ok(None);
        }
        let config = ProjectConfig::load(&config_path)?;
        Ok(Some(config.deps))
    }

    fn manager_evidence(&self, app: &str) -> Vec<Manager> {
        let dir = self.checkout_dir(app);
        let mut evidence = Vec::new();
        if dir.join("mix.exs").exists() {
            evidence.push(Manager::Mix);
        }
        if dir.join("rebar.config").exists() || dir.join("rebar.config.script").exists() {
            evidence.push(Manager::Rebar3);
        }
        if dir.join("Makefile").exists() {
            evidence.push(Manager::Make);
        }
        evidence
    }
}

/// In-memory loader for tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    children: HashMap<String, Vec<RawDepSpec>>,
    evidence: HashMap<String, Vec<Manager>>,
}

impl StaticLoader {
    /// Create an empty loader: every node is a leaf.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node's declared specs, making it a project.
    #[must_use]
    pub fn with_children(mut self, app: &str, specs: Vec<RawDepSpec>) -> Self {
        self.children.insert(app.to_string(), specs);
        self
    }

    /// Register manager evidence for a node.
    #[must_use]
    pub fn with_evidence(mut self, app: &str, evidence: Vec<Manager>) -> Self {
        self.evidence.insert(app.to_string(), evidence);
        self
    }
}

impl SpecLoader for StaticLoader {
    fn load_children(&self, app: &str) -> Result<Option<Vec<RawDepSpec>>, ConvergeError> {
        Ok(self.children.get(app).cloned())
    }

    fn manager_evidence(&self, app: &str) -> Vec<Manager> {
        self.evidence.get(app).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_loader_leaf_and_project() {
        let dir = tempfile::tempdir().unwrap();
        let deps = dir.path().join("deps");
        std::fs::create_dir_all(deps.join("leaf")).unwrap();
        std::fs::create_dir_all(deps.join("proj")).unwrap();
        std::fs::write(
            deps.join("proj").join(CONFIG_NAME),
            "[project]\nname = \"proj\"\n\n[deps]\ncowboy = \"^2.0\"\n",
        )
        .unwrap();

        let loader = FsSpecLoader::new(&deps);
        assert!(loader.load_children("leaf").unwrap().is_none());
        assert!(loader.load_children("absent").unwrap().is_none());

        let specs = loader.load_children("proj").unwrap().unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].app, "cowboy");
    }

    #[test]
    fn test_fs_loader_broken_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let deps = dir.path().join("deps");
        std::fs::create_dir_all(deps.join("broken")).unwrap();
        std::fs::write(deps.join("broken").join(CONFIG_NAME), "[project\n").unwrap();

        let loader = FsSpecLoader::new(&deps);
        assert!(matches!(
            loader.load_children("broken"),
            Err(ConvergeError::ConfigLoad { .. })
        ));
    }

    #[test]
    fn test_fs_loader_manager_evidence() {
        let dir = tempfile::tempdir().unwrap();
        let deps = dir.path().join("deps");
        let both = deps.join("both");
        std::fs::create_dir_all(&both).unwrap();
        std::fs::write(both.join("rebar.config"), "").unwrap();
        std::fs::write(both.join("Makefile"), "all:\n").unwrap();

        let loader = FsSpecLoader::new(&deps);
        let evidence = loader.manager_evidence("both");
        assert!(evidence.contains(&Manager::Rebar3));
        assert!(evidence.contains(&Manager::Make));
        assert!(!evidence.contains(&Manager::Mix));
        assert!(loader.manager_evidence("absent").is_empty());
    }
}
