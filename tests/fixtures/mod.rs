//! Shared test fixtures for CLI integration tests.
//!
//! Builds throwaway project directories with a `converge.toml`, optional
//! `converge.lock`, dependency checkouts under `deps/`, and per-dependency
//! build manifests, then hands out pre-wired `converge` commands running
//! against them.

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Toolchain version every test command reports as currently running.
pub const TOOLCHAIN: &str = "1.16.0";

/// Runtime version every test command reports as currently running.
pub const RUNTIME: &str = "26.2";

/// A temporary project directory for driving the CLI.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Create an empty project directory (no configuration yet).
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Write the root `converge.toml`.
    pub fn write_config(&self, content: &str) {
        fs::write(self.dir.path().join("converge.toml"), content)
            .expect("failed to write converge.toml");
    }

    /// Write the `converge.lock` lock file.
    #[allow(dead_code)]
    pub fn write_lockfile(&self, content: &str) {
        fs::write(self.dir.path().join("converge.lock"), content)
            .expect("failed to write converge.lock");
    }

    /// Create a checkout directory for `app` under `deps/`, marking the
    /// dependency as fetched.
    pub fn fetch(&self, app: &str) -> PathBuf {
        let checkout = self.dir.path().join("deps").join(app);
        fs::create_dir_all(&checkout).expect("failed to create checkout");
        checkout
    }

    /// Give a fetched dependency its own `converge.toml`, making it a
    /// project the walker recurses into.
    pub fn write_dep_config(&self, app: &str, content: &str) {
        let checkout = self.fetch(app);
        fs::write(checkout.join("converge.toml"), content)
            .expect("failed to write dependency converge.toml");
    }

    /// Record a build manifest for a fetched dependency.
    ///
    /// `toolchain` defaults to the running one when `None`, producing a
    /// manifest the evaluator considers current.
    #[allow(dead_code)]
    pub fn write_manifest(&self, app: &str, scm: &str, fresh: bool, toolchain: Option<&str>) {
        let checkout = self.fetch(app);
        let manifest_dir = checkout.join(".converge");
        fs::create_dir_all(&manifest_dir).expect("failed to create manifest dir");
        fs::write(
            manifest_dir.join("manifest.toml"),
            format!(
                "toolchain_version = \"{}\"\nruntime_version = \"{RUNTIME}\"\nscm = \"{scm}\"\nfresh = {fresh}\n",
                toolchain.unwrap_or(TOOLCHAIN)
            ),
        )
        .expect("failed to write manifest");
    }

    /// A `converge` command running in this project with a pinned toolchain.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("converge").expect("binary should build");
        cmd.current_dir(self.dir.path())
            .env("CONVERGE_TOOLCHAIN_VERSION", TOOLCHAIN)
            .env("CONVERGE_RUNTIME_VERSION", RUNTIME)
            .env("NO_COLOR", "1");
        cmd
    }
}
