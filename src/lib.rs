//! Converge - Dependency Graph Convergence Engine
//!
//! Converge takes a project's declared dependencies (and, transitively, every
//! dependency's own declared dependencies) and produces one canonical,
//! de-duplicated, status-annotated dependency list for a given execution
//! context (environment × target). The engine resolves conflicting
//! requirement specifications, source divergences, and override rules across
//! an arbitrarily deep and potentially cyclic-looking tree, deterministically
//! and cache-consistently across repeated invocations and nested sub-project
//! builds.
//!
//! # Architecture Overview
//!
//! Convergence is a pipeline of four stages:
//!
//! 1. The [`walker`] visits project nodes starting at the root, loading each
//!    node's declared specs through a [`loader::SpecLoader`], filtering them
//!    by environment and target, and cutting off ancestor-chain cycles. It
//!    produces an explicit forest, never recursion that trusts acyclicity.
//! 2. The [`converger`] merges the forest into one flat, app-unique list,
//!    applying override and divergence rules, inferring build managers, and
//!    stripping transitive optionality.
//! 3. The [`evaluator`] refines each available record against the lock file
//!    and build manifest through a pure per-dependency state machine.
//! 4. The [`cache`] stores fully-evaluated results per
//!    `(project, environment, target)` so repeated queries and nested
//!    sub-project builds avoid recomputation.
//!
//! The engine performs no source-control I/O of its own: fetch strategies are
//! consulted through the [`scm::Scm`] capability trait, which answers purely
//! from declared options and parsed lock entries.
//!
//! ## Key Properties
//!
//! - **Deterministic**: a fixed forest and context always converge to the
//!   same list in the same discovery order
//! - **App-unique**: multiple declarations of the same app merge into exactly
//!   one record, never silently dropped
//! - **Conflicts are statuses, not errors**: a divergence is reported through
//!   [`dep::DepStatus`] so listings can still show every dependency; only an
//!   unloadable configuration and an ambiguous double-override abort a run
//!
//! # Core Modules
//!
//! ## Engine
//! - [`walker`] - Forest construction with memoized loading and cycle cutoff
//! - [`converger`] - Merge, override, and divergence rules
//! - [`evaluator`] - Lock and build-manifest status state machine
//! - [`cache`] - Per-context result cache with child-mode subtree extraction
//!
//! ## Collaborator Seams
//! - [`loader`] - The spec-loading seam ([`loader::FsSpecLoader`] reads
//!   `converge.toml` checkouts; [`loader::StaticLoader`] serves tests)
//! - [`scm`] - Fetch-strategy capability trait with git, path, and registry
//!   implementations
//!
//! ## Parsed Inputs
//! - [`config`] - Project configuration parsing (`converge.toml`)
//! - [`lockfile`] - Lock file entries (`converge.lock`)
//! - [`manifest`] - Per-dependency build manifests
//! - [`version`] - Requirement parsing and matching
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface (presentation only)
//! - [`core`] - Error types shared by every component
//! - [`dep`] - Dependency records, options, and statuses
//!
//! # Configuration Format (converge.toml)
//!
//! ```toml
//! [project]
//! name = "my_app"
//! version = "0.1.0"
//!
//! [deps]
//! plug = "^1.14"
//! phoenix = { git = "https://github.com/example/phoenix.git", tag = "v1.7.0" }
//! local_auth = { path = "../auth", optional = true }
//! cowboy = { req = "~> 2.0", override = true, only = ["dev", "test"] }
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! # List every converged dependency with its status
//! converge list
//!
//! # Include dependencies restricted to other environments or targets
//! converge list --all
//!
//! # Select specific dependencies (non-zero exit if a name is unknown)
//! converge list plug phoenix
//!
//! # Converge for another context
//! converge list --env prod --target rpi
//!
//! # Render the dependency tree
//! converge tree
//! ```

// Engine
pub mod cache;
pub mod converger;
pub mod evaluator;
pub mod walker;

// Collaborator seams
pub mod loader;
pub mod scm;

// Parsed inputs
pub mod config;
pub mod lockfile;
pub mod manifest;
pub mod version;

// Supporting modules
pub mod cli;
pub mod core;
pub mod dep;
