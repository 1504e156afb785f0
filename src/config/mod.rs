//! Project configuration parsing (`converge.toml`).
//!
//! A project declares its identity and its dependencies:
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
//! Each `deps` entry is either a bare requirement string or an inline table.
//! Recognized table keys map onto [`DepOpts`] fields; unrecognized keys pass
//! through in the residual `extra` map for manager-specific tooling. Every
//! parse failure is a [`ConvergeError::ConfigLoad`] naming the offending
//! file, which is fatal to the walk that triggered it.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::ConvergeError;
use crate::dep::{DepOpts, Manager, RawDepSpec};
use crate::version::Requirement;

/// Configuration file name looked up in each project directory.
pub const CONFIG_NAME: &str = "converge.toml";

#[derive(Debug, Deserialize)]
struct RawConfig {
    project: ProjectSection,
    #[serde(default)]
    deps: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
struct ProjectSection {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

/// A parsed project configuration.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Project name from the `[project]` section
    pub name: String,
    /// Project version, if declared
    pub version: Option<String>,
    /// Declared dependency specs in declaration order
    pub deps: Vec<RawDepSpec>,
    /// Path of the configuration file itself
    pub path: PathBuf,
}

impl ProjectConfig {
    /// Load and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConvergeError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConvergeError::ConfigLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Parse configuration content, attributing errors to `path`.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConvergeError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConvergeError::ConfigLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        // TOML tables don't preserve declaration order, so sort by app name
        // for a stable discovery order within one file.
        let mut deps = Vec::with_capacity(raw.deps.len());
        for (app, value) in &raw.deps {
            deps.push(parse_dep_entry(app, value, path)?);
        }

        Ok(Self {
            name: raw.project.name,
            version: raw.project.version,
            deps,
            path: path.to_path_buf(),
        })
    }
}

fn parse_dep_entry(
    app: &str,
    value: &toml::Value,
    path: &Path,
) -> Result<RawDepSpec, ConvergeError> {
    let config_error = |reason: String| ConvergeError::ConfigLoad {
        path: path.display().to_string(),
        reason,
    };

    match value {
        toml::Value::String(requirement) => Ok(RawDepSpec {
            app: app.to_string(),
            requirement: Some(Requirement::parse(requirement)?),
            opts: DepOpts::default(),
            from: path.to_path_buf(),
        }),

        toml::Value::Table(table) => {
            let mut requirement = None;
            let mut opts = DepOpts::default();

            for (key, entry) in table {
                match key.as_str() {
                    "req" | "requirement" => {
                        let s = expect_str(app, key, entry, &config_error)?;
                        requirement = Some(Requirement::parse(s)?);
                    }
                    "git" => opts.git = Some(expect_str(app, key, entry, &config_error)?.to_string()),
                    "rev" => opts.rev = Some(expect_str(app, key, entry, &config_error)?.to_string()),
                    "branch" => {
                        opts.branch = Some(expect_str(app, key, entry, &config_error)?.to_string());
                    }
                    "tag" => opts.tag = Some(expect_str(app, key, entry, &config_error)?.to_string()),
                    "path" => {
                        opts.path = Some(PathBuf::from(expect_str(app, key, entry, &config_error)?));
                    }
                    "registry" => {
                        opts.registry = Some(expect_str(app, key, entry, &config_error)?.to_string());
                    }
                    "env" => opts.env = Some(expect_str(app, key, entry, &config_error)?.to_string()),
                    "build" => {
                        opts.build = Some(PathBuf::from(expect_str(app, key, entry, &config_error)?));
                    }
                    "dest" => {
                        opts.dest = Some(PathBuf::from(expect_str(app, key, entry, &config_error)?));
                    }
                    "only" => opts.only = Some(expect_str_list(app, key, entry, &config_error)?),
                    "targets" => {
                        opts.targets = Some(expect_str_list(app, key, entry, &config_error)?);
                    }
                    "override" => {
                        opts.override_flag = expect_bool(app, key, entry, &config_error)?;
                    }
                    "optional" => opts.optional = expect_bool(app, key, entry, &config_error)?,
                    "manager" => {
                        let name = expect_str(app, key, entry, &config_error)?;
                        opts.manager = Some(Manager::from_name(name).ok_or_else(|| {
                            config_error(format!(
                                "dependency '{app}': unknown manager '{name}' (expected mix, rebar3, or make)"
                            ))
                        })?);
                    }
                    "system_env" => {
                        let table = entry.as_table().ok_or_else(|| {
                            config_error(format!(
                                "dependency '{app}': `system_env` must be a table of strings"
                            ))
                        })?;
                        for (var, value) in table {
                            let value = expect_str(app, "system_env", value, &config_error)?;
                            opts.system_env.push((var.clone(), value.to_string()));
                        }
                    }
                    _ => {
                        opts.extra.insert(key.clone(), entry.clone());
                    }
                }
            }

            Ok(RawDepSpec {
                app: app.to_string(),
                requirement,
                opts,
                from: path.to_path_buf(),
            })
        }

        other => Err(config_error(format!(
            "dependency '{app}': expected a requirement string or an inline table, got {}",
            other.type_str()
        ))),
    }
}

fn expect_str<'a>(
    app: &str,
    key: &str,
    value: &'a toml::Value,
    config_error: &impl Fn(String) -> ConvergeError,
) -> Result<&'a str, ConvergeError> {
    value
        .as_str()
        .ok_or_else(|| config_error(format!("dependency '{app}': `{key}` must be a string")))
}

fn expect_bool(
    app: &str,
    key: &str,
    value: &toml::Value,
    config_error: &impl Fn(String) -> ConvergeError,
) -> Result<bool, ConvergeError> {
    value
        .as_bool()
        .ok_or_else(|| config_error(format!("dependency '{app}': `{key}` must be a boolean")))
}

fn expect_str_list(
    app: &str,
    key: &str,
    value: &toml::Value,
    config_error: &impl Fn(String) -> ConvergeError,
) -> Result<Vec<String>, ConvergeError> {
    // Accept both `only = "dev"` and `only = ["dev", "test"]`
    if let Some(single) = value.as_str() {
        return Ok(vec![single.to_string()]);
    }
    let array = value
        .as_array()
        .ok_or_else(|| config_error(format!("dependency '{app}': `{key}` must be a string or an array of strings")))?;
    array
        .iter()
        .map(|entry| {
            entry.as_str().map(ToString::to_string).ok_or_else(|| {
                config_error(format!("dependency '{app}': `{key}` entries must be strings"))
            })
        })
        .collect()
}
