//! Error handling for the convergence engine.
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! Two types carry this split:
//! - [`ConvergeError`] - enumerated error kinds for every fatal or
//!   per-dependency failure in the engine
//! - [`ErrorContext`] - wrapper that adds suggestions and details for display
//!
//! Note the deliberate asymmetry with dependency *statuses*: a divergence
//! between two declarations of the same app is never an error. It is reported
//! through [`DepStatus`](crate::dep::DepStatus) so a listing command can still
//! display every dependency. Only two conditions abort a convergence run:
//! a project configuration that cannot be loaded ([`ConvergeError::ConfigLoad`])
//! and two declarations both claiming `override`
//! ([`ConvergeError::AmbiguousOverride`]).
//!
//! Common library errors are converted automatically:
//! - [`std::io::Error`] → [`ConvergeError::Io`]
//! - [`toml::de::Error`] → [`ConvergeError::Toml`]
//! - [`semver::Error`] → [`ConvergeError::Semver`]

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for convergence operations.
///
/// Each variant represents a specific failure mode with enough context to
/// produce a pointed message. Divergent dependency declarations are *not*
/// represented here; see [`DepStatus`](crate::dep::DepStatus).
#[derive(Error, Debug)]
pub enum ConvergeError {
    /// A project node's configuration could not be loaded or parsed.
    ///
    /// This is fatal to the whole walk: no partial forest is returned.
    #[error("Failed to load project configuration at {path}")]
    ConfigLoad {
        /// Path of the offending configuration file
        path: String,
        /// Specific reason the load failed
        reason: String,
    },

    /// More than one declaration of the same app claims `override = true`.
    ///
    /// With two competing overrides there is no authoritative definition to
    /// pick, so the run aborts naming both declaration sites.
    #[error("Dependency '{app}' has conflicting overrides declared in {first} and {second}")]
    AmbiguousOverride {
        /// The app with competing override declarations
        app: String,
        /// First declaration site (discovery order)
        first: String,
        /// Second declaration site
        second: String,
    },

    /// A caller filtered the converged set by a name that is not in it.
    ///
    /// Recoverable: surfaced as a user-facing message, never aborts the
    /// convergence itself.
    #[error("Unknown dependency '{name}' for environment {env}")]
    UnknownDependency {
        /// The requested app name
        name: String,
        /// The active environment, so the user can tell whether the dep
        /// was filtered out rather than undeclared
        env: String,
        /// Closest-matching known name, if any
        suggestion: Option<String>,
    },

    /// The lock file could not be read or parsed.
    #[error("Failed to read lock file {path}")]
    LockIo {
        /// Path of the lock file
        path: String,
        /// Specific reason the read failed
        reason: String,
    },

    /// An SCM collaborator failed while answering a query.
    ///
    /// Treated as "evaluation could not complete for this one dependency";
    /// sibling dependencies still evaluate.
    #[error("SCM query failed for '{app}' ({scm})")]
    ScmQuery {
        /// The app being evaluated
        app: String,
        /// Name of the SCM that failed
        scm: String,
        /// Error reported by the collaborator
        reason: String,
    },

    /// A nested sub-project build asked the cache for a subtree, but no
    /// top-level convergence has been cached.
    ///
    /// Fatal: the caller must have already run a full convergence at the top.
    #[error("No cached convergence contains '{app}'; run the top-level build first")]
    MissingParentConvergence {
        /// The sub-project that requested its subtree
        app: String,
    },

    /// A build manifest file exists but could not be parsed.
    #[error("Invalid build manifest {file}")]
    ManifestParse {
        /// Path of the manifest file
        file: String,
        /// Specific reason the parse failed
        reason: String,
    },

    /// A requirement string could not be parsed.
    #[error("Invalid requirement: {requirement}")]
    InvalidRequirement {
        /// The requirement string as written
        requirement: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Semver parsing error
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl Clone for ConvergeError {
    fn clone(&self) -> Self {
        match self {
            Self::ConfigLoad {
                path,
                reason,
            } => Self::ConfigLoad {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::AmbiguousOverride {
                app,
                first,
                second,
            } => Self::AmbiguousOverride {
                app: app.clone(),
                first: first.clone(),
                second: second.clone(),
            },
            Self::UnknownDependency {
                name,
                env,
                suggestion,
            } => Self::UnknownDependency {
                name: name.clone(),
                env: env.clone(),
                suggestion: suggestion.clone(),
            },
            Self::LockIo {
                path,
                reason,
            } => Self::LockIo {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::ScmQuery {
                app,
                scm,
                reason,
            } => Self::ScmQuery {
                app: app.clone(),
                scm: scm.clone(),
                reason: reason.clone(),
            },
            Self::MissingParentConvergence {
                app,
            } => Self::MissingParentConvergence {
                app: app.clone(),
            },
            Self::ManifestParse {
                file,
                reason,
            } => Self::ManifestParse {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::InvalidRequirement {
                requirement,
            } => Self::InvalidRequirement {
                requirement: requirement.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::Io(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Toml(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::TomlSer(e) => Self::Other {
                message: format!("TOML serialization error: {e}"),
            },
            Self::Semver(e) => Self::Other {
                message: format!("Semver parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// Wraps a [`ConvergeError`] and adds optional suggestions and details. When
/// displayed, errors show the main message in red, details in yellow, and the
/// suggestion in green.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ConvergeError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ConvergeError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with suggestions.
///
/// This is the main entry point for converting arbitrary errors into messages
/// for CLI display. It recognizes [`ConvergeError`] variants and common
/// library errors, and falls back to printing the full error chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(converge_error) = error.downcast_ref::<ConvergeError>() {
        return create_error_context(converge_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ConvergeError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check file ownership or run with elevated permissions");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ConvergeError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(ConvergeError::ConfigLoad {
            path: "converge.toml".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax. Verify quotes, brackets, and indentation")
        .with_details("TOML parsing errors are usually caused by syntax issues like missing quotes or mismatched brackets");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ConvergeError::Other {
        message,
    })
}

/// Map each [`ConvergeError`] variant to a context with tailored suggestions.
fn create_error_context(error: ConvergeError) -> ErrorContext {
    match &error {
        ConvergeError::ConfigLoad { path, reason } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Check the dependency declarations in {path}. Each entry needs a requirement string or an inline table"
            ))
            .with_details(format!("The configuration could not be parsed: {reason}")),

        ConvergeError::AmbiguousOverride { app, first, second } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Remove `override = true` from one of the two declarations of '{app}'"
            ))
            .with_details(format!(
                "Both {first} and {second} claim to be the authoritative definition of '{app}', so neither can win"
            )),

        ConvergeError::UnknownDependency { name, env, suggestion } => {
            let ctx = ErrorContext::new(error.clone()).with_details(format!(
                "'{name}' is not in the converged dependency set for environment {env}. It may be restricted to another environment via `only`"
            ));
            match suggestion {
                Some(s) => ctx.with_suggestion(format!("Did you mean '{s}'?")),
                None => ctx.with_suggestion("Run `converge list --all` to see every declared dependency"),
            }
        }

        ConvergeError::LockIo { path, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Check that {path} is readable and is valid TOML"))
            .with_details("The lock file records pinned references from the last fetch; without it every fetchable dependency reports `nolock`"),

        ConvergeError::ScmQuery { app, .. } => ErrorContext::new(error.clone())
            .with_details(format!(
                "Status evaluation was skipped for '{app}'; other dependencies were still evaluated"
            )),

        ConvergeError::MissingParentConvergence { app } => ErrorContext::new(error.clone())
            .with_suggestion("Run the build from the top-level project before building a dependency in isolation")
            .with_details(format!(
                "Sub-project builds reuse the top-level convergence; none was found containing '{app}'"
            )),

        _ => ErrorContext::new(error.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ConvergeError::ConfigLoad {
            path: "deps/a/converge.toml".to_string(),
            reason: "unexpected eof".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to load project configuration at deps/a/converge.toml"
        );

        let error = ConvergeError::UnknownDependency {
            name: "poison".to_string(),
            env: "dev".to_string(),
            suggestion: None,
        };
        assert_eq!(error.to_string(), "Unknown dependency 'poison' for environment dev");

        let error = ConvergeError::AmbiguousOverride {
            app: "plug".to_string(),
            first: "converge.toml".to_string(),
            second: "deps/b/converge.toml".to_string(),
        };
        assert!(error.to_string().contains("conflicting overrides"));
    }

    #[test]
    fn test_error_context_builder() {
        let ctx = ErrorContext::new(ConvergeError::MissingParentConvergence {
            app: "child".to_string(),
        })
        .with_suggestion("run the top-level build")
        .with_details("no cached entry");

        assert_eq!(ctx.suggestion, Some("run the top-level build".to_string()));
        assert_eq!(ctx.details, Some("no cached entry".to_string()));

        let display = format!("{ctx}");
        assert!(display.contains("child"));
        assert!(display.contains("run the top-level build"));
    }

    #[test]
    fn test_user_friendly_error_unknown_dependency_suggests() {
        let error = ConvergeError::UnknownDependency {
            name: "pluf".to_string(),
            env: "prod".to_string(),
            suggestion: Some("plug".to_string()),
        };
        let ctx = user_friendly_error(anyhow::Error::from(error));
        assert!(ctx.suggestion.unwrap().contains("plug"));
    }

    #[test]
    fn test_user_friendly_error_toml_parse() {
        let toml_str = "invalid = toml {";
        let result: Result<toml::Value, _> = toml::from_str(toml_str);

        if let Err(e) = result {
            let ctx = user_friendly_error(anyhow::Error::from(e));
            match ctx.error {
                ConvergeError::ConfigLoad {
                    ..
                } => {}
                _ => panic!("Expected ConfigLoad error"),
            }
            assert!(ctx.suggestion.unwrap().contains("TOML syntax"));
        }
    }

    #[test]
    fn test_user_friendly_error_generic_keeps_chain() {
        let root = anyhow::anyhow!("root cause");
        let error = root.context("outer context");
        let ctx = user_friendly_error(error);

        match ctx.error {
            ConvergeError::Other {
                message,
            } => {
                assert!(message.contains("outer context"));
                assert!(message.contains("root cause"));
            }
            _ => panic!("Expected Other error"),
        }
    }

    #[test]
    fn test_clone_converts_unclonable_to_other() {
        let error = ConvergeError::Io(std::io::Error::other("boom"));
        match error.clone() {
            ConvergeError::Other {
                message,
            } => assert!(message.contains("boom")),
            _ => panic!("Expected Other after clone"),
        }
    }
}
