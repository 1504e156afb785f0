//! Requirement parsing and matching for dependency declarations.
//!
//! A declared dependency carries an optional version requirement. Requirements
//! come in three shapes:
//!
//! - **Exact versions**: `"1.0.0"`, `"v2.3.1"` - match exactly one version
//! - **Ranges**: `"^1.0"`, `"~1.2.0"`, `">= 1.0, < 2.0"`, `"~> 1.2"` - semver
//!   requirement expressions, including the pessimistic operator
//! - **Patterns**: `"/^2\\..*-rc/"` - a regular expression matched against the
//!   rendered version string, for release trains that don't follow semver
//!
//! The pessimistic operator `~>` is translated at parse time: with two
//! segments (`~> 1.2`) it behaves like `^1.2` (same major), with three
//! (`~> 1.2.3`) like `~1.2.3` (same minor).
//!
//! Requirement equality is *semantic*: two requirements are considered equal
//! when their canonical display forms agree, which is what the converger uses
//! to decide whether two declarations of the same app can be merged.

use regex::Regex;
use semver::{Version, VersionReq};
use std::fmt;

use crate::core::ConvergeError;

/// A version requirement attached to a dependency declaration.
#[derive(Debug, Clone)]
pub enum Requirement {
    /// Exact version match (e.g., `"1.0.0"`, `"v1.0.0"`)
    Exact(Version),

    /// Semver requirement expression (e.g., `"^1.0"`, `">= 1.0, < 2.0"`)
    Range(VersionReq),

    /// Regular expression matched against the version string, written
    /// `/pattern/` in configuration
    Pattern(Regex),
}

impl Requirement {
    /// Parse a requirement string.
    ///
    /// Accepts exact versions (with or without a leading `v`), semver range
    /// expressions, the pessimistic operator `~>`, the wildcard `*`, and
    /// `/regex/` patterns. Anything that fails to parse as one of these is an
    /// [`ConvergeError::InvalidRequirement`].
    pub fn parse(input: &str) -> Result<Self, ConvergeError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(ConvergeError::InvalidRequirement {
                requirement: input.to_string(),
            });
        }

        // /regex/ pattern requirement
        if let Some(body) = trimmed.strip_prefix('/').and_then(|s| s.strip_suffix('/')) {
            let regex = Regex::new(body).map_err(|_| ConvergeError::InvalidRequirement {
                requirement: input.to_string(),
            })?;
            return Ok(Self::Pattern(regex));
        }

        if trimmed == "*" {
            return Ok(Self::Range(VersionReq::STAR));
        }

        // Pessimistic operator: `~> 1.2` widens to same-major, `~> 1.2.3`
        // narrows to same-minor.
        if let Some(rest) = trimmed.strip_prefix("~>") {
            let body = rest.trim();
            let segments = body.split('.').count();
            let translated = if segments >= 3 {
                format!("~{body}")
            } else {
                format!("^{body}")
            };
            let req = VersionReq::parse(&translated).map_err(|_| {
                ConvergeError::InvalidRequirement {
                    requirement: input.to_string(),
                }
            })?;
            return Ok(Self::Range(req));
        }

        // Exact version, tolerating a leading 'v'
        let cleaned = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if let Ok(version) = Version::parse(cleaned) {
            return Ok(Self::Exact(version));
        }

        // Fall through to a general semver range expression
        match VersionReq::parse(trimmed) {
            Ok(req) => Ok(Self::Range(req)),
            Err(_) => Err(ConvergeError::InvalidRequirement {
                requirement: input.to_string(),
            }),
        }
    }

    /// Check whether a concrete version satisfies this requirement.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Exact(exact) => exact == version,
            Self::Range(req) => req.matches(version),
            Self::Pattern(regex) => regex.is_match(&version.to_string()),
        }
    }

    /// Check a raw version string against this requirement.
    ///
    /// Pattern requirements match the raw string directly; the other shapes
    /// require the string to parse as a semantic version first.
    #[must_use]
    pub fn matches_str(&self, version: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(version),
            _ => {
                let cleaned = version.strip_prefix('v').unwrap_or(version);
                Version::parse(cleaned).is_ok_and(|v| self.matches(&v))
            }
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(version) => write!(f, "{version}"),
            Self::Range(req) => write!(f, "{req}"),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

// Semantic equality by canonical display form. Regex does not implement
// PartialEq, and VersionReq normalizes whitespace, so the rendered form is
// the comparison key.
impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Requirement {}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_exact() {
        let req = Requirement::parse("1.2.3").unwrap();
        assert!(matches!(req, Requirement::Exact(_)));
        assert!(req.matches(&v("1.2.3")));
        assert!(!req.matches(&v("1.2.4")));

        // Leading 'v' is tolerated
        let req = Requirement::parse("v1.2.3").unwrap();
        assert!(req.matches(&v("1.2.3")));
    }

    #[test]
    fn test_parse_ranges() {
        let caret = Requirement::parse("^1.0").unwrap();
        assert!(caret.matches(&v("1.9.0")));
        assert!(!caret.matches(&v("2.0.0")));

        let tilde = Requirement::parse("~1.2.0").unwrap();
        assert!(tilde.matches(&v("1.2.9")));
        assert!(!tilde.matches(&v("1.3.0")));

        let range = Requirement::parse(">= 1.0, < 2.0").unwrap();
        assert!(range.matches(&v("1.5.0")));
        assert!(!range.matches(&v("2.0.0")));

        let star = Requirement::parse("*").unwrap();
        assert!(star.matches(&v("0.0.1")));
    }

    #[test]
    fn test_parse_pessimistic() {
        // Two segments: same major
        let wide = Requirement::parse("~> 1.2").unwrap();
        assert!(wide.matches(&v("1.9.0")));
        assert!(!wide.matches(&v("2.0.0")));

        // Three segments: same minor
        let narrow = Requirement::parse("~> 1.2.3").unwrap();
        assert!(narrow.matches(&v("1.2.9")));
        assert!(!narrow.matches(&v("1.3.0")));
    }

    #[test]
    fn test_parse_pattern() {
        let req = Requirement::parse("/^2\\..*-rc/").unwrap();
        assert!(matches!(req, Requirement::Pattern(_)));
        assert!(req.matches_str("2.1.0-rc1"));
        assert!(!req.matches_str("1.1.0-rc1"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse("not a requirement !!").is_err());
        assert!(Requirement::parse("/[unclosed/").is_err());
    }

    #[test]
    fn test_semantic_equality() {
        let a = Requirement::parse("^1.0").unwrap();
        let b = Requirement::parse("^1.0").unwrap();
        let c = Requirement::parse("^2.0").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        // Whitespace normalizes away
        let spaced = Requirement::parse(">=1.0, <2.0").unwrap();
        let roomy = Requirement::parse(">= 1.0 , < 2.0").unwrap();
        assert_eq!(spaced, roomy);
    }

    #[test]
    fn test_matches_str() {
        let req = Requirement::parse("^1.0").unwrap();
        assert!(req.matches_str("1.4.2"));
        assert!(req.matches_str("v1.4.2"));
        assert!(!req.matches_str("2.0.0"));
        assert!(!req.matches_str("garbage"));
    }
}
