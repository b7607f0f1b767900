//! Structured failure reporting for unsatisfiable solves.

use std::fmt;

use serde::{Deserialize, Serialize};

use depsolve_core::Requirement;
use depsolve_version::VersionRange;

/// A requirement together with where it came from: the chain of chosen
/// package variants (qualified names) that led to it. An empty chain
/// means the requirement was part of the original request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSource {
    pub requirement: Requirement,
    pub via: Vec<String>,
}

impl RequirementSource {
    pub fn request(requirement: Requirement) -> Self {
        Self {
            requirement,
            via: Vec::new(),
        }
    }

    pub fn from_package(requirement: Requirement, via: Vec<String>) -> Self {
        Self { requirement, via }
    }

    pub fn is_request(&self) -> bool {
        self.via.is_empty()
    }
}

impl fmt::Display for RequirementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.via.is_empty() {
            write!(f, "{} (requested)", self.requirement)
        } else {
            write!(f, "{} (via {})", self.requirement, self.via.join(" -> "))
        }
    }
}

/// Why a solve did not produce a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Two requirements for the same family cannot both hold.
    Conflict {
        first: RequirementSource,
        second: RequirementSource,
    },

    /// A family is required in a range the repository has no variants for.
    NoCandidates {
        family: String,
        range: VersionRange,
        sources: Vec<RequirementSource>,
    },

    /// A dependency chain leads back to an earlier family with a range its
    /// chosen version cannot satisfy.
    Cycle { path: Vec<String> },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Conflict { first, second } => {
                writeln!(f, "requirement conflict:")?;
                writeln!(f, "  {first}")?;
                write!(f, "  {second}")
            }
            FailureReason::NoCandidates {
                family,
                range,
                sources,
            } => {
                writeln!(f, "no versions of '{family}' satisfy {range}:")?;
                for (i, s) in sources.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "  {s}")?;
                }
                Ok(())
            }
            FailureReason::Cycle { path } => {
                write!(f, "dependency cycle: {}", path.join(" -> "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(s: &str) -> Requirement {
        Requirement::parse(s).unwrap()
    }

    #[test]
    fn conflict_display_names_both_sides() {
        let reason = FailureReason::Conflict {
            first: RequirementSource::request(req("bar-2.0")),
            second: RequirementSource::from_package(req("bar-1.0"), vec!["foo-1.0".into()]),
        };
        let s = reason.to_string();
        assert!(s.contains("bar-2.0 (requested)"));
        assert!(s.contains("bar-1.0 (via foo-1.0)"));
    }

    #[test]
    fn cycle_display_shows_path() {
        let reason = FailureReason::Cycle {
            path: vec!["x-1.0".into(), "y-1.0".into(), "x".into()],
        };
        assert_eq!(reason.to_string(), "dependency cycle: x-1.0 -> y-1.0 -> x");
    }
}
