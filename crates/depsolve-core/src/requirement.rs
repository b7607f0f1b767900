//! Package requirements and requirement-list reduction.
//!
//! A requirement names a package family and constrains its version range.
//! Three modifiers change how a requirement participates in a solve:
//!
//! - `!foo-1.5` — a conflict requirement: versions of `foo` in the range
//!   must NOT be present. `!foo` conflicts with every version.
//! - `~foo-1` — a weak requirement: `foo` is not required, but if present
//!   it must fall within the range. Equivalent to the conflict of the
//!   inverse of the range; `~foo` alone is valid and has no effect.
//! - `.platform-linux` — an ephemeral requirement (leading `.` on the
//!   name): it takes part in narrowing but never resolves to an installed
//!   package.
//!
//! The separator between name and range may be `-`, `@` or `#` (purely
//! cosmetic), and may be dropped when the range starts with `=`, `<` or
//! `>`, as in `foo<3` or `foo==1.0.1`.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use depsolve_version::{ParseError, Version, VersionRange};

/// A requirement for a package family.
///
/// Internally a weak requirement stores the inverse of its written range
/// with the conflict flag set, which makes weak and conflict requirements
/// behave identically during solving: both subtract their stored range
/// from a family's permissible set and neither forces the family into the
/// solve.
#[derive(Debug, Clone)]
pub struct Requirement {
    name: String,
    range: VersionRange,
    conflict: bool,
    weak: bool,
    sep: char,
}

impl Requirement {
    /// Parse a requirement string such as `foo-1.2+`, `!bar-2`, `~baz<3`
    /// or `.platform-linux`.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let invalid = |reason: &str| ParseError::InvalidRequirement {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (rest, conflict, weak) = if let Some(r) = s.strip_prefix('!') {
            (r, true, false)
        } else if let Some(r) = s.strip_prefix('~') {
            (r, true, true)
        } else {
            (s, false, false)
        };

        let split = rest
            .char_indices()
            .find(|(_, c)| matches!(c, '-' | '@' | '#' | '=' | '<' | '>'));
        let (name, sep, range_str) = match split {
            None => (rest, '-', None),
            Some((i, c)) if matches!(c, '-' | '@' | '#') => (&rest[..i], c, Some(&rest[i + 1..])),
            Some((i, _)) => (&rest[..i], '-', Some(&rest[i..])),
        };

        let stripped = name.strip_prefix('.').unwrap_or(name);
        if stripped.is_empty()
            || !stripped
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
        {
            return Err(invalid("missing or malformed package name"));
        }

        let range = match range_str {
            None if weak => VersionRange::none(),
            None => VersionRange::any(),
            Some(r) => {
                let written = VersionRange::parse(r)?;
                if weak {
                    written.inverse()
                } else {
                    written
                }
            }
        };

        Ok(Self {
            name: name.to_string(),
            range,
            conflict,
            weak,
            sep,
        })
    }

    /// Build a plain (hard) requirement from a name and range.
    pub fn construct(name: impl Into<String>, range: VersionRange) -> Self {
        Self {
            name: name.into(),
            range,
            conflict: false,
            weak: false,
            sep: '-',
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stored range. For a plain requirement this is the permitted
    /// range; for a conflict (or weak) requirement it is the excluded one.
    pub fn range(&self) -> &VersionRange {
        &self.range
    }

    /// True for conflict requirements. Weak requirements are also conflict
    /// requirements, but not the other way around.
    pub fn is_conflict(&self) -> bool {
        self.conflict
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    /// True if the requirement names an ephemeral family (leading `.`).
    pub fn is_ephemeral(&self) -> bool {
        self.name.starts_with('.')
    }

    /// True for requirements with no constraining effect (`~foo`).
    pub fn is_no_op(&self) -> bool {
        self.conflict && self.range.is_none()
    }

    /// The range a variant of this family is permitted to have: the stored
    /// range for plain requirements, its inverse for conflict ones.
    pub fn permitted_range(&self) -> VersionRange {
        if self.conflict {
            self.range.inverse()
        } else {
            self.range.clone()
        }
    }

    /// Merge with another requirement for the same family. Returns `None`
    /// when the two cannot be satisfied together (e.g. `foo-4` and `foo-6`).
    ///
    /// Examples of successful merges:
    /// - `foo-3+` and `!foo-5+` merge to `foo-3+<5`
    /// - `foo-1` and `foo-1.5` merge to `foo-1.5`
    /// - `!foo-2` and `!foo-5` merge to `!foo-2|5`
    pub fn merged(&self, other: &Requirement) -> Option<Requirement> {
        if self.name != other.name {
            return None;
        }

        match (self.conflict, other.conflict) {
            (true, true) => {
                let range = self.range.union(&other.range);
                let weak = self.weak && other.weak && !range.is_any();
                Some(Requirement {
                    name: self.name.clone(),
                    range,
                    conflict: true,
                    weak,
                    sep: self.sep,
                })
            }
            (true, false) => {
                let range = other.range.subtract(&self.range);
                (!range.is_none()).then(|| Requirement {
                    name: other.name.clone(),
                    range,
                    conflict: false,
                    weak: false,
                    sep: other.sep,
                })
            }
            (false, true) => {
                let range = self.range.subtract(&other.range);
                (!range.is_none()).then(|| Requirement {
                    name: self.name.clone(),
                    range,
                    conflict: false,
                    weak: false,
                    sep: self.sep,
                })
            }
            (false, false) => {
                let range = self.range.intersection(&other.range);
                (!range.is_none()).then(|| Requirement {
                    name: self.name.clone(),
                    range,
                    conflict: false,
                    weak: false,
                    sep: self.sep,
                })
            }
        }
    }

    /// True if this requirement and `other` cannot both be satisfied.
    pub fn conflicts_with(&self, other: &Requirement) -> bool {
        if self.name != other.name || self.is_no_op() || other.is_no_op() {
            return false;
        }
        match (self.conflict, other.conflict) {
            (true, true) => false,
            (true, false) => self.range.is_superset(&other.range),
            (false, true) => other.range.is_superset(&self.range),
            (false, false) => !self.range.intersects(&other.range),
        }
    }

    /// True if a concrete variant version of this family violates the
    /// requirement.
    pub fn conflicts_with_version(&self, version: &Version) -> bool {
        if self.is_no_op() {
            return false;
        }
        if self.conflict {
            self.range.contains_version(version)
        } else {
            !self.range.contains_version(version)
        }
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.range == other.range && self.conflict == other.conflict
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.range.hash(state);
        self.conflict.hash(state);
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.weak {
            "~"
        } else if self.conflict {
            "!"
        } else {
            ""
        };

        // Weak requirements display their written (un-inverted) range.
        let range = if self.weak {
            if self.range.is_none() {
                VersionRange::any()
            } else {
                self.range.inverse()
            }
        } else {
            self.range.clone()
        };

        if range.is_any() {
            return write!(f, "{prefix}{}", self.name);
        }

        let range_str = range.to_string();
        if range_str.starts_with(['=', '<', '>']) {
            write!(f, "{prefix}{}{range_str}", self.name)
        } else {
            write!(f, "{prefix}{}{}{range_str}", self.name, self.sep)
        }
    }
}

impl FromStr for Requirement {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A requirement list reduced to its optimal form: requirements for common
/// families are merged, first-appearance order is retained, and the first
/// unsatisfiable pair is reported instead.
#[derive(Debug, Clone)]
pub struct RequirementList {
    requirements: Vec<Requirement>,
    conflict: Option<(Requirement, Requirement)>,
}

impl RequirementList {
    pub fn new<I: IntoIterator<Item = Requirement>>(requirements: I) -> Self {
        let requirements: Vec<Requirement> = requirements.into_iter().collect();
        let mut merged: HashMap<String, Requirement> = HashMap::new();

        for req in &requirements {
            match merged.get(req.name()) {
                Some(existing) => match existing.merged(req) {
                    Some(m) => {
                        merged.insert(req.name().to_string(), m);
                    }
                    None => {
                        tracing::debug!(first = %existing, second = %req, "requirement reduction hit a conflict");
                        return Self {
                            requirements: Vec::new(),
                            conflict: Some((existing.clone(), req.clone())),
                        };
                    }
                },
                None => {
                    merged.insert(req.name().to_string(), req.clone());
                }
            }
        }

        let mut seen = Vec::new();
        let mut reduced = Vec::new();
        for req in &requirements {
            if !seen.contains(&req.name()) {
                seen.push(req.name());
                reduced.push(merged[req.name()].clone());
            }
        }

        Self {
            requirements: reduced,
            conflict: None,
        }
    }

    /// The reduced requirements; empty when the list is self-conflicting.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// The first unsatisfiable requirement pair, if any.
    pub fn conflict(&self) -> Option<&(Requirement, Requirement)> {
        self.conflict.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter()
    }
}

impl fmt::Display for RequirementList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((a, b)) = &self.conflict {
            return write!(f, "{a} <--!--> {b}");
        }
        for (i, req) in self.requirements.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{req}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(s: &str) -> Requirement {
        Requirement::parse(s).unwrap()
    }

    fn ver(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn parse_plain() {
        let r = req("foo-1.2+");
        assert_eq!(r.name(), "foo");
        assert!(!r.is_conflict() && !r.is_weak() && !r.is_ephemeral());
        assert!(r.range().contains_version(&ver("1.3")));
        assert!(!r.range().contains_version(&ver("1.1")));
    }

    #[test]
    fn parse_separator_variants() {
        assert_eq!(req("foo@1.0"), req("foo-1.0"));
        assert_eq!(req("foo#1.0"), req("foo-1.0"));
        assert_eq!(req("foo<3").range(), &VersionRange::parse("<3").unwrap());
        assert_eq!(req("foo==1.0.1").range(), &VersionRange::parse("==1.0.1").unwrap());
    }

    #[test]
    fn parse_unversioned() {
        let r = req("foo");
        assert!(r.range().is_any());
    }

    #[test]
    fn parse_conflict() {
        let r = req("!bar-2");
        assert!(r.is_conflict());
        assert!(!r.is_weak());
        assert!(r.conflicts_with_version(&ver("2.3")));
        assert!(!r.conflicts_with_version(&ver("3.0")));
    }

    #[test]
    fn parse_weak() {
        // ~foo-1 permits absence, and 1.x if present.
        let r = req("~foo-1");
        assert!(r.is_conflict() && r.is_weak());
        assert!(!r.conflicts_with_version(&ver("1.5")));
        assert!(r.conflicts_with_version(&ver("2.0")));

        // ~foo alone has no effect.
        let r = req("~foo");
        assert!(r.is_no_op());
        assert!(!r.conflicts_with_version(&ver("9")));
    }

    #[test]
    fn parse_ephemeral() {
        let r = req(".platform-linux");
        assert!(r.is_ephemeral());
        assert_eq!(r.name(), ".platform");
    }

    #[test]
    fn rejects_malformed() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse("-1.0").is_err());
        assert!(Requirement::parse("foo bar-1").is_err());
        assert!(Requirement::parse("foo--1").is_err());
    }

    #[test]
    fn display_round_trip() {
        for s in [
            "foo-1.2+",
            "foo",
            "!bar-2",
            "~baz-1",
            "~baz",
            "foo==1.0.1",
            "foo<3",
            ".platform-linux",
            "!.feature",
        ] {
            let r = req(s);
            assert_eq!(r.to_string(), s, "display of '{s}'");
            assert_eq!(req(&r.to_string()), r, "round trip of '{s}'");
        }
    }

    #[test]
    fn merge_hard_and_conflict() {
        let m = req("foo-3+").merged(&req("!foo-5+")).unwrap();
        assert_eq!(m, req("foo-3+<5"));
    }

    #[test]
    fn merge_hard_and_hard() {
        let m = req("foo-1").merged(&req("foo-1.5")).unwrap();
        assert_eq!(m, req("foo-1.5"));
        assert!(req("foo-4").merged(&req("foo-6")).is_none());
    }

    #[test]
    fn merge_conflicts() {
        let m = req("!foo-2").merged(&req("!foo-5")).unwrap();
        assert_eq!(m, req("!foo-2|5"));
    }

    #[test]
    fn merge_weak_no_op() {
        let m = req("~foo").merged(&req("foo-1.5")).unwrap();
        assert_eq!(m, req("foo-1.5"));
    }

    #[test]
    fn conflict_detection() {
        assert!(req("foo-4").conflicts_with(&req("foo-6")));
        assert!(!req("foo-4").conflicts_with(&req("foo-4.2")));
        assert!(req("!foo").conflicts_with(&req("foo-1")));
        assert!(!req("foo-1").conflicts_with(&req("bar-1")));
        assert!(!req("~foo").conflicts_with(&req("foo-1")));
    }

    #[test]
    fn requirement_list_merges_in_order() {
        let list = RequirementList::new(vec![req("a-1"), req("b"), req("a-1.5+")]);
        assert!(list.conflict().is_none());
        let reqs = list.requirements();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].name(), "a");
        assert_eq!(reqs[0], req("a-1.5+<1_"));
        assert_eq!(reqs[1].name(), "b");
    }

    #[test]
    fn requirement_list_reports_conflict() {
        let list = RequirementList::new(vec![req("a-1"), req("a-2")]);
        let (x, y) = list.conflict().unwrap();
        assert_eq!(x, &req("a-1"));
        assert_eq!(y, &req("a-2"));
        assert!(list.requirements().is_empty());
    }

    #[test]
    fn serde_as_string() {
        let r = req("!bar-2");
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"!bar-2\"");
        let back: Requirement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
