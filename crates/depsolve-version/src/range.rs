//! Version ranges as ordered sets of non-overlapping bounded intervals.
//!
//! Range syntax, by example (forms on one line are equivalent):
//!
//! - `3` — superset form, contains `3`, `3.0`, `3.1.4`, ...
//! - `2+`, `>=2` — inclusive lower bound; `>2` exclusive
//! - `<5` exclusive upper bound; `<=5` inclusive
//! - `1+<5`, `>=1,<5` — bounded span (the comma is cosmetic)
//! - `1..5` — inclusive lower and upper
//! - `==2` — exactly version `2`
//! - `4|6+` — union of ranges
//! - the empty string — the "any" range, containing every version
//!
//! Overlapping or touching intervals are merged on construction, so
//! `3+<6|4+<8` is the same range as `3+<8`. The empty ("none") range that
//! matches nothing is representable and distinct from "any"; it only arises
//! from operations such as intersection, never from parsing.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ParseError;
use crate::version::Version;

/// Inclusive or exclusive lower bound. The empty version with `inclusive`
/// is the unbounded minimum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LowerBound {
    pub version: Version,
    pub inclusive: bool,
}

impl LowerBound {
    pub fn min() -> Self {
        Self {
            version: Version::new(),
            inclusive: true,
        }
    }

    pub fn is_min(&self) -> bool {
        self.version.is_empty() && self.inclusive
    }

    pub fn contains_version(&self, version: &Version) -> bool {
        *version > self.version || (self.inclusive && *version == self.version)
    }
}

impl Ord for LowerBound {
    fn cmp(&self, other: &Self) -> Ordering {
        // At equal versions the inclusive bound admits more, so it sorts first.
        self.version.cmp(&other.version).then(match (self.inclusive, other.inclusive) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        })
    }
}

impl PartialOrd for LowerBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LowerBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            if !self.inclusive {
                f.write_str(">")?;
            }
            Ok(())
        } else if self.inclusive {
            write!(f, "{}+", self.version)
        } else {
            write!(f, ">{}", self.version)
        }
    }
}

/// Inclusive or exclusive upper bound. `version: None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpperBound {
    pub version: Option<Version>,
    pub inclusive: bool,
}

impl UpperBound {
    pub fn inf() -> Self {
        Self {
            version: None,
            inclusive: true,
        }
    }

    pub fn is_inf(&self) -> bool {
        self.version.is_none()
    }

    pub fn contains_version(&self, version: &Version) -> bool {
        match &self.version {
            None => true,
            Some(upper) => *version < *upper || (self.inclusive && *version == *upper),
        }
    }
}

impl Ord for UpperBound {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.version, &other.version) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b).then(match (self.inclusive, other.inclusive) {
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                _ => Ordering::Equal,
            }),
        }
    }
}

impl PartialOrd for UpperBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            None => Ok(()),
            Some(v) if self.inclusive => write!(f, "<={v}"),
            Some(v) => write!(f, "<{v}"),
        }
    }
}

/// One contiguous interval of a version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    pub lower: LowerBound,
    pub upper: UpperBound,
}

impl Bound {
    /// The interval containing every version.
    pub fn any() -> Self {
        Self {
            lower: LowerBound::min(),
            upper: UpperBound::inf(),
        }
    }

    /// Construct a validated interval; the lower end must not exceed the
    /// upper end.
    pub fn new(lower: LowerBound, upper: UpperBound) -> Result<Self, ParseError> {
        let valid = match &upper.version {
            None => true,
            Some(u) => {
                lower.version < *u
                    || (lower.version == *u && lower.inclusive && upper.inclusive)
            }
        };
        if valid {
            Ok(Self { lower, upper })
        } else {
            Err(ParseError::InvalidBound {
                lower: lower.to_string(),
                upper: upper.to_string(),
            })
        }
    }

    /// The interval `[version, version]`.
    pub fn exact(version: Version) -> Self {
        Self {
            lower: LowerBound {
                version: version.clone(),
                inclusive: true,
            },
            upper: UpperBound {
                version: Some(version),
                inclusive: true,
            },
        }
    }

    /// The superset interval of a bare version: `[v, v.next())`, containing
    /// `v` and every version extending it.
    pub fn superset(version: Version) -> Self {
        let next = version.next();
        Self {
            lower: LowerBound {
                version,
                inclusive: true,
            },
            upper: UpperBound {
                version: next,
                inclusive: false,
            },
        }
    }

    pub fn lower_bounded(&self) -> bool {
        !self.lower.is_min()
    }

    pub fn upper_bounded(&self) -> bool {
        !self.upper.is_inf()
    }

    pub fn contains_version(&self, version: &Version) -> bool {
        self.lower.contains_version(version) && self.upper.contains_version(version)
    }

    pub fn contains_bound(&self, other: &Bound) -> bool {
        self.lower <= other.lower && self.upper >= other.upper
    }

    pub fn intersects(&self, other: &Bound) -> bool {
        self.intersection(other).is_some()
    }

    pub fn intersection(&self, other: &Bound) -> Option<Bound> {
        let lower = std::cmp::max(&self.lower, &other.lower).clone();
        let upper = std::cmp::min(&self.upper, &other.upper).clone();
        Bound::new(lower, upper).ok()
    }
}

impl Ord for Bound {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lower
            .cmp(&other.lower)
            .then_with(|| self.upper.cmp(&other.upper))
    }
}

impl PartialOrd for Bound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.upper.version {
            None => write!(f, "{}", self.lower),
            Some(u) if self.lower.version == *u => write!(f, "=={u}"),
            Some(u) if self.lower.inclusive && self.upper.inclusive => {
                if self.lower.version.is_empty() {
                    write!(f, "<={u}")
                } else {
                    write!(f, "{}..{}", self.lower.version, u)
                }
            }
            Some(u)
                if self.lower.inclusive
                    && !self.upper.inclusive
                    && self.lower.version.next().as_ref() == Some(u) =>
            {
                write!(f, "{}", self.lower.version)
            }
            Some(_) => write!(f, "{}{}", self.lower, self.upper),
        }
    }
}

/// A set of one or more contiguous version intervals, kept sorted and
/// merged; or the empty set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    bounds: Vec<Bound>,
}

impl VersionRange {
    /// The range containing every version.
    pub fn any() -> Self {
        Self {
            bounds: vec![Bound::any()],
        }
    }

    /// The empty range, containing no version at all.
    pub fn none() -> Self {
        Self { bounds: Vec::new() }
    }

    /// Parse a range expression. The empty string parses to the any range.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let mut bounds = Vec::new();
        for part in s.split('|') {
            bounds.push(Self::parse_part(part.trim(), s)?);
        }
        Ok(Self {
            bounds: Self::merge(bounds),
        })
    }

    fn parse_part(part: &str, input: &str) -> Result<Bound, ParseError> {
        let invalid = || ParseError::InvalidRange {
            input: input.to_string(),
        };

        if part.is_empty() {
            return Ok(Bound::any());
        }

        if let Some(rest) = part.strip_prefix("==") {
            return Ok(Bound::exact(Version::parse(rest).map_err(|_| invalid())?));
        }

        if let Some((lo, hi)) = part.split_once("..") {
            let lower = LowerBound {
                version: Version::parse(lo).map_err(|_| invalid())?,
                inclusive: true,
            };
            let upper = UpperBound {
                version: if hi.is_empty() {
                    None
                } else {
                    Some(Version::parse(hi).map_err(|_| invalid())?)
                },
                inclusive: true,
            };
            return Bound::new(lower, upper).map_err(|_| invalid());
        }

        let (lo_str, hi_str) = match part.find('<') {
            Some(i) => (&part[..i], &part[i..]),
            None => (part, ""),
        };
        let lo_str = lo_str.strip_suffix(',').unwrap_or(lo_str);

        let lower = if lo_str.is_empty() {
            LowerBound::min()
        } else if let Some(rest) = lo_str.strip_prefix(">=") {
            LowerBound {
                version: Version::parse(rest).map_err(|_| invalid())?,
                inclusive: true,
            }
        } else if let Some(rest) = lo_str.strip_prefix('>') {
            LowerBound {
                version: Version::parse(rest).map_err(|_| invalid())?,
                inclusive: false,
            }
        } else if let Some(rest) = lo_str.strip_suffix('+') {
            LowerBound {
                version: Version::parse(rest).map_err(|_| invalid())?,
                inclusive: true,
            }
        } else {
            // A bare version: a superset bound if it stands alone, an
            // inclusive lower bound when paired with an upper bound.
            let version = Version::parse(lo_str).map_err(|_| invalid())?;
            if hi_str.is_empty() {
                return Ok(Bound::superset(version));
            }
            LowerBound {
                version,
                inclusive: true,
            }
        };

        let upper = if hi_str.is_empty() {
            UpperBound::inf()
        } else if let Some(rest) = hi_str.strip_prefix("<=") {
            UpperBound {
                version: Some(Version::parse(rest).map_err(|_| invalid())?),
                inclusive: true,
            }
        } else {
            let rest = &hi_str[1..];
            if rest.is_empty() {
                // "<''" would be an upper bound below the smallest version.
                return Err(invalid());
            }
            UpperBound {
                version: Some(Version::parse(rest).map_err(|_| invalid())?),
                inclusive: false,
            }
        };

        Bound::new(lower, upper).map_err(|_| invalid())
    }

    /// The superset range of a bare version (`from_version(1.2)` contains
    /// `1.2`, `1.2.0`, `1.2.9.alpha`, ...). The empty version yields the
    /// any range.
    pub fn from_version(version: Version) -> Self {
        if version.is_empty() {
            return Self::any();
        }
        Self {
            bounds: vec![Bound::superset(version)],
        }
    }

    /// The range containing exactly `version`.
    pub fn exact(version: Version) -> Self {
        Self {
            bounds: vec![Bound::exact(version)],
        }
    }

    /// The range containing exactly the given versions, e.g. `==3|==4|==5.1`.
    pub fn from_versions<I: IntoIterator<Item = Version>>(versions: I) -> Self {
        let bounds = versions.into_iter().map(Bound::exact).collect();
        Self {
            bounds: Self::merge(bounds),
        }
    }

    /// A contiguous range spanning `lower..upper` inclusively; `None` on
    /// either side leaves that side unbounded.
    pub fn as_span(lower: Option<Version>, upper: Option<Version>) -> Self {
        let bound = Bound {
            lower: lower.map_or_else(LowerBound::min, |version| LowerBound {
                version,
                inclusive: true,
            }),
            upper: UpperBound {
                version: upper,
                inclusive: true,
            },
        };
        Self {
            bounds: vec![bound],
        }
    }

    pub fn is_any(&self) -> bool {
        self.bounds.len() == 1 && self.bounds[0] == Bound::any()
    }

    pub fn is_none(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    pub fn lower_bounded(&self) -> bool {
        self.bounds.first().is_some_and(Bound::lower_bounded)
    }

    pub fn upper_bounded(&self) -> bool {
        self.bounds.last().is_some_and(Bound::upper_bounded)
    }

    pub fn contains_version(&self, version: &Version) -> bool {
        self.bounds.iter().any(|b| b.contains_version(version))
    }

    /// True if every version in `other` is also in this range.
    pub fn is_superset(&self, other: &VersionRange) -> bool {
        other
            .bounds
            .iter()
            .all(|b2| self.bounds.iter().any(|b1| b1.contains_bound(b2)))
    }

    pub fn is_subset(&self, other: &VersionRange) -> bool {
        other.is_superset(self)
    }

    pub fn intersects(&self, other: &VersionRange) -> bool {
        self.bounds
            .iter()
            .any(|b1| other.bounds.iter().any(|b2| b1.intersects(b2)))
    }

    /// The range matching both `self` and `other`; possibly the none range.
    pub fn intersection(&self, other: &VersionRange) -> VersionRange {
        let mut bounds = Vec::new();
        for b1 in &self.bounds {
            for b2 in &other.bounds {
                if let Some(b) = b1.intersection(b2) {
                    bounds.push(b);
                }
            }
        }
        VersionRange {
            bounds: Self::merge(bounds),
        }
    }

    /// The range matching either `self` or `other`.
    pub fn union(&self, other: &VersionRange) -> VersionRange {
        let mut bounds = self.bounds.clone();
        bounds.extend(other.bounds.iter().cloned());
        VersionRange {
            bounds: Self::merge(bounds),
        }
    }

    /// The range matching exactly the versions this range does not.
    /// The inverse of "any" is "none" and vice versa.
    pub fn inverse(&self) -> VersionRange {
        if self.is_none() {
            return Self::any();
        }

        let mut lowers: Vec<Option<LowerBound>> = vec![None];
        let mut uppers: Vec<Option<UpperBound>> = Vec::new();

        for bound in &self.bounds {
            if bound.lower.is_min() {
                uppers.push(None);
            } else {
                uppers.push(Some(UpperBound {
                    version: Some(bound.lower.version.clone()),
                    inclusive: !bound.lower.inclusive,
                }));
            }
            match &bound.upper.version {
                None => lowers.push(None),
                Some(u) => lowers.push(Some(LowerBound {
                    version: u.clone(),
                    inclusive: !bound.upper.inclusive,
                })),
            }
        }
        uppers.push(None);

        let bounds = lowers
            .into_iter()
            .zip(uppers)
            .filter(|(l, u)| l.is_some() || u.is_some())
            .map(|(l, u)| Bound {
                lower: l.unwrap_or_else(LowerBound::min),
                upper: u.unwrap_or_else(UpperBound::inf),
            })
            .collect();

        VersionRange { bounds }
    }

    /// The range matching `self` but not `other`.
    pub fn subtract(&self, other: &VersionRange) -> VersionRange {
        self.intersection(&other.inverse())
    }

    /// A single contiguous interval covering the whole range, e.g. the span
    /// of `2+<4|6+<8` is `2+<8`.
    pub fn span(&self) -> VersionRange {
        match (self.bounds.first(), self.bounds.last()) {
            (Some(first), Some(last)) => VersionRange {
                bounds: vec![Bound {
                    lower: first.lower.clone(),
                    upper: last.upper.clone(),
                }],
            },
            _ => Self::none(),
        }
    }

    /// The versions matched exactly (intervals of the form `==v`).
    pub fn to_versions(&self) -> Vec<Version> {
        self.bounds
            .iter()
            .filter_map(|b| match &b.upper.version {
                Some(u) if b.lower.inclusive && b.upper.inclusive && b.lower.version == *u => {
                    Some(u.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Sort and merge intervals so no two overlap or touch.
    fn merge(mut bounds: Vec<Bound>) -> Vec<Bound> {
        if bounds.len() < 2 {
            return bounds;
        }
        bounds.sort();

        let mut merged: Vec<Bound> = Vec::new();
        let mut current = bounds[0].clone();
        for bound in &bounds[1..] {
            let disjoint = match &current.upper.version {
                None => false,
                Some(u) => {
                    bound.lower.version > *u
                        || (bound.lower.version == *u
                            && !bound.lower.inclusive
                            && !current.upper.inclusive)
                }
            };
            if disjoint {
                merged.push(current);
                current = bound.clone();
            } else if bound.upper > current.upper {
                current.upper = bound.upper.clone();
            }
        }
        merged.push(current);
        merged
    }
}

impl fmt::Display for VersionRange {
    /// The canonical merged form. The none range displays as `<none>`,
    /// which is a diagnostic form only and does not parse back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bounds.is_empty() {
            return f.write_str("<none>");
        }
        for (i, bound) in self.bounds.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{bound}")?;
        }
        Ok(())
    }
}

impl FromStr for VersionRange {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        // The none range has no written form; round-trip it explicitly.
        if s == "<none>" {
            return Ok(Self::none());
        }
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl Ord for VersionRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bounds.cmp(&other.bounds)
    }
}

impl PartialOrd for VersionRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
