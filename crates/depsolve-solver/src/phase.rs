//! Per-family solve state.

use depsolve_core::{PackageVariant, Requirement};
use depsolve_version::VersionRange;

use crate::conflict::RequirementSource;

/// The solver's working state for one package family: the range versions
/// are still allowed to come from, whether the family must appear in the
/// resolution, and the variant chosen so far (if any).
///
/// Conflict and weak requirements only shrink `allowed`; they never set
/// `required`, so a family constrained purely by them stays out of the
/// resolution.
#[derive(Debug, Clone)]
pub struct Phase {
    pub family: String,
    pub allowed: VersionRange,
    pub required: bool,
    pub ephemeral: bool,
    pub chosen: Option<PackageVariant>,
    /// Hard requirement provenance, kept for failure reporting.
    pub sources: Vec<RequirementSource>,
}

impl Phase {
    pub fn new(family: impl Into<String>) -> Self {
        let family = family.into();
        let ephemeral = family.starts_with('.');
        Self {
            family,
            allowed: VersionRange::any(),
            required: false,
            ephemeral,
            chosen: None,
            sources: Vec::new(),
        }
    }

    /// Intersect the allowed range with a hard requirement's range.
    /// Returns false when the intersection is empty.
    pub fn narrow(&mut self, range: &VersionRange) -> bool {
        self.allowed = self.allowed.intersection(range);
        !self.allowed.is_none()
    }

    /// Remove a conflict requirement's range from the allowed set.
    /// Returns false when nothing remains.
    pub fn exclude(&mut self, range: &VersionRange) -> bool {
        self.allowed = self.allowed.subtract(range);
        !self.allowed.is_none()
    }

    /// True when the chosen variant (if any) still fits the allowed range.
    pub fn choice_valid(&self) -> bool {
        match &self.chosen {
            Some(v) => self.allowed.contains_version(&v.version),
            None => true,
        }
    }

    /// True when this phase still needs a variant chosen.
    pub fn needs_choice(&self) -> bool {
        self.required && !self.ephemeral && self.chosen.is_none()
    }

    /// The requirement an ephemeral family resolves to: its family name
    /// pinned to whatever range survived narrowing.
    pub fn resolved_requirement(&self) -> Requirement {
        Requirement::construct(self.family.clone(), self.allowed.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_accumulates() {
        let mut p = Phase::new("foo");
        assert!(p.narrow(&VersionRange::parse("1.2+").unwrap()));
        assert!(p.narrow(&VersionRange::parse("<2").unwrap()));
        assert_eq!(p.allowed, VersionRange::parse("1.2+<2").unwrap());
        assert!(!p.narrow(&VersionRange::parse("3+").unwrap()));
    }

    #[test]
    fn exclusion_carves_holes() {
        let mut p = Phase::new("foo");
        assert!(p.narrow(&VersionRange::parse("1+<3").unwrap()));
        assert!(p.exclude(&VersionRange::parse("2").unwrap()));
        let range = &p.allowed;
        assert!(range.contains_version(&"1.5".parse().unwrap()));
        assert!(!range.contains_version(&"2.3".parse().unwrap()));
    }

    #[test]
    fn ephemeral_detection() {
        assert!(Phase::new(".platform").ephemeral);
        assert!(!Phase::new("platform").ephemeral);
    }
}
