//! Per-solve variant cache.
//!
//! Repository lookups are memoized for the lifetime of one solve, so a
//! family queried again after backtracking hits memory instead of the
//! backing store. Timestamp filtering and candidate ordering happen once,
//! at first load.

use std::collections::HashMap;

use depsolve_core::{PackageVariant, Repository, RepositoryError};
use depsolve_version::VersionRange;

pub struct VariantCache<'r> {
    repo: &'r dyn Repository,
    entries: HashMap<String, Vec<PackageVariant>>,
    timestamp_cutoff: Option<u64>,
    prefer_highest: bool,
}

impl<'r> VariantCache<'r> {
    pub fn new(
        repo: &'r dyn Repository,
        timestamp_cutoff: Option<u64>,
        prefer_highest: bool,
    ) -> Self {
        Self {
            repo,
            entries: HashMap::new(),
            timestamp_cutoff,
            prefer_highest,
        }
    }

    /// All variants of a family, filtered by the timestamp cutoff and
    /// sorted in trial order: version descending, then variant index
    /// descending within a version. Both reverse when lowest versions are
    /// preferred.
    pub fn family(&mut self, family: &str) -> Result<&[PackageVariant], RepositoryError> {
        if !self.entries.contains_key(family) {
            let mut variants = self.repo.get_variants(family)?;
            if let Some(cutoff) = self.timestamp_cutoff {
                variants.retain(|v| v.timestamp.map_or(true, |t| t <= cutoff));
            }
            variants.sort_by(|a, b| {
                a.version
                    .cmp(&b.version)
                    .then(a.variant_index.cmp(&b.variant_index))
            });
            if self.prefer_highest {
                variants.reverse();
            }
            self.entries.insert(family.to_string(), variants);
        }
        Ok(&self.entries[family])
    }

    /// Variants of a family whose versions fall within `range`, in trial
    /// order.
    pub fn candidates(
        &mut self,
        family: &str,
        range: &VersionRange,
    ) -> Result<Vec<PackageVariant>, RepositoryError> {
        Ok(self
            .family(family)?
            .iter()
            .filter(|v| range.contains_version(&v.version))
            .cloned()
            .collect())
    }
}
