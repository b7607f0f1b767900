//! Installable package variants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::requirement::Requirement;
use depsolve_version::Version;

/// One installable unit: a package version plus one of its variants.
///
/// A package version may ship several variants, each with its own
/// requirement list (e.g. one per platform or DCC build). The variant
/// index identifies the slot within the package definition; packages
/// without variants use index 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVariant {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub variant_index: usize,
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// Release time (epoch seconds), if the repository tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl PackageVariant {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            variant_index: 0,
            requires: Vec::new(),
            timestamp: None,
        }
    }

    pub fn with_requires(mut self, requires: Vec<Requirement>) -> Self {
        self.requires = requires;
        self
    }

    pub fn with_variant_index(mut self, index: usize) -> Self {
        self.variant_index = index;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// `name-version` handle, e.g. `foo-1.2.0`. Unversioned packages
    /// display as the bare name.
    pub fn qualified_name(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{}-{}", self.name, self.version)
        }
    }
}

impl fmt::Display for PackageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.qualified_name(), self.variant_index)
    }
}
