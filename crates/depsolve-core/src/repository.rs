//! The package repository interface the solver queries, plus an in-memory
//! implementation used in tests and for ad-hoc solves.

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;

use crate::variant::PackageVariant;

/// Failure of the repository backing store. Distinct from "family not
/// found", which is a routine solve outcome and returns an empty list.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("package repository unavailable: {reason}")]
    #[diagnostic(code(depsolve::repo::unavailable))]
    Unavailable { reason: String },

    #[error("corrupt package data for family '{family}': {reason}")]
    #[diagnostic(code(depsolve::repo::corrupt))]
    Corrupt { family: String, reason: String },
}

/// Source of package variants, keyed by family name.
///
/// Implementations return ALL variants of the family; ordering does not
/// matter, the solver sorts candidates itself. An unknown family is an
/// empty list, not an error.
pub trait Repository {
    fn get_variants(&self, family: &str) -> Result<Vec<PackageVariant>, RepositoryError>;
}

/// In-memory repository backed by a hash map.
#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    families: HashMap<String, Vec<PackageVariant>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, variant: PackageVariant) {
        self.families
            .entry(variant.name.clone())
            .or_default()
            .push(variant);
    }

    pub fn add_all<I: IntoIterator<Item = PackageVariant>>(&mut self, variants: I) {
        for v in variants {
            self.add(v);
        }
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }
}

impl Repository for MemoryRepository {
    fn get_variants(&self, family: &str) -> Result<Vec<PackageVariant>, RepositoryError> {
        Ok(self.families.get(family).cloned().unwrap_or_default())
    }
}
