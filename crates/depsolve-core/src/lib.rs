//! Core data types for depsolve: package requirements (with weak, conflict
//! and ephemeral modifiers), package variants, the repository interface the
//! solver queries, and solver configuration.

pub mod config;
pub mod errors;
pub mod repository;
pub mod requirement;
pub mod variant;

pub use config::SolverConfig;
pub use errors::{Error, Result};
pub use repository::{MemoryRepository, Repository, RepositoryError};
pub use requirement::{Requirement, RequirementList};
pub use variant::PackageVariant;

pub use depsolve_version::{ParseError, Version, VersionRange};
