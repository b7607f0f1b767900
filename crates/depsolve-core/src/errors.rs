use miette::Diagnostic;
use thiserror::Error;

use crate::repository::RepositoryError;
use depsolve_version::ParseError;

/// Unified error type for depsolve operations.
///
/// Only malformed input and broken infrastructure surface as errors; an
/// unsatisfiable or aborted solve is a routine outcome reported through the
/// resolved context's status, not through this type.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// Malformed version, range or requirement string.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// The package repository backing store failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Repository(#[from] RepositoryError),
}

/// Convenience alias used across the depsolve crates.
pub type Result<T> = std::result::Result<T, Error>;
