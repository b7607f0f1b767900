//! Backtracking dependency solver: turns a list of package requirements
//! plus a repository into a resolved context listing one variant per
//! required family, or a structured failure explaining why none exists.

pub mod cache;
pub mod conflict;
pub mod context;
pub mod graph;
pub mod phase;
pub mod solver;

pub use conflict::{FailureReason, RequirementSource};
pub use context::{ResolvedContext, ResolvedRecord, SolveStats, SolverStatus};
pub use graph::{ResolveGraph, ResolvedNode};
pub use solver::{solve, Solver};
