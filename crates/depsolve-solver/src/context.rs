//! The result of a solve.

use std::fmt;

use serde::{Deserialize, Serialize};

use depsolve_core::{PackageVariant, Requirement};

use crate::conflict::FailureReason;
use crate::graph::ResolveGraph;

/// Terminal state of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// Every required family has a chosen variant.
    Solved,
    /// The requirements are unsatisfiable.
    Failed,
    /// A dependency cycle prevents resolution.
    Cyclic,
    /// The solve hit its step, time or cancellation budget.
    Aborted,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolverStatus::Solved => "solved",
            SolverStatus::Failed => "failed",
            SolverStatus::Cyclic => "cyclic",
            SolverStatus::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Solve effort counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Main-loop iterations performed.
    pub steps: u64,
    /// Choice points unwound.
    pub backtracks: u64,
    /// Package families encountered.
    pub phases: u64,
}

/// Outcome of a solve: the status, the chosen variants (resolution order,
/// i.e. the order families were first required in), resolved ephemerals,
/// and on failure a structured reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedContext {
    status: SolverStatus,
    requested: Vec<Requirement>,
    variants: Vec<PackageVariant>,
    ephemerals: Vec<Requirement>,
    failure: Option<FailureReason>,
    stats: SolveStats,
}

impl ResolvedContext {
    pub(crate) fn new(
        status: SolverStatus,
        requested: Vec<Requirement>,
        variants: Vec<PackageVariant>,
        ephemerals: Vec<Requirement>,
        failure: Option<FailureReason>,
        stats: SolveStats,
    ) -> Self {
        Self {
            status,
            requested,
            variants,
            ephemerals,
            failure,
            stats,
        }
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn is_solved(&self) -> bool {
        self.status == SolverStatus::Solved
    }

    /// The original request, in the order given.
    pub fn requested(&self) -> &[Requirement] {
        &self.requested
    }

    /// Chosen variants, one per required family, in the order the
    /// families were first required. Empty unless solved.
    pub fn variants(&self) -> &[PackageVariant] {
        &self.variants
    }

    /// Resolved ephemeral requirements (families with a leading `.`).
    pub fn ephemerals(&self) -> &[Requirement] {
        &self.ephemerals
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    /// Human-readable rendering of the failure, if any.
    pub fn describe_failure(&self) -> Option<String> {
        self.failure.as_ref().map(FailureReason::to_string)
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// Look up the chosen variant for a family.
    pub fn get(&self, family: &str) -> Option<&PackageVariant> {
        self.variants.iter().find(|v| v.name == family)
    }

    /// The resolution as a dependency graph rooted at the request.
    pub fn graph(&self) -> ResolveGraph {
        ResolveGraph::from_resolution(&self.requested, &self.variants)
    }

    /// Serializable snapshot of this context.
    pub fn to_record(&self) -> ResolvedRecord {
        ResolvedRecord {
            status: self.status,
            requested: self.requested.clone(),
            variants: self.variants.clone(),
            ephemerals: self.ephemerals.clone(),
            stats: self.stats,
        }
    }

    /// Rebuild a context from a stored record. Failure details are not
    /// recorded, so a non-solved record round-trips without its reason.
    pub fn from_record(record: ResolvedRecord) -> Self {
        Self {
            status: record.status,
            requested: record.requested,
            variants: record.variants,
            ephemerals: record.ephemerals,
            failure: None,
            stats: record.stats,
        }
    }
}

impl fmt::Display for ResolvedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.status)?;
        for v in &self.variants {
            write!(f, " {}", v.qualified_name())?;
        }
        for e in &self.ephemerals {
            write!(f, " {e}")?;
        }
        Ok(())
    }
}

/// Flat, stable-format record of a resolution, suitable for storing and
/// re-loading (e.g. as a context file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub status: SolverStatus,
    pub requested: Vec<Requirement>,
    #[serde(default)]
    pub variants: Vec<PackageVariant>,
    #[serde(default)]
    pub ephemerals: Vec<Requirement>,
    #[serde(default)]
    pub stats: SolveStats,
}
