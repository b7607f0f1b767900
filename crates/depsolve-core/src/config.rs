//! Solver configuration.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Knobs controlling a solve. `Default` gives an unbounded, highest-first
/// solve with no timestamp filtering.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum number of solver steps before the solve aborts.
    /// `None` means unbounded.
    pub max_steps: Option<u64>,

    /// Wall-clock budget for the solve.
    pub timeout: Option<Duration>,

    /// Try higher versions first (the default). When false the solver
    /// prefers the lowest satisfying versions instead.
    pub prefer_highest: bool,

    /// Ignore package variants released after this time (epoch seconds).
    /// Variants without a timestamp are never filtered.
    pub timestamp_cutoff: Option<u64>,

    /// Cooperative cancellation flag; setting it aborts the solve at the
    /// next step boundary.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            timeout: None,
            prefer_highest: true,
            timestamp_cutoff: None,
            cancel: None,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_prefer_highest(mut self, prefer_highest: bool) -> Self {
        self.prefer_highest = prefer_highest;
        self
    }

    pub fn with_timestamp_cutoff(mut self, cutoff: u64) -> Self {
        self.timestamp_cutoff = Some(cutoff);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}
