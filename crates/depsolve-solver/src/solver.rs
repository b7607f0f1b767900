//! The backtracking solve loop.
//!
//! The solver alternates between two activities until it reaches a
//! terminal state:
//!
//! 1. Drain the requirement queue, narrowing each named family's allowed
//!    range. Conflict and weak requirements subtract from the range; hard
//!    requirements intersect with it and mark the family as required.
//! 2. With the queue empty, pick the first required family without a
//!    chosen variant, snapshot the search state, and try its preferred
//!    candidate. The candidate's own requirements go back on the queue.
//!
//! When narrowing invalidates an earlier choice (or a family runs out of
//! candidates), the solver restores the snapshot of the most recent choice
//! point and tries its next candidate, unwinding further when a choice
//! point is exhausted. An empty choice stack means the request is
//! unsatisfiable.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, info};

use depsolve_core::{
    PackageVariant, Repository, Requirement, RequirementList, Result, SolverConfig,
};

use crate::cache::VariantCache;
use crate::conflict::{FailureReason, RequirementSource};
use crate::context::{ResolvedContext, SolveStats, SolverStatus};
use crate::phase::Phase;

/// Resolve `requests` against `repo` in one shot.
pub fn solve(
    repo: &dyn Repository,
    requests: &[Requirement],
    config: SolverConfig,
) -> Result<ResolvedContext> {
    Solver::new(repo, config).solve(requests)
}

/// A requirement waiting to be applied, with the chain of chosen variants
/// that introduced it.
#[derive(Debug, Clone)]
struct QueuedRequirement {
    requirement: Requirement,
    via: Vec<String>,
}

/// Everything a choice point must be able to restore.
#[derive(Debug, Clone)]
struct SearchState {
    phases: Vec<Phase>,
    index: HashMap<String, usize>,
    queue: VecDeque<QueuedRequirement>,
}

impl SearchState {
    fn phase_index(&mut self, family: &str, stats: &mut SolveStats) -> usize {
        if let Some(&idx) = self.index.get(family) {
            return idx;
        }
        debug!(family, "opening phase");
        stats.phases += 1;
        let idx = self.phases.len();
        self.phases.push(Phase::new(family));
        self.index.insert(family.to_string(), idx);
        idx
    }
}

struct ChoicePoint {
    /// Search state as it was before any candidate of this phase was tried.
    snapshot: SearchState,
    phase_idx: usize,
    candidates: Vec<PackageVariant>,
    tried: usize,
}

enum Applied {
    Ok,
    Fail(FailureReason),
}

/// A reusable solver bound to one repository. Each `solve` call builds a
/// fresh variant cache, so repository changes between calls are observed.
pub struct Solver<'r> {
    repo: &'r dyn Repository,
    config: SolverConfig,
}

impl<'r> Solver<'r> {
    pub fn new(repo: &'r dyn Repository, config: SolverConfig) -> Self {
        Self { repo, config }
    }

    pub fn solve(&mut self, requests: &[Requirement]) -> Result<ResolvedContext> {
        let mut stats = SolveStats::default();
        let mut cache = VariantCache::new(
            self.repo,
            self.config.timestamp_cutoff,
            self.config.prefer_highest,
        );

        // Reduce the request first; a self-conflicting request fails
        // without touching the repository.
        let list = RequirementList::new(requests.iter().cloned());
        if let Some((first, second)) = list.conflict() {
            let failure = FailureReason::Conflict {
                first: RequirementSource::request(first.clone()),
                second: RequirementSource::request(second.clone()),
            };
            return Ok(ResolvedContext::new(
                SolverStatus::Failed,
                requests.to_vec(),
                Vec::new(),
                Vec::new(),
                Some(failure),
                stats,
            ));
        }

        let deadline = self.config.timeout.map(|t| Instant::now() + t);

        let mut state = SearchState {
            phases: Vec::new(),
            index: HashMap::new(),
            queue: list
                .iter()
                .map(|req| QueuedRequirement {
                    requirement: req.clone(),
                    via: Vec::new(),
                })
                .collect(),
        };
        let mut stack: Vec<ChoicePoint> = Vec::new();
        let mut last_failure: Option<FailureReason> = None;

        let solved = loop {
            stats.steps += 1;
            if self.budget_exceeded(&stats, deadline) {
                info!(steps = stats.steps, "solve aborted");
                return Ok(ResolvedContext::new(
                    SolverStatus::Aborted,
                    requests.to_vec(),
                    Vec::new(),
                    Vec::new(),
                    None,
                    stats,
                ));
            }

            if let Some(item) = state.queue.pop_front() {
                match apply(&mut state, &item, &mut stats) {
                    Applied::Ok => {}
                    Applied::Fail(reason) => {
                        last_failure = Some(reason);
                        if !backtrack(&mut state, &mut stack, &mut stats) {
                            break false;
                        }
                    }
                }
                continue;
            }

            // Queue drained; choose a variant for the next open family.
            let next = state
                .phases
                .iter()
                .position(|p| p.needs_choice())
                .map(|idx| (idx, state.phases[idx].family.clone(), state.phases[idx].allowed.clone()));
            match next {
                None => break true,
                Some((idx, family, allowed)) => {
                    let candidates = cache.candidates(&family, &allowed)?;
                    if candidates.is_empty() {
                        last_failure = Some(FailureReason::NoCandidates {
                            family,
                            range: allowed,
                            sources: state.phases[idx].sources.clone(),
                        });
                        if !backtrack(&mut state, &mut stack, &mut stats) {
                            break false;
                        }
                        continue;
                    }
                    let snapshot = state.clone();
                    let variant = candidates[0].clone();
                    debug!(family = %family, version = %variant.version, "choosing variant");
                    choose(&mut state, idx, variant);
                    stack.push(ChoicePoint {
                        snapshot,
                        phase_idx: idx,
                        candidates,
                        tried: 0,
                    });
                }
            }
        };

        if solved {
            let variants: Vec<PackageVariant> = state
                .phases
                .iter()
                .filter(|p| !p.ephemeral)
                .filter_map(|p| p.chosen.clone())
                .collect();
            let ephemerals: Vec<Requirement> = state
                .phases
                .iter()
                .filter(|p| p.ephemeral && p.required)
                .map(Phase::resolved_requirement)
                .collect();
            info!(
                packages = variants.len(),
                steps = stats.steps,
                backtracks = stats.backtracks,
                "solve succeeded"
            );
            return Ok(ResolvedContext::new(
                SolverStatus::Solved,
                requests.to_vec(),
                variants,
                ephemerals,
                None,
                stats,
            ));
        }

        let status = match &last_failure {
            Some(FailureReason::Cycle { .. }) => SolverStatus::Cyclic,
            _ => SolverStatus::Failed,
        };
        info!(%status, steps = stats.steps, "solve failed");
        Ok(ResolvedContext::new(
            status,
            requests.to_vec(),
            Vec::new(),
            Vec::new(),
            last_failure,
            stats,
        ))
    }

    fn budget_exceeded(&self, stats: &SolveStats, deadline: Option<Instant>) -> bool {
        if let Some(max) = self.config.max_steps {
            if stats.steps > max {
                return true;
            }
        }
        if let Some(d) = deadline {
            if Instant::now() >= d {
                return true;
            }
        }
        if let Some(cancel) = &self.config.cancel {
            if cancel.load(Ordering::Relaxed) {
                return true;
            }
        }
        false
    }
}

/// Apply one queued requirement to the search state.
fn apply(state: &mut SearchState, item: &QueuedRequirement, stats: &mut SolveStats) -> Applied {
    let req = &item.requirement;
    if req.is_no_op() {
        return Applied::Ok;
    }

    let idx = state.phase_index(req.name(), stats);
    let source = RequirementSource::from_package(req.clone(), item.via.clone());

    // A hard requirement whose provenance chain passes through its own
    // family marks a dependency cycle if it turns out to be unsatisfiable.
    let reentrant = !req.is_conflict()
        && item.via.iter().any(|q| {
            q.strip_prefix(req.name())
                .map_or(false, |rest| rest.is_empty() || rest.starts_with('-'))
        });
    let cycle_failure = || {
        let mut path = item.via.clone();
        path.push(req.name().to_string());
        Applied::Fail(FailureReason::Cycle { path })
    };

    let (ok, choice_ok, blame) = {
        let phase = &mut state.phases[idx];
        let ok = if req.is_conflict() {
            let survived = phase.exclude(req.range());
            survived || !phase.required
        } else {
            phase.required = true;
            phase.narrow(req.range())
        };
        // Earlier requirement to blame if this one empties the range.
        let blame = phase
            .sources
            .iter()
            .find(|s| s.requirement.conflicts_with(req))
            .or_else(|| phase.sources.first())
            .cloned();
        (ok, phase.choice_valid(), blame)
    };

    if !ok || !choice_ok {
        // Re-entering a family along its own dependency chain with an
        // incompatible range is a cycle; from any other direction it is
        // an ordinary conflict to backtrack over.
        if reentrant {
            return cycle_failure();
        }
        let first = blame.unwrap_or_else(|| source.clone());
        state.phases[idx].sources.push(source.clone());
        return Applied::Fail(FailureReason::Conflict {
            first,
            second: source,
        });
    }

    state.phases[idx].sources.push(source);
    Applied::Ok
}

/// Commit a variant choice: record it on the phase and queue its
/// requirements with an extended provenance chain.
fn choose(state: &mut SearchState, phase_idx: usize, variant: PackageVariant) {
    let via = {
        let phase = &state.phases[phase_idx];
        let mut via = phase
            .sources
            .first()
            .map(|s| s.via.clone())
            .unwrap_or_default();
        via.push(variant.qualified_name());
        via
    };
    for req in &variant.requires {
        state.queue.push_back(QueuedRequirement {
            requirement: req.clone(),
            via: via.clone(),
        });
    }
    state.phases[phase_idx].chosen = Some(variant);
}

/// Restore the most recent choice point that still has an untried
/// candidate. Returns false when every choice point is exhausted.
fn backtrack(
    state: &mut SearchState,
    stack: &mut Vec<ChoicePoint>,
    stats: &mut SolveStats,
) -> bool {
    while let Some(mut cp) = stack.pop() {
        cp.tried += 1;
        if cp.tried < cp.candidates.len() {
            stats.backtracks += 1;
            *state = cp.snapshot.clone();
            let variant = cp.candidates[cp.tried].clone();
            debug!(
                family = %state.phases[cp.phase_idx].family,
                version = %variant.version,
                "backtracking to next candidate"
            );
            choose(state, cp.phase_idx, variant);
            stack.push(cp);
            return true;
        }
    }
    false
}
