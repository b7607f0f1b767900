use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use depsolve_core::{
    Error, MemoryRepository, PackageVariant, Repository, RepositoryError, Requirement,
    SolverConfig, Version, VersionRange,
};
use depsolve_solver::{solve, FailureReason, ResolvedContext, Solver, SolverStatus};

fn ver(s: &str) -> Version {
    s.parse().unwrap()
}

fn req(s: &str) -> Requirement {
    s.parse().unwrap()
}

fn reqs(strs: &[&str]) -> Vec<Requirement> {
    strs.iter().map(|s| req(s)).collect()
}

fn pkg(name: &str, version: &str, requires: &[&str]) -> PackageVariant {
    PackageVariant::new(name, ver(version)).with_requires(reqs(requires))
}

fn run(repo: &MemoryRepository, requests: &[&str]) -> ResolvedContext {
    solve(repo, &reqs(requests), SolverConfig::default()).unwrap()
}

fn resolved_names(ctx: &ResolvedContext) -> Vec<String> {
    ctx.variants()
        .iter()
        .map(|v| v.qualified_name())
        .collect()
}

#[test]
fn single_package_highest_version_wins() {
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("foo", "1.0", &[]),
        pkg("foo", "1.2", &[]),
        pkg("foo", "2.0", &[]),
    ]);
    let ctx = run(&repo, &["foo"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(resolved_names(&ctx), ["foo-2.0"]);
}

#[test]
fn conflict_requirement_excludes_versions() {
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("foo", "1.2", &[]),
        pkg("foo", "1.4", &[]),
        pkg("foo", "1.5", &[]),
        pkg("foo", "1.6", &[]),
    ]);
    // 1.6 is the highest version in 1.2+ not excluded by !foo-1.5.
    let ctx = run(&repo, &["foo-1.2+", "!foo-1.5"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(resolved_names(&ctx), ["foo-1.6"]);
}

#[test]
fn transitive_requirements_are_followed() {
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("foo", "1.0", &["bar-2+"]),
        pkg("bar", "2.3", &["baz"]),
        pkg("bar", "1.9", &[]),
        pkg("baz", "5.0", &[]),
    ]);
    let ctx = run(&repo, &["foo"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(resolved_names(&ctx), ["foo-1.0", "bar-2.3", "baz-5.0"]);
}

#[test]
fn incompatible_transitive_requirements_fail() {
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("foo", "1.0", &["bar-2.0"]),
        pkg("bar", "2.0", &[]),
        pkg("bar", "1.0", &[]),
    ]);
    let ctx = run(&repo, &["foo-1.0", "bar-1.0"]);
    assert_eq!(ctx.status(), SolverStatus::Failed);
    match ctx.failure().unwrap() {
        FailureReason::Conflict { first, second } => {
            assert_eq!(first.requirement.name(), "bar");
            assert_eq!(second.requirement.name(), "bar");
            // One side must carry the provenance chain through foo.
            assert!(
                first.via.contains(&"foo-1.0".to_string())
                    || second.via.contains(&"foo-1.0".to_string())
            );
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn self_conflicting_request_fails_before_lookup() {
    // Repository is empty; the request alone is unsatisfiable.
    let repo = MemoryRepository::new();
    let ctx = run(&repo, &["a-1", "a-2"]);
    assert_eq!(ctx.status(), SolverStatus::Failed);
    assert!(matches!(
        ctx.failure(),
        Some(FailureReason::Conflict { .. })
    ));
}

#[test]
fn missing_family_reports_no_candidates() {
    let repo = MemoryRepository::new();
    let ctx = run(&repo, &["ghost-1"]);
    assert_eq!(ctx.status(), SolverStatus::Failed);
    match ctx.failure().unwrap() {
        FailureReason::NoCandidates { family, .. } => assert_eq!(family, "ghost"),
        other => panic!("expected no-candidates, got {other:?}"),
    }
}

#[test]
fn backtracks_to_older_version() {
    // a-2.0 needs c-2 but b needs c-1, so the solver must fall back to
    // a-1.0 even though a-2.0 is preferred.
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("a", "2.0", &["c-2"]),
        pkg("a", "1.0", &["c-1"]),
        pkg("b", "1.0", &["c-1"]),
        pkg("c", "2.0", &[]),
        pkg("c", "1.0", &[]),
    ]);
    let ctx = run(&repo, &["a", "b"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(resolved_names(&ctx), ["a-1.0", "b-1.0", "c-1.0"]);
    assert!(ctx.stats().backtracks >= 1);
}

#[test]
fn cyclic_requirements_are_detected() {
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("x", "1.0", &["y"]),
        pkg("y", "1.0", &["x-2.0"]),
    ]);
    let ctx = run(&repo, &["x-1"]);
    assert_eq!(ctx.status(), SolverStatus::Cyclic);
    match ctx.failure().unwrap() {
        FailureReason::Cycle { path } => {
            assert_eq!(path, &["x-1.0", "y-1.0", "x"]);
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn benign_cycle_resolves() {
    // x and y depend on each other with compatible ranges.
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("x", "1.0", &["y-1"]),
        pkg("y", "1.0", &["x-1"]),
    ]);
    let ctx = run(&repo, &["x"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(resolved_names(&ctx), ["x-1.0", "y-1.0"]);
}

#[test]
fn weak_requirement_alone_pulls_nothing() {
    let mut repo = MemoryRepository::new();
    repo.add_all([pkg("foo", "1.0", &[]), pkg("tool", "1.0", &[])]);
    let ctx = run(&repo, &["tool", "~foo-1"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(resolved_names(&ctx), ["tool-1.0"]);
}

#[test]
fn weak_requirement_constrains_when_present() {
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("foo", "1.5", &[]),
        pkg("foo", "2.0", &[]),
        pkg("tool", "1.0", &["foo"]),
    ]);
    // Without the weak requirement foo-2.0 would win.
    let ctx = run(&repo, &["tool", "~foo-1"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(resolved_names(&ctx), ["tool-1.0", "foo-1.5"]);
}

#[test]
fn ephemerals_resolve_to_ranges_not_packages() {
    let mut repo = MemoryRepository::new();
    repo.add_all([pkg("foo", "1.0", &[".platform-linux"])]);
    let ctx = run(&repo, &["foo", ".platform-linux"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(resolved_names(&ctx), ["foo-1.0"]);
    assert_eq!(ctx.ephemerals().len(), 1);
    let eph = &ctx.ephemerals()[0];
    assert_eq!(eph.name(), ".platform");
    assert_eq!(eph.range(), &VersionRange::parse("linux").unwrap());
}

#[test]
fn conflicting_ephemerals_fail() {
    let mut repo = MemoryRepository::new();
    repo.add_all([pkg("foo", "1.0", &[".mode-debug"])]);
    let ctx = run(&repo, &["foo", ".mode-release"]);
    assert_eq!(ctx.status(), SolverStatus::Failed);
}

#[test]
fn max_steps_aborts() {
    let mut repo = MemoryRepository::new();
    repo.add_all([pkg("foo", "1.0", &["bar"]), pkg("bar", "1.0", &[])]);
    let ctx = solve(&repo, &reqs(&["foo"]), SolverConfig::default().with_max_steps(1)).unwrap();
    assert_eq!(ctx.status(), SolverStatus::Aborted);
    assert!(ctx.variants().is_empty());
}

#[test]
fn cancellation_aborts() {
    let mut repo = MemoryRepository::new();
    repo.add_all([pkg("foo", "1.0", &[])]);
    let cancel = Arc::new(AtomicBool::new(false));
    cancel.store(true, Ordering::Relaxed);
    let config = SolverConfig::default().with_cancel(cancel);
    let ctx = solve(&repo, &reqs(&["foo"]), config).unwrap();
    assert_eq!(ctx.status(), SolverStatus::Aborted);
}

#[test]
fn prefer_lowest_when_configured() {
    let mut repo = MemoryRepository::new();
    repo.add_all([pkg("foo", "1.0", &[]), pkg("foo", "2.0", &[])]);
    let config = SolverConfig::default().with_prefer_highest(false);
    let ctx = solve(&repo, &reqs(&["foo"]), config).unwrap();
    assert_eq!(resolved_names(&ctx), ["foo-1.0"]);
}

#[test]
fn timestamp_cutoff_hides_newer_releases() {
    let mut repo = MemoryRepository::new();
    repo.add(pkg("foo", "1.0", &[]).with_timestamp(100));
    repo.add(pkg("foo", "2.0", &[]).with_timestamp(200));
    let config = SolverConfig::default().with_timestamp_cutoff(150);
    let ctx = solve(&repo, &reqs(&["foo"]), config).unwrap();
    assert_eq!(resolved_names(&ctx), ["foo-1.0"]);
}

#[test]
fn resolve_is_idempotent() {
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("foo", "1.0", &["bar-2+"]),
        pkg("bar", "2.3", &[]),
        pkg("bar", "3.0", &[]),
    ]);
    let first = run(&repo, &["foo", "bar<3"]);
    assert_eq!(first.status(), SolverStatus::Solved);

    // Feeding the resolution back in as exact requests reproduces it.
    let pinned: Vec<String> = first
        .variants()
        .iter()
        .map(|v| format!("{}=={}", v.name, v.version))
        .collect();
    let pinned_refs: Vec<&str> = pinned.iter().map(String::as_str).collect();
    let second = run(&repo, &pinned_refs);
    assert_eq!(second.status(), SolverStatus::Solved);
    let mut a = resolved_names(&first);
    let mut b = resolved_names(&second);
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[test]
fn variant_with_higher_index_preferred_within_version() {
    let mut repo = MemoryRepository::new();
    repo.add(pkg("app", "1.0", &["dep-2"]).with_variant_index(0));
    repo.add(pkg("app", "1.0", &["dep-1"]).with_variant_index(1));
    repo.add_all([pkg("dep", "1.0", &[]), pkg("dep", "2.0", &[])]);
    // Both variants are satisfiable; the higher index is tried first.
    let ctx = run(&repo, &["app"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(ctx.get("app").unwrap().variant_index, 1);
    assert_eq!(ctx.get("dep").unwrap().version, ver("1.0"));
}

#[test]
fn falls_back_to_other_variant_of_same_version() {
    let mut repo = MemoryRepository::new();
    repo.add(pkg("app", "1.0", &["dep-1"]).with_variant_index(0));
    repo.add(pkg("app", "1.0", &["dep-2"]).with_variant_index(1));
    repo.add(pkg("dep", "1.0", &[]));
    // app[1] is tried first but dep-2 does not exist.
    let ctx = run(&repo, &["app"]);
    assert_eq!(ctx.status(), SolverStatus::Solved);
    assert_eq!(ctx.get("app").unwrap().variant_index, 0);
    assert_eq!(ctx.get("dep").unwrap().version, ver("1.0"));
}

#[test]
fn fresh_repository_state_seen_on_each_solve() {
    struct SharedRepo(RefCell<MemoryRepository>);

    impl Repository for SharedRepo {
        fn get_variants(&self, family: &str) -> Result<Vec<PackageVariant>, RepositoryError> {
            self.0.borrow().get_variants(family)
        }
    }

    let repo = SharedRepo(RefCell::new(MemoryRepository::new()));
    repo.0.borrow_mut().add(pkg("foo", "1.0", &[]));

    let mut solver = Solver::new(&repo, SolverConfig::default());
    let first = solver.solve(&reqs(&["foo"])).unwrap();
    assert_eq!(resolved_names(&first), ["foo-1.0"]);

    // A release published between solves must be visible to the next one.
    repo.0.borrow_mut().add(pkg("foo", "2.0", &[]));
    let second = solver.solve(&reqs(&["foo"])).unwrap();
    assert_eq!(resolved_names(&second), ["foo-2.0"]);
}

#[test]
fn repository_failure_is_an_error_not_a_status() {
    struct BrokenRepo;

    impl Repository for BrokenRepo {
        fn get_variants(&self, _family: &str) -> Result<Vec<PackageVariant>, RepositoryError> {
            Err(RepositoryError::Unavailable {
                reason: "store offline".to_string(),
            })
        }
    }

    let err = solve(&BrokenRepo, &reqs(&["foo"]), SolverConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Repository(_)));
}

#[test]
fn timeout_aborts() {
    let mut repo = MemoryRepository::new();
    repo.add_all([pkg("foo", "1.0", &["bar"]), pkg("bar", "1.0", &[])]);
    let config = SolverConfig::default().with_timeout(Duration::ZERO);
    let ctx = solve(&repo, &reqs(&["foo"]), config).unwrap();
    assert_eq!(ctx.status(), SolverStatus::Aborted);
    assert!(ctx.variants().is_empty());
}

#[test]
fn record_round_trips_through_json() {
    let mut repo = MemoryRepository::new();
    repo.add_all([pkg("foo", "1.0", &["bar"]), pkg("bar", "2.0", &[])]);
    let ctx = run(&repo, &["foo"]);
    let json = serde_json::to_string(&ctx.to_record()).unwrap();
    let back = ResolvedContext::from_record(serde_json::from_str(&json).unwrap());
    assert_eq!(back.status(), ctx.status());
    assert_eq!(back.variants(), ctx.variants());
    assert_eq!(back.requested(), ctx.requested());
}

#[test]
fn graph_reflects_resolution() {
    let mut repo = MemoryRepository::new();
    repo.add_all([
        pkg("foo", "1.0", &["bar-2+"]),
        pkg("bar", "2.3", &["baz"]),
        pkg("baz", "5.0", &[]),
    ]);
    let ctx = run(&repo, &["foo"]);
    let graph = ctx.graph();
    assert_eq!(graph.len(), 3);
    let path: Vec<String> = graph
        .find_path("baz")
        .unwrap()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(path, ["(request)", "foo-1.0", "bar-2.3", "baz-5.0"]);
}
