use depsolve_version::{Version, VersionRange};

fn ver(s: &str) -> Version {
    s.parse().unwrap()
}

fn range(s: &str) -> VersionRange {
    s.parse().unwrap()
}

#[test]
fn version_ordering_ladder() {
    // Each entry is strictly less than the next.
    let ladder = [
        "",
        "0.0.0",
        "1",
        "1.0",
        "1.0.0",
        "1.1",
        "1.2",
        "1.2.1",
        "1.2.15",
        "1.2.alpha",
        "1.2.beta",
        "2",
        "2.0",
        "10",
        "beta",
    ];
    for pair in ladder.windows(2) {
        assert!(
            ver(pair[0]) < ver(pair[1]),
            "expected {} < {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn numeric_padding_breaks_ties() {
    assert!(ver("1.01") < ver("1.1"));
    assert_eq!(ver("1.01").cmp(&ver("1.01")), std::cmp::Ordering::Equal);
}

#[test]
fn bare_version_matches_its_subtree() {
    let r = range("1.2");
    assert!(r.contains_version(&ver("1.2")));
    assert!(r.contains_version(&ver("1.2.0")));
    assert!(r.contains_version(&ver("1.2.99.beta")));
    assert!(!r.contains_version(&ver("1.3")));
    assert!(!r.contains_version(&ver("1.20")));
}

#[test]
fn union_canonicalizes_overlaps() {
    let r = range("3+<6").union(&range("4+<8"));
    assert_eq!(r, range("3+<8"));
    assert_eq!(r.to_string(), "3+<8");
}

#[test]
fn disjoint_union_keeps_both_bounds() {
    let r = range("1").union(&range("3"));
    assert_eq!(r.to_string(), "1|3");
    assert!(r.contains_version(&ver("1.5")));
    assert!(!r.contains_version(&ver("2")));
    assert!(r.contains_version(&ver("3.0.1")));
}

#[test]
fn intersection_of_disjoint_ranges_is_empty() {
    let r = range("1+<2").intersection(&range("3+<4"));
    assert!(r.is_none());
    assert_eq!(r.to_string(), "<none>");
}

#[test]
fn inverse_partitions_the_version_space() {
    for s in ["1.2+", "<3", "1+<2|4+<5", "==1.0.1", "2"] {
        let r = range(s);
        let inv = r.inverse();
        for v in ["", "0.5", "1.0", "1.0.1", "1.5", "2.3", "3", "4.2", "9"] {
            let v = ver(v);
            assert_ne!(
                r.contains_version(&v),
                inv.contains_version(&v),
                "version {v} in both or neither of {s} and its inverse"
            );
        }
        assert_eq!(r.inverse().inverse(), r, "double inverse of {s}");
    }
}

#[test]
fn any_and_none_are_duals() {
    assert!(VersionRange::any().inverse().is_none());
    assert!(VersionRange::none().inverse().is_any());
}

#[test]
fn subtract_carves_a_hole() {
    let r = range("1+<5").subtract(&range("2+<3"));
    assert!(r.contains_version(&ver("1.5")));
    assert!(!r.contains_version(&ver("2.5")));
    assert!(r.contains_version(&ver("3")));
}

#[test]
fn superset_and_subset() {
    assert!(range("1+").is_superset(&range("2+<3")));
    assert!(range("2+<3").is_subset(&range("1+")));
    assert!(!range("2+<3").is_superset(&range("1+")));
    assert!(VersionRange::any().is_superset(&range("==4.1")));
}

#[test]
fn display_round_trips() {
    for s in [
        "1.2+",
        "<3",
        "1.2+<3",
        "==1.0.1",
        "1.2",
        "1|2|3",
        ">1.2,<3",
        "",
    ] {
        let r = range(s);
        assert_eq!(range(&r.to_string()), r, "round trip of '{s}'");
    }
}

#[test]
fn malformed_ranges_rejected() {
    for s in ["4+<2", "1..2..3", "1.2+bad", "<", "1+<"] {
        assert!(VersionRange::parse(s).is_err(), "'{s}' should not parse");
    }
}
