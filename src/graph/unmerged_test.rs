use super::*;
use crate::graph::RevisionGraph;

fn r(s: &str) -> RevId {
    RevId::from(s)
}

fn build_scenario_4() -> RevisionGraph {
    // local mainline: r1, r2, r3; remote mainline: r1, r4, r5
    let mut g = RevisionGraph::new();
    g.insert(r("r1"), vec![]);
    g.insert(r("r2"), vec![r("r1")]);
    g.insert(r("r3"), vec![r("r2")]);
    g.insert(r("r4"), vec![r("r1")]);
    g.insert(r("r5"), vec![r("r4")]);
    g
}

#[test]
fn test_unmerged_between_branches() {
    let g = build_scenario_4();
    let (local_extra, remote_extra) = find_unmerged(
        &g,
        FindUnmergedArgs {
            local_tip: &r("r3"),
            remote_tip: &r("r5"),
            include_merges: false,
            backward: false,
            local_range: None,
            remote_range: None,
        },
    )
    .unwrap();

    assert_eq!(
        local_extra,
        vec![
            Unmerged { revno: Revno::Mainline(2), rev: r("r2") },
            Unmerged { revno: Revno::Mainline(3), rev: r("r3") },
        ]
    );
    assert_eq!(
        remote_extra,
        vec![
            Unmerged { revno: Revno::Mainline(2), rev: r("r4") },
            Unmerged { revno: Revno::Mainline(3), rev: r("r5") },
        ]
    );
}

#[test]
fn test_unmerged_backward() {
    let g = build_scenario_4();
    let (local_extra, _) = find_unmerged(
        &g,
        FindUnmergedArgs {
            local_tip: &r("r3"),
            remote_tip: &r("r5"),
            include_merges: false,
            backward: true,
            local_range: None,
            remote_range: None,
        },
    )
    .unwrap();

    assert_eq!(
        local_extra,
        vec![
            Unmerged { revno: Revno::Mainline(3), rev: r("r3") },
            Unmerged { revno: Revno::Mainline(2), rev: r("r2") },
        ]
    );
}

#[test]
fn test_unmerged_remote_range() {
    let g = build_scenario_4();
    let (_, remote_extra) = find_unmerged(
        &g,
        FindUnmergedArgs {
            local_tip: &r("r3"),
            remote_tip: &r("r5"),
            include_merges: false,
            backward: false,
            local_range: None,
            remote_range: Some((r("r4"), r("r4"))),
        },
    )
    .unwrap();

    assert_eq!(remote_extra, vec![Unmerged { revno: Revno::Mainline(2), rev: r("r4") }]);
}

#[test]
fn test_shortcut_when_one_mainline_is_prefix() {
    let mut g = RevisionGraph::new();
    g.insert(r("r1"), vec![]);
    g.insert(r("r2"), vec![r("r1")]);
    g.insert(r("r3"), vec![r("r2")]);

    // remote tip == r1, strictly an ancestor of local's mainline.
    let (local_extra, remote_extra) = find_unmerged(
        &g,
        FindUnmergedArgs {
            local_tip: &r("r3"),
            remote_tip: &r("r1"),
            include_merges: false,
            backward: false,
            local_range: None,
            remote_range: None,
        },
    )
    .unwrap();

    assert!(remote_extra.is_empty());
    assert_eq!(local_extra.len(), 2); // r2, r3 (suffix above r1)
}
