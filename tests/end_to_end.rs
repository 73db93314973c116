//! End-to-end scenarios spanning more than one module, exercised the way
//! a higher-level repository facade would drive this core. Each test
//! corresponds to one cross-module story: a weave history, a knit's
//! delta-chain promotion, a reconcile pass, an unmerged-revision query,
//! a rename guess, and a ghost-tolerant add.

use braidstore::{
    config::Config,
    graph::{
        rename::{guess_renames, Candidate, MissingFile},
        unmerged::{find_unmerged, FindUnmergedArgs, Revno},
        RevId, RevisionGraph,
    },
    knit::Knit,
    lock::LockTable,
    reconcile::Reconciler,
    weave::{MergeState, Weave},
};

fn lines(strs: &[&str]) -> Vec<Vec<u8>> {
    strs.iter().map(|s| s.as_bytes().to_vec()).collect()
}

#[test]
fn fresh_weave_three_versions() {
    let mut w = Weave::new();
    assert_eq!(w.add_version(RevId::from("a"), vec![], lines(&["L1\n", "L2\n", "L3\n"])).unwrap(), 0);
    let idx_b = w
        .add_version(RevId::from("b"), vec![RevId::from("a")], lines(&["L1\n", "L2-mod\n", "L3\n"]))
        .unwrap();
    assert_eq!(idx_b, 1);
    assert_eq!(w.get_lines(&RevId::from("b")).unwrap(), lines(&["L1\n", "L2-mod\n", "L3\n"]));
    let idx_c =
        w.add_version(RevId::from("c"), vec![RevId::from("a")], lines(&["L1\n", "L3\n"])).unwrap();
    assert_eq!(idx_c, 2);

    let plan = w.plan_merge(&RevId::from("b"), &RevId::from("c")).unwrap();
    let killed_b = plan.iter().filter(|(s, _)| *s == MergeState::KilledB).count();
    let new_b = plan.iter().filter(|(s, _)| *s == MergeState::NewB).count();
    let unchanged = plan.iter().filter(|(s, _)| *s == MergeState::Unchanged).count();
    assert_eq!(killed_b, 1, "L2\\n only survives on b's side of the merge base");
    assert_eq!(new_b, 1, "L2-mod\\n is b's replacement text");
    assert_eq!(unchanged, 2, "L1 and L3 are unchanged on both sides");
}

#[test]
fn knit_delta_chain_promotion() {
    let cfg = Config { knit_delta_threshold: 3, ..Config::default() };
    let mut k = Knit::new();

    k.add_lines(RevId::from("v0"), vec![], lines(&["a\n", "b\n", "c\n"]), &cfg).unwrap();
    k.add_lines(RevId::from("v1"), vec![RevId::from("v0")], lines(&["a1\n", "b\n", "c\n"]), &cfg).unwrap();
    k.add_lines(RevId::from("v2"), vec![RevId::from("v1")], lines(&["a1\n", "b2\n", "c\n"]), &cfg).unwrap();
    k.add_lines(RevId::from("v3"), vec![RevId::from("v2")], lines(&["a1\n", "b2\n", "c3\n"]), &cfg).unwrap();
    k.add_lines(RevId::from("v4"), vec![RevId::from("v3")], lines(&["a4\n", "b2\n", "c3\n"]), &cfg).unwrap();

    assert_eq!(k.get_lines(&RevId::from("v4")).unwrap(), lines(&["a4\n", "b2\n", "c3\n"]));
}

#[test]
fn reconcile_drops_garbage_version_and_fixes_parents() {
    let mut graph = RevisionGraph::new();
    graph.insert(RevId::from("a"), vec![]);
    graph.insert(RevId::from("b"), vec![RevId::from("a")]);

    let mut w = Weave::new();
    w.add_version(RevId::from("a"), vec![], lines(&["1\n"])).unwrap();
    // "b" is stored with no recorded parent, though the graph says "a".
    w.add_version(RevId::from("b"), vec![], lines(&["1\n", "2\n"])).unwrap();
    // "x" has no corresponding revision in the ground-truth graph.
    w.add_version(RevId::from("x"), vec![], lines(&["garbage\n"])).unwrap();

    let locks = LockTable::new();
    let dir = tempfile::tempdir().unwrap();
    let lock_path: std::ffi::OsString = dir.path().join("weave.lock").into();
    let reconciler = Reconciler::new(true);

    let (rebuilt, report) = reconciler.reconcile_weave(&locks, &lock_path, &w, &graph).unwrap();
    assert_eq!(report.inconsistent_parents, 1);
    assert_eq!(report.garbage_versions, 1);
    assert!(!report.aborted);
    assert_eq!(rebuilt.versions(), &[RevId::from("a"), RevId::from("b")]);
    assert_eq!(rebuilt.parent_names_of(&RevId::from("b")).unwrap(), &[RevId::from("a")]);

    let (_, report_again) = reconciler.reconcile_weave(&locks, &lock_path, &rebuilt, &graph).unwrap();
    assert_eq!(report_again.garbage_versions, 0, "a clean weave reconciles to zero fixes");
    assert_eq!(report_again.inconsistent_parents, 0, "a clean weave reconciles to zero fixes");
}

#[test]
fn unmerged_between_branches() {
    let mut graph = RevisionGraph::new();
    graph.insert(RevId::from("r1"), vec![]);
    graph.insert(RevId::from("r2"), vec![RevId::from("r1")]);
    graph.insert(RevId::from("r3"), vec![RevId::from("r2")]);
    graph.insert(RevId::from("r4"), vec![RevId::from("r1")]);
    graph.insert(RevId::from("r5"), vec![RevId::from("r4")]);

    let (local_tip, remote_tip) = (RevId::from("r3"), RevId::from("r5"));

    let (local_extra, remote_extra) = find_unmerged(
        &graph,
        FindUnmergedArgs {
            local_tip: &local_tip,
            remote_tip: &remote_tip,
            include_merges: false,
            backward: false,
            local_range: None,
            remote_range: None,
        },
    )
    .unwrap();

    assert_eq!(
        local_extra.iter().map(|u| (u.revno.clone(), u.rev.clone())).collect::<Vec<_>>(),
        vec![(Revno::Mainline(2), RevId::from("r2")), (Revno::Mainline(3), RevId::from("r3"))]
    );
    assert_eq!(
        remote_extra.iter().map(|u| (u.revno.clone(), u.rev.clone())).collect::<Vec<_>>(),
        vec![(Revno::Mainline(2), RevId::from("r4")), (Revno::Mainline(3), RevId::from("r5"))]
    );

    let (local_back, remote_back) = find_unmerged(
        &graph,
        FindUnmergedArgs {
            local_tip: &local_tip,
            remote_tip: &remote_tip,
            include_merges: false,
            backward: true,
            local_range: None,
            remote_range: None,
        },
    )
    .unwrap();
    assert_eq!(local_back.first().unwrap().rev, RevId::from("r3"));
    assert_eq!(remote_back.first().unwrap().rev, RevId::from("r5"));

    let (_, remote_ranged) = find_unmerged(
        &graph,
        FindUnmergedArgs {
            local_tip: &local_tip,
            remote_tip: &remote_tip,
            include_merges: false,
            backward: false,
            local_range: None,
            remote_range: Some((RevId::from("r4"), RevId::from("r4"))),
        },
    )
    .unwrap();
    assert_eq!(remote_ranged, vec![braidstore::graph::unmerged::Unmerged {
        revno: Revno::Mainline(2),
        rev: RevId::from("r4"),
    }]);
}

#[test]
fn rename_detection_via_line_pair_hashing() {
    let basis_lines: Vec<Vec<u8>> =
        (0..100).map(|i| format!("line {}\n", i).into_bytes()).collect();
    let missing = MissingFile { file_id: b"F".to_vec(), basis_lines: &basis_lines };

    let mut working_lines = basis_lines.clone();
    working_lines[10] = b"line 10 modified\n".to_vec();
    working_lines[80] = b"line 80 modified\n".to_vec();
    let candidate = Candidate { path: "b.txt".to_string(), lines: &working_lines };

    let plan = guess_renames(
        braidstore::config::DEFAULT_RENAME_HASH_MODULUS,
        &[missing],
        &[candidate],
        &[],
        |_| None,
    );

    assert_eq!(plan.file_matches.len(), 1);
    assert_eq!(plan.file_matches[0].path, "b.txt");
    assert_eq!(plan.file_matches[0].file_id, b"F".to_vec());
}

#[test]
fn ghost_tolerant_add() {
    let mut w = Weave::new();
    w.add_version(RevId::from("v1"), vec![RevId::from("ghost-parent")], lines(&["hi\n"])).unwrap();
    assert_eq!(w.parent_names_of(&RevId::from("v1")).unwrap(), &[RevId::from("ghost-parent")]);

    let mut graph = RevisionGraph::new();
    graph.insert(RevId::from("v1"), vec![RevId::from("ghost-parent")]);
    let anc = graph.ancestors(&RevId::from("v1")).unwrap();
    assert_eq!(anc, [RevId::from("v1")].into_iter().collect());

    let reconciler = Reconciler::new(true);
    let report = reconciler.check_weave(&w, &graph);
    assert_eq!(report.inconsistent_parents, 1, "the ghost parent is not yet resolvable in the graph");

    // Now the ghost resolves: the graph grows a real "ghost-parent" node.
    let mut graph_resolved = RevisionGraph::new();
    graph_resolved.insert(RevId::from("ghost-parent"), vec![]);
    graph_resolved.insert(RevId::from("v1"), vec![RevId::from("ghost-parent")]);
    let report_resolved = reconciler.check_weave(&w, &graph_resolved);
    assert_eq!(report_resolved.inconsistent_parents, 0, "stored parent list now matches the resolved graph");
}
