use super::*;

fn lines(strs: &[&str]) -> Vec<Vec<u8>> {
    strs.iter().map(|s| s.as_bytes().to_vec()).collect()
}

fn build_scenario() -> Weave {
    let mut w = Weave::new();
    w.add_version(RevId::from("a"), vec![], lines(&["1\n", "2\n", "3\n"])).unwrap();
    w.add_version(RevId::from("b"), vec![RevId::from("a")], lines(&["1\n", "2-b\n", "3\n"])).unwrap();
    w.add_version(
        RevId::from("c"),
        vec![RevId::from("a")],
        lines(&["1\n", "2\n", "3\n", "4-c\n"]),
    )
    .unwrap();
    w
}

#[test]
fn test_get_lines_reconstructs_every_version() {
    let w = build_scenario();
    assert_eq!(w.get_lines(&RevId::from("a")).unwrap(), lines(&["1\n", "2\n", "3\n"]));
    assert_eq!(w.get_lines(&RevId::from("b")).unwrap(), lines(&["1\n", "2-b\n", "3\n"]));
    assert_eq!(w.get_lines(&RevId::from("c")).unwrap(), lines(&["1\n", "2\n", "3\n", "4-c\n"]));
}

#[test]
fn test_annotate_attributes_each_line_to_its_author() {
    let w = build_scenario();
    let got = w.annotate(&RevId::from("b")).unwrap();
    let want = vec![
        (RevId::from("a"), b"1\n".to_vec()),
        (RevId::from("b"), b"2-b\n".to_vec()),
        (RevId::from("a"), b"3\n".to_vec()),
    ];
    assert_eq!(got, want);
}

#[test]
fn test_plan_merge_classifies_each_line() {
    let w = build_scenario();
    let got = w.plan_merge(&RevId::from("b"), &RevId::from("c")).unwrap();
    let want = vec![
        (MergeState::Unchanged, b"1\n".to_vec()),
        (MergeState::KilledA, b"2\n".to_vec()),
        (MergeState::NewA, b"2-b\n".to_vec()),
        (MergeState::Unchanged, b"3\n".to_vec()),
        (MergeState::NewB, b"4-c\n".to_vec()),
        (MergeState::Unchanged, vec![]),
    ];
    assert_eq!(got, want);
}

#[test]
fn test_check_reports_no_defects_for_a_well_formed_weave() {
    let w = build_scenario();
    let report = w.check();
    assert!(report.is_ok(), "unexpected defects: {:?}", report.defects);
}

#[test]
fn test_add_version_is_idempotent_on_identical_resubmission() {
    let mut w = Weave::new();
    let v1 = w.add_version(RevId::from("a"), vec![], lines(&["x\n"])).unwrap();
    let v2 = w.add_version(RevId::from("a"), vec![], lines(&["x\n"])).unwrap();
    assert_eq!(v1, v2);
    assert_eq!(w.len(), 1);
}

#[test]
fn test_add_version_rejects_same_id_with_different_content() {
    let mut w = Weave::new();
    w.add_version(RevId::from("a"), vec![], lines(&["x\n"])).unwrap();
    let err = w.add_version(RevId::from("a"), vec![], lines(&["y\n"])).unwrap_err();
    assert_eq!(err.kind, crate::ErrorKind::AlreadyPresent);
}

#[test]
fn test_add_version_tolerates_a_ghost_parent() {
    let mut w = Weave::new();
    w.add_version(RevId::from("g1"), vec![RevId::from("phantom")], lines(&["hi\n"])).unwrap();

    assert_eq!(w.get_lines(&RevId::from("g1")).unwrap(), lines(&["hi\n"]));
    assert!(w.check().is_ok());
}

#[test]
fn test_reweave_unions_two_histories_sharing_a_common_version() {
    let mut wa = Weave::new();
    wa.add_version(RevId::from("base"), vec![], lines(&["x\n"])).unwrap();
    wa.add_version(RevId::from("a1"), vec![RevId::from("base")], lines(&["x\n", "a-line\n"])).unwrap();

    let mut wb = Weave::new();
    wb.add_version(RevId::from("base"), vec![], lines(&["x\n"])).unwrap();
    wb.add_version(RevId::from("b1"), vec![RevId::from("base")], lines(&["x\n", "b-line\n"])).unwrap();

    let merged = Weave::reweave(&wa, &wb).unwrap();

    assert_eq!(merged.len(), 3);
    assert_eq!(merged.get_lines(&RevId::from("base")).unwrap(), lines(&["x\n"]));
    assert_eq!(merged.get_lines(&RevId::from("a1")).unwrap(), lines(&["x\n", "a-line\n"]));
    assert_eq!(merged.get_lines(&RevId::from("b1")).unwrap(), lines(&["x\n", "b-line\n"]));
}

#[test]
fn test_reweave_rejects_conflicting_text_for_the_same_version() {
    let mut wa = Weave::new();
    wa.add_version(RevId::from("base"), vec![], lines(&["x\n"])).unwrap();

    let mut wb = Weave::new();
    wb.add_version(RevId::from("base"), vec![], lines(&["y\n"])).unwrap();

    let err = Weave::reweave(&wa, &wb).unwrap_err();
    assert_eq!(err.kind, crate::ErrorKind::Fatal);
}

/// Two weaves "agree" when they hold the same set of versions, each
/// with identical reconstructed content and the same set of recorded
/// parents, regardless of the internal entry order reweave happened to
/// pick.
fn weaves_agree(x: &Weave, y: &Weave) -> bool {
    let mut xs = x.versions().to_vec();
    let mut ys = y.versions().to_vec();
    xs.sort();
    ys.sort();
    if xs != ys {
        return false;
    }
    xs.iter().all(|name| {
        let x_lines = x.get_lines(name).unwrap();
        let y_lines = y.get_lines(name).unwrap();
        let mut x_parents = x.parent_names_of(name).unwrap().to_vec();
        let mut y_parents = y.parent_names_of(name).unwrap().to_vec();
        x_parents.sort();
        y_parents.sort();
        x_lines == y_lines && x_parents == y_parents
    })
}

#[test]
fn test_reweave_is_associative_across_three_weaves() {
    let mut wa = Weave::new();
    wa.add_version(RevId::from("base"), vec![], lines(&["x\n"])).unwrap();
    wa.add_version(RevId::from("a1"), vec![RevId::from("base")], lines(&["x\n", "a-line\n"])).unwrap();

    let mut wb = Weave::new();
    wb.add_version(RevId::from("base"), vec![], lines(&["x\n"])).unwrap();
    wb.add_version(RevId::from("b1"), vec![RevId::from("base")], lines(&["x\n", "b-line\n"])).unwrap();

    let mut wc = Weave::new();
    wc.add_version(RevId::from("base"), vec![], lines(&["x\n"])).unwrap();
    wc.add_version(RevId::from("c1"), vec![RevId::from("base")], lines(&["x\n", "c-line\n"])).unwrap();

    let left = Weave::reweave(&Weave::reweave(&wa, &wb).unwrap(), &wc).unwrap();
    let right = Weave::reweave(&wa, &Weave::reweave(&wb, &wc).unwrap()).unwrap();

    assert!(weaves_agree(&left, &right), "reweave must be associative: {:?} vs {:?}", left, right);
    assert_eq!(left.len(), 4);
}
