use super::*;

fn lines_of(n: usize, prefix: &str) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("{}{}\n", prefix, i).into_bytes()).collect()
}

#[test]
fn test_rename_detection_via_line_pair_hashing() {
    // Basis has a.txt (file-id F) with 100 lines. Working tree: a.txt
    // missing, b.txt has the same 100 lines plus 2 modifications.
    let basis_lines = lines_of(100, "L");
    let mut candidate_lines = basis_lines.clone();
    candidate_lines[10] = b"MODIFIED-A\n".to_vec();
    candidate_lines[50] = b"MODIFIED-B\n".to_vec();

    let missing = vec![MissingFile { file_id: b"F".to_vec(), basis_lines: &basis_lines }];
    let candidates = vec![Candidate { path: "b.txt".to_string(), lines: &candidate_lines }];

    let plan = guess_renames(DEFAULT_RENAME_HASH_MODULUS, &missing, &candidates, &[], |_| None);
    assert_eq!(plan.file_matches, vec![Match { path: "b.txt".to_string(), file_id: b"F".to_vec() }]);
}

#[test]
fn test_no_match_for_unrelated_content() {
    let basis_lines = lines_of(50, "alpha-");
    let unrelated_lines = lines_of(50, "zzzz-unrelated-content-");

    let missing = vec![MissingFile { file_id: b"F".to_vec(), basis_lines: &basis_lines }];
    let candidates = vec![Candidate { path: "c.txt".to_string(), lines: &unrelated_lines }];

    let plan = guess_renames(DEFAULT_RENAME_HASH_MODULUS, &missing, &candidates, &[], |_| None);
    assert!(plan.file_matches.is_empty());
}

#[test]
fn test_greedy_match_is_deterministic_on_ties() {
    // Two candidates tie in score against one file-id; path "a" sorts
    // before "b", so "a" wins deterministically.
    let hit_list = vec![
        (1.0, "b".to_string(), b"F".to_vec()),
        (1.0, "a".to_string(), b"F".to_vec()),
    ];
    let out = greedy_match(hit_list);
    assert_eq!(out, vec![Match { path: "a".to_string(), file_id: b"F".to_vec() }]);
}

#[test]
fn test_parent_directory_matching() {
    let mut required_parents = HashMap::new();
    required_parents.insert(
        "newdir".to_string(),
        vec![b"child1".to_vec(), b"child2".to_vec()].into_iter().collect::<HashSet<_>>(),
    );
    let missing_dirs = vec![MissingDir {
        file_id: b"D".to_vec(),
        child_file_ids: vec![b"child1".to_vec(), b"child2".to_vec()].into_iter().collect(),
    }];

    let matches = DirMatcher::match_parents(&required_parents, &missing_dirs);
    assert_eq!(matches, vec![Match { path: "newdir".to_string(), file_id: b"D".to_vec() }]);
}
