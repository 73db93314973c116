use super::*;

fn lines(strs: &[&str]) -> Vec<Vec<u8>> {
    strs.iter().map(|s| s.as_bytes().to_vec()).collect()
}

#[test]
fn test_identical_sequences_are_all_equal() {
    let a = lines(&["x", "y", "z"]);
    let ops = compute_opcodes(&a, &a);
    assert_eq!(ops, vec![Opcode { tag: Tag::Equal, i1: 0, i2: 3, j1: 0, j2: 3 }]);
}

#[test]
fn test_single_line_replace() {
    let a = lines(&["L1", "L2", "L3"]);
    let b = lines(&["L1", "L2-mod", "L3"]);
    let ops = compute_opcodes(&a, &b);
    assert_eq!(
        ops,
        vec![
            Opcode { tag: Tag::Equal, i1: 0, i2: 1, j1: 0, j2: 1 },
            Opcode { tag: Tag::Replace, i1: 1, i2: 2, j1: 1, j2: 2 },
            Opcode { tag: Tag::Equal, i1: 2, i2: 3, j1: 2, j2: 3 },
        ]
    );
}

#[test]
fn test_pure_deletion() {
    let a = lines(&["L1", "L2", "L3"]);
    let b = lines(&["L1", "L3"]);
    let ops = compute_opcodes(&a, &b);
    assert_eq!(
        ops,
        vec![
            Opcode { tag: Tag::Equal, i1: 0, i2: 1, j1: 0, j2: 1 },
            Opcode { tag: Tag::Delete, i1: 1, i2: 2, j1: 1, j2: 1 },
            Opcode { tag: Tag::Equal, i1: 2, i2: 3, j1: 1, j2: 2 },
        ]
    );
}

#[test]
fn test_pure_insertion() {
    let a = lines(&["L1", "L3"]);
    let b = lines(&["L1", "L2", "L3"]);
    let ops = compute_opcodes(&a, &b);
    assert_eq!(
        ops,
        vec![
            Opcode { tag: Tag::Equal, i1: 0, i2: 1, j1: 0, j2: 1 },
            Opcode { tag: Tag::Insert, i1: 1, i2: 1, j1: 1, j2: 2 },
            Opcode { tag: Tag::Equal, i1: 1, i2: 2, j1: 2, j2: 3 },
        ]
    );
}

#[test]
fn test_empty_basis_is_pure_insert() {
    let a: Vec<Vec<u8>> = vec![];
    let b = lines(&["L1", "L2"]);
    let ops = compute_opcodes(&a, &b);
    assert_eq!(ops, vec![Opcode { tag: Tag::Insert, i1: 0, i2: 0, j1: 0, j2: 2 }]);
}
