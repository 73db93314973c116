//! A sequence matcher producing difflib-style opcodes between the basis
//! line sequence and the incoming lines for a new weave version.
//! Implemented as a longest-common-subsequence edit script rather than
//! literal patience diff; this crate keeps its own on-disk/diff
//! representation with no byte-for-byte format interop, so an LCS-based
//! matcher producing the same opcode shape is a faithful substitute.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Equal,
    Replace,
    Insert,
    Delete,
}

/// One contiguous run where `a[i1..i2]` maps to `b[j1..j2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: Tag,
    pub i1: usize,
    pub i2: usize,
    pub j1: usize,
    pub j2: usize,
}

/// Compute the opcodes turning `a` into `b`.
pub fn compute_opcodes(a: &[Vec<u8>], b: &[Vec<u8>]) -> Vec<Opcode> {
    let matches = lcs_matches(a, b);
    opcodes_from_matches(&matches, a.len(), b.len())
}

/// `(i, j)` pairs of matched (equal-content) positions, strictly
/// increasing in both indices, forming a longest common subsequence.
fn lcs_matches(a: &[Vec<u8>], b: &[Vec<u8>]) -> Vec<(usize, usize)> {
    let (n, m) = (a.len(), b.len());
    // dp[i][j] = LCS length of a[i..], b[j..]
    let mut dp = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            dp[i][j] = if a[i] == b[j] {
                dp[i + 1][j + 1] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }

    let mut matches = vec![];
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            matches.push((i, j));
            i += 1;
            j += 1;
        } else if dp[i + 1][j] >= dp[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    matches
}

fn opcodes_from_matches(matches: &[(usize, usize)], n: usize, m: usize) -> Vec<Opcode> {
    let mut ops = vec![];
    let (mut i, mut j) = (0, 0);

    let mut push_gap = |i1: usize, i2: usize, j1: usize, j2: usize, ops: &mut Vec<Opcode>| {
        let tag = match (i1 < i2, j1 < j2) {
            (false, false) => return,
            (true, false) => Tag::Delete,
            (false, true) => Tag::Insert,
            (true, true) => Tag::Replace,
        };
        ops.push(Opcode { tag, i1, i2, j1, j2 });
    };

    for &(mi, mj) in matches {
        push_gap(i, mi, j, mj, &mut ops);
        ops.push(Opcode { tag: Tag::Equal, i1: mi, i2: mi + 1, j1: mj, j2: mj + 1 });
        i = mi + 1;
        j = mj + 1;
    }
    push_gap(i, n, j, m, &mut ops);

    merge_adjacent_equal(ops)
}

/// Successive per-line `Equal` ops collapse into one run, matching
/// difflib's `get_opcodes()` shape.
fn merge_adjacent_equal(ops: Vec<Opcode>) -> Vec<Opcode> {
    let mut out: Vec<Opcode> = vec![];
    for op in ops {
        if op.tag == Tag::Equal {
            if let Some(last) = out.last_mut() {
                if last.tag == Tag::Equal && last.i2 == op.i1 && last.j2 == op.j1 {
                    last.i2 = op.i2;
                    last.j2 = op.j2;
                    continue;
                }
            }
        }
        out.push(op);
    }
    out
}

#[cfg(test)]
#[path = "diff_test.rs"]
mod diff_test;
