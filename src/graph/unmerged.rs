//! `find_unmerged`: revisions present on one branch's mainline but not in
//! the other's ancestry. Algorithm grounded in
//! `bzrlib.missing.find_unmerged`'s shortcut/full-ancestry split.

use std::collections::HashSet;

use crate::{
    graph::{RevId, RevisionGraph},
    Result,
};

/// A revision tagged with its position on the owning branch's mainline,
/// 1-based from the common root (matching `bzrlib.missing`'s
/// `rev_history.index(rev) + 1` convention). Merged-in (non-mainline)
/// revisions injected by `include_merges` carry a dotted-decimal tuple
/// instead.
#[derive(Clone, Debug, PartialEq)]
pub enum Revno {
    Mainline(usize),
    Merged(Vec<usize>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Unmerged {
    pub revno: Revno,
    pub rev: RevId,
}

/// An inclusive range filter on mainline position, or unbounded.
pub type RevRange = Option<(RevId, RevId)>;

pub struct FindUnmergedArgs<'a> {
    pub local_tip: &'a RevId,
    pub remote_tip: &'a RevId,
    pub include_merges: bool,
    pub backward: bool,
    pub local_range: RevRange,
    pub remote_range: RevRange,
}

/// Revisions unique to each side's mainline.
pub fn find_unmerged(
    graph: &RevisionGraph,
    args: FindUnmergedArgs,
) -> Result<(Vec<Unmerged>, Vec<Unmerged>)> {
    let local_mainline = graph.first_parent_walk(args.local_tip);
    let remote_mainline = graph.first_parent_walk(args.remote_tip);

    // Step 2: fast-path shortcuts.
    if local_mainline.is_empty() {
        return Ok((vec![], tag_mainline(&remote_mainline)));
    }
    if remote_mainline.is_empty() {
        return Ok((tag_mainline(&local_mainline), vec![]));
    }
    if let Some(pos) = local_mainline.iter().position(|r| r == args.remote_tip) {
        // remote tip is an ancestor of local's mainline: local's suffix
        // strictly above that point is the only local-extra; remote has
        // nothing extra.
        return Ok((tag_mainline_suffix(&local_mainline, pos), vec![]));
    }
    if let Some(pos) = remote_mainline.iter().position(|r| r == args.local_tip) {
        return Ok((vec![], tag_mainline_suffix(&remote_mainline, pos)));
    }

    // Step 3: full ancestry symmetric difference, intersected with each
    // side's own mainline.
    let local_ancestry = graph.ancestors(args.local_tip)?;
    let remote_ancestry = graph.ancestors(args.remote_tip)?;

    let local_set: HashSet<RevId> = local_mainline.iter().cloned().collect();
    let remote_set: HashSet<RevId> = remote_mainline.iter().cloned().collect();

    let mut local_extra: Vec<Unmerged> = local_mainline
        .iter()
        .enumerate()
        .filter(|(_, r)| !remote_ancestry.contains(*r))
        .map(|(i, r)| Unmerged { revno: Revno::Mainline(i + 1), rev: r.clone() })
        .collect();
    let mut remote_extra: Vec<Unmerged> = remote_mainline
        .iter()
        .enumerate()
        .filter(|(_, r)| !local_ancestry.contains(*r))
        .map(|(i, r)| Unmerged { revno: Revno::Mainline(i + 1), rev: r.clone() })
        .collect();

    // Step 5: inject merged-in (non-mainline) ancestry.
    if args.include_merges {
        inject_merged(graph, &local_ancestry, &remote_set, &mut local_extra)?;
        inject_merged(graph, &remote_ancestry, &local_set, &mut remote_extra)?;
    }

    // Step 4: order, then range-filter.
    sort_by_mainline_position(&mut local_extra, args.backward);
    sort_by_mainline_position(&mut remote_extra, args.backward);

    let local_extra = apply_range(local_extra, &local_mainline, args.local_range);
    let remote_extra = apply_range(remote_extra, &remote_mainline, args.remote_range);

    Ok((local_extra, remote_extra))
}

/// Simplified entry point returning only the rev-id lists, matching
/// `bzrlib.missing.find_unmerged`'s plain two-branch comparison without
/// dotted-revno bookkeeping.
pub fn find_unmerged_revisions(
    graph: &RevisionGraph,
    local_tip: &RevId,
    remote_tip: &RevId,
) -> Result<(Vec<RevId>, Vec<RevId>)> {
    let (local, remote) = find_unmerged(
        graph,
        FindUnmergedArgs {
            local_tip,
            remote_tip,
            include_merges: false,
            backward: false,
            local_range: None,
            remote_range: None,
        },
    )?;
    Ok((
        local.into_iter().map(|u| u.rev).collect(),
        remote.into_iter().map(|u| u.rev).collect(),
    ))
}

fn tag_mainline(mainline: &[RevId]) -> Vec<Unmerged> {
    mainline
        .iter()
        .enumerate()
        .map(|(i, r)| Unmerged { revno: Revno::Mainline(i + 1), rev: r.clone() })
        .collect()
}

fn tag_mainline_suffix(mainline: &[RevId], below: usize) -> Vec<Unmerged> {
    mainline[..below]
        .iter()
        .enumerate()
        .map(|(i, r)| Unmerged { revno: Revno::Mainline(i + 1), rev: r.clone() })
        .collect()
}

/// For each mainline revision in `extra`, find ancestors of that
/// revision that are not on the mainline and not in `other_mainline`'s
/// own history, and insert them right after their merging mainline
/// revision with a dotted-decimal tuple.
fn inject_merged(
    graph: &RevisionGraph,
    own_ancestry: &HashSet<RevId>,
    other_mainline_set: &HashSet<RevId>,
    extra: &mut Vec<Unmerged>,
) -> Result<()> {
    let mainline_positions: Vec<(usize, RevId)> = extra
        .iter()
        .filter_map(|u| match &u.revno {
            Revno::Mainline(i) => Some((*i, u.rev.clone())),
            Revno::Merged(_) => None,
        })
        .collect();

    let mut injected = vec![];
    for (i, rev) in &mainline_positions {
        let parents = graph.parents_of(rev).unwrap_or(&[]);
        // merged-in parents are every parent after the first (the
        // mainline parent), plus their own ancestry, excluding anything
        // already on either mainline.
        for (k, p) in parents.iter().enumerate().skip(1) {
            let merged_ancestry = graph.ancestors(p)?;
            let mut merged: Vec<RevId> = merged_ancestry
                .into_iter()
                .filter(|r| own_ancestry.contains(r) && !other_mainline_set.contains(r))
                .filter(|r| !mainline_positions.iter().any(|(_, m)| m == r))
                .collect();
            merged.sort();
            for (j, m) in merged.into_iter().enumerate() {
                injected.push(Unmerged { revno: Revno::Merged(vec![*i, k, j]), rev: m });
            }
        }
    }
    extra.extend(injected);
    Ok(())
}

fn sort_by_mainline_position(items: &mut [Unmerged], backward: bool) {
    items.sort_by(|a, b| {
        let ka = position_key(a);
        let kb = position_key(b);
        if backward {
            kb.cmp(&ka)
        } else {
            ka.cmp(&kb)
        }
    });
}

fn position_key(u: &Unmerged) -> Vec<usize> {
    match &u.revno {
        Revno::Mainline(i) => vec![*i],
        Revno::Merged(v) => v.clone(),
    }
}

fn apply_range(items: Vec<Unmerged>, mainline: &[RevId], range: RevRange) -> Vec<Unmerged> {
    let (lo, hi) = match range {
        None => return items,
        Some((lo, hi)) => (lo, hi),
    };
    let lo_pos = mainline.iter().position(|r| *r == lo);
    let hi_pos = mainline.iter().position(|r| *r == hi);
    let (lo_pos, hi_pos) = match (lo_pos, hi_pos) {
        (Some(l), Some(h)) => (l + 1, h + 1),
        _ => return vec![],
    };
    items
        .into_iter()
        .filter(|u| match &u.revno {
            Revno::Mainline(i) => *i >= lo_pos.min(hi_pos) && *i <= lo_pos.max(hi_pos),
            Revno::Merged(v) => {
                let i = v[0];
                i >= lo_pos.min(hi_pos) && i <= lo_pos.max(hi_pos)
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "unmerged_test.rs"]
mod unmerged_test;
