//! Weave storage: every revision of one file interleaved into a single
//! append-friendly container with per-line origin tracking. Grounded in
//! `bzrlib.weave.Weave`'s `_walk_internal`/`_extract` state machine,
//! reimplemented without its literal on-disk format — this crate keeps
//! no byte-for-byte interop with any external weave implementation.
//!
//! A weave stores an ordered sequence of [Entry] values: literal text
//! lines, or control instructions bracketing insertion and deletion
//! blocks tagged by the internal version index that authored them. "What
//! is version `v`" is defined purely by walking this sequence — see
//! [Weave::get_lines].

pub mod diff;
pub mod format;

use std::collections::{HashSet, VecDeque};
use std::collections::HashMap;

use crate::{err_at, graph::RevId, util, Error, Result};

/// One element of a weave's entry stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Literal text, as originally supplied; may or may not end in `\n`.
    Line(Vec<u8>),
    InsertStart(usize),
    InsertEnd,
    DeleteStart(usize),
    DeleteEnd(usize),
}

/// Outcome of [Weave::plan_merge] for one weave line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeState {
    Unchanged,
    NewA,
    NewB,
    KilledA,
    KilledB,
    KilledBoth,
    KilledBase,
    GhostA,
    GhostB,
    Irrelevant,
}

/// Result of [Weave::check]: a flat list of defect descriptions. Empty
/// means the weave satisfies every structural invariant checked.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub defects: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.defects.is_empty()
    }
}

/// One file's complete versioned history.
#[derive(Clone, Debug, Default)]
pub struct Weave {
    names: Vec<RevId>,
    index_of: HashMap<RevId, usize>,
    // as originally supplied, may include ghost names with no index.
    parent_names: Vec<Vec<RevId>>,
    // resolved against index_of; ghosts are simply absent here.
    parents: Vec<Vec<usize>>,
    sha1: Vec<String>,
    entries: Vec<Entry>,
}

struct ExtractedLine {
    abs_pos: usize,
    origin: usize,
}

struct WalkedLine {
    abs_pos: usize,
    insert: usize,
    deleteset: HashSet<usize>,
}

impl Weave {
    pub fn new() -> Weave {
        Weave::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn versions(&self) -> &[RevId] {
        &self.names
    }

    /// The parent rev-ids recorded for `rev_id` as originally supplied,
    /// including any that turned out to be ghosts.
    pub fn parent_names_of(&self, rev_id: &RevId) -> Result<&[RevId]> {
        let v = self.resolve_index(rev_id)?;
        Ok(&self.parent_names[v])
    }

    fn resolve_index(&self, rev_id: &RevId) -> Result<usize> {
        self.index_of
            .get(rev_id)
            .copied()
            .ok_or_else(|| {
                Error::new(crate::ErrorKind::NotFound, file!(), line!(), format!("no such version: {}", rev_id))
            })
    }

    /// `ancestors(v) ∪ {v}`, as internal indices.
    fn inclusive_ancestors(&self, v: usize) -> HashSet<usize> {
        let mut seen = HashSet::new();
        let mut stack = vec![v];
        while let Some(x) = stack.pop() {
            if seen.insert(x) {
                for &p in &self.parents[x] {
                    stack.push(p);
                }
            }
        }
        seen
    }

    fn inclusive_ancestors_of_set(&self, vs: &[usize]) -> HashSet<usize> {
        let mut out = HashSet::new();
        for &v in vs {
            out.extend(self.inclusive_ancestors(v));
        }
        out
    }

    fn line_at(&self, pos: usize) -> &Vec<u8> {
        match &self.entries[pos] {
            Entry::Line(l) => l,
            other => unreachable!("abs_pos {} does not reference a Line entry: {:?}", pos, other),
        }
    }

    /// Single-pass extraction restricted to `included`: for every text
    /// line, record it iff the innermost open insertion is in `included`
    /// and no open deletion tagged within `included` is active.
    fn extract(&self, included: &HashSet<usize>) -> Result<Vec<ExtractedLine>> {
        let mut stack: Vec<usize> = vec![];
        let mut dset: HashSet<usize> = HashSet::new();
        let mut out = vec![];

        for (pos, e) in self.entries.iter().enumerate() {
            match e {
                Entry::InsertStart(v) => stack.push(*v),
                Entry::InsertEnd => {
                    if stack.pop().is_none() {
                        return err_at!(MalformedFormat, msg: "unbalanced insertion end at {}", pos);
                    }
                }
                Entry::DeleteStart(v) => {
                    if included.contains(v) {
                        dset.insert(*v);
                    }
                }
                Entry::DeleteEnd(v) => {
                    if included.contains(v) {
                        dset.remove(v);
                    }
                }
                Entry::Line(_) => {
                    let active =
                        dset.is_empty() && stack.last().map(|t| included.contains(t)).unwrap_or(false);
                    if active {
                        out.push(ExtractedLine { abs_pos: pos, origin: *stack.last().unwrap() });
                    }
                }
            }
        }
        Ok(out)
    }

    /// Full, unrestricted walk used by [Weave::plan_merge] and
    /// [Weave::check]: every text line paired with its innermost
    /// insertion tag and the complete set of currently-open deletion
    /// tags.
    fn walk_internal(&self) -> Result<Vec<WalkedLine>> {
        let mut stack: Vec<usize> = vec![];
        let mut dset: HashSet<usize> = HashSet::new();
        let mut out = vec![];

        for (pos, e) in self.entries.iter().enumerate() {
            match e {
                Entry::InsertStart(v) => stack.push(*v),
                Entry::InsertEnd => {
                    if stack.pop().is_none() {
                        return err_at!(MalformedFormat, msg: "unbalanced insertion end at {}", pos);
                    }
                }
                Entry::DeleteStart(v) => {
                    dset.insert(*v);
                }
                Entry::DeleteEnd(v) => {
                    if !dset.remove(v) {
                        return err_at!(MalformedFormat, msg: "unbalanced deletion end at {}", pos);
                    }
                }
                Entry::Line(_) => {
                    if stack.is_empty() {
                        return err_at!(MalformedFormat, msg: "line outside any insertion at {}", pos);
                    }
                    out.push(WalkedLine {
                        abs_pos: pos,
                        insert: *stack.last().unwrap(),
                        deleteset: dset.clone(),
                    });
                }
            }
        }
        if !stack.is_empty() || !dset.is_empty() {
            return err_at!(MalformedFormat, msg: "unclosed blocks at end of weave");
        }
        Ok(out)
    }

    /// Append a new version. Idempotent: re-adding `(rev_id, parents,
    /// lines)` with identical content and parent set is a no-op
    /// returning the existing index; a rev-id reused with different
    /// parents fails `AlreadyPresent`.
    pub fn add_version(
        &mut self,
        rev_id: RevId,
        given_parents: Vec<RevId>,
        lines: Vec<Vec<u8>>,
    ) -> Result<usize> {
        let new_sha1 = util::sha1_of_lines(lines.iter().map(|l| l.as_slice()));

        if let Some(&existing) = self.index_of.get(&rev_id) {
            let existing_set: HashSet<&RevId> = self.parent_names[existing].iter().collect();
            let given_set: HashSet<&RevId> = given_parents.iter().collect();
            if new_sha1 == self.sha1[existing] && existing_set == given_set {
                log::debug!("add_version: idempotent re-add of {}", rev_id);
                return Ok(existing);
            }
            return err_at!(AlreadyPresent, msg: "revision already present with different parents: {}", rev_id);
        }

        let mut resolved: Vec<usize> = vec![];
        for p in &given_parents {
            if let Some(&idx) = self.index_of.get(p) {
                resolved.push(idx);
            }
        }
        let new_v = self.names.len();

        if given_parents.is_empty() {
            self.entries.push(Entry::InsertStart(new_v));
            for l in &lines {
                self.entries.push(Entry::Line(l.clone()));
            }
            self.entries.push(Entry::InsertEnd);
        } else if resolved.len() == 1
            && resolved.len() == given_parents.len()
            && self.sha1[resolved[0]] == new_sha1
        {
            log::debug!("add_version: metadata-only add for {} (identical to parent)", rev_id);
        } else {
            self.splice_diff(new_v, &resolved, &lines)?;
        }

        log::debug!(
            "add_version: {} parents={} lines={}",
            rev_id,
            given_parents.len(),
            lines.len()
        );

        self.names.push(rev_id.clone());
        self.index_of.insert(rev_id, new_v);
        self.parent_names.push(given_parents);
        self.parents.push(resolved);
        self.sha1.push(new_sha1);

        Ok(new_v)
    }

    fn splice_diff(&mut self, new_v: usize, resolved: &[usize], lines: &[Vec<u8>]) -> Result<()> {
        let inc = self.inclusive_ancestors_of_set(resolved);
        let basis = self.extract(&inc)?;
        let basis_lines: Vec<Vec<u8>> = basis.iter().map(|e| self.line_at(e.abs_pos).clone()).collect();
        let opcodes = diff::compute_opcodes(&basis_lines, lines);

        let mut out = Vec::with_capacity(self.entries.len() + lines.len() + 4);
        let mut cursor = 0usize;

        for op in &opcodes {
            use diff::Tag;
            match op.tag {
                Tag::Equal => {
                    if op.i2 > op.i1 {
                        let end_abs = basis[op.i2 - 1].abs_pos;
                        out.extend_from_slice(&self.entries[cursor..=end_abs]);
                        cursor = end_abs + 1;
                    }
                }
                Tag::Delete | Tag::Replace | Tag::Insert => {
                    if op.i2 > op.i1 {
                        let start_abs = basis[op.i1].abs_pos;
                        let end_abs = basis[op.i2 - 1].abs_pos;
                        out.extend_from_slice(&self.entries[cursor..start_abs]);
                        out.push(Entry::DeleteStart(new_v));
                        out.extend_from_slice(&self.entries[start_abs..=end_abs]);
                        out.push(Entry::DeleteEnd(new_v));
                        cursor = end_abs + 1;
                    } else {
                        let anchor = if op.i1 < basis.len() { basis[op.i1].abs_pos } else { self.entries.len() };
                        out.extend_from_slice(&self.entries[cursor..anchor]);
                        cursor = anchor;
                    }
                    if op.j2 > op.j1 {
                        out.push(Entry::InsertStart(new_v));
                        for l in &lines[op.j1..op.j2] {
                            out.push(Entry::Line(l.clone()));
                        }
                        out.push(Entry::InsertEnd);
                    }
                }
            }
        }
        out.extend_from_slice(&self.entries[cursor..]);
        self.entries = out;
        Ok(())
    }

    /// Reconstruct `rev_id`, verifying its stored SHA-1.
    pub fn get_lines(&self, rev_id: &RevId) -> Result<Vec<Vec<u8>>> {
        let v = self.resolve_index(rev_id)?;
        let included = self.inclusive_ancestors(v);
        let extracted = self.extract(&included)?;
        let lines: Vec<Vec<u8>> = extracted.iter().map(|e| self.line_at(e.abs_pos).clone()).collect();

        let got = util::sha1_of_lines(lines.iter().map(|l| l.as_slice()));
        if got != self.sha1[v] {
            log::error!("checksum mismatch reconstructing {}: want {} got {}", rev_id, self.sha1[v], got);
            return err_at!(ChecksumMismatch, msg: "version {}: want {} got {}", rev_id, self.sha1[v], got);
        }
        Ok(lines)
    }

    /// Per-line origin annotation.
    pub fn annotate(&self, rev_id: &RevId) -> Result<Vec<(RevId, Vec<u8>)>> {
        let v = self.resolve_index(rev_id)?;
        let included = self.inclusive_ancestors(v);
        let extracted = self.extract(&included)?;
        Ok(extracted
            .iter()
            .map(|e| (self.names[e.origin].clone(), self.line_at(e.abs_pos).clone()))
            .collect())
    }

    /// Per-line 3-way merge plan between `a` and `b`, terminated by a
    /// sentinel `(Unchanged, "")` entry.
    pub fn plan_merge(&self, a: &RevId, b: &RevId) -> Result<Vec<(MergeState, Vec<u8>)>> {
        let va = self.resolve_index(a)?;
        let vb = self.resolve_index(b)?;
        let inc_a = self.inclusive_ancestors(va);
        let inc_b = self.inclusive_ancestors(vb);
        let inc_c: HashSet<usize> = inc_a.intersection(&inc_b).copied().collect();

        let walked = self.walk_internal()?;
        let mut out = Vec::with_capacity(walked.len() + 1);
        for w in &walked {
            let state = classify(w.insert, &w.deleteset, &inc_a, &inc_b, &inc_c);
            out.push((state, self.line_at(w.abs_pos).clone()));
        }
        out.push((MergeState::Unchanged, vec![]));
        Ok(out)
    }

    /// Verify SHA-1 per version, nesting invariants, and parent index
    /// ordering. Logs one `log::warn!` per defect before returning.
    pub fn check(&self) -> CheckReport {
        let mut defects = vec![];

        let mut stack: Vec<usize> = vec![];
        for e in &self.entries {
            match e {
                Entry::InsertStart(v) => stack.push(*v),
                Entry::InsertEnd => {
                    stack.pop();
                }
                Entry::DeleteStart(v) => {
                    if stack.contains(v) {
                        defects.push(format!("version {} deletes inside its own insertion", v));
                    }
                }
                _ => {}
            }
        }

        if let Err(err) = self.walk_internal() {
            defects.push(format!("malformed weave structure: {}", err));
        }

        for (v, parents) in self.parents.iter().enumerate() {
            for &p in parents {
                if p >= v {
                    defects.push(format!("version {} has non-ancestor parent index {}", v, p));
                }
            }
        }

        for v in 0..self.names.len() {
            if let Err(err) = self.get_lines(&self.names[v]) {
                defects.push(format!("version {} ({}): {}", v, self.names[v], err));
            }
        }

        for d in &defects {
            log::warn!("weave check: {}", d);
        }
        CheckReport { defects }
    }

    /// Merge two weaves that agree on shared versions' content but may
    /// disagree on parent sets, into one weave with the union of
    /// versions and a combined parent graph.
    pub fn reweave(a: &Weave, b: &Weave) -> Result<Weave> {
        let mut combined_parents: HashMap<RevId, HashSet<RevId>> = HashMap::new();
        let mut names: Vec<RevId> = vec![];
        let mut seen: HashSet<RevId> = HashSet::new();

        for w in [a, b] {
            for (i, name) in w.names.iter().enumerate() {
                if seen.insert(name.clone()) {
                    names.push(name.clone());
                }
                let entry = combined_parents.entry(name.clone()).or_default();
                for p in &w.parent_names[i] {
                    entry.insert(p.clone());
                }
            }
        }

        let order = topo_sort_names(&names, &combined_parents)?;

        let mut out = Weave::new();
        for name in order {
            let mut parents: Vec<RevId> =
                combined_parents.get(&name).cloned().unwrap_or_default().into_iter().collect();
            parents.sort();

            let lines_a = a.index_of.get(&name).map(|_| a.get_lines(&name)).transpose()?;
            let lines_b = b.index_of.get(&name).map(|_| b.get_lines(&name)).transpose()?;
            let lines = match (lines_a, lines_b) {
                (Some(la), Some(lb)) => {
                    if la != lb {
                        return err_at!(Fatal, msg: "WeaveTextDiffers: {} differs between inputs", name);
                    }
                    la
                }
                (Some(la), None) => la,
                (None, Some(lb)) => lb,
                (None, None) => unreachable!("name collected from a or b must be present in one"),
            };

            out.add_version(name, parents, lines)?;
        }
        Ok(out)
    }
}

fn classify(
    insert: usize,
    deleteset: &HashSet<usize>,
    inc_a: &HashSet<usize>,
    inc_b: &HashSet<usize>,
    inc_c: &HashSet<usize>,
) -> MergeState {
    if !deleteset.is_disjoint(inc_c) {
        MergeState::KilledBase
    } else if inc_c.contains(&insert) {
        let killed_a = !deleteset.is_disjoint(inc_a);
        let killed_b = !deleteset.is_disjoint(inc_b);
        match (killed_a, killed_b) {
            (true, true) => MergeState::KilledBoth,
            (true, false) => MergeState::KilledA,
            (false, true) => MergeState::KilledB,
            (false, false) => MergeState::Unchanged,
        }
    } else if inc_a.contains(&insert) {
        if !deleteset.is_disjoint(inc_a) {
            MergeState::GhostA
        } else {
            MergeState::NewA
        }
    } else if inc_b.contains(&insert) {
        if !deleteset.is_disjoint(inc_b) {
            MergeState::GhostB
        } else {
            MergeState::NewB
        }
    } else {
        MergeState::Irrelevant
    }
}

fn topo_sort_names(names: &[RevId], parents: &HashMap<RevId, HashSet<RevId>>) -> Result<Vec<RevId>> {
    let name_set: HashSet<RevId> = names.iter().cloned().collect();
    let mut indegree: HashMap<RevId, usize> = names.iter().cloned().map(|n| (n, 0)).collect();
    let mut children: HashMap<RevId, Vec<RevId>> = HashMap::new();

    for n in names {
        if let Some(ps) = parents.get(n) {
            for p in ps {
                if name_set.contains(p) {
                    *indegree.get_mut(n).unwrap() += 1;
                    children.entry(p.clone()).or_default().push(n.clone());
                }
            }
        }
    }

    let mut ready: Vec<RevId> = indegree.iter().filter(|&(_, &d)| d == 0).map(|(n, _)| n.clone()).collect();
    ready.sort();
    let mut queue: VecDeque<RevId> = ready.into();

    let mut out = vec![];
    while let Some(n) = queue.pop_front() {
        out.push(n.clone());
        if let Some(kids) = children.get(&n) {
            let mut newly = vec![];
            for k in kids {
                let d = indegree.get_mut(k).unwrap();
                *d -= 1;
                if *d == 0 {
                    newly.push(k.clone());
                }
            }
            newly.sort();
            for k in newly {
                queue.push_back(k);
            }
        }
    }

    if out.len() != names.len() {
        return err_at!(InconsistentGraph, msg: "cycle among {} revisions during reweave", names.len());
    }
    Ok(out)
}

#[cfg(test)]
#[path = "weave_test.rs"]
mod weave_test;
