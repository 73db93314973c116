//! Revision graph and the queries built on it: ancestry, unmerged-revision
//! discovery between two branches, and rename detection over trees.

pub mod rename;
pub mod unmerged;

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{err_at, Error, Result};

/// Opaque revision identifier. A newtype over bytes rather than `String`:
/// rev-ids are treated as raw byte strings, with no assumption about
/// encoding, the way an on-disk key is generally left generic over raw
/// bytes rather than pinned to `String`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct RevId(pub Vec<u8>);

impl RevId {
    pub fn new<B: Into<Vec<u8>>>(b: B) -> RevId {
        RevId(b.into())
    }
}

impl std::fmt::Display for RevId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl<'a> From<&'a str> for RevId {
    fn from(s: &'a str) -> RevId {
        RevId(s.as_bytes().to_vec())
    }
}

/// Repository-wide revision graph: `rev-id -> parents`, first parent is
/// the mainline ancestor. A rev-id appearing only as a parent (never
/// inserted with its own entry) is a ghost.
#[derive(Default, Clone, Debug)]
pub struct RevisionGraph {
    parents: HashMap<RevId, Vec<RevId>>,
    insertion_order: Vec<RevId>,
}

impl RevisionGraph {
    pub fn new() -> RevisionGraph {
        RevisionGraph::default()
    }

    /// Insert `rev` with `parents`, preserving parent-list order. Ghost
    /// parents (not themselves inserted) are recorded but never gain
    /// their own node.
    pub fn insert(&mut self, rev: RevId, parents: Vec<RevId>) {
        if !self.parents.contains_key(&rev) {
            self.insertion_order.push(rev.clone());
        }
        self.parents.insert(rev, parents);
    }

    pub fn contains(&self, rev: &RevId) -> bool {
        self.parents.contains_key(rev)
    }

    /// Every rev-id ever inserted with its own entry, in insertion order.
    /// Ghosts (referenced only as a parent) are not included.
    pub fn revisions(&self) -> &[RevId] {
        &self.insertion_order
    }

    pub fn parents_of(&self, rev: &RevId) -> Option<&[RevId]> {
        self.parents.get(rev).map(|v| v.as_slice())
    }

    /// First-parent of `rev`, if any (the mainline step).
    pub fn first_parent(&self, rev: &RevId) -> Option<&RevId> {
        self.parents.get(rev).and_then(|p| p.first())
    }

    /// Ghosts are rev-ids referenced as a parent anywhere in the graph
    /// but with no entry of their own.
    pub fn ghosts(&self) -> HashSet<RevId> {
        let mut ghosts = HashSet::new();
        for parents in self.parents.values() {
            for p in parents {
                if !self.parents.contains_key(p) {
                    ghosts.insert(p.clone());
                }
            }
        }
        ghosts
    }

    /// Walk `first_parent` links from `tip` to the root, inclusive of
    /// `tip`. Stops (without failing) at a ghost or missing parent.
    pub fn first_parent_walk(&self, tip: &RevId) -> Vec<RevId> {
        let mut out = vec![];
        let mut cur = Some(tip.clone());
        while let Some(rev) = cur {
            let exists = self.parents.contains_key(&rev);
            out.push(rev.clone());
            if !exists {
                break;
            }
            cur = self.first_parent(&rev).cloned();
        }
        out
    }

    /// All transitive ancestors of `rev`, including `rev` itself. Fails
    /// `InconsistentGraph` if a cycle is detected.
    pub fn ancestors(&self, rev: &RevId) -> Result<HashSet<RevId>> {
        let mut seen = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![rev.clone()];
        while let Some(r) = stack.pop() {
            if visited.contains(&r) {
                continue;
            }
            visited.insert(r.clone());
            // A ghost (referenced as a parent but never inserted with its
            // own entry) is not itself part of the ancestry, only the
            // reason traversal stops along that branch.
            let parents = match self.parents.get(&r) {
                Some(parents) => parents,
                None => continue,
            };
            seen.insert(r.clone());
            for p in parents {
                if p == &r {
                    return err_at!(InconsistentGraph, msg: "self-parent: {}", r);
                }
                stack.push(p.clone());
            }
        }
        Ok(seen)
    }

    /// Ancestors of the union of `revs`.
    pub fn ancestors_of_set<'a, I>(&self, revs: I) -> Result<HashSet<RevId>>
    where
        I: IntoIterator<Item = &'a RevId>,
    {
        let mut out = HashSet::new();
        for r in revs {
            out.extend(self.ancestors(r)?);
        }
        Ok(out)
    }

    /// All ancestors of `rev`, in topological order (parents before
    /// children) when `topo_sorted`, else an arbitrary set-derived order.
    pub fn get_ancestry(&self, rev: &RevId, topo_sorted: bool) -> Result<Vec<RevId>> {
        let set = self.ancestors(rev)?;
        if !topo_sorted {
            return Ok(set.into_iter().collect());
        }
        self.topo_sort(&set)
    }

    /// Kahn's algorithm restricted to the node set `within`.
    fn topo_sort(&self, within: &HashSet<RevId>) -> Result<Vec<RevId>> {
        let mut indegree: HashMap<RevId, usize> = within.iter().cloned().map(|r| (r, 0)).collect();
        let mut children: HashMap<RevId, Vec<RevId>> = HashMap::new();
        for r in within {
            if let Some(parents) = self.parents.get(r) {
                for p in parents {
                    if within.contains(p) {
                        *indegree.get_mut(r).unwrap() += 1;
                        children.entry(p.clone()).or_default().push(r.clone());
                    }
                }
            }
        }

        // Deterministic tie-break: process the insertion-order-stable
        // front of the queue; ties broken by rev-id ordering.
        let mut ready: Vec<RevId> =
            indegree.iter().filter(|(_, &d)| d == 0).map(|(r, _)| r.clone()).collect();
        ready.sort();
        let mut queue: VecDeque<RevId> = ready.into();

        let mut out = vec![];
        while let Some(r) = queue.pop_front() {
            out.push(r.clone());
            if let Some(kids) = children.get(&r) {
                let mut newly_ready = vec![];
                for k in kids {
                    let d = indegree.get_mut(k).unwrap();
                    *d -= 1;
                    if *d == 0 {
                        newly_ready.push(k.clone());
                    }
                }
                newly_ready.sort();
                for k in newly_ready {
                    queue.push_back(k);
                }
            }
        }

        if out.len() != within.len() {
            return err_at!(InconsistentGraph, msg: "cycle detected among {} revisions", within.len());
        }
        Ok(out)
    }
}
