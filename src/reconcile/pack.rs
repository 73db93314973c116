//! The pack aggregation concept the pack-format reconciler checks
//! against: a named, immutable bundle of already-packed revisions, with
//! the live set published as one atomically-rewritten pack-names list
//! rather than rewritten in place.

use std::collections::HashSet;

use crate::graph::RevId;

/// One immutable aggregation of revisions, identified by name. This
/// crate does not itself produce packs from loose weave/knit data —
/// that packer is out of scope here — but the reconciler needs to
/// reason about which revisions a pack set claims to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pack {
    pub name: String,
    pub contains: Vec<RevId>,
}

/// The live set of packs a repository currently publishes, analogous to
/// bzr's `pack-names` file: the set of names is swapped atomically, never
/// edited in place.
#[derive(Debug, Clone, Default)]
pub struct PackNames {
    packs: Vec<Pack>,
}

impl PackNames {
    pub fn new() -> PackNames {
        PackNames::default()
    }

    pub fn add(&mut self, pack: Pack) {
        self.packs.push(pack);
    }

    pub fn packs(&self) -> &[Pack] {
        &self.packs
    }

    /// Every revision any pack in this set claims to hold.
    pub fn all_revisions(&self) -> HashSet<RevId> {
        self.packs.iter().flat_map(|p| p.contains.iter().cloned()).collect()
    }
}

#[cfg(test)]
#[path = "pack_test.rs"]
mod pack_test;
