//! Content-similarity rename detection, grounded in
//! `bzrlib.rename_map.RenameMap`'s line-pair hash-hit scheme.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use crate::config::DEFAULT_RENAME_HASH_MODULUS;

/// Opaque file identifier, stable across renames.
pub type FileId = Vec<u8>;

/// A versioned file whose path has gone missing from the working tree.
pub struct MissingFile<'a> {
    pub file_id: FileId,
    pub basis_lines: &'a [Vec<u8>],
}

/// An unversioned path present in the working tree, candidate for being
/// the new location of some missing file.
pub struct Candidate<'a> {
    pub path: String,
    pub lines: &'a [Vec<u8>],
}

/// A directory whose versioned entry has gone missing, identified by the
/// file-ids of the children it used to contain.
pub struct MissingDir {
    pub file_id: FileId,
    pub child_file_ids: HashSet<FileId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub path: String,
    pub file_id: FileId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    pub file_matches: Vec<Match>,
    pub dir_matches: Vec<Match>,
}

/// Accumulates line-pair hash signatures for the set of missing files,
/// then scores candidate paths against them.
pub struct RenameMap {
    modulus: u64,
    edge_hashes: HashMap<u64, HashSet<FileId>>,
}

impl RenameMap {
    pub fn new() -> RenameMap {
        RenameMap::with_modulus(DEFAULT_RENAME_HASH_MODULUS)
    }

    pub fn with_modulus(modulus: u64) -> RenameMap {
        RenameMap { modulus, edge_hashes: HashMap::new() }
    }

    /// Hash of each consecutive line pair in `lines`, mod `modulus`. The
    /// last line, having no successor, is hashed paired with an empty
    /// sentinel line so that single-line files still contribute a
    /// signature.
    fn iter_edge_hashes<'a>(modulus: u64, lines: &'a [Vec<u8>]) -> impl Iterator<Item = u64> + 'a {
        let empty: &'static [u8] = b"";
        (0..lines.len()).map(move |n| {
            let a = lines[n].as_slice();
            let b = lines.get(n + 1).map(|l| l.as_slice()).unwrap_or(empty);
            hash_line_pair(a, b) % modulus
        })
    }

    /// Index one missing file's basis content under its file-id tag.
    pub fn add_missing(&mut self, missing: &MissingFile) {
        for h in Self::iter_edge_hashes(self.modulus, missing.basis_lines) {
            self.edge_hashes.entry(h).or_default().insert(missing.file_id.clone());
        }
    }

    /// Hit counts for `lines` against every tagged file-id, weighted by
    /// `1 / tag_count` per hash.
    fn hitcounts(&self, lines: &[Vec<u8>]) -> HashMap<FileId, f64> {
        let mut hits: HashMap<FileId, f64> = HashMap::new();
        for h in Self::iter_edge_hashes(self.modulus, lines) {
            if let Some(tags) = self.edge_hashes.get(&h) {
                let weight = 1.0 / (tags.len() as f64);
                for tag in tags {
                    *hits.entry(tag.clone()).or_insert(0.0) += weight;
                }
            }
        }
        hits
    }

    /// Rank candidates by score, greedily pairing highest-first while
    /// skipping any path or file-id already claimed. Ties broken score
    /// desc, path asc, file-id asc.
    pub fn file_match(&self, candidates: &[Candidate]) -> Vec<Match> {
        let mut hit_list: Vec<(f64, String, FileId)> = vec![];
        for c in candidates {
            for (file_id, score) in self.hitcounts(c.lines) {
                hit_list.push((score, c.path.clone(), file_id));
            }
        }
        greedy_match(hit_list)
    }

}

/// Parent-directory inference pass: once file matches imply which
/// directories the working tree now requires, match missing versioned
/// directories to those required paths by counting file-id overlap
/// between their children sets, mirroring
/// `bzrlib.rename_map.RenameMap._find_directory_moves`'s `_susp_dirs`
/// bookkeeping.
pub struct DirMatcher;

impl DirMatcher {
    pub fn match_parents(
        required_parents: &HashMap<String, HashSet<FileId>>,
        missing_dirs: &[MissingDir],
    ) -> Vec<Match> {
        let mut hit_list: Vec<(f64, String, FileId)> = vec![];
        for dir in missing_dirs {
            for (path, children) in required_parents {
                let hits = dir.child_file_ids.intersection(children).count();
                if hits > 0 {
                    hit_list.push((hits as f64, path.clone(), dir.file_id.clone()));
                }
            }
        }
        greedy_match(hit_list)
    }
}

impl Default for RenameMap {
    fn default() -> Self {
        RenameMap::new()
    }
}

fn greedy_match(mut hit_list: Vec<(f64, String, FileId)>) -> Vec<Match> {
    // Deterministic order: score desc, then path asc, then file-id asc.
    hit_list.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    let mut seen_paths: HashSet<String> = HashSet::new();
    let mut seen_file_ids: HashSet<FileId> = HashSet::new();
    let mut out = vec![];
    for (_, path, file_id) in hit_list {
        if seen_paths.contains(&path) || seen_file_ids.contains(&file_id) {
            continue;
        }
        seen_paths.insert(path.clone());
        seen_file_ids.insert(file_id.clone());
        out.push(Match { path, file_id });
    }
    out
}

fn hash_line_pair(a: &[u8], b: &[u8]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    a.hash(&mut hasher);
    b.hash(&mut hasher);
    hasher.finish()
}

/// Run the full procedure for a working tree: match missing files to
/// candidate paths, then recursively match missing parent directories
/// implied by those matches.
pub fn guess_renames(
    modulus: u64,
    missing_files: &[MissingFile],
    candidates: &[Candidate],
    missing_dirs: &[MissingDir],
    path_to_dir: impl Fn(&str) -> Option<String>,
) -> RenamePlan {
    let mut rn = RenameMap::with_modulus(modulus);
    for m in missing_files {
        rn.add_missing(m);
    }
    let file_matches = rn.file_match(candidates);

    let mut required_parents: HashMap<String, HashSet<FileId>> = HashMap::new();
    for m in &file_matches {
        if let Some(dir) = path_to_dir(&m.path) {
            required_parents.entry(dir).or_default().insert(m.file_id.clone());
        }
    }
    let dir_matches = DirMatcher::match_parents(&required_parents, missing_dirs);

    RenamePlan { file_matches, dir_matches }
}

#[cfg(test)]
#[path = "rename_test.rs"]
mod rename_test;
