//! Loads the plain-text revision-graph manifest the subcommands accept:
//! one `rev-id:parent,parent,...` line per revision, parents comma
//! separated and possibly empty. [braidstore::graph::RevisionGraph] is
//! an in-memory structure with no on-disk format of its own, so the CLI
//! defines this minimal format and reads it directly rather than
//! through a library-owned serialization.

use std::{ffi, fs, path::Path};

use braidstore::{
    err_at,
    graph::{RevId, RevisionGraph},
    transport::local::LocalTransport,
    Result,
};

pub fn load(path: &str) -> Result<RevisionGraph> {
    let text = err_at!(IoError, fs::read_to_string(path))?;
    let mut graph = RevisionGraph::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (rev, parents) = match line.split_once(':') {
            Some(pair) => pair,
            None => return err_at!(MalformedFormat, msg: "bad graph line: {:?}", line),
        };
        let parents: Vec<RevId> = parents
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(RevId::from)
            .collect();
        graph.insert(RevId::from(rev.trim()), parents);
    }
    Ok(graph)
}

/// Splits a CLI-supplied file path into a [LocalTransport] rooted at its
/// parent directory plus the bare file name `weave`/`knit` format
/// readers expect, since both take a transport-relative path rather
/// than an absolute one.
pub fn transport_for(path: &str) -> (LocalTransport, String) {
    let p = Path::new(path);
    let dir = p.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let name = p.file_name().unwrap_or_else(|| ffi::OsStr::new(path)).to_string_lossy().into_owned();
    (LocalTransport::new(dir), name)
}
