//! On-disk weave container, with its own byte layout rather than
//! byte-for-byte interop with any external weave implementation: the
//! full entry stream and per-version metadata are framed as one
//! [cbordata]-encoded record and published atomically through a
//! [Transport].

use cbordata::Cborize;

use crate::{
    graph::RevId,
    transport::Transport,
    util,
    weave::{Entry, Weave},
    Result,
};

const WEAVE_VER: u32 = 0x0001_0001;

#[derive(Clone, Debug, Cborize)]
enum EntryRecord {
    Line { bytes: Vec<u8> },
    InsertStart { v: u64 },
    InsertEnd {},
    DeleteStart { v: u64 },
    DeleteEnd { v: u64 },
}

impl EntryRecord {
    const ID: u32 = WEAVE_VER;
}

impl From<&Entry> for EntryRecord {
    fn from(e: &Entry) -> EntryRecord {
        match e {
            Entry::Line(bytes) => EntryRecord::Line { bytes: bytes.clone() },
            Entry::InsertStart(v) => EntryRecord::InsertStart { v: *v as u64 },
            Entry::InsertEnd => EntryRecord::InsertEnd {},
            Entry::DeleteStart(v) => EntryRecord::DeleteStart { v: *v as u64 },
            Entry::DeleteEnd(v) => EntryRecord::DeleteEnd { v: *v as u64 },
        }
    }
}

impl From<EntryRecord> for Entry {
    fn from(e: EntryRecord) -> Entry {
        match e {
            EntryRecord::Line { bytes } => Entry::Line(bytes),
            EntryRecord::InsertStart { v } => Entry::InsertStart(v as usize),
            EntryRecord::InsertEnd {} => Entry::InsertEnd,
            EntryRecord::DeleteStart { v } => Entry::DeleteStart(v as usize),
            EntryRecord::DeleteEnd { v } => Entry::DeleteEnd(v as usize),
        }
    }
}

#[derive(Clone, Debug, Cborize)]
struct WeaveRecord {
    names: Vec<Vec<u8>>,
    parent_names: Vec<Vec<Vec<u8>>>,
    sha1: Vec<String>,
    entries: Vec<EntryRecord>,
}

impl WeaveRecord {
    const ID: u32 = WEAVE_VER;
}

impl From<&Weave> for WeaveRecord {
    fn from(w: &Weave) -> WeaveRecord {
        WeaveRecord {
            names: w.names.iter().map(|r| r.0.clone()).collect(),
            parent_names: w
                .parent_names
                .iter()
                .map(|ps| ps.iter().map(|r| r.0.clone()).collect())
                .collect(),
            sha1: w.sha1.clone(),
            entries: w.entries.iter().map(EntryRecord::from).collect(),
        }
    }
}

impl From<WeaveRecord> for Weave {
    fn from(r: WeaveRecord) -> Weave {
        let names: Vec<RevId> = r.names.into_iter().map(RevId).collect();
        let index_of = names.iter().cloned().enumerate().map(|(i, r)| (r, i)).collect();
        let parent_names: Vec<Vec<RevId>> = r
            .parent_names
            .into_iter()
            .map(|ps| ps.into_iter().map(RevId).collect())
            .collect();
        let name_index: std::collections::HashMap<RevId, usize> =
            names.iter().cloned().enumerate().map(|(i, r)| (r, i)).collect();
        let parents: Vec<Vec<usize>> = parent_names
            .iter()
            .map(|ps| ps.iter().filter_map(|p| name_index.get(p).copied()).collect())
            .collect();

        Weave {
            names,
            index_of,
            parent_names,
            parents,
            sha1: r.sha1,
            entries: r.entries.into_iter().map(Entry::from).collect(),
        }
    }
}

/// Serialize `weave` into its on-disk byte representation.
pub fn to_bytes(weave: &Weave) -> Result<Vec<u8>> {
    util::into_cbor_bytes(WeaveRecord::from(weave))
}

/// Parse a weave previously written by [to_bytes].
pub fn from_bytes(data: &[u8]) -> Result<Weave> {
    let (record, _n): (WeaveRecord, usize) = util::from_cbor_bytes(data)?;
    Ok(Weave::from(record))
}

/// Publish `weave` to `path` on `transport`, atomically replacing any
/// prior contents.
pub fn write_to<T: Transport>(transport: &T, path: &str, weave: &Weave) -> Result<()> {
    let data = to_bytes(weave)?;
    transport.put_file(path, &data)
}

/// Load the weave stored at `path` on `transport`.
pub fn read_from<T: Transport>(transport: &T, path: &str) -> Result<Weave> {
    use std::io::Read;

    let mut f = transport.get(path)?;
    let mut data = vec![];
    crate::err_at!(IoError, f.read_to_end(&mut data))?;
    from_bytes(&data)
}

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;
