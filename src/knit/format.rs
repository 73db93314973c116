//! On-disk knit container: one CBOR-framed record holding the index
//! (parent lists, checksums, chain lengths) and the content table
//! (fulltexts and delta hunks), published atomically through a
//! [Transport]. Parent references are compressed: a resolved parent is
//! written as its integer position in this knit rather than repeating
//! its rev-id bytes; only a ghost parent, which has no position, is
//! written out explicitly. Each content record is independently
//! gzip-compressed before being framed into the index, the way a knit's
//! per-version data is meant to be addressable without inflating
//! neighboring records.

use cbordata::Cborize;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use std::{
    convert::TryFrom,
    io::{Read, Write},
};

use crate::{
    err_at,
    graph::RevId,
    knit::{Content, Hunk, Knit},
    transport::Transport,
    util, Result,
};

const KNIT_VER: u32 = 0x0002_0001;

#[derive(Clone, Debug, Cborize)]
enum ParentRef {
    Index { pos: u64 },
    Ghost { rev_id: Vec<u8> },
}

impl ParentRef {
    const ID: u32 = KNIT_VER;
}

#[derive(Clone, Debug, Cborize)]
struct HunkRecord {
    s1: u64,
    s2: u64,
    lines: Vec<Vec<u8>>,
}

impl HunkRecord {
    const ID: u32 = KNIT_VER;
}

#[derive(Clone, Debug, Cborize)]
enum ContentRecord {
    Fulltext { lines: Vec<Vec<u8>> },
    Delta { basis: u64, hunks: Vec<HunkRecord> },
}

impl ContentRecord {
    const ID: u32 = KNIT_VER;
}

#[derive(Clone, Debug, Cborize)]
struct IndexEntry {
    rev_id: Vec<u8>,
    parent_refs: Vec<ParentRef>,
    sha1: String,
    chain_len: u64,
}

impl IndexEntry {
    const ID: u32 = KNIT_VER;
}

#[derive(Clone, Debug, Cborize)]
struct KnitRecord {
    index: Vec<IndexEntry>,
    // Each entry is an independently gzip-compressed, CBOR-encoded
    // ContentRecord, rather than one record holding the whole table.
    content: Vec<Vec<u8>>,
}

impl KnitRecord {
    const ID: u32 = KNIT_VER;
}

fn gzip_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    err_at!(IoError, enc.write_all(data))?;
    err_at!(IoError, enc.finish())
}

fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut dec = GzDecoder::new(data);
    let mut out = vec![];
    err_at!(IoError, dec.read_to_end(&mut out))?;
    Ok(out)
}

fn encode_content(rec: &ContentRecord) -> Result<Vec<u8>> {
    gzip_compress(&util::into_cbor_bytes(rec.clone())?)
}

fn decode_content(data: &[u8]) -> Result<ContentRecord> {
    let raw = gzip_decompress(data)?;
    let (rec, _n): (ContentRecord, usize) = util::from_cbor_bytes(&raw)?;
    Ok(rec)
}

fn encode_parent_ref(name: &RevId, index_of: &std::collections::HashMap<RevId, usize>) -> ParentRef {
    match index_of.get(name) {
        Some(&pos) => ParentRef::Index { pos: pos as u64 },
        None => ParentRef::Ghost { rev_id: name.0.clone() },
    }
}

impl TryFrom<&Knit> for KnitRecord {
    type Error = crate::Error;

    fn try_from(k: &Knit) -> Result<KnitRecord> {
        let index = (0..k.names.len())
            .map(|v| IndexEntry {
                rev_id: k.names[v].0.clone(),
                parent_refs: k.parent_names[v].iter().map(|p| encode_parent_ref(p, &k.index_of)).collect(),
                sha1: k.sha1[v].clone(),
                chain_len: k.chain_len[v] as u64,
            })
            .collect();

        let content = k
            .content
            .iter()
            .zip(k.basis.iter())
            .map(|(c, basis)| {
                let rec = match c {
                    Content::Fulltext(lines) => ContentRecord::Fulltext { lines: lines.clone() },
                    Content::Delta(hunks) => ContentRecord::Delta {
                        basis: basis.expect("delta record must carry a basis") as u64,
                        hunks: hunks
                            .iter()
                            .map(|h| HunkRecord { s1: h.s1 as u64, s2: h.s2 as u64, lines: h.lines.clone() })
                            .collect(),
                    },
                };
                encode_content(&rec)
            })
            .collect::<Result<Vec<Vec<u8>>>>()?;

        Ok(KnitRecord { index, content })
    }
}

impl TryFrom<KnitRecord> for Knit {
    type Error = crate::Error;

    fn try_from(r: KnitRecord) -> Result<Knit> {
        let names: Vec<RevId> = r.index.iter().map(|e| RevId(e.rev_id.clone())).collect();
        let index_of: std::collections::HashMap<RevId, usize> =
            names.iter().cloned().enumerate().map(|(i, n)| (n, i)).collect();

        let mut parent_names = vec![];
        let mut parents = vec![];
        let mut sha1 = vec![];
        let mut chain_len = vec![];
        for e in &r.index {
            let names_for_v: Vec<RevId> = e
                .parent_refs
                .iter()
                .map(|pr| match pr {
                    ParentRef::Index { pos } => names[*pos as usize].clone(),
                    ParentRef::Ghost { rev_id } => RevId(rev_id.clone()),
                })
                .collect();
            parents.push(names_for_v.iter().filter_map(|n| index_of.get(n).copied()).collect());
            parent_names.push(names_for_v);
            sha1.push(e.sha1.clone());
            chain_len.push(e.chain_len as usize);
        }

        let mut basis = vec![];
        let mut content = vec![];
        for blob in r.content {
            match decode_content(&blob)? {
                ContentRecord::Fulltext { lines } => {
                    basis.push(None);
                    content.push(Content::Fulltext(lines));
                }
                ContentRecord::Delta { basis: b, hunks } => {
                    basis.push(Some(b as usize));
                    content.push(Content::Delta(
                        hunks
                            .into_iter()
                            .map(|h| Hunk { s1: h.s1 as usize, s2: h.s2 as usize, lines: h.lines })
                            .collect(),
                    ));
                }
            }
        }

        Ok(Knit { names, index_of, parent_names, parents, sha1, basis, chain_len, content })
    }
}

/// Serialize `knit` into its on-disk byte representation.
pub fn to_bytes(knit: &Knit) -> Result<Vec<u8>> {
    util::into_cbor_bytes(KnitRecord::try_from(knit)?)
}

/// Parse a knit previously written by [to_bytes].
pub fn from_bytes(data: &[u8]) -> Result<Knit> {
    let (record, _n): (KnitRecord, usize) = util::from_cbor_bytes(data)?;
    Knit::try_from(record)
}

/// Publish `knit` to `path` on `transport`, atomically replacing any
/// prior contents.
pub fn write_to<T: Transport>(transport: &T, path: &str, knit: &Knit) -> Result<()> {
    let data = to_bytes(knit)?;
    transport.put_file(path, &data)
}

/// Load the knit stored at `path` on `transport`.
pub fn read_from<T: Transport>(transport: &T, path: &str) -> Result<Knit> {
    use std::io::Read;

    let mut f = transport.get(path)?;
    let mut data = vec![];
    crate::err_at!(IoError, f.read_to_end(&mut data))?;
    from_bytes(&data)
}

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;
