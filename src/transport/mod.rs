//! The [Transport] abstraction the core depends on for all I/O.
//! The core never touches `std::fs` directly outside this module and
//! [crate::lock]; [local::LocalTransport] is the one concrete
//! implementation this crate ships, sufficient to exercise every
//! operation end to end. HTTP/SFTP transports are thin collaborators
//! outside this crate's scope.

pub mod local;

use std::io::Read;

use crate::Result;

/// What [Transport::stat] reports about a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    File,
    Directory,
}

#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub size: u64,
    pub kind: Kind,
}

/// One `(offset, length)` request for [Transport::readv].
#[derive(Debug, Clone, Copy)]
pub struct Range {
    pub offset: u64,
    pub length: u64,
}

/// Abstraction over the underlying storage medium. Every method is
/// synchronous and blocking: the core performs no internal scheduling,
/// suspension happens only inside transport calls.
pub trait Transport {
    type Read: Read;

    /// Open `path` for reading. Fails `NotFound` if absent.
    fn get(&self, path: &str) -> Result<Self::Read>;

    /// Atomically replace the contents of `path` with `data`.
    fn put_file(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Atomically append `data` to `path`, creating it if absent.
    fn append(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Atomically rename `from` to `to`. Fails if `to` already exists.
    fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Create a directory at `path`. Fails if it already exists.
    fn mkdir(&self, path: &str) -> Result<()>;

    /// Delete the file at `path`. Fails `NotFound` if absent.
    fn delete(&self, path: &str) -> Result<()>;

    /// Metadata about `path`.
    fn stat(&self, path: &str) -> Result<Stat>;

    /// List the immediate children of directory `path`.
    fn list_dir(&self, path: &str) -> Result<Vec<String>>;

    /// Batched random reads; returns the bytes for each requested range
    /// in request order.
    fn readv(&self, path: &str, ranges: &[Range]) -> Result<Vec<Vec<u8>>>;

    /// Opaque identifier for diagnostics (e.g. a URL or local path).
    fn external_url(&self) -> String;
}
