//! Common helpers shared by the weave, knit, reconcile and graph modules.

use cbordata::{Cbor, FromCbor, IntoCbor};
use sha1::{Digest, Sha1};

use std::{ffi, fs, io, path};

use crate::{err_at, Error, Result};

pub mod atomic;

/// Serialize `val` into a byte string using [cbordata]'s wire format.
pub fn into_cbor_bytes<T>(val: T) -> Result<Vec<u8>>
where
    T: IntoCbor,
{
    let mut data: Vec<u8> = vec![];
    let n = err_at!(FailCbor, err_at!(FailCbor, val.into_cbor())?.encode(&mut data))?;
    if n != data.len() {
        err_at!(Fatal, msg: "cbor encoding len mismatch {} {}", n, data.len())
    } else {
        Ok(data)
    }
}

/// Deserialize a `T` from `data`, returning the value and bytes consumed.
pub fn from_cbor_bytes<T>(mut data: &[u8]) -> Result<(T, usize)>
where
    T: FromCbor,
{
    let (val, n) = err_at!(FailCbor, Cbor::decode(&mut data))?;
    Ok((err_at!(FailCbor, T::from_cbor(val))?, n))
}

/// SHA-1 of the concatenation of `lines`, hex-encoded — the checksum form
/// stored in weave metadata and knit record headers.
pub fn sha1_of_lines<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Sha1::new();
    for line in lines {
        hasher.update(line);
    }
    hex_digest(hasher.finalize().as_slice())
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

/// Create a file in append mode, truncating any existing file with the
/// same path. Parent directories are created as needed.
pub fn create_file_a(file: &ffi::OsStr) -> Result<fs::File> {
    let os_file = path::Path::new(file);
    fs::remove_file(os_file).ok();

    if let Some(parent) = os_file.parent() {
        err_at!(IoError, fs::create_dir_all(parent))?;
    }

    let mut opts = fs::OpenOptions::new();
    err_at!(IoError, opts.append(true).create_new(true).open(os_file))
}

/// Open an existing file in append mode.
pub fn open_file_a(file: &ffi::OsStr) -> Result<fs::File> {
    let mut opts = fs::OpenOptions::new();
    err_at!(IoError, opts.append(true).open(path::Path::new(file)))
}

/// Open a file read-only.
pub fn open_file_r(file: &ffi::OsStr) -> Result<fs::File> {
    err_at!(IoError, fs::OpenOptions::new().read(true).open(path::Path::new(file)))
}

/// Write `data` to `file`, verifying a full write, then fsync.
pub fn sync_write(file: &mut fs::File, data: &[u8]) -> Result<usize> {
    use io::Write;

    let n = err_at!(IoError, file.write(data))?;
    if n != data.len() {
        err_at!(IoError, msg: "partial write {}/{}", n, data.len())?;
    }
    err_at!(IoError, file.sync_all())?;
    Ok(n)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
