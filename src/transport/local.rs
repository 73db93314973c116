//! Disk-backed [super::Transport], built from the same `OpenOptions` +
//! `err_at!`-wrapped IO idiom used elsewhere in this crate's on-disk
//! stores (`util::create_file_a`/`open_file_a`/`open_file_r`).

use std::{
    fs,
    io::{Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use crate::{
    err_at,
    transport::{Kind, Range, Stat, Transport},
    util, Error, Result,
};

/// A [Transport] rooted at a directory on the local filesystem.
pub struct LocalTransport {
    root: PathBuf,
}

impl LocalTransport {
    pub fn new<P: AsRef<Path>>(root: P) -> LocalTransport {
        LocalTransport { root: root.as_ref().to_path_buf() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl Transport for LocalTransport {
    type Read = fs::File;

    fn get(&self, path: &str) -> Result<fs::File> {
        let full = self.resolve(path);
        match err_at!(IoError, fs::File::open(&full)) {
            Ok(fd) => Ok(fd),
            Err(err) if !full.exists() => err_at!(NotFound, msg: "{}", err),
            Err(err) => Err(err),
        }
    }

    fn put_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        util::atomic::publish(full.as_os_str(), data)
    }

    fn append(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        let mut fd = if full.exists() {
            util::open_file_a(full.as_os_str())?
        } else {
            util::create_file_a(full.as_os_str())?
        };
        util::sync_write(&mut fd, data)?;
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let (from, to) = (self.resolve(from), self.resolve(to));
        if to.exists() {
            return err_at!(AlreadyPresent, msg: "rename target exists: {:?}", to);
        }
        err_at!(IoError, fs::rename(&from, &to))
    }

    fn mkdir(&self, path: &str) -> Result<()> {
        let full = self.resolve(path);
        if full.exists() {
            return err_at!(AlreadyPresent, msg: "already exists: {:?}", full);
        }
        err_at!(IoError, fs::create_dir_all(&full))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path);
        if !full.exists() {
            return err_at!(NotFound, msg: "{:?}", full);
        }
        err_at!(IoError, fs::remove_file(&full))
    }

    fn stat(&self, path: &str) -> Result<Stat> {
        let full = self.resolve(path);
        let meta = err_at!(IoError, fs::metadata(&full))?;
        let kind = if meta.is_dir() { Kind::Directory } else { Kind::File };
        Ok(Stat { size: meta.len(), kind })
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let full = self.resolve(path);
        let mut names = vec![];
        for entry in err_at!(IoError, fs::read_dir(&full))? {
            let entry = err_at!(IoError, entry)?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn readv(&self, path: &str, ranges: &[Range]) -> Result<Vec<Vec<u8>>> {
        let full = self.resolve(path);
        let mut fd = err_at!(IoError, fs::File::open(&full))?;
        let mut out = Vec::with_capacity(ranges.len());
        for r in ranges {
            err_at!(IoError, fd.seek(SeekFrom::Start(r.offset)))?;
            let mut buf = vec![0u8; r.length as usize];
            err_at!(IoError, fd.read_exact(&mut buf))?;
            out.push(buf);
        }
        Ok(out)
    }

    fn external_url(&self) -> String {
        format!("file://{}", self.root.display())
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod local_test;
