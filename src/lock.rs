//! Named lock files implementing an advisory read/write locking
//! discipline: multiple readers, one exclusive writer, refcounted
//! per-handle, released on drop.

use fs2::FileExt;

use std::{cell::RefCell, collections::HashMap, ffi, fs, rc::Rc};

use crate::{err_at, Error, Result};

/// Per-handle refcount table keyed by lock-file path, so nested
/// `lock_write`/`lock_read` calls on the same handle don't re-block.
#[derive(Default)]
struct Counts {
    write: HashMap<ffi::OsString, usize>,
    read: HashMap<ffi::OsString, usize>,
    files: HashMap<ffi::OsString, fs::File>,
}

/// One repository handle's view of the locking subsystem. Cloning a
/// `LockTable` shares the same handle's bookkeeping (nested acquisitions
/// don't re-block); a *different* handle constructed via `LockTable::new`
/// contends for the same OS-level advisory lock on the underlying file.
#[derive(Clone)]
pub struct LockTable {
    inner: Rc<RefCell<Counts>>,
}

impl LockTable {
    pub fn new() -> LockTable {
        LockTable { inner: Rc::new(RefCell::new(Counts::default())) }
    }

    fn ensure_open(&self, path: &ffi::OsStr) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if !inner.files.contains_key(path) {
            if let Some(parent) = std::path::Path::new(path).parent() {
                err_at!(IoError, fs::create_dir_all(parent))?;
            }
            let fd = err_at!(
                IoError,
                fs::OpenOptions::new().create(true).write(true).open(path)
            )?;
            inner.files.insert(path.to_os_string(), fd);
        }
        Ok(())
    }

    /// Acquire (or re-enter) an exclusive write lock on `path`.
    pub fn lock_write(&self, path: &ffi::OsStr) -> Result<WriteGuard> {
        self.ensure_open(path)?;

        let mut inner = self.inner.borrow_mut();
        let depth = *inner.write.get(path).unwrap_or(&0);
        if depth == 0 {
            let fd = inner.files.get(path).unwrap();
            err_at!(Locked, fd.try_lock_exclusive())?;
        }
        inner.write.insert(path.to_os_string(), depth + 1);

        Ok(WriteGuard { table: self.clone(), path: path.to_os_string() })
    }

    /// Acquire (or re-enter) a shared read lock on `path`.
    pub fn lock_read(&self, path: &ffi::OsStr) -> Result<ReadGuard> {
        self.ensure_open(path)?;

        let mut inner = self.inner.borrow_mut();
        let already_writer = inner.write.get(path).copied().unwrap_or(0) > 0;
        let depth = *inner.read.get(path).unwrap_or(&0);
        if depth == 0 && !already_writer {
            let fd = inner.files.get(path).unwrap();
            err_at!(Locked, fd.try_lock_shared())?;
        }
        inner.read.insert(path.to_os_string(), depth + 1);

        Ok(ReadGuard { table: self.clone(), path: path.to_os_string() })
    }

    fn release_write(&self, path: &ffi::OsStr) {
        let mut inner = self.inner.borrow_mut();
        if let Some(depth) = inner.write.get(path).copied() {
            if depth <= 1 {
                inner.write.remove(path);
                if let Some(fd) = inner.files.get(path) {
                    FileExt::unlock(fd).ok();
                }
            } else {
                inner.write.insert(path.to_os_string(), depth - 1);
            }
        }
    }

    fn release_read(&self, path: &ffi::OsStr) {
        let mut inner = self.inner.borrow_mut();
        let already_writer = inner.write.get(path).copied().unwrap_or(0) > 0;
        if let Some(depth) = inner.read.get(path).copied() {
            if depth <= 1 {
                inner.read.remove(path);
                if !already_writer {
                    if let Some(fd) = inner.files.get(path) {
                        FileExt::unlock(fd).ok();
                    }
                }
            } else {
                inner.read.insert(path.to_os_string(), depth - 1);
            }
        }
    }
}

impl Default for LockTable {
    fn default() -> Self {
        LockTable::new()
    }
}

/// RAII guard releasing a write lock on drop.
pub struct WriteGuard {
    table: LockTable,
    path: ffi::OsString,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        self.table.release_write(&self.path);
    }
}

/// RAII guard releasing a read lock on drop.
pub struct ReadGuard {
    table: LockTable,
    path: ffi::OsString,
}

impl Drop for ReadGuard {
    fn drop(&mut self) {
        self.table.release_read(&self.path);
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod lock_test;
