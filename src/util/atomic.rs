//! Atomic publish: serialize to a temp file, fsync, rename over the
//! target. Used by weave writes, reconcile's inventory-weave swap and
//! pack-names publication so that a crash at any point leaves the
//! previous, consistent file in place.

use std::{ffi, fs, path::PathBuf};

use crate::{err_at, util, Error, Result};

/// Write `data` to `path` via a sibling `<name>.tmp-<pid>` file, fsync,
/// then rename into place. `path`'s parent directories are created if
/// missing. On any failure the temp file is removed and `path` is left
/// untouched.
pub fn publish(path: &ffi::OsStr, data: &[u8]) -> Result<()> {
    let dst = PathBuf::from(path);
    let parent = dst.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    err_at!(IoError, fs::create_dir_all(&parent))?;

    let tmp_name = format!(
        "{}.tmp-{}",
        dst.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        std::process::id()
    );
    let tmp = parent.join(tmp_name);

    let write_result = (|| -> Result<()> {
        let mut fd = util::create_file_a(tmp.as_os_str())?;
        util::sync_write(&mut fd, data)?;
        Ok(())
    })();

    match write_result {
        Ok(()) => err_at!(IoError, fs::rename(&tmp, &dst)),
        Err(err) => {
            fs::remove_file(&tmp).ok();
            Err(err)
        }
    }
}
