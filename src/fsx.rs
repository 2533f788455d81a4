//! Filesystem helpers shared by placement and recovery.
//!
//! Staged files live in the system temp directory, which is often a different
//! filesystem than the destination, so moves fall back to copy + remove.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Moves the regular file `src` to `dst`, replacing `dst` if it is a file.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!(src = %src.display(), dst = %dst.display(), "rename crossed filesystems, copying");
            fs::copy(src, dst)?;
            fs::remove_file(src)
        }
        Err(e) => Err(e),
    }
}

fn is_cross_device(e: &io::Error) -> bool {
    #[cfg(unix)]
    {
        // EXDEV
        e.raw_os_error() == Some(18)
    }
    #[cfg(windows)]
    {
        // ERROR_NOT_SAME_DEVICE
        e.raw_os_error() == Some(17)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = e;
        false
    }
}

/// Returns `path` if nothing exists there, else the first free `path.1`, `path.2`, ...
pub fn first_free_path(path: &Path) -> PathBuf {
    if fs::symlink_metadata(path).is_err() {
        return path.to_path_buf();
    }
    let mut n = 1u32;
    loop {
        let mut name = path.as_os_str().to_os_string();
        name.push(format!(".{}", n));
        let candidate = PathBuf::from(name);
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        n += 1;
    }
}
