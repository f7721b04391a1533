/// Timestamped sibling backups taken before a file is mutated.
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ResetError, Result};

/// Current unix time in whole seconds.
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// `<path>.bak.<secs>`
pub fn backup_path_for(path: &Path, secs: i64) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".bak.{}", secs));
    PathBuf::from(name)
}

/// Copy `path` to `<path>.bak.<now>` and return the backup's path.
///
/// Content and permission bits are copied, then the modification time is
/// carried over. An existing backup with the same name is overwritten.
pub fn backup_file(path: &Path) -> Result<PathBuf> {
    let metadata = fs::metadata(path).map_err(|e| ResetError::io(path, e))?;
    if !metadata.is_file() {
        return Err(ResetError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "backup source is not a regular file",
            ),
        });
    }

    let backup_path = backup_path_for(path, unix_timestamp());
    fs::copy(path, &backup_path).map_err(|e| ResetError::io(&backup_path, e))?;

    if let Ok(modified) = metadata.modified() {
        // Windows needs a writable handle to touch file times
        let handle = fs::OpenOptions::new()
            .read(true)
            .write(cfg!(windows))
            .open(&backup_path);
        match handle.and_then(|f| f.set_modified(modified)) {
            Ok(()) => {}
            Err(e) => tracing::warn!(
                "Could not preserve modification time on {}: {}",
                backup_path.display(),
                e
            ),
        }
    }

    tracing::info!("Backed up {} to {}", path.display(), backup_path.display());
    Ok(backup_path)
}
