/// Workspace storage cleanup
///
/// Archives the whole workspace-storage tree into a sibling zip, then deletes
/// the tree. Both phases are best-effort: a file that cannot be archived or
/// removed is recorded in the report and the walk carries on.
use serde::Serialize;
use std::cmp::Reverse;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::backup::unix_timestamp;
use crate::error::{ResetError, Result};
use crate::paths::EditorPaths;

/// Filesystem primitives used by the archive and delete phases.
pub trait StorageFs {
    fn open_file(&self, path: &Path) -> io::Result<Box<dyn Read>>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
    /// Clear whatever write protection stops `path` from being removed.
    fn make_writable(&self, path: &Path) -> io::Result<()>;
}

/// `StorageFs` backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFs;

impl StorageFs for StdFs {
    fn open_file(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(path)?))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn make_writable(&self, path: &Path) -> io::Result<()> {
        let metadata = fs::symlink_metadata(path)?;
        if metadata.file_type().is_symlink() {
            return Ok(());
        }
        let mut perms = metadata.permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // directories also need read + search to be emptied
            let wanted = if metadata.is_dir() { 0o700 } else { 0o200 };
            let mode = perms.mode();
            if mode & wanted == wanted {
                return Ok(());
            }
            perms.set_mode(mode | wanted);
        }
        #[cfg(not(unix))]
        {
            if !perms.readonly() {
                return Ok(());
            }
            perms.set_readonly(false);
        }
        fs::set_permissions(path, perms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// An entry the delete phase could not remove.
#[derive(Debug, Clone, Serialize)]
pub struct FailedOperation {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: PathBuf,
    pub error: String,
}

/// A file the archive phase could not capture.
#[derive(Debug, Clone, Serialize)]
pub struct FailedCompression {
    pub file: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceReport {
    pub backup_path: PathBuf,
    /// Files present after archiving, before the delete phase.
    pub deleted_files_count: usize,
    pub failed_operations: Vec<FailedOperation>,
    pub failed_compressions: Vec<FailedCompression>,
}

pub fn clean_workspace_storage(paths: &EditorPaths) -> Result<WorkspaceReport> {
    clean_workspace_storage_with(&paths.workspace_storage(), &StdFs)
}

/// Archive `root` to `<root>_backup_<secs>.zip`, then delete it.
///
/// A missing `root` is NotFound and a symlinked `root` is refused. Archive
/// finalisation failures propagate; everything per-entry lands in the report.
pub fn clean_workspace_storage_with(
    root: &Path,
    ops: &dyn StorageFs,
) -> Result<WorkspaceReport> {
    match fs::symlink_metadata(root) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            return Err(ResetError::Io {
                path: root.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "workspace storage root is a symlink",
                ),
            });
        }
        Ok(metadata) if metadata.is_dir() => {}
        _ => {
            return Err(ResetError::NotFound {
                what: "Workspace storage directory",
                path: root.to_path_buf(),
            });
        }
    }

    let backup_path = archive_path_for(root, unix_timestamp());
    let failed_compressions = archive_tree(root, &backup_path, ops)?;
    tracing::info!(
        "Archived {} to {} ({} failures)",
        root.display(),
        backup_path.display(),
        failed_compressions.len()
    );

    // may differ from what was archived if the tree changed meanwhile
    let deleted_files_count = count_files(root);

    let failed_operations = delete_tree(root, ops);
    tracing::info!(
        "Deleted workspace storage at {} ({} files, {} failures)",
        root.display(),
        deleted_files_count,
        failed_operations.len()
    );

    Ok(WorkspaceReport {
        backup_path,
        deleted_files_count,
        failed_operations,
        failed_compressions,
    })
}

/// `<root>_backup_<secs>.zip`, a sibling of `root`.
pub fn archive_path_for(root: &Path, secs: i64) -> PathBuf {
    let mut name = OsString::from(root.as_os_str());
    name.push(format!("_backup_{}.zip", secs));
    PathBuf::from(name)
}

fn archive_tree(
    root: &Path,
    archive_path: &Path,
    ops: &dyn StorageFs,
) -> Result<Vec<FailedCompression>> {
    let file = File::create(archive_path).map_err(|e| ResetError::io(archive_path, e))?;
    let mut zip = ZipWriter::new(file);
    let mut failed = Vec::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                tracing::warn!("Could not walk {}: {}", path.display(), err);
                failed.push(FailedCompression {
                    file: path,
                    error: err.to_string(),
                });
                continue;
            }
        };
        if !entry.path().is_file() {
            continue;
        }
        if let Err(err) = add_file(&mut zip, root, entry.path(), ops) {
            tracing::warn!("Could not archive {}: {}", entry.path().display(), err);
            failed.push(FailedCompression {
                file: entry.path().to_path_buf(),
                error: err.to_string(),
            });
        }
    }

    zip.finish().map_err(|source| ResetError::Archive {
        path: archive_path.to_path_buf(),
        source,
    })?;
    Ok(failed)
}

fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    root: &Path,
    path: &Path,
    ops: &dyn StorageFs,
) -> io::Result<()> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // open first so an unreadable file never leaves an empty entry
    let mut reader = ops.open_file(path)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(entry_name(relative), options)
        .map_err(io::Error::other)?;
    io::copy(&mut reader, zip)?;
    Ok(())
}

/// Archive entry name: path components joined with `/`.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn count_files(root: &Path) -> usize {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .count()
}

/// Bulk force delete first; if anything survives, go entry by entry.
fn delete_tree(root: &Path, ops: &dyn StorageFs) -> Vec<FailedOperation> {
    if force_remove(root, ops) {
        return Vec::new();
    }
    tracing::warn!(
        "Bulk delete of {} left entries behind, removing them one by one",
        root.display()
    );

    let mut failed = Vec::new();
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        } else {
            files.push(entry.into_path());
        }
    }

    for file in files {
        let result = ops
            .make_writable(&file)
            .and_then(|()| ops.remove_file(&file));
        match result {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Could not delete file {}: {}", file.display(), e);
                failed.push(FailedOperation {
                    kind: EntryKind::File,
                    path: file,
                    error: e.to_string(),
                });
            }
        }
    }

    // deepest first so children go before their parents
    dirs.sort_by_key(|dir| Reverse(dir.components().count()));
    for dir in dirs {
        if force_remove(&dir, ops) {
            continue;
        }
        match ops.remove_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Could not delete directory {}: {}", dir.display(), e);
                failed.push(FailedOperation {
                    kind: EntryKind::Directory,
                    path: dir,
                    error: e.to_string(),
                });
            }
        }
    }

    failed
}

/// Recursively remove `top`, clearing write protection on anything that
/// resists. Keeps going past failures; returns true when `top` is gone.
fn force_remove(top: &Path, ops: &dyn StorageFs) -> bool {
    remove_entry(top, top, ops)
}

fn remove_entry(path: &Path, top: &Path, ops: &dyn StorageFs) -> bool {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
        Err(e) => {
            tracing::debug!("Could not stat {}: {}", path.display(), e);
            return false;
        }
    };

    if !metadata.is_dir() {
        return remove_with_retry(path, top, ops, |p| ops.remove_file(p));
    }

    let mut emptied = true;
    match read_dir_forced(path, ops) {
        Ok(entries) => {
            for entry in entries {
                match entry {
                    Ok(entry) => emptied &= remove_entry(&entry.path(), top, ops),
                    Err(e) => {
                        tracing::debug!("Could not read entry in {}: {}", path.display(), e);
                        emptied = false;
                    }
                }
            }
        }
        Err(e) => {
            tracing::debug!("Could not list {}: {}", path.display(), e);
            emptied = false;
        }
    }

    emptied && remove_with_retry(path, top, ops, |p| ops.remove_dir(p))
}

fn read_dir_forced(path: &Path, ops: &dyn StorageFs) -> io::Result<fs::ReadDir> {
    match fs::read_dir(path) {
        Ok(entries) => Ok(entries),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            ops.make_writable(path)?;
            fs::read_dir(path)
        }
        Err(e) => Err(e),
    }
}

/// Try `remove`; on failure clear write protection on the entry and, inside
/// `top`, on its parent, then try once more.
fn remove_with_retry(
    path: &Path,
    top: &Path,
    ops: &dyn StorageFs,
    remove: impl Fn(&Path) -> io::Result<()>,
) -> bool {
    let first = match remove(path) {
        Ok(()) => return true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
        Err(e) => e,
    };
    tracing::debug!("Retrying removal of {} after: {}", path.display(), first);

    let _ = ops.make_writable(path);
    if let Some(parent) = path.parent().filter(|p| p.starts_with(top)) {
        let _ = ops.make_writable(parent);
    }

    match remove(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::debug!("Could not remove {}: {}", path.display(), e);
            false
        }
    }
}
