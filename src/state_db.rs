/// Key/value state database cleanup
///
/// Removes extension rows from the editor's `ItemTable` after backing up the
/// database file.
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::backup::backup_file;
use crate::error::{ResetError, Result};
use crate::paths::EditorPaths;

/// Substring removed by `clean_augment_data`.
pub const AUGMENT_PATTERN: &str = "augment";

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseReport {
    pub db_backup_path: PathBuf,
    pub deleted_rows: usize,
}

/// Delete every `ItemTable` row whose key contains `augment` (case-sensitive).
pub fn clean_augment_data(paths: &EditorPaths) -> Result<DatabaseReport> {
    clean_matching_keys(&paths.database(), AUGMENT_PATTERN)
}

/// Back up `db_path`, then delete rows whose key contains `pattern`.
///
/// A missing database surfaces as NotFound from the backup step. The
/// connection is dropped on every exit path.
pub fn clean_matching_keys(db_path: &Path, pattern: &str) -> Result<DatabaseReport> {
    let db_backup_path = backup_file(db_path)?;

    let db_err = |source: rusqlite::Error| ResetError::Database {
        path: db_path.to_path_buf(),
        source,
    };

    let mut conn = Connection::open(db_path).map_err(db_err)?;
    let deleted_rows = {
        let tx = conn.transaction().map_err(db_err)?;
        // GLOB, not LIKE: LIKE ignores ASCII case
        let deleted = tx
            .execute(
                "DELETE FROM ItemTable WHERE key GLOB ?1",
                params![substring_glob(pattern)],
            )
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        deleted
    };
    conn.close().map_err(|(_, source)| db_err(source))?;

    tracing::info!(
        "Deleted {} rows matching '{}' from {}",
        deleted_rows,
        pattern,
        db_path.display()
    );

    Ok(DatabaseReport {
        db_backup_path,
        deleted_rows,
    })
}

/// `*<pattern>*` with GLOB metacharacters in `pattern` matched literally.
fn substring_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len() + 2);
    glob.push('*');
    for c in pattern.chars() {
        match c {
            '*' | '?' | '[' => {
                glob.push('[');
                glob.push(c);
                glob.push(']');
            }
            _ => glob.push(c),
        }
    }
    glob.push('*');
    glob
}
