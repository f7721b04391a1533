/// Telemetry identifier rewrite for the preferences file and machine-id file.
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backup::backup_file;
use crate::error::{ResetError, Result};
use crate::ids::{generate_device_id, generate_machine_id};
use crate::paths::EditorPaths;

pub const MACHINE_ID_KEY: &str = "telemetry.machineId";
pub const DEVICE_ID_KEY: &str = "telemetry.devDeviceId";

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryReport {
    pub old_machine_id: String,
    pub new_machine_id: String,
    pub old_device_id: String,
    pub new_device_id: String,
    pub storage_backup_path: PathBuf,
    /// `None` when there was no machine-id file to back up.
    pub machine_id_backup_path: Option<PathBuf>,
}

/// Replace both telemetry ids in the preferences file and rewrite the machine-id file.
///
/// The machine-id file receives the new *device* id. Nothing is written, not
/// even a backup, when the preferences file is missing.
pub fn modify_telemetry_ids(paths: &EditorPaths) -> Result<TelemetryReport> {
    rewrite_telemetry_ids(&paths.storage(), &paths.machine_id())
}

/// Same as `modify_telemetry_ids`, with explicit file locations.
pub fn rewrite_telemetry_ids(
    storage_path: &Path,
    machine_id_path: &Path,
) -> Result<TelemetryReport> {
    if !storage_path.exists() {
        return Err(ResetError::NotFound {
            what: "Storage file",
            path: storage_path.to_path_buf(),
        });
    }

    let storage_backup_path = backup_file(storage_path)?;
    let machine_id_backup_path = if machine_id_path.exists() {
        Some(backup_file(machine_id_path)?)
    } else {
        None
    };

    let mut data = read_object(storage_path)?;
    let old_machine_id = string_field(&data, MACHINE_ID_KEY);
    let old_device_id = string_field(&data, DEVICE_ID_KEY);

    let new_machine_id = generate_machine_id();
    let new_device_id = generate_device_id();

    data.insert(MACHINE_ID_KEY.to_string(), Value::String(new_machine_id.clone()));
    data.insert(DEVICE_ID_KEY.to_string(), Value::String(new_device_id.clone()));

    write_object(storage_path, &data)?;
    fs::write(machine_id_path, &new_device_id).map_err(|e| ResetError::io(machine_id_path, e))?;

    tracing::info!(
        "Rewrote telemetry ids in {} and {}",
        storage_path.display(),
        machine_id_path.display()
    );

    Ok(TelemetryReport {
        old_machine_id,
        new_machine_id,
        old_device_id,
        new_device_id,
        storage_backup_path,
        machine_id_backup_path,
    })
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path).map_err(|e| ResetError::io(path, e))?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ResetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ResetError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Serialize with 4-space indentation and overwrite `path`.
fn write_object(path: &Path, data: &Map<String, Value>) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut ser).map_err(|source| ResetError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, buf).map_err(|e| ResetError::io(path, e))
}

fn string_field(data: &Map<String, Value>, key: &str) -> String {
    match data.get(key) {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(storage: Option<&str>, machine_id: Option<&str>) -> (TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let storage_path = dir.path().join("storage.json");
        let machine_id_path = dir.path().join("machineid");
        if let Some(s) = storage {
            fs::write(&storage_path, s).unwrap();
        }
        if let Some(m) = machine_id {
            fs::write(&machine_id_path, m).unwrap();
        }
        (dir, storage_path, machine_id_path)
    }

    fn read_json(path: &Path) -> Map<String, Value> {
        read_object(path).unwrap()
    }

    #[test]
    fn test_rewrites_ids_and_keeps_other_keys() {
        let (_dir, storage, machine_id) = fixture(
            Some(r#"{"telemetry.machineId":"old-m","telemetry.devDeviceId":"old-d","other.key":"keep"}"#),
            Some("old-file-id"),
        );

        let report = rewrite_telemetry_ids(&storage, &machine_id).unwrap();
        assert_eq!(report.old_machine_id, "old-m");
        assert_eq!(report.old_device_id, "old-d");
        assert_ne!(report.new_machine_id, "old-m");
        assert_ne!(report.new_device_id, "old-d");

        let data = read_json(&storage);
        assert_eq!(data["other.key"], "keep");
        assert_eq!(data[MACHINE_ID_KEY], report.new_machine_id.as_str());
        assert_eq!(data[DEVICE_ID_KEY], report.new_device_id.as_str());

        assert_eq!(fs::read_to_string(&machine_id).unwrap(), report.new_device_id);
        let mid_backup = report.machine_id_backup_path.unwrap();
        assert_eq!(fs::read_to_string(mid_backup).unwrap(), "old-file-id");
        assert!(fs::read_to_string(report.storage_backup_path)
            .unwrap()
            .contains("old-m"));
    }

    #[test]
    fn test_output_uses_four_space_indent() {
        let (_dir, storage, machine_id) = fixture(Some(r#"{"a":1}"#), None);
        rewrite_telemetry_ids(&storage, &machine_id).unwrap();
        let text = fs::read_to_string(&storage).unwrap();
        assert!(text.starts_with("{\n    \"a\": 1,"), "got: {}", text);
    }

    #[test]
    fn test_large_numbers_survive_rewrite() {
        let (_dir, storage, machine_id) = fixture(
            Some(r#"{"big":123456789012345678901234567890,"neg":-98765432109876543210,"ratio":0.1000000000000000055511151231257827}"#),
            None,
        );
        rewrite_telemetry_ids(&storage, &machine_id).unwrap();

        let text = fs::read_to_string(&storage).unwrap();
        assert!(text.contains("\"big\": 123456789012345678901234567890,"), "got: {}", text);
        assert!(text.contains("\"neg\": -98765432109876543210,"), "got: {}", text);
        assert!(text.contains("0.1000000000000000055511151231257827"), "got: {}", text);
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let (_dir, storage, machine_id) = fixture(Some("{}"), None);
        let report = rewrite_telemetry_ids(&storage, &machine_id).unwrap();
        assert_eq!(report.old_machine_id, "");
        assert_eq!(report.old_device_id, "");
    }

    #[test]
    fn test_missing_machine_id_file_has_no_backup() {
        let (_dir, storage, machine_id) = fixture(Some("{}"), None);
        let report = rewrite_telemetry_ids(&storage, &machine_id).unwrap();
        assert!(report.machine_id_backup_path.is_none());
        assert_eq!(fs::read_to_string(&machine_id).unwrap(), report.new_device_id);
    }

    #[test]
    fn test_missing_storage_is_not_found_without_side_effects() {
        let (dir, storage, machine_id) = fixture(None, Some("keep-me"));
        let err = rewrite_telemetry_ids(&storage, &machine_id).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fs::read_to_string(&machine_id).unwrap(), "keep-me");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_malformed_json_fails_after_backup() {
        let (_dir, storage, machine_id) = fixture(Some("{not json"), None);
        let err = rewrite_telemetry_ids(&storage, &machine_id).unwrap_err();
        assert!(matches!(err, ResetError::Json { .. }));
        assert_eq!(fs::read_to_string(&storage).unwrap(), "{not json");
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let (_dir, storage, machine_id) = fixture(Some("[1, 2]"), None);
        let err = rewrite_telemetry_ids(&storage, &machine_id).unwrap_err();
        assert!(matches!(err, ResetError::NotAnObject { .. }));
    }
}
