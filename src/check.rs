/// Read-only check of the editor installation before anything is reset.
use serde::Serialize;
use std::path::Path;

use crate::paths::EditorPaths;
use crate::platform::Platform;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub platform: Platform,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Missing editor directories are errors; missing target files are warnings,
/// since a fresh installation does not have them yet.
///
/// When a directory is missing the per-file checks are skipped, so the report
/// carries the error plus the general reminders only.
pub fn validate(paths: &EditorPaths) -> ValidationReport {
    let platform = paths.host().platform;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let missing: Vec<String> = [paths.editor_dir(), paths.user_dir(), paths.global_storage_dir()]
        .iter()
        .filter(|dir| !dir.is_dir())
        .map(|dir| dir.display().to_string())
        .collect();
    if missing.is_empty() {
        file_warnings(paths, &mut warnings);
    } else {
        errors.push(format!(
            "Editor installation incomplete. Missing directories: {}",
            missing.join(", ")
        ));
    }

    warnings.push("Make sure the editor is completely closed before resetting.".to_string());
    if paths.global_storage_dir().is_dir() {
        warnings.push(
            "Previous backup files may exist. Cleanup leaves them in place.".to_string(),
        );
    }
    warnings.push(platform_hint(platform).to_string());

    ValidationReport {
        platform,
        errors,
        warnings,
    }
}

fn file_warnings(paths: &EditorPaths, warnings: &mut Vec<String>) {
    for (what, path, is_dir) in [
        ("Preferences file", paths.storage(), false),
        ("State database", paths.database(), false),
        ("Workspace storage directory", paths.workspace_storage(), true),
    ] {
        if !present(&path, is_dir) {
            warnings.push(format!(
                "{} not found at {}. This is normal for new installations.",
                what,
                path.display()
            ));
        }
    }
}

fn platform_hint(platform: Platform) -> &'static str {
    match platform {
        Platform::Windows => {
            "On Windows, run with administrator privileges if you hit permission errors."
        }
        Platform::MacOs => "On macOS, you may need to grant access to the editor's directories.",
        Platform::Linux => {
            "On Linux, make sure your user has write access to the editor's configuration directory."
        }
    }
}

fn present(path: &Path, is_dir: bool) -> bool {
    if is_dir {
        path.is_dir()
    } else {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HostEnv;
    use std::fs;

    fn linux_paths(home: &Path) -> EditorPaths {
        EditorPaths::new(HostEnv::new(Platform::Linux, home, ""))
    }

    #[test]
    fn test_missing_installation_is_invalid() {
        let home = tempfile::tempdir().unwrap();
        let report = validate(&linux_paths(home.path()));
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("globalStorage"));

        // no per-file warnings once the installation itself is missing
        assert_eq!(report.warnings.len(), 2);
        assert!(!report.warnings.iter().any(|w| w.contains("not found")));
        assert!(report.warnings[0].contains("closed"));
        assert!(report.warnings[1].starts_with("On Linux"));
    }

    #[test]
    fn test_complete_installation_has_only_general_reminders() {
        let home = tempfile::tempdir().unwrap();
        let paths = linux_paths(home.path());
        fs::create_dir_all(paths.global_storage_dir()).unwrap();
        fs::create_dir_all(paths.workspace_storage()).unwrap();
        fs::write(paths.storage(), "{}").unwrap();
        fs::write(paths.database(), "").unwrap();

        let report = validate(&paths);
        assert!(report.is_valid());
        assert_eq!(report.platform, Platform::Linux);
        assert_eq!(report.warnings.len(), 3);
        assert!(report.warnings[1].starts_with("Previous backup files"));
    }

    #[test]
    fn test_fresh_install_warns_about_missing_files() {
        let home = tempfile::tempdir().unwrap();
        let paths = linux_paths(home.path());
        fs::create_dir_all(paths.global_storage_dir()).unwrap();

        let report = validate(&paths);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.starts_with("State database")));
        assert_eq!(report.warnings.len(), 6);
    }

    #[test]
    fn test_platform_hint_follows_host() {
        let home = tempfile::tempdir().unwrap();
        let paths = EditorPaths::new(HostEnv::new(Platform::MacOs, home.path(), ""));
        let report = validate(&paths);
        assert!(report.warnings.last().unwrap().starts_with("On macOS"));

        let app_data = home.path().join("AppData").display().to_string();
        let paths = EditorPaths::new(HostEnv::new(Platform::Windows, home.path(), app_data));
        let report = validate(&paths);
        assert!(report.warnings.last().unwrap().contains("administrator"));
    }
}
