/// Locations of the editor's identity and state files.
use serde::Serialize;
use std::path::PathBuf;

use crate::platform::{HostEnv, Platform};

const EDITOR_DIR: &str = "Code";

/// The six locations the resolver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Home,
    AppData,
    Storage,
    Database,
    MachineId,
    WorkspaceStorage,
}

impl PathKind {
    pub const ALL: [PathKind; 6] = [
        PathKind::Home,
        PathKind::AppData,
        PathKind::Storage,
        PathKind::Database,
        PathKind::MachineId,
        PathKind::WorkspaceStorage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "Home Directory",
            Self::AppData => "App Data Directory",
            Self::Storage => "Storage Path",
            Self::Database => "DB Path",
            Self::MachineId => "Machine ID Path",
            Self::WorkspaceStorage => "Workspace Storage Path",
        }
    }
}

/// Path resolver bound to one host description.
#[derive(Debug, Clone)]
pub struct EditorPaths {
    host: HostEnv,
}

/// Every resolved location, for display and the `paths` service output.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPaths {
    pub home_dir: PathBuf,
    pub app_data_dir: PathBuf,
    pub storage_path: PathBuf,
    pub db_path: PathBuf,
    pub machine_id_path: PathBuf,
    pub workspace_storage_path: PathBuf,
}

impl EditorPaths {
    pub fn new(host: HostEnv) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &HostEnv {
        &self.host
    }

    /// Resolve one location. Pure: nothing is checked on disk.
    pub fn resolve(&self, kind: PathKind) -> PathBuf {
        match kind {
            PathKind::Home => self.host.home.clone(),
            PathKind::AppData => self.app_data_root(),
            PathKind::Storage => self.global_storage_dir().join("storage.json"),
            PathKind::Database => self.global_storage_dir().join("state.vscdb"),
            PathKind::MachineId => match self.host.platform {
                // macOS keeps it next to User/, not inside it
                Platform::MacOs => self.editor_dir().join("machineid"),
                Platform::Windows | Platform::Linux => self.user_dir().join("machineid"),
            },
            PathKind::WorkspaceStorage => self.user_dir().join("workspaceStorage"),
        }
    }

    pub fn storage(&self) -> PathBuf {
        self.resolve(PathKind::Storage)
    }

    pub fn database(&self) -> PathBuf {
        self.resolve(PathKind::Database)
    }

    pub fn machine_id(&self) -> PathBuf {
        self.resolve(PathKind::MachineId)
    }

    pub fn workspace_storage(&self) -> PathBuf {
        self.resolve(PathKind::WorkspaceStorage)
    }

    pub fn resolve_all(&self) -> ResolvedPaths {
        ResolvedPaths {
            home_dir: self.resolve(PathKind::Home),
            app_data_dir: self.resolve(PathKind::AppData),
            storage_path: self.storage(),
            db_path: self.database(),
            machine_id_path: self.machine_id(),
            workspace_storage_path: self.workspace_storage(),
        }
    }

    /// `<base>/Code`
    pub fn editor_dir(&self) -> PathBuf {
        self.config_base().join(EDITOR_DIR)
    }

    /// `<base>/Code/User`
    pub fn user_dir(&self) -> PathBuf {
        self.editor_dir().join("User")
    }

    /// `<base>/Code/User/globalStorage`
    pub fn global_storage_dir(&self) -> PathBuf {
        self.user_dir().join("globalStorage")
    }

    /// Base directory the editor's files live under.
    fn config_base(&self) -> PathBuf {
        match self.host.platform {
            Platform::Windows => PathBuf::from(&self.host.app_data),
            Platform::MacOs => self.host.home.join("Library").join("Application Support"),
            Platform::Linux => self.host.home.join(".config"),
        }
    }

    /// Generic app-data root. Differs from `config_base` on Linux.
    fn app_data_root(&self) -> PathBuf {
        match self.host.platform {
            Platform::Linux => self.host.home.join(".local").join("share"),
            Platform::Windows | Platform::MacOs => self.config_base(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn linux() -> EditorPaths {
        EditorPaths::new(HostEnv::new(Platform::Linux, "/home/ada", ""))
    }

    fn macos() -> EditorPaths {
        EditorPaths::new(HostEnv::new(Platform::MacOs, "/Users/ada", ""))
    }

    fn windows(app_data: &str) -> EditorPaths {
        EditorPaths::new(HostEnv::new(Platform::Windows, "C:/Users/ada", app_data))
    }

    #[test]
    fn test_linux_paths() {
        let p = linux();
        let base = Path::new("/home/ada/.config/Code/User");
        assert_eq!(p.resolve(PathKind::Home), Path::new("/home/ada"));
        assert_eq!(p.resolve(PathKind::AppData), Path::new("/home/ada/.local/share"));
        assert_eq!(p.storage(), base.join("globalStorage").join("storage.json"));
        assert_eq!(p.database(), base.join("globalStorage").join("state.vscdb"));
        assert_eq!(p.machine_id(), base.join("machineid"));
        assert_eq!(p.workspace_storage(), base.join("workspaceStorage"));
    }

    #[test]
    fn test_macos_machine_id_skips_user_dir() {
        let p = macos();
        let code = Path::new("/Users/ada/Library/Application Support/Code");
        assert_eq!(p.machine_id(), code.join("machineid"));
        assert_eq!(p.storage(), code.join("User/globalStorage/storage.json"));
        assert_eq!(
            p.resolve(PathKind::AppData),
            Path::new("/Users/ada/Library/Application Support")
        );
    }

    #[test]
    fn test_windows_uses_app_data() {
        let p = windows("C:/Users/ada/AppData/Roaming");
        let user = Path::new("C:/Users/ada/AppData/Roaming/Code/User");
        assert_eq!(p.machine_id(), user.join("machineid"));
        assert_eq!(p.workspace_storage(), user.join("workspaceStorage"));
        assert_eq!(
            p.resolve(PathKind::AppData),
            Path::new("C:/Users/ada/AppData/Roaming")
        );
    }

    #[test]
    fn test_windows_empty_app_data_gives_relative_paths() {
        let p = windows("");
        assert_eq!(p.resolve(PathKind::AppData), PathBuf::new());
        assert_eq!(
            p.storage(),
            Path::new("Code/User/globalStorage/storage.json")
        );
        assert!(p.database().is_relative());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        for p in [linux(), macos(), windows("X:/roam")] {
            for kind in PathKind::ALL {
                assert_eq!(p.resolve(kind), p.resolve(kind));
            }
        }
    }
}
