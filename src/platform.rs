/// Host description used for path resolution.
///
/// Everything ambient (OS, home directory, `APPDATA`) is read once here so the
/// rest of the crate resolves paths from plain values.
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::Serialize;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Operating system family. `Linux` covers every Unix that is not macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that path resolution depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnv {
    pub platform: Platform,
    pub home: PathBuf,
    /// Roaming app-data root. Only consulted on Windows; empty when unset.
    pub app_data: String,
}

impl HostEnv {
    pub fn new(platform: Platform, home: impl Into<PathBuf>, app_data: impl Into<String>) -> Self {
        Self {
            platform,
            home: home.into(),
            app_data: app_data.into(),
        }
    }

    /// Read the running process's platform, home directory and `APPDATA`.
    pub fn from_process() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        let app_data = env::var("APPDATA").unwrap_or_default();
        Ok(Self::new(
            Platform::current(),
            base_dirs.home_dir(),
            app_data,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::Windows.to_string(), "windows");
        assert_eq!(Platform::MacOs.to_string(), "macos");
        assert_eq!(Platform::Linux.to_string(), "linux");
    }

    #[test]
    fn test_current_matches_build_target() {
        let current = Platform::current();
        if cfg!(windows) {
            assert_eq!(current, Platform::Windows);
        } else if cfg!(target_os = "macos") {
            assert_eq!(current, Platform::MacOs);
        } else {
            assert_eq!(current, Platform::Linux);
        }
    }

    #[test]
    fn test_new_keeps_empty_app_data() {
        let host = HostEnv::new(Platform::Windows, "C:/Users/a", "");
        assert_eq!(host.app_data, "");
    }
}
