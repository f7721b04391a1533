// Library exports for the binary and tests
pub mod backup;
pub mod check;
pub mod error;
pub mod ids;
pub mod logging;
pub mod paths;
pub mod platform;
pub mod state_db;
pub mod telemetry;
pub mod workspace;

pub use error::{ResetError, Result};
pub use paths::{EditorPaths, PathKind};
pub use platform::{HostEnv, Platform};
pub use state_db::clean_augment_data;
pub use telemetry::modify_telemetry_ids;
pub use workspace::clean_workspace_storage;
