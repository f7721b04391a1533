/// Single-operation entry point for callers that want machine-readable output.
///
/// Prints exactly one JSON line: the operation's report, or `{"error": ...}`.
use anyhow::{bail, Result};
use serde_json::{json, Value};

use fresh::paths::EditorPaths;
use fresh::{clean_augment_data, clean_workspace_storage, modify_telemetry_ids};

pub const USAGE: &str = "Usage: fresh service <function_name>";

/// Run `function` and print its JSON line. Returns the process exit code.
pub fn run(function: Option<&str>, paths: Result<EditorPaths>) -> i32 {
    let Some(name) = function else {
        emit(&json!({ "error": USAGE }));
        return 1;
    };

    match paths.and_then(|paths| dispatch(name, &paths)) {
        Ok(value) => {
            emit(&value);
            0
        }
        Err(e) => {
            tracing::warn!("Service call {} failed: {:#}", name, e);
            emit(&json!({ "error": e.to_string() }));
            1
        }
    }
}

fn dispatch(name: &str, paths: &EditorPaths) -> Result<Value> {
    let value = match name {
        "modify_telemetry_ids" => serde_json::to_value(modify_telemetry_ids(paths)?)?,
        "clean_augment_data" => serde_json::to_value(clean_augment_data(paths)?)?,
        "clean_workspace_storage" => serde_json::to_value(clean_workspace_storage(paths)?)?,
        "resolve_paths" => serde_json::to_value(paths.resolve_all())?,
        other => bail!("Unknown function: {}", other),
    };
    Ok(value)
}

fn emit(value: &Value) {
    println!("{}", value);
}
