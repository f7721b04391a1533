/// Logging setup for the `fresh` binary.
///
/// With a log directory, everything goes to `{log_dir}/fresh.log` and each run
/// starts with a separator. Without one, warnings go to stderr so stdout stays
/// free for reports and service JSON.
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_NAME: &str = "fresh.log";

/// Initializes tracing. `RUST_LOG` overrides the default level either way.
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    match log_dir {
        Some(dir) => init_file_logging(dir),
        None => {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time();
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()
                .ok(); // Ignore error if already initialized
            Ok(())
        }
    }
}

fn init_file_logging(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    // Write session separator before the appender starts writing
    let separator = format!(
        "\n{sep}\n[{ts}] New reset session\n{sep}\n",
        sep = "=".repeat(80),
        ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    );
    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE_NAME))
    {
        let _ = writeln!(file, "{}", separator);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_line_number(true);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok();

    tracing::info!("Logging initialized in {}", log_dir.display());
    Ok(())
}
