use anyhow::Result;
use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use fresh::check;
use fresh::logging;
use fresh::paths::{EditorPaths, PathKind};
use fresh::platform::HostEnv;
use fresh::{clean_augment_data, clean_workspace_storage, modify_telemetry_ids};

mod service;

#[derive(Parser)]
#[command(name = "fresh")]
#[command(about = "Reset the editor's local telemetry ids, extension state and workspace storage", long_about = None)]
struct Cli {
    /// Do not ask for confirmation before resetting
    #[arg(short, long)]
    yes: bool,

    /// Write logs to this directory (defaults to $FRESH_LOG_DIR, else stderr)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Optional subcommand; without one, all three resets run in sequence
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved editor paths
    Paths,
    /// Check the editor installation without changing anything
    Check,
    /// Run one operation and print its result as a single JSON line
    Service {
        /// modify_telemetry_ids, clean_augment_data, clean_workspace_storage or resolve_paths
        function: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = cli
        .log_dir
        .or_else(|| env::var_os("FRESH_LOG_DIR").map(PathBuf::from));
    logging::init(log_dir.as_deref())?;

    match cli.command {
        Some(Commands::Service { function }) => {
            let paths = HostEnv::from_process().map(EditorPaths::new);
            let code = service::run(function.as_deref(), paths);
            std::process::exit(code);
        }
        Some(Commands::Paths) => {
            let paths = EditorPaths::new(HostEnv::from_process()?);
            print_paths(&paths);
            Ok(())
        }
        Some(Commands::Check) => {
            let paths = EditorPaths::new(HostEnv::from_process()?);
            let report = check::validate(&paths);
            print_validation(&report);
            if !report.is_valid() {
                std::process::exit(1);
            }
            Ok(())
        }
        None => {
            let paths = EditorPaths::new(HostEnv::from_process()?);
            if let Err(e) = run_all(&paths, cli.yes) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn print_paths(paths: &EditorPaths) {
    println!("System Paths:");
    for kind in PathKind::ALL {
        println!("{}: {}", kind.label(), paths.resolve(kind).display());
    }
}

fn print_validation(report: &check::ValidationReport) {
    println!("Platform: {}", report.platform);
    if report.is_valid() {
        println!("Environment check passed.");
    } else {
        println!("Environment check failed:");
        for error in &report.errors {
            println!("  ✗ {}", error);
        }
    }
    for warning in &report.warnings {
        println!("  ⚠ {}", warning);
    }
}

/// Interactive flow: show paths, confirm, then reset the three stores in order.
fn run_all(paths: &EditorPaths, assume_yes: bool) -> Result<()> {
    print_paths(paths);

    if !assume_yes {
        println!();
        println!("Close the editor before continuing. Backups are written next to each target.");
        let confirm = prompt("Proceed? [y/N]: ")?;
        if !matches!(confirm.trim(), "y" | "Y") {
            println!("Reset cancelled.");
            return Ok(());
        }
    }

    println!("\nModifying Telemetry IDs:");
    let telemetry = modify_telemetry_ids(paths)?;
    println!("\nBackup created at:");
    println!("Storage backup path: {}", telemetry.storage_backup_path.display());
    if let Some(backup) = &telemetry.machine_id_backup_path {
        println!("Machine ID backup path: {}", backup.display());
    }
    println!("\nOld IDs:");
    println!("Machine ID: {}", telemetry.old_machine_id);
    println!("Device ID: {}", telemetry.old_device_id);
    println!("\nNew IDs:");
    println!("Machine ID: {}", telemetry.new_machine_id);
    println!("Device ID: {}", telemetry.new_device_id);

    println!("\nCleaning State Database:");
    let db = clean_augment_data(paths)?;
    println!("Database backup created at: {}", db.db_backup_path.display());
    println!(
        "Deleted {} rows containing 'augment' in their keys",
        db.deleted_rows
    );

    println!("\nCleaning Workspace Storage:");
    let ws = clean_workspace_storage(paths)?;
    println!("Workspace backup created at: {}", ws.backup_path.display());
    println!(
        "Deleted {} files from workspace storage",
        ws.deleted_files_count
    );
    if !ws.failed_compressions.is_empty() {
        println!("{} files could not be archived:", ws.failed_compressions.len());
        for failure in &ws.failed_compressions {
            println!("  {}: {}", failure.file.display(), failure.error);
        }
    }
    if !ws.failed_operations.is_empty() {
        println!("{} entries could not be deleted:", ws.failed_operations.len());
        for failure in &ws.failed_operations {
            println!("  {}: {}", failure.path.display(), failure.error);
        }
    }

    println!("\nDone. The editor will start with fresh identifiers.");
    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}
