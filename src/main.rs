//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `table_extract` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate. The binary is
//! synchronous: the data-source adapter runs its own runtime.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use table_extract::initialization::{init_logger_to_file, init_logger_with};
use table_extract::{run_extraction, Config};

fn main() -> Result<()> {
    // Credentials usually live in .env; look next to the executable as well
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    match &config.log_file {
        Some(path) => init_logger_to_file(log_level.into(), log_format, path),
        None => init_logger_with(log_level.into(), log_format),
    }
    .context("Failed to initialize logger")?;

    match run_extraction(&config) {
        Ok(report) => {
            for outcome in &report.outcomes {
                match &outcome.result {
                    Ok(export) => println!(
                        "✅ {}: {} row{} saved to {}{}",
                        outcome.name,
                        export.rows,
                        if export.rows == 1 { "" } else { "s" },
                        export.path.display(),
                        if outcome.degraded {
                            " (without material descriptions)"
                        } else {
                            ""
                        }
                    ),
                    Err(e) => eprintln!("❌ {}: {e}", outcome.name),
                }
            }
            if report.failed() > 0 {
                eprintln!(
                    "table_extract: {} of {} job(s) failed",
                    report.failed(),
                    report.outcomes.len()
                );
                process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("table_extract error: {:#}", e);
            process::exit(1);
        }
    }
}
