//! Logger initialization.
//!
//! This module provides functions to initialize the logger with custom formatting.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` with custom formatting. Supports both plain text
/// (with colors and emojis) and JSON formats for structured logging.
///
/// The logger reads from the `RUST_LOG` environment variable by default, but
/// the provided `level` parameter will override it. This allows developers to
/// use `RUST_LOG=debug` for quick debugging while still supporting explicit
/// CLI control via `--log-level`.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// # Use RUST_LOG for quick debugging (no CLI args needed)
/// RUST_LOG=debug table_extract --plant S004
///
/// # Per-module filtering via RUST_LOG
/// RUST_LOG=table_extract=debug,sqlx=warn table_extract --plant S004
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = base_builder(level);
    apply_format(&mut builder, format);

    // try_init() so repeated initialization (tests) returns an error instead of panicking
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// Initializes the logger so that every record goes to stderr and to `path`.
///
/// The file is created (or truncated) before the logger is installed. Colors
/// are disabled because the same bytes land in the file.
///
/// # Errors
///
/// Returns `InitializationError::LoggerSetupError` if the file cannot be
/// created, or `InitializationError::LoggerError` if a logger is already installed.
pub fn init_logger_to_file(
    level: LevelFilter,
    format: LogFormat,
    path: &Path,
) -> Result<(), InitializationError> {
    let file = File::create(path).map_err(|e| {
        InitializationError::LoggerSetupError(format!(
            "failed to create log file {}: {e}",
            path.display()
        ))
    })?;
    colored::control::set_override(false);

    let mut builder = base_builder(level);
    apply_format(&mut builder, format);
    builder.target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));

    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

fn base_builder(level: LevelFilter) -> env_logger::Builder {
    // Read from RUST_LOG environment variable first, then override with CLI arg
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("sqlx", LevelFilter::Info);
    builder.filter_module("table_extract", level);
    builder
}

fn apply_format(builder: &mut env_logger::Builder, format: LogFormat) {
    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".into())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };

                let emoji = match level {
                    log::Level::Error => "❌",
                    log::Level::Warn => "⚠️",
                    log::Level::Info => "✔️",
                    log::Level::Debug => "🔍",
                    log::Level::Trace => "🔬",
                };

                writeln!(
                    buf,
                    "{} {} {} [{}] {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    emoji,
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }
}

/// Duplicates log output to stderr and a file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // stderr is best effort; the file is the durable copy
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}
