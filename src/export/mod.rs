//! Export of result sets to files.
//!
//! The format follows the destination's extension (CSV, XLSX or JSON). An
//! unknown extension falls back to CSV with a warning, or fails in strict
//! mode. Content is encoded in memory and then written to a temporary file
//! next to the destination, synced, and renamed into place, so a failed
//! export never leaves a partial file under the destination name.

mod csv;
mod json;
mod types;
mod xlsx;

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error_handling::ExportError;
use crate::extract::ResultSet;
use crate::query::QuerySpec;

pub use types::{ExportFormat, ExportOptions, ExportReport};

/// Exports `result` to `path` with default options (non-strict).
///
/// # Errors
///
/// Returns `ExportError::Io` if the destination cannot be written and
/// `ExportError::Encode` if the encoder fails.
pub fn export(result: &ResultSet, path: &Path) -> Result<ExportReport, ExportError> {
    export_with(result, path, &ExportOptions::default())
}

/// Exports `result` to `path`.
///
/// # Errors
///
/// As [`export`], plus `ExportError::UnsupportedFormat` for an unknown
/// extension when `options.strict` is set.
pub fn export_with(
    result: &ResultSet,
    path: &Path,
    options: &ExportOptions,
) -> Result<ExportReport, ExportError> {
    let format = resolve_format(path, options.strict)?;

    let contents = match format {
        ExportFormat::Csv => csv::render_csv(result)?,
        ExportFormat::Xlsx => xlsx::render_xlsx(result)?,
        ExportFormat::Json => json::render_json(result)?,
    };
    write_atomically(path, &contents)?;

    info!(
        "Saved {} row(s) as {format} to {}",
        result.len(),
        path.display()
    );
    Ok(ExportReport {
        path: path.to_path_buf(),
        format,
        rows: result.len(),
        bytes: contents.len(),
    })
}

/// Picks the format for `path` from its final extension.
///
/// # Errors
///
/// Returns `ExportError::UnsupportedFormat` for an unknown extension when `strict`.
pub fn resolve_format(path: &Path, strict: bool) -> Result<ExportFormat, ExportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ExportFormat::from_extension(&extension) {
        Some(format) => Ok(format),
        None if strict => Err(ExportError::UnsupportedFormat { extension }),
        None => {
            warn!(
                "Unsupported file extension {extension:?} for {}. Defaulting to CSV.",
                path.display()
            );
            Ok(ExportFormat::Csv)
        }
    }
}

/// File name for an extraction when the caller gives none, e.g.
/// `mard_data_S004_20250401_to_20250520.xlsx`. Dates use the layout's date
/// encoding, so a fiscal-year table gives `anep_data_2024_to_2025.xlsx`.
pub fn default_output_path(spec: &QuerySpec, format: ExportFormat) -> PathBuf {
    let mut name = format!("{}_data", spec.layout.table.to_ascii_lowercase());
    if let Some(key) = &spec.key {
        name.push('_');
        name.push_str(&file_name_safe(key));
    }
    if let Some(range) = &spec.date_range {
        // The source's own encoding keeps fiscal-year ranges short (2024_to_2025)
        let (start, end) = range.encode(&spec.layout.date_format);
        name.push('_');
        name.push_str(&file_name_safe(&start));
        name.push_str("_to_");
        name.push_str(&file_name_safe(&end));
    }
    name.push('.');
    name.push_str(format.default_extension());
    PathBuf::from(name)
}

fn file_name_safe(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Writes `contents` to a temporary sibling of `path`, syncs it, then renames
/// it over `path`. The directory must already exist.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Dropped (and deleted) on any early return
    let mut builder = tempfile::Builder::new();
    builder.prefix(".table_extract-").suffix(".tmp");
    #[cfg(unix)]
    {
        // Same mode as a plainly created file (0666 less the umask); tempfile
        // would otherwise make it owner-only
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut temp = builder.tempfile_in(dir).map_err(io_error)?;

    // A replaced file keeps its permissions
    if let Ok(existing) = std::fs::metadata(path) {
        temp.as_file()
            .set_permissions(existing.permissions())
            .map_err(io_error)?;
    }

    temp.write_all(contents).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
