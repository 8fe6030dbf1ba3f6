//! Export types and options.

use std::fmt;
use std::path::PathBuf;

use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Export format options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter)]
pub enum ExportFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Single-sheet XLSX workbook with a header row
    Xlsx,
    /// JSON array of objects, one per row
    Json,
}

impl ExportFormat {
    /// File extensions (lower-case, without dot) that select this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ExportFormat::Csv => &["csv"],
            ExportFormat::Xlsx => &["xlsx"],
            ExportFormat::Json => &["json"],
        }
    }

    /// Canonical extension used when generating file names.
    pub fn default_extension(self) -> &'static str {
        self.extensions()[0]
    }

    /// Looks up the format for an extension, case-insensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        Self::iter().find(|f| f.extensions().contains(&extension.as_str()))
    }

    /// Short name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for exporting data.
#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    /// Fail on an unrecognized extension instead of falling back to CSV.
    pub strict: bool,
}

/// What an export call wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReport {
    /// Destination path.
    pub path: PathBuf,
    /// Format actually written.
    pub format: ExportFormat,
    /// Number of data rows (header excluded).
    pub rows: usize,
    /// Size of the written file in bytes.
    pub bytes: usize,
}
