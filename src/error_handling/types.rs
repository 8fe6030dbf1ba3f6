//! Error type definitions.
//!
//! This module defines the error types used by each layer: the data-source
//! collaborator, the extractor, the exporter, batch jobs, configuration and
//! start-up.

use std::path::PathBuf;

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the logger with custom message (e.g., file creation).
    #[error("Logger initialization error: {0}")]
    LoggerSetupError(String),
}

/// Error types for configuration problems detected before connecting.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting was not supplied.
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    /// Production mode with an empty or template password.
    #[error("Refusing to run in production mode with a missing or placeholder password")]
    PlaceholderSecret,

    /// A setting has an unusable value.
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Failures reported by a data-source connection.
///
/// The split matters to the extractor: a connectivity failure means the handle
/// itself is unusable, a statement failure only condemns the statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source cannot be reached, authenticated against, or timed out.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The statement was rejected or failed while executing.
    #[error("Statement error: {0}")]
    Statement(String),
}

impl SourceError {
    /// Returns true for failures of the handle rather than of a statement.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SourceError::Connectivity(_))
    }
}

/// Errors returned by [`crate::extract()`].
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The query specification is inconsistent (bad range, bad identifier, ...).
    #[error("Invalid query specification: {0}")]
    InvalidSpec(String),

    /// The connection handle is unusable.
    #[error("Data source unavailable: {0}")]
    Connectivity(#[source] SourceError),

    /// Both the preferred and the fallback query failed.
    ///
    /// The preferred query's error is the source; the fallback error, when a
    /// fallback ran, is kept for diagnostics only.
    #[error("Query failed: {preferred}")]
    Query {
        /// Error of the preferred (enriched) query.
        #[source]
        preferred: SourceError,
        /// Error of the fallback query, if one was attempted.
        fallback: Option<SourceError>,
    },
}

/// Errors returned by [`crate::export()`].
#[derive(Error, Debug)]
pub enum ExportError {
    /// The destination (or its temporary sibling) could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        /// Destination being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Strict mode and the extension maps to no known format.
    #[error("Unsupported export format: {extension:?}")]
    UnsupportedFormat {
        /// Lower-cased extension, empty when the path has none.
        extension: String,
    },

    /// The encoder for the chosen format failed before anything was written.
    #[error("Failed to encode {format} output: {message}")]
    Encode {
        /// Format being produced.
        format: &'static str,
        /// Encoder error text.
        message: String,
    },
}

/// Failure of one job in a batch run.
#[derive(Error, Debug)]
pub enum JobError {
    /// The extraction failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The rows were extracted but could not be written.
    #[error(transparent)]
    Export(#[from] ExportError),
}
