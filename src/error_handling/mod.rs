//! Error handling.
//!
//! Errors are split by layer:
//! - **Source**: the connection failed or a statement failed
//! - **Extract**: invalid spec, unusable handle, or both queries failed
//! - **Export**: unwritable destination, unsupported format, encoder failure
//! - **Job**: either of the above, for one job of a batch
//! - **Config / Initialization**: problems found before any work starts

mod types;

// Re-export public API
pub use types::{
    ConfigError, ExportError, ExtractError, InitializationError, JobError, SourceError,
};
