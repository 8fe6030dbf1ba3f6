//! Application initialization.
//!
//! Logger setup for the CLI and for library users that want the same output
//! format. Initialization functions return typed errors instead of panicking.

mod logger;

// Re-export public API
pub use logger::{init_logger_to_file, init_logger_with};
