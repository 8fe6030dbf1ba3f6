//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, encodings, limits)
//! - Command-line options ([`Config`])
//! - Log option types used by the CLI
//! - Connection settings and their validation

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use cli::Config;
pub use types::{ConnectionSettings, LogFormat, LogLevel, RunMode};
