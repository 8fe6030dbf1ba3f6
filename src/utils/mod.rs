//! Utility functions.
//!
//! This module provides string sanitization for database error messages.

pub mod sanitize;

pub use sanitize::sanitize_and_truncate_error_message;
