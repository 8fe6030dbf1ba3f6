//! Utilities for sanitizing database error messages.
//!
//! Drivers sometimes echo raw statement text or binary fragments back in their
//! error messages. These helpers remove control characters and cap the length
//! before a message is logged or stored in an error value.

use crate::config::MAX_ERROR_MESSAGE_LENGTH;

/// Sanitizes an error message by removing control characters.
///
/// Newline, tab and carriage return are kept; other characters below 0x20 are
/// dropped. Non-ASCII text is preserved.
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| {
            let code = *c as u32;
            code >= 0x20 // Printable ASCII starts at 0x20 (space)
                || code == 0x09 // Tab
                || code == 0x0A // Newline
                || code == 0x0D // Carriage return
        })
        .collect()
}

/// Sanitizes and truncates an error message to `MAX_ERROR_MESSAGE_LENGTH` bytes.
///
/// Truncation happens on a character boundary and appends a marker with the
/// original length.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);

    if sanitized.len() > MAX_ERROR_MESSAGE_LENGTH {
        // Leave room for the truncation marker
        let mut truncate_len = MAX_ERROR_MESSAGE_LENGTH.saturating_sub(50);
        while !sanitized.is_char_boundary(truncate_len) {
            truncate_len -= 1;
        }
        format!(
            "{}... (truncated, original length: {} chars)",
            &sanitized[..truncate_len],
            sanitized.len()
        )
    } else {
        sanitized
    }
}
