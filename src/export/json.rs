//! JSON encoding: an array with one object per row, keys in column order.

use crate::error_handling::ExportError;
use crate::extract::{Record, ResultSet};

/// Encodes `result` as a JSON array of objects.
///
/// # Errors
///
/// Returns `ExportError::Encode` if serialization fails.
pub(crate) fn render_json(result: &ResultSet) -> Result<Vec<u8>, ExportError> {
    let records: Vec<Record<'_>> = result.records().collect();
    serde_json::to_vec(&records).map_err(|e| ExportError::Encode {
        format: "json",
        message: e.to_string(),
    })
}
