//! CSV encoding.
//!
//! Header row of column names, one record per row. NULL becomes an empty
//! field; other values use their plain text form.

use csv::Writer;

use crate::error_handling::ExportError;
use crate::extract::ResultSet;

/// Encodes `result` as CSV.
///
/// # Errors
///
/// Returns `ExportError::Encode` if the CSV writer rejects a record.
pub(crate) fn render_csv(result: &ResultSet) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::from_writer(Vec::new());

    writer.write_record(result.columns()).map_err(encode_error)?;
    for row in result.rows() {
        writer
            .write_record(row.iter().map(|value| value.to_string()))
            .map_err(encode_error)?;
    }

    writer.into_inner().map_err(|e| ExportError::Encode {
        format: "csv",
        message: e.to_string(),
    })
}

fn encode_error(err: csv::Error) -> ExportError {
    ExportError::Encode {
        format: "csv",
        message: err.to_string(),
    }
}
