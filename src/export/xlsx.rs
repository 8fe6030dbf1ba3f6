//! XLSX encoding.
//!
//! One worksheet, header row of column names, one row per record, no styling.
//! Integers and floats become numeric cells, NULL leaves the cell empty.
//! Integers beyond 2^53 cannot be stored exactly in a numeric cell and are
//! written as text instead.

use rust_xlsxwriter::{Workbook, XlsxError};

use crate::config::SHEET_NAME;
use crate::error_handling::ExportError;
use crate::extract::ResultSet;
use crate::source::Value;

/// Encodes `result` as an XLSX workbook.
///
/// # Errors
///
/// Returns `ExportError::Encode` if the result exceeds worksheet limits
/// (1,048,576 rows or 16,384 columns) or the workbook cannot be assembled.
pub(crate) fn render_xlsx(result: &ResultSet) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME).map_err(encode_error)?;

        for (col, name) in result.columns().iter().enumerate() {
            worksheet
                .write_string(0, column_number(col)?, name.as_str())
                .map_err(encode_error)?;
        }

        for (index, row) in result.rows().iter().enumerate() {
            let row_num = row_number(index + 1)?;
            for (col, value) in row.iter().enumerate() {
                let col = column_number(col)?;
                let written = match value {
                    Value::Null => continue,
                    Value::Bool(b) => worksheet.write_boolean(row_num, col, *b),
                    Value::Int(i) => match exact_number(*i) {
                        Some(n) => worksheet.write_number(row_num, col, n),
                        None => worksheet.write_string(row_num, col, i.to_string()),
                    },
                    Value::Float(x) => worksheet.write_number(row_num, col, *x),
                    Value::Text(s) => worksheet.write_string(row_num, col, s.as_str()),
                    Value::Bytes(_) => worksheet.write_string(row_num, col, value.to_string()),
                };
                written.map_err(encode_error)?;
            }
        }
    }

    workbook.save_to_buffer().map_err(encode_error)
}

/// Largest magnitude an f64 holds without losing integer precision.
const MAX_EXACT_INTEGER: i64 = 1 << 53;

/// `i` as a cell number, or `None` when the conversion would round it.
fn exact_number(i: i64) -> Option<f64> {
    (-MAX_EXACT_INTEGER..=MAX_EXACT_INTEGER)
        .contains(&i)
        .then_some(i as f64)
}

fn row_number(index: usize) -> Result<u32, ExportError> {
    u32::try_from(index).map_err(|_| ExportError::Encode {
        format: "xlsx",
        message: format!("row {index} exceeds worksheet limits"),
    })
}

fn column_number(index: usize) -> Result<u16, ExportError> {
    u16::try_from(index).map_err(|_| ExportError::Encode {
        format: "xlsx",
        message: format!("column {index} exceeds worksheet limits"),
    })
}

fn encode_error(err: XlsxError) -> ExportError {
    ExportError::Encode {
        format: "xlsx",
        message: err.to_string(),
    }
}
