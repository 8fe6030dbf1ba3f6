//! Data-source collaborator.
//!
//! The extractor only needs a small, blocking capability from the database:
//! check the handle, execute a parameterized statement, read back column names
//! and rows, close. [`SourceConnection`] is that capability; [`SqliteSource`]
//! implements it on top of `sqlx`.

mod sqlite;
mod value;

use crate::error_handling::SourceError;

pub use sqlite::SqliteSource;
pub use value::Value;

/// Fully fetched result of one statement.
///
/// Columns come from the statement's projection, so they are known even when
/// no rows match. Rows keep the order the source returned them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Cursor {
    /// Creates a cursor from column names and row values.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Column names in projection order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in fetch order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Consumes the cursor, returning only the rows.
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// Consumes the cursor, returning columns and rows.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

/// A blocking connection to a relational data source.
///
/// `execute` takes `&mut self`: a handle never serves two statements at once.
/// Placeholders in `sql` are positional `?` markers matched in order by `params`.
pub trait SourceConnection {
    /// Checks that the handle is still usable.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Connectivity` if it is not.
    fn ping(&mut self) -> Result<(), SourceError>;

    /// Executes `sql` with `params` bound in order and fetches every row.
    ///
    /// # Errors
    ///
    /// `SourceError::Statement` when the statement fails,
    /// `SourceError::Connectivity` when the handle fails underneath it.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Cursor, SourceError>;

    /// Closes the handle.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if the close handshake fails; the handle is
    /// gone either way.
    fn close(self) -> Result<(), SourceError>
    where
        Self: Sized;
}
