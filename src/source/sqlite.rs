//! `sqlx`-backed SQLite connection.
//!
//! sqlx is async; this adapter owns a current-thread Tokio runtime and blocks
//! on each operation so callers see a plain synchronous handle. Like other
//! blocking clients it must not be used from inside an async runtime.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, error, info, warn};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Executor, Row, Statement, TypeInfo, ValueRef};
use tokio::runtime::{Builder, Runtime};

use super::{Cursor, SourceConnection, Value};
use crate::config::ConnectionSettings;
use crate::error_handling::SourceError;
use crate::utils::sanitize_and_truncate_error_message;

/// A single SQLite connection behind the blocking [`SourceConnection`] API.
///
/// A statement that exceeds the query timeout is abandoned together with its
/// connection: the driver cannot cancel it, and a handle still busy with it
/// would stall every later call. From then on the handle reports itself
/// unusable.
pub struct SqliteSource {
    runtime: Runtime,
    conn: Option<SqliteConnection>,
    query_timeout: Option<Duration>,
    /// Why the connection was abandoned, if it was.
    abandoned: Option<String>,
}

/// The operation did not finish within the limit.
struct TimedOut(Duration);

impl SqliteSource {
    /// Opens a connection described by `settings`.
    ///
    /// The settings are validated first; a settings problem is reported as a
    /// connectivity error because no handle can be produced.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Connectivity` if the settings are rejected, the
    /// runtime cannot start, or the database cannot be opened.
    pub fn connect(settings: &ConnectionSettings) -> Result<Self, SourceError> {
        settings
            .validate()
            .map_err(|e| SourceError::Connectivity(e.to_string()))?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SourceError::Connectivity(format!("failed to start runtime: {e}")))?;

        let options = SqliteConnectOptions::from_str(&settings.url).map_err(|e| {
            SourceError::Connectivity(sanitize_and_truncate_error_message(&e.to_string()))
        })?;

        let conn = runtime
            .block_on(SqliteConnection::connect_with(&options))
            .map_err(|e| {
                let message = sanitize_and_truncate_error_message(&e.to_string());
                error!("Failed to connect to {}: {message}", settings.url);
                SourceError::Connectivity(message)
            })?;
        info!("Connected to {}", settings.url);

        Ok(Self {
            runtime,
            conn: Some(conn),
            query_timeout: settings.query_timeout,
            abandoned: None,
        })
    }

    /// True while the handle still holds a live connection.
    pub fn is_usable(&self) -> bool {
        self.conn.is_some()
    }

    /// Runs a script of one or more statements without parameters or results.
    ///
    /// Meant for fixtures and setup DDL; extraction goes through
    /// [`SourceConnection::execute`].
    ///
    /// # Errors
    ///
    /// Same classification as [`SourceConnection::execute`].
    pub fn execute_script(&mut self, sql: &str) -> Result<(), SourceError> {
        let conn = self.conn.as_mut().ok_or_else(|| unusable(self.abandoned.as_deref()))?;
        let outcome = block(&self.runtime, self.query_timeout, async move {
            sqlx::raw_sql(sql).execute(&mut *conn).await.map(|_| ())
        });
        self.settle(outcome)
    }

    /// Turns a blocking outcome into the caller's result, abandoning the
    /// connection if the operation timed out.
    fn settle<T>(
        &mut self,
        outcome: Result<Result<T, sqlx::Error>, TimedOut>,
    ) -> Result<T, SourceError> {
        match outcome {
            Ok(result) => result.map_err(classify),
            Err(TimedOut(limit)) => {
                let message = format!("statement timed out after {:.1}s", limit.as_secs_f64());
                // Dropping without the close handshake: the worker finishes the
                // abandoned statement on its own and then shuts down
                drop(self.conn.take());
                error!("{message}; abandoning the connection");
                self.abandoned = Some(message.clone());
                Err(SourceError::Connectivity(message))
            }
        }
    }
}

impl SourceConnection for SqliteSource {
    fn ping(&mut self) -> Result<(), SourceError> {
        let conn = self.conn.as_mut().ok_or_else(|| unusable(self.abandoned.as_deref()))?;
        let outcome = block(&self.runtime, self.query_timeout, conn.ping());
        self.settle(outcome).map_err(|e| match e {
            // A handle that cannot answer a ping is unusable whatever the driver says
            SourceError::Statement(message) => SourceError::Connectivity(message),
            other => other,
        })
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Cursor, SourceError> {
        let conn = self.conn.as_mut().ok_or_else(|| unusable(self.abandoned.as_deref()))?;
        debug!("Executing statement with {} parameter(s): {sql}", params.len());

        let outcome = block(&self.runtime, self.query_timeout, async move {
            // Column names come from the prepared statement so they are
            // available for empty results too
            let statement = (&mut *conn).prepare(sql).await?;
            let columns: Vec<String> = statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();

            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_value(query, param);
            }
            let rows = query.fetch_all(&mut *conn).await?;
            Ok::<_, sqlx::Error>((columns, rows))
        });
        let (columns, rows) = self.settle(outcome)?;

        let rows = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(classify)?;
        Ok(Cursor::new(columns, rows))
    }

    fn close(mut self) -> Result<(), SourceError> {
        match self.conn.take() {
            Some(conn) => {
                self.runtime.block_on(conn.close()).map_err(classify)?;
                info!("Connection closed");
                Ok(())
            }
            None => {
                if let Some(reason) = &self.abandoned {
                    debug!("Nothing to close; connection was abandoned ({reason})");
                }
                Ok(())
            }
        }
    }
}

impl Drop for SqliteSource {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = self.runtime.block_on(conn.close()) {
                warn!("Failed to close connection cleanly: {e}");
            } else {
                debug!("Connection closed on drop");
            }
        }
    }
}

fn unusable(abandoned: Option<&str>) -> SourceError {
    match abandoned {
        Some(reason) => SourceError::Connectivity(format!("connection unusable: {reason}")),
        None => SourceError::Connectivity("connection already closed".to_string()),
    }
}

/// Blocks on `fut`, enforcing `timeout` when set.
fn block<F, T>(
    runtime: &Runtime,
    timeout: Option<Duration>,
    fut: F,
) -> Result<Result<T, sqlx::Error>, TimedOut>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match timeout {
        Some(limit) => runtime
            .block_on(async { tokio::time::timeout(limit, fut).await })
            .map_err(|_| TimedOut(limit)),
        None => Ok(runtime.block_on(fut)),
    }
}

/// Maps a sqlx error onto the connectivity/statement split.
fn classify(err: sqlx::Error) -> SourceError {
    let message = sanitize_and_truncate_error_message(&err.to_string());
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => SourceError::Connectivity(message),
        _ => SourceError::Statement(message),
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(x) => query.bind(*x),
        Value::Text(s) => query.bind(s.clone()),
        Value::Bytes(bytes) => query.bind(bytes.clone()),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Vec<Value>, sqlx::Error> {
    (0..row.len()).map(|index| decode_cell(row, index)).collect()
}

/// Decodes by the value's storage class, not the declared column type.
fn decode_cell(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let storage_class = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_string()
    };

    let value = match storage_class.as_str() {
        "INTEGER" => Value::Int(row.try_get::<i64, _>(index)?),
        "REAL" => Value::Float(row.try_get::<f64, _>(index)?),
        "BLOB" => Value::Bytes(row.try_get::<Vec<u8>, _>(index)?),
        _ => Value::Text(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}
