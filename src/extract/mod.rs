//! Extraction with graceful degradation.
//!
//! The preferred query enriches primary rows with descriptive texts. When it
//! fails for any reason (missing lookup table, privileges, type mismatch,
//! network fault) the extractor logs the failure and runs the fallback query
//! against the primary table alone. If that fails too, the preferred query's
//! error is reported: it describes the request the caller actually made.
//!
//! The one exception is a connectivity failure that leaves the handle unusable
//! (for example a statement timeout): no fallback is attempted on a handle
//! that no longer answers a ping.

mod result;

use log::{debug, error, info, warn};

use crate::error_handling::{ExtractError, SourceError};
use crate::query::{build_fallback_query, build_preferred_query, QuerySpec, SqlQuery};
use crate::source::{Cursor, SourceConnection};

pub use result::{Record, ResultSet};

/// Runs the extraction described by `spec` on `conn`.
///
/// Zero matching rows is a successful, empty result.
///
/// # Errors
///
/// - `ExtractError::InvalidSpec` if `spec` does not validate (nothing is executed)
/// - `ExtractError::Connectivity` if the handle fails its ping, if the
///   preferred query failed on connectivity and the handle stopped answering,
///   or if the preferred query failed on connectivity and the fallback failed too
/// - `ExtractError::Query` if both queries failed; its source is the
///   preferred query's error
pub fn extract<C>(conn: &mut C, spec: &QuerySpec) -> Result<ResultSet, ExtractError>
where
    C: SourceConnection + ?Sized,
{
    spec.validate()?;

    conn.ping().map_err(|e| {
        error!("Data source is not usable: {e}");
        ExtractError::Connectivity(e)
    })?;

    let preferred = build_preferred_query(spec)?;
    info!("Extracting {}", describe(spec));

    let preferred_err = match run(conn, &preferred) {
        Ok(cursor) => {
            let result = ResultSet::from_cursor(cursor, false);
            info!(
                "Retrieved {} row(s) from {}",
                result.len(),
                spec.layout.table
            );
            return Ok(result);
        }
        Err(e) => e,
    };

    if spec.layout.lookup.is_none() {
        // Without a descriptive join the fallback would be the same statement
        error!(
            "Query against {} failed: {preferred_err}",
            spec.layout.table
        );
        return Err(escalate(preferred_err, None));
    }

    if preferred_err.is_connectivity() {
        // A timed-out or dropped handle cannot run the fallback either
        if let Err(e) = conn.ping() {
            error!(
                "Query against {} failed and the data source is gone: {e}",
                spec.layout.table
            );
            return Err(ExtractError::Connectivity(preferred_err));
        }
    }

    warn!(
        "Enriched query against {} failed: {preferred_err}; retrying without descriptive columns",
        spec.layout.table
    );
    let fallback = build_fallback_query(spec)?;
    match run(conn, &fallback) {
        Ok(cursor) => {
            let result = ResultSet::from_cursor(cursor, true);
            info!(
                "Retrieved {} row(s) from {} (without descriptive columns)",
                result.len(),
                spec.layout.table
            );
            Ok(result)
        }
        Err(fallback_err) => {
            error!(
                "Fallback query against {} failed as well: {fallback_err}",
                spec.layout.table
            );
            Err(escalate(preferred_err, Some(fallback_err)))
        }
    }
}

fn run<C>(conn: &mut C, query: &SqlQuery) -> Result<Cursor, SourceError>
where
    C: SourceConnection + ?Sized,
{
    debug!("SQL: {}", query.text());
    debug!("Parameters: {:?}", query.params());
    conn.execute(query.text(), query.params())
}

fn escalate(preferred: SourceError, fallback: Option<SourceError>) -> ExtractError {
    if preferred.is_connectivity() {
        ExtractError::Connectivity(preferred)
    } else {
        ExtractError::Query {
            preferred,
            fallback,
        }
    }
}

fn describe(spec: &QuerySpec) -> String {
    let mut parts = vec![spec.layout.qualify(&spec.layout.table)];
    if let (Some(key), Some(column)) = (&spec.key, &spec.layout.key_column) {
        parts.push(format!("{column}={key}"));
    }
    if let Some(range) = &spec.date_range {
        parts.push(format!("{} to {}", range.start, range.end));
    }
    if !spec.filters.is_empty() {
        parts.push(format!("{} extra filter(s)", spec.filters.len()));
    }
    parts.join(", ")
}
