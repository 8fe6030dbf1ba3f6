//! Batch orchestration.
//!
//! Runs independent extraction jobs one after another over a single
//! connection. A failed job is logged and recorded; the remaining jobs still
//! run, unless the connection itself is lost, in which case they are recorded
//! as connectivity failures without being attempted. This is the only layer that swallows errors: [`crate::extract()`]
//! and [`crate::export()`] always report them to their caller.

use std::path::PathBuf;
use std::time::Instant;

use log::{error, info, warn};

use crate::error_handling::{ExtractError, JobError, SourceError};
use crate::export::{export_with, ExportOptions, ExportReport};
use crate::extract::extract;
use crate::query::QuerySpec;
use crate::source::SourceConnection;

/// One unit of work: what to extract and where to write it.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    /// Label used in logs and in the report.
    pub name: String,
    /// What to extract.
    pub spec: QuerySpec,
    /// Destination file; its extension selects the format.
    pub output: PathBuf,
}

impl ExtractionJob {
    /// Creates a job.
    pub fn new(name: impl Into<String>, spec: QuerySpec, output: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            spec,
            output: output.into(),
        }
    }
}

/// Result of one job.
#[derive(Debug)]
pub struct JobOutcome {
    /// The job's name.
    pub name: String,
    /// Export report, or why the job failed.
    pub result: Result<ExportReport, JobError>,
    /// True when the rows came from the fallback query.
    pub degraded: bool,
}

impl JobOutcome {
    /// True if the job wrote its file.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results of a batch run, in job order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One outcome per job.
    pub outcomes: Vec<JobOutcome>,
    /// Elapsed time in seconds.
    pub elapsed_seconds: f64,
}

impl BatchReport {
    /// Number of jobs that wrote their file.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of jobs that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Total rows written across successful jobs.
    pub fn rows_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.rows)
            .sum()
    }
}

/// Runs `jobs` in order on `conn`.
///
/// Never fails as a whole: each job's failure is logged and kept in its
/// [`JobOutcome`].
pub fn run_batch<C>(conn: &mut C, jobs: &[ExtractionJob], options: &ExportOptions) -> BatchReport
where
    C: SourceConnection + ?Sized,
{
    let start = Instant::now();
    let mut outcomes = Vec::with_capacity(jobs.len());

    for (index, job) in jobs.iter().enumerate() {
        info!("Job {}/{}: {}", index + 1, jobs.len(), job.name);
        let mut degraded = false;
        let result = extract(conn, &job.spec)
            .map_err(JobError::from)
            .and_then(|rows| {
                degraded = rows.is_degraded();
                export_with(&rows, &job.output, options).map_err(JobError::from)
            });

        let lost = match &result {
            Err(e) => {
                error!("Job {} failed: {e}", job.name);
                connection_lost(conn, e)
            }
            Ok(_) => None,
        };
        outcomes.push(JobOutcome {
            name: job.name.clone(),
            result,
            degraded,
        });

        if let Some(reason) = lost {
            let remaining = &jobs[index + 1..];
            if !remaining.is_empty() {
                warn!(
                    "Connection lost ({reason}); skipping {} remaining job(s)",
                    remaining.len()
                );
            }
            outcomes.extend(remaining.iter().map(|job| JobOutcome {
                name: job.name.clone(),
                result: Err(JobError::Extract(ExtractError::Connectivity(reason.clone()))),
                degraded: false,
            }));
            break;
        }
    }

    let report = BatchReport {
        outcomes,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };
    info!(
        "Batch finished: {} succeeded, {} failed, {} row(s) written",
        report.succeeded(),
        report.failed(),
        report.rows_written()
    );
    report
}

/// After a connectivity failure, the ping error if the handle is no longer usable.
fn connection_lost<C>(conn: &mut C, err: &JobError) -> Option<SourceError>
where
    C: SourceConnection + ?Sized,
{
    match err {
        JobError::Extract(ExtractError::Connectivity(_)) => conn.ping().err(),
        _ => None,
    }
}
