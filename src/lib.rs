//! table_extract library: parameterized table extraction with graceful degradation
//!
//! This library runs an enriched SELECT (primary table joined to a descriptive
//! lookup, optionally restricted to a document date range), falls back to the
//! primary table alone when the enriched query fails, and writes the rows as
//! CSV, XLSX or JSON depending on the output file's extension.
//!
//! # Example
//!
//! ```no_run
//! use table_extract::config::ConnectionSettings;
//! use table_extract::query::{QuerySpec, TableLayout};
//! use table_extract::source::{SourceConnection, SqliteSource};
//! use table_extract::{export, extract};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conn = SqliteSource::connect(&ConnectionSettings::new("sqlite://stock.db"))?;
//! let spec = QuerySpec::new(TableLayout::stock().without_schema()).with_key("P001");
//!
//! let result = extract(&mut conn, &spec);
//! conn.close()?;
//! let report = export(&result?, Path::new("stock_p001.csv"))?;
//! println!("Wrote {} rows to {}", report.rows, report.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! The API is blocking. [`source::SqliteSource`] drives its own Tokio runtime,
//! so it must not be used from inside an async context.

#![warn(missing_docs)]

pub mod batch;
pub mod config;
mod error_handling;
pub mod export;
pub mod extract;
pub mod initialization;
pub mod query;
pub mod source;
mod utils;

// Re-export public API
pub use batch::{run_batch, BatchReport, ExtractionJob, JobOutcome};
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{
    ConfigError, ExportError, ExtractError, InitializationError, JobError, SourceError,
};
pub use export::{export, export_with, ExportFormat, ExportOptions, ExportReport};
pub use extract::{extract, ResultSet};
pub use query::{QuerySpec, TableLayout};
pub use run::{build_jobs, run_extraction};

// Internal run module (turns CLI options into jobs and runs them)
mod run {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use anyhow::{bail, Context, Result};
    use log::{info, warn};

    use crate::batch::{run_batch, BatchReport, ExtractionJob};
    use crate::config::{Config, DEFAULT_SCHEMA};
    use crate::export::{default_output_path, ExportFormat, ExportOptions};
    use crate::query::{DateSource, QuerySpec, TableLayout};
    use crate::source::{SourceConnection, SqliteSource};

    /// Builds one job per table and `--plant` (a single all-plant job per
    /// table without any). Tables are the stock layout, or the `--table` list.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are inconsistent: `--output` with more
    /// than one job, `--plant` or a date range on `--table` tables without the
    /// column to apply it to, an unusable table, column or date format, or two
    /// jobs that would write the same file.
    pub fn build_jobs(config: &Config) -> Result<Vec<ExtractionJob>> {
        let layouts = if config.tables.is_empty() {
            vec![TableLayout::stock()]
        } else {
            if !config.plants.is_empty() && config.key_column.is_none() {
                bail!("--plant with --table needs --key-column to filter on");
            }
            if config.from.is_some() && config.date_column.is_none() {
                bail!("--from/--to with --table needs --date-column to filter on");
            }
            config.tables.iter().map(|table| table_layout(config, table)).collect()
        };

        let mut jobs = Vec::new();
        for layout in layouts {
            let layout = if config.no_schema {
                layout.without_schema()
            } else if let Some(schema) = &config.schema {
                layout.with_schema(schema.clone())
            } else {
                layout
            };
            let table = layout.table.clone();
            let base = base_spec(config, layout);

            if config.plants.is_empty() {
                jobs.push((table, base));
            } else {
                for plant in &config.plants {
                    let spec = base.clone().with_key(plant.clone());
                    jobs.push((format!("{table} plant {plant}"), spec));
                }
            }
        }

        if config.output.is_some() && jobs.len() > 1 {
            bail!("--output names a single file; drop it to get one file per table and --plant");
        }

        let mut seen: HashMap<PathBuf, String> = HashMap::new();
        let mut built = Vec::with_capacity(jobs.len());
        for (name, spec) in jobs {
            spec.layout
                .validate()
                .with_context(|| format!("Invalid table options for job {name:?}"))?;
            let output = config
                .output
                .clone()
                .unwrap_or_else(|| default_output_path(&spec, ExportFormat::Xlsx));
            if let Some(earlier) = seen.insert(output.clone(), name.clone()) {
                bail!(
                    "jobs {earlier:?} and {name:?} would both write {}; check for repeated --plant or --table values",
                    output.display()
                );
            }
            built.push(ExtractionJob::new(name, spec, output));
        }
        Ok(built)
    }

    /// A `--table` table: every column, in the default schema.
    fn table_layout(config: &Config, table: &str) -> TableLayout {
        let mut layout = TableLayout::new(table).with_schema(DEFAULT_SCHEMA);
        if let Some(column) = &config.key_column {
            layout = layout.with_key_column(column.clone());
        }
        if let Some(column) = &config.date_column {
            layout = layout.with_dates(DateSource::Column(column.clone()));
        }
        if let Some(format) = &config.date_format {
            layout = layout.with_date_format(format.clone());
        }
        layout
    }

    fn base_spec(config: &Config, layout: TableLayout) -> QuerySpec {
        let mut base = QuerySpec::new(layout).with_distinct(config.distinct);
        if let (Some(from), Some(to)) = (config.from, config.to) {
            base = base.with_date_range(from, to);
        }
        if let Some(language) = &config.language {
            base = base.with_language(language.clone());
        }
        for (column, value) in &config.filters {
            base = base.with_filter(column.clone(), value.as_str());
        }
        if let Some(limit) = config.limit {
            base = base.with_limit(limit);
        }
        base
    }

    /// Connects, runs every job built from `config`, and closes the connection.
    ///
    /// Individual job failures are reported in the returned [`BatchReport`];
    /// only problems that prevent any job from running are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are inconsistent, the settings are
    /// rejected, or the data source cannot be reached.
    pub fn run_extraction(config: &Config) -> Result<BatchReport> {
        let jobs = build_jobs(config)?;

        let settings = config.connection_settings();
        settings
            .validate()
            .context("Invalid connection settings")?;
        let mut conn = SqliteSource::connect(&settings)
            .with_context(|| format!("Failed to connect to {}", settings.url))?;

        let options = ExportOptions {
            strict: config.strict,
        };
        let report = run_batch(&mut conn, &jobs, &options);

        if let Err(e) = conn.close() {
            warn!("Failed to close connection: {e}");
        }
        info!(
            "Finished {} job(s) in {:.1}s",
            report.outcomes.len(),
            report.elapsed_seconds
        );
        Ok(report)
    }
}
