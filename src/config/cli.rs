//! Command-line configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use crate::config::constants::{CLI_DATE_FORMAT, DEFAULT_QUERY_TIMEOUT};
use crate::config::types::{ConnectionSettings, LogFormat, LogLevel, RunMode};

/// Options for one run of the `table_extract` binary.
///
/// Without `--table` the SAP stock layout (`MARD` with material texts) is
/// extracted; each `--table` instead extracts that table as is. Every table is
/// combined with every `--plant` into one job; without `--plant` a single job
/// per table extracts all plants.
///
/// # Examples
///
/// ```no_run
/// use table_extract::Config;
///
/// let config = Config {
///     database_url: "sqlite://stock.db".to_string(),
///     plants: vec!["P001".to_string()],
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Parser)]
#[command(
    name = "table_extract",
    version,
    long_about = None,
    about = "Extract SAP tables to CSV, XLSX or JSON, with a fallback when text lookups fail"
)]
pub struct Config {
    /// Database URL (e.g. sqlite://stock.db)
    #[arg(long, env = "TABLE_EXTRACT_DATABASE_URL")]
    pub database_url: String,

    /// Database password
    #[arg(long, env = "TABLE_EXTRACT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Run mode; production refuses empty or placeholder passwords
    #[arg(long, value_enum, default_value_t = RunMode::Development)]
    pub mode: RunMode,

    /// Schema holding the tables (default: SAPABAP1)
    #[arg(long, conflicts_with = "no_schema")]
    pub schema: Option<String>,

    /// Address tables without a schema prefix
    #[arg(long)]
    pub no_schema: bool,

    /// Extract this table (all columns) instead of the stock layout; repeatable
    #[arg(long = "table", value_name = "TABLE")]
    pub tables: Vec<String>,

    /// Column `--plant` filters on for `--table` tables (e.g. WERKS)
    #[arg(long, requires = "tables")]
    pub key_column: Option<String>,

    /// Column of each `--table` table that `--from`/`--to` apply to (e.g. GJAHR)
    #[arg(long, requires = "tables")]
    pub date_column: Option<String>,

    /// How `--date-column` encodes dates, as a chrono format (default: %Y%m%d;
    /// %Y for fiscal years)
    #[arg(long, requires = "date_column")]
    pub date_format: Option<String>,

    /// Plant code (WERKS); repeat for one output per plant
    #[arg(long = "plant")]
    pub plants: Vec<String>,

    /// First posting date, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_cli_date, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last posting date, inclusive (YYYY-MM-DD)
    #[arg(long, value_parser = parse_cli_date, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Language key for material descriptions (default: E)
    #[arg(long)]
    pub language: Option<String>,

    /// Extra equality filter on the stock table; repeatable
    #[arg(long = "filter", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Drop duplicate rows
    #[arg(long)]
    pub distinct: bool,

    /// Maximum number of rows per job
    #[arg(long)]
    pub limit: Option<u64>,

    /// Output file; the extension picks the format (csv, xlsx, json).
    /// Defaults to a name derived from plant and dates, as .xlsx
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Fail on an unknown output extension instead of writing CSV
    #[arg(long)]
    pub strict: bool,

    /// Per-statement timeout in seconds
    #[arg(long, default_value_t = DEFAULT_QUERY_TIMEOUT.as_secs())]
    pub query_timeout_secs: u64,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain or json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Connection settings for this run.
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            url: self.database_url.clone(),
            password: self.password.clone(),
            mode: self.mode,
            query_timeout: Some(Duration::from_secs(self.query_timeout_secs)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            password: None,
            mode: RunMode::Development,
            schema: None,
            no_schema: false,
            tables: Vec::new(),
            key_column: None,
            date_column: None,
            date_format: None,
            plants: Vec::new(),
            from: None,
            to: None,
            language: None,
            filters: Vec::new(),
            distinct: false,
            limit: None,
            output: None,
            strict: false,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT.as_secs(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            log_file: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("mode", &self.mode)
            .field("schema", &self.schema)
            .field("no_schema", &self.no_schema)
            .field("tables", &self.tables)
            .field("key_column", &self.key_column)
            .field("date_column", &self.date_column)
            .field("date_format", &self.date_format)
            .field("plants", &self.plants)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("language", &self.language)
            .field("filters", &self.filters)
            .field("distinct", &self.distinct)
            .field("limit", &self.limit)
            .field("output", &self.output)
            .field("strict", &self.strict)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish_non_exhaustive()
    }
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, CLI_DATE_FORMAT)
        .map_err(|e| format!("expected a date like 2025-04-01: {e}"))
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected COLUMN=VALUE, got {s:?}")),
    }
}
