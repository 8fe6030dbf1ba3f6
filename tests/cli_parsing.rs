//! Tests for command-line parsing and job construction.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use table_extract::config::{ConnectionSettings, RunMode};
use table_extract::query::DateSource;
use table_extract::source::{SourceConnection, SqliteSource, Value};
use table_extract::{build_jobs, run_extraction, Config, LogFormat, LogLevel};
use tempfile::TempDir;

fn parse(args: &[&str]) -> Result<Config, clap::Error> {
    let mut argv = vec!["table_extract", "--database-url", "sqlite::memory:"];
    argv.extend_from_slice(args);
    Config::try_parse_from(argv)
}

#[test]
fn test_defaults() {
    let config = parse(&[]).expect("defaults parse");
    assert_eq!(config.mode, RunMode::Development);
    assert!(config.plants.is_empty());
    assert!(config.filters.is_empty());
    assert!(!config.strict);
    assert!(!config.distinct);
    assert_eq!(config.query_timeout_secs, 300);
    assert!(matches!(config.log_level, LogLevel::Info));
    assert!(matches!(config.log_format, LogFormat::Plain));
}

#[test]
fn test_full_command_line() {
    let config = parse(&[
        "--mode",
        "production",
        "--password",
        "k7#Vq2!mLp",
        "--schema",
        "SAPHANADB",
        "--plant",
        "S004",
        "--from",
        "2025-04-01",
        "--to",
        "2025-05-20",
        "--language",
        "D",
        "--filter",
        "LGORT=0001",
        "--filter",
        "PSTAT=L",
        "--distinct",
        "--limit",
        "100",
        "--output",
        "stock.csv",
        "--strict",
        "--query-timeout-secs",
        "30",
        "--log-level",
        "debug",
        "--log-format",
        "json",
    ])
    .expect("full command line parses");

    assert_eq!(config.mode, RunMode::Production);
    assert_eq!(config.schema.as_deref(), Some("SAPHANADB"));
    assert_eq!(config.plants, ["S004"]);
    assert_eq!(config.from, NaiveDate::from_ymd_opt(2025, 4, 1));
    assert_eq!(config.to, NaiveDate::from_ymd_opt(2025, 5, 20));
    assert_eq!(
        config.filters,
        [
            ("LGORT".to_string(), "0001".to_string()),
            ("PSTAT".to_string(), "L".to_string())
        ]
    );
    assert_eq!(config.limit, Some(100));
    assert_eq!(config.output, Some(PathBuf::from("stock.csv")));
    assert!(config.strict);
    assert!(matches!(config.log_level, LogLevel::Debug));
    assert!(matches!(config.log_format, LogFormat::Json));
    assert!(config.connection_settings().validate().is_ok());
}

#[test]
fn test_date_bounds_come_in_pairs() {
    assert!(parse(&["--from", "2025-04-01"]).is_err());
    assert!(parse(&["--to", "2025-04-01"]).is_err());
}

#[test]
fn test_rejects_malformed_values() {
    assert!(parse(&["--from", "20250401", "--to", "2025-05-20"]).is_err());
    assert!(parse(&["--filter", "LGORT"]).is_err());
    assert!(parse(&["--mode", "staging"]).is_err());
    assert!(parse(&["--schema", "X", "--no-schema"]).is_err());
}

#[test]
fn test_database_url_is_required() {
    // The env fallback must not leak into this test
    std::env::remove_var("TABLE_EXTRACT_DATABASE_URL");
    assert!(Config::try_parse_from(["table_extract"]).is_err());
}

#[test]
fn test_one_job_per_plant_with_default_names() {
    let config = parse(&[
        "--plant",
        "S004",
        "--plant",
        "S005",
        "--from",
        "2025-04-01",
        "--to",
        "2025-05-20",
        "--filter",
        "LGORT=0001",
    ])
    .expect("parses");

    let jobs = build_jobs(&config).expect("jobs build");

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].spec.key.as_deref(), Some("S004"));
    assert_eq!(jobs[1].spec.key.as_deref(), Some("S005"));
    assert_eq!(
        jobs[0].output,
        PathBuf::from("mard_data_S004_20250401_to_20250520.xlsx")
    );
    assert_eq!(
        jobs[1].output,
        PathBuf::from("mard_data_S005_20250401_to_20250520.xlsx")
    );
    assert_eq!(
        jobs[0].spec.filters.get("LGORT"),
        Some(&Value::from("0001"))
    );
    assert_eq!(jobs[0].spec.layout.schema.as_deref(), Some("SAPABAP1"));
}

#[test]
fn test_no_plant_is_single_job() {
    let config = parse(&["--no-schema"]).expect("parses");
    let jobs = build_jobs(&config).expect("jobs build");

    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].spec.key.is_none());
    assert!(jobs[0].spec.layout.schema.is_none());
    assert_eq!(jobs[0].output, PathBuf::from("mard_data.xlsx"));
}

#[test]
fn test_single_output_with_many_plants_rejected() {
    let config = parse(&["--plant", "S004", "--plant", "S005", "--output", "x.csv"])
        .expect("parses");
    assert!(build_jobs(&config).is_err());
}

#[test]
fn test_repeated_plant_rejected() {
    let config = parse(&["--plant", "S004", "--plant", "S004"]).expect("parses");
    let err = build_jobs(&config).expect_err("same file twice");
    assert!(err.to_string().contains("mard_data_S004.xlsx"), "{err}");
}

#[test]
fn test_plants_with_same_file_name_rejected() {
    // Both map to mard_data_S_04.xlsx
    let config = parse(&["--plant", "S/04", "--plant", "S_04"]).expect("parses");
    assert!(build_jobs(&config).is_err());
}

#[test]
fn test_fiscal_year_tables() {
    let config = parse(&[
        "--table",
        "ANEP",
        "--table",
        "ANEA",
        "--date-column",
        "GJAHR",
        "--date-format",
        "%Y",
        "--from",
        "2024-01-01",
        "--to",
        "2025-12-31",
    ])
    .expect("parses");

    let jobs = build_jobs(&config).expect("jobs build");

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].name, "ANEP");
    assert_eq!(jobs[0].output, PathBuf::from("anep_data_2024_to_2025.xlsx"));
    assert_eq!(jobs[1].output, PathBuf::from("anea_data_2024_to_2025.xlsx"));
    let layout = &jobs[1].spec.layout;
    assert_eq!(layout.table, "ANEA");
    assert_eq!(layout.schema.as_deref(), Some("SAPABAP1"));
    assert!(layout.columns.is_empty());
    assert!(layout.lookup.is_none());
    assert_eq!(layout.dates, Some(DateSource::Column("GJAHR".to_string())));
    assert_eq!(layout.date_format, "%Y");
}

#[test]
fn test_master_tables_per_plant() {
    let config = parse(&[
        "--table",
        "T001W",
        "--key-column",
        "WERKS",
        "--plant",
        "S004",
        "--plant",
        "S005",
        "--no-schema",
    ])
    .expect("parses");

    let jobs = build_jobs(&config).expect("jobs build");

    let names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, ["T001W plant S004", "T001W plant S005"]);
    assert_eq!(jobs[0].spec.layout.key_column.as_deref(), Some("WERKS"));
    assert_eq!(jobs[1].output, PathBuf::from("t001w_data_S005.xlsx"));
}

#[test]
fn test_table_options_need_their_columns() {
    assert!(parse(&["--key-column", "WERKS"]).is_err());
    assert!(parse(&["--date-column", "GJAHR"]).is_err());
    assert!(parse(&["--table", "ANEP", "--date-format", "%Y"]).is_err());

    let config = parse(&["--table", "ANLA", "--plant", "S004"]).expect("parses");
    assert!(build_jobs(&config).is_err());

    let config = parse(&["--table", "ANLA", "--from", "2024-01-01", "--to", "2025-12-31"])
        .expect("parses");
    assert!(build_jobs(&config).is_err());
}

#[test]
fn test_table_names_are_checked_before_running() {
    let config = parse(&["--table", "ANLA; DROP TABLE ANLA"]).expect("parses");
    assert!(build_jobs(&config).is_err());

    let config = parse(&[
        "--table",
        "ANEP",
        "--date-column",
        "GJAHR",
        "--date-format",
        "%Y%",
        "--from",
        "2024-01-01",
        "--to",
        "2025-12-31",
    ])
    .expect("parses");
    assert!(build_jobs(&config).is_err());
}

#[test]
fn test_repeated_table_rejected() {
    let config = parse(&["--table", "T093", "--table", "T093"]).expect("parses");
    assert!(build_jobs(&config).is_err());
}

const SAP_STOCK_FIXTURE: &str = "
    CREATE TABLE MARD (
        MANDT TEXT, MATNR TEXT, WERKS TEXT, LGORT TEXT, LABST REAL, UMLME REAL, INSME REAL,
        EINME REAL, SPEME REAL, RETME REAL, VMLAB REAL, LWMKB TEXT, PSTAT TEXT
    );
    INSERT INTO MARD VALUES
        ('100', 'M-1', 'P001', '0001', 10, 0, 0, 0, 0, 0, 0, '', 'L'),
        ('100', 'M-2', 'P001', '0002', 4, 0, 1, 0, 0, 0, 0, '', 'L'),
        ('100', 'M-3', 'P002', '0001', 7, 0, 0, 0, 0, 0, 0, '', 'L');
    CREATE TABLE MAKT (MATNR TEXT, SPRAS TEXT, MAKTX TEXT);
    INSERT INTO MAKT VALUES ('M-1', 'E', 'Bolt'), ('M-2', 'E', 'Nut'), ('M-3', 'E', 'Gear');
";

fn seed_database(dir: &TempDir, script: &str) -> String {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("stock.db").display());
    let mut seed = SqliteSource::connect(&ConnectionSettings::new(url.clone()))
        .expect("open seed database");
    seed.execute_script(script).expect("load fixture");
    seed.close().expect("close seed database");
    url
}

#[test]
fn test_run_extraction_end_to_end() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = seed_database(&dir, SAP_STOCK_FIXTURE);
    let output = dir.path().join("p001.json");
    let config = Config {
        database_url: url,
        no_schema: true,
        plants: vec!["P001".to_string()],
        output: Some(output.clone()),
        ..Default::default()
    };

    let report = run_extraction(&config).expect("run succeeds");

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.rows_written(), 2);
    assert!(!report.outcomes[0].degraded);
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).expect("read output"))
            .expect("valid json");
    let mut texts: Vec<&str> = parsed
        .as_array()
        .expect("array of rows")
        .iter()
        .filter_map(|row| row["MAKTX"].as_str())
        .collect();
    texts.sort_unstable();
    assert_eq!(texts, ["Bolt", "Nut"]);
}

#[test]
fn test_run_extraction_reports_failed_jobs() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = seed_database(&dir, "CREATE TABLE UNRELATED (A TEXT);");
    let config = Config {
        database_url: url,
        no_schema: true,
        plants: vec!["P001".to_string(), "P002".to_string()],
        ..Default::default()
    };

    // Missing tables fail the jobs, not the run
    let report = run_extraction(&config).expect("run completes");
    assert_eq!(report.failed(), 2);
}

#[test]
fn test_run_extraction_refuses_placeholder_password() {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        mode: RunMode::Production,
        password: Some("changeme".to_string()),
        ..Default::default()
    };
    assert!(run_extraction(&config).is_err());
}

const ASSET_FIXTURE: &str = "
    CREATE TABLE ANEP (BUKRS TEXT, ANLN1 TEXT, GJAHR TEXT, ANBTR REAL);
    INSERT INTO ANEP VALUES
        ('1000', 'A-1', '2023', 100.0),
        ('1000', 'A-1', '2024', 200.0),
        ('1000', 'A-2', '2025', 300.0),
        ('1000', 'A-2', '2026', 400.0);
    CREATE TABLE ANLA (BUKRS TEXT, ANLN1 TEXT, TXT50 TEXT);
    INSERT INTO ANLA VALUES ('1000', 'A-1', 'Forklift'), ('1000', 'A-2', 'Crane');
";

#[test]
fn test_run_extraction_fiscal_year_table() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = seed_database(&dir, ASSET_FIXTURE);
    let output = dir.path().join("anep.csv");
    let config = Config {
        database_url: url,
        no_schema: true,
        tables: vec!["ANEP".to_string()],
        date_column: Some("GJAHR".to_string()),
        date_format: Some("%Y".to_string()),
        from: NaiveDate::from_ymd_opt(2024, 1, 1),
        to: NaiveDate::from_ymd_opt(2025, 12, 31),
        output: Some(output.clone()),
        ..Default::default()
    };

    let report = run_extraction(&config).expect("run succeeds");

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.rows_written(), 2);
    let contents = std::fs::read_to_string(&output).expect("read output");
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("BUKRS,ANLN1,GJAHR,ANBTR"));
    let years: Vec<&str> = lines.filter_map(|l| l.split(',').nth(2)).collect();
    assert_eq!(years, ["2024", "2025"]);
}
