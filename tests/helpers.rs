// Shared test helpers: in-memory stock fixtures and table layouts.
//
// The fixture mirrors the SAP shape on a small scale: STOCK rows per material,
// plant and storage location, material texts in LOOKUP, and material
// documents split into DOC_ITEMS and DOC_HEADERS (posting date BUDAT).

use std::time::Duration;

use table_extract::config::ConnectionSettings;
use table_extract::query::{DateSource, DescriptionLookup, DocumentDates, TableLayout};
use table_extract::source::SqliteSource;

/// Plant P001 holds M-1, M-2, M-3; P002 holds M-4.
///
/// Document postings for P001:
/// - M-1: 2025-04-01 (twice, two documents) and 2025-04-15
/// - M-2: 2025-03-31 and 2025-05-21
/// - M-3: 2025-05-20
pub const STOCK_FIXTURE: &str = "
    CREATE TABLE STOCK (MATNR TEXT, WERKS TEXT, LGORT TEXT, LABST REAL);
    INSERT INTO STOCK VALUES
        ('M-1', 'P001', '0001', 10.0),
        ('M-2', 'P001', '0001', 0.0),
        ('M-3', 'P001', '0002', 5.5),
        ('M-4', 'P002', '0001', 7.0);

    CREATE TABLE LOOKUP (MATNR TEXT, SPRAS TEXT, MAKTX TEXT);
    INSERT INTO LOOKUP VALUES
        ('M-1', 'E', 'Bolt'),
        ('M-1', 'D', 'Schraube'),
        ('M-2', 'E', 'Nut'),
        ('M-3', 'E', 'Washer'),
        ('M-4', 'E', 'Gear');

    CREATE TABLE DOC_HEADERS (MBLNR TEXT, MJAHR TEXT, BUDAT TEXT);
    INSERT INTO DOC_HEADERS VALUES
        ('4900000001', '2025', '20250401'),
        ('4900000002', '2025', '20250401'),
        ('4900000003', '2025', '20250415'),
        ('4900000004', '2025', '20250331'),
        ('4900000005', '2025', '20250521'),
        ('4900000006', '2025', '20250520');

    CREATE TABLE DOC_ITEMS (MBLNR TEXT, MJAHR TEXT, MATNR TEXT, WERKS TEXT, LGORT TEXT);
    INSERT INTO DOC_ITEMS VALUES
        ('4900000001', '2025', 'M-1', 'P001', '0001'),
        ('4900000002', '2025', 'M-1', 'P001', '0001'),
        ('4900000003', '2025', 'M-1', 'P001', '0001'),
        ('4900000004', '2025', 'M-2', 'P001', '0001'),
        ('4900000005', '2025', 'M-2', 'P001', '0001'),
        ('4900000006', '2025', 'M-3', 'P001', '0002');
";

/// Opens an in-memory database loaded with [`STOCK_FIXTURE`].
#[allow(dead_code)] // Used by other test files
pub fn stock_source() -> SqliteSource {
    let mut source = SqliteSource::connect(&ConnectionSettings::new("sqlite::memory:"))
        .expect("Failed to open in-memory database");
    source
        .execute_script(STOCK_FIXTURE)
        .expect("Failed to load stock fixture");
    source
}

/// Stock fixture whose LOOKUP is a view that takes far longer than `limit`
/// to produce a row, on a handle with a `limit` statement timeout.
#[allow(dead_code)] // Used by other test files
pub fn stock_source_with_slow_lookup(limit: Duration) -> SqliteSource {
    let mut settings = ConnectionSettings::new("sqlite::memory:");
    settings.query_timeout = Some(limit);
    let mut source = SqliteSource::connect(&settings).expect("Failed to open in-memory database");
    source
        .execute_script(STOCK_FIXTURE)
        .expect("Failed to load stock fixture");
    source
        .execute_script(
            "DROP TABLE LOOKUP;
             CREATE VIEW LOOKUP AS
                 WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 200000000)
                 SELECT 'M-1' AS MATNR, 'E' AS SPRAS, 'Bolt' AS MAKTX
                 FROM (SELECT count(*) AS n FROM c);",
        )
        .expect("Failed to create slow LOOKUP view");
    source
}

/// Same fixture without the LOOKUP table.
#[allow(dead_code)] // Used by other test files
pub fn stock_source_without_lookup() -> SqliteSource {
    let mut source = stock_source();
    source
        .execute_script("DROP TABLE LOOKUP;")
        .expect("Failed to drop LOOKUP");
    source
}

/// STOCK keyed by plant, no lookup, no dates.
#[allow(dead_code)] // Used by other test files
pub fn plain_stock_layout() -> TableLayout {
    TableLayout::new("STOCK")
        .with_columns(["MATNR", "WERKS", "LGORT", "LABST"])
        .with_key_column("WERKS")
}

/// STOCK with material texts from LOOKUP and posting dates from the documents.
#[allow(dead_code)] // Used by other test files
pub fn enriched_stock_layout() -> TableLayout {
    plain_stock_layout()
        .with_lookup(DescriptionLookup {
            table: "LOOKUP".to_string(),
            alias: "lk".to_string(),
            join_columns: vec!["MATNR".to_string()],
            language_column: Some("SPRAS".to_string()),
            text_columns: vec!["MAKTX".to_string()],
        })
        .with_dates(DateSource::Documents(DocumentDates {
            item_table: "DOC_ITEMS".to_string(),
            item_alias: "ms".to_string(),
            header_table: "DOC_HEADERS".to_string(),
            header_alias: "h".to_string(),
            header_join_columns: vec!["MBLNR".to_string(), "MJAHR".to_string()],
            date_column: "BUDAT".to_string(),
            match_columns: vec![
                "MATNR".to_string(),
                "WERKS".to_string(),
                "LGORT".to_string(),
            ],
        }))
}

/// Values of `column` across all rows, as sorted strings.
#[allow(dead_code)] // Used by other test files
pub fn sorted_column(result: &table_extract::ResultSet, column: &str) -> Vec<String> {
    let index = result
        .column_index(column)
        .unwrap_or_else(|| panic!("column {column} missing"));
    let mut values: Vec<String> = result
        .rows()
        .iter()
        .map(|row| row[index].to_string())
        .collect();
    values.sort();
    values
}
