//! Table layouts.
//!
//! A layout names everything the generated SQL refers to: the primary table
//! and its projection, the primary filter key column, the optional lookup
//! table that supplies descriptive texts, and where document dates come from.
//! All of these are spliced into SQL text, so every name is checked against a
//! strict identifier pattern before use.

use std::sync::LazyLock;

use chrono::format::{Item, StrftimeItems};
use regex::Regex;

use crate::config::{DEFAULT_SCHEMA, SOURCE_DATE_FORMAT};
use crate::error_handling::ExtractError;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
});

/// Checks that `name` can be placed unquoted into SQL text.
///
/// # Errors
///
/// Returns `ExtractError::InvalidSpec` naming the offending identifier.
pub fn validate_identifier(kind: &str, name: &str) -> Result<(), ExtractError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(ExtractError::InvalidSpec(format!(
            "invalid {kind} identifier {name:?}"
        )))
    }
}

/// Table that supplies human-readable texts for the primary rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionLookup {
    /// Lookup table name (e.g. `MAKT`).
    pub table: String,
    /// Alias used in generated SQL.
    pub alias: String,
    /// Columns shared with the primary table (e.g. `MATNR`).
    pub join_columns: Vec<String>,
    /// Column holding the language key (e.g. `SPRAS`), if texts are localized.
    pub language_column: Option<String>,
    /// Descriptive columns added to the projection (e.g. `MAKTX`).
    pub text_columns: Vec<String>,
}

/// Document tables that carry posting dates for primary rows.
///
/// Item rows are joined to their header on `header_join_columns`; the header's
/// `date_column` is range-filtered and items are matched back to primary rows
/// on `match_columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDates {
    /// Document item table (e.g. `MSEG`).
    pub item_table: String,
    /// Alias for the item table.
    pub item_alias: String,
    /// Document header table (e.g. `MKPF`).
    pub header_table: String,
    /// Alias for the header table.
    pub header_alias: String,
    /// Columns joining items to headers (e.g. `MBLNR`, `MJAHR`).
    pub header_join_columns: Vec<String>,
    /// Date column on the header (e.g. `BUDAT`).
    pub date_column: String,
    /// Columns matching items to primary rows (e.g. `MATNR`, `WERKS`, `LGORT`).
    pub match_columns: Vec<String>,
}

/// Where the date range of a query is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSource {
    /// A date column of the primary table itself.
    Column(String),
    /// Posting dates of related documents.
    Documents(DocumentDates),
}

/// Everything the query builder needs to know about the tables involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// Schema prefix, if tables must be qualified.
    pub schema: Option<String>,
    /// Primary table name.
    pub table: String,
    /// Alias of the primary table in generated SQL.
    pub alias: String,
    /// Projection of the primary table; empty selects every column.
    pub columns: Vec<String>,
    /// Column the primary filter key applies to.
    pub key_column: Option<String>,
    /// Optional descriptive lookup.
    pub lookup: Option<DescriptionLookup>,
    /// Optional source of dates for range filtering.
    pub dates: Option<DateSource>,
    /// chrono format string of the source's native date encoding.
    pub date_format: String,
}

impl TableLayout {
    /// A bare layout for `table`: no schema, all columns, no key, no lookup.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            alias: "m".to_string(),
            columns: Vec::new(),
            key_column: None,
            lookup: None,
            dates: None,
            date_format: SOURCE_DATE_FORMAT.to_string(),
        }
    }

    /// SAP storage-location stock: `MARD` with material texts from `MAKT` and
    /// posting dates from material documents (`MSEG` items, `MKPF` headers),
    /// keyed by plant (`WERKS`).
    pub fn stock() -> Self {
        Self::new("MARD")
            .with_schema(DEFAULT_SCHEMA)
            .with_columns([
                "MANDT", "MATNR", "WERKS", "LGORT", "LABST", "UMLME", "INSME", "EINME", "SPEME",
                "RETME", "VMLAB", "LWMKB", "PSTAT",
            ])
            .with_key_column("WERKS")
            .with_lookup(DescriptionLookup {
                table: "MAKT".to_string(),
                alias: "mk".to_string(),
                join_columns: vec!["MATNR".to_string()],
                language_column: Some("SPRAS".to_string()),
                text_columns: vec!["MAKTX".to_string()],
            })
            .with_dates(DateSource::Documents(DocumentDates {
                item_table: "MSEG".to_string(),
                item_alias: "ms".to_string(),
                header_table: "MKPF".to_string(),
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

    /// Sets the schema prefix.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Removes the schema prefix.
    #[must_use]
    pub fn without_schema(mut self) -> Self {
        self.schema = None;
        self
    }

    /// Sets the primary projection.
    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the primary filter key column.
    #[must_use]
    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = Some(column.into());
        self
    }

    /// Sets the descriptive lookup.
    #[must_use]
    pub fn with_lookup(mut self, lookup: DescriptionLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Sets the date source.
    #[must_use]
    pub fn with_dates(mut self, dates: DateSource) -> Self {
        self.dates = Some(dates);
        self
    }

    /// Sets the chrono format dates are stored in (e.g. `%Y` for fiscal years).
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// `schema.table`, or just `table` without a schema.
    pub fn qualify(&self, table: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{table}"),
            None => table.to_string(),
        }
    }

    /// Checks every identifier in the layout.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::InvalidSpec` for the first bad identifier or for
    /// a lookup/document source without join columns.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if let Some(schema) = &self.schema {
            validate_identifier("schema", schema)?;
        }
        validate_identifier("table", &self.table)?;
        validate_identifier("alias", &self.alias)?;
        for column in &self.columns {
            validate_identifier("column", column)?;
        }
        if let Some(key) = &self.key_column {
            validate_identifier("key column", key)?;
        }

        if let Some(lookup) = &self.lookup {
            validate_identifier("lookup table", &lookup.table)?;
            validate_identifier("lookup alias", &lookup.alias)?;
            if lookup.join_columns.is_empty() {
                return Err(ExtractError::InvalidSpec(format!(
                    "lookup table {} has no join columns",
                    lookup.table
                )));
            }
            for column in lookup.join_columns.iter().chain(&lookup.text_columns) {
                validate_identifier("lookup column", column)?;
            }
            if let Some(language) = &lookup.language_column {
                validate_identifier("language column", language)?;
            }
        }

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ExtractError::InvalidSpec(format!(
                "invalid date format {:?}",
                self.date_format
            )));
        }

        match &self.dates {
            Some(DateSource::Column(column)) => validate_identifier("date column", column)?,
            Some(DateSource::Documents(docs)) => {
                validate_identifier("document item table", &docs.item_table)?;
                validate_identifier("document item alias", &docs.item_alias)?;
                validate_identifier("document header table", &docs.header_table)?;
                validate_identifier("document header alias", &docs.header_alias)?;
                validate_identifier("document date column", &docs.date_column)?;
                if docs.header_join_columns.is_empty() || docs.match_columns.is_empty() {
                    return Err(ExtractError::InvalidSpec(format!(
                        "document source {} needs header join and match columns",
                        docs.item_table
                    )));
                }
                for column in docs.header_join_columns.iter().chain(&docs.match_columns) {
                    validate_identifier("document column", column)?;
                }
            }
            None => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_layout_is_valid() {
        let layout = TableLayout::stock();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.qualify("MARD"), "SAPABAP1.MARD");
        assert_eq!(layout.key_column.as_deref(), Some("WERKS"));
    }

    #[test]
    fn test_qualify_without_schema() {
        let layout = TableLayout::stock().without_schema();
        assert_eq!(layout.qualify("MAKT"), "MAKT");
    }

    #[test]
    fn test_identifier_rules() {
        assert!(validate_identifier("column", "LGORT").is_ok());
        assert!(validate_identifier("column", "_x1").is_ok());
        assert!(validate_identifier("column", "1ABC").is_err());
        assert!(validate_identifier("column", "WERKS; DROP TABLE MARD").is_err());
        assert!(validate_identifier("column", "A.B").is_err());
        assert!(validate_identifier("column", "").is_err());
    }

    #[test]
    fn test_invalid_column_rejected() {
        let layout = TableLayout::new("STOCK").with_columns(["MATNR", "bad name"]);
        let err = layout.validate().expect_err("space is not allowed");
        assert!(err.to_string().contains("bad name"));
    }

    #[test]
    fn test_date_format_checked() {
        let layout = TableLayout::new("ANEP").with_date_format("%Y");
        assert!(layout.validate().is_ok());

        let layout = TableLayout::new("ANEP").with_date_format("%Y%");
        let err = layout.validate().expect_err("dangling percent sign");
        assert!(err.to_string().contains("\"%Y%\""));
    }

    #[test]
    fn test_lookup_without_join_columns_rejected() {
        let layout = TableLayout::new("STOCK").with_lookup(DescriptionLookup {
            table: "LOOKUP".to_string(),
            alias: "lk".to_string(),
            join_columns: Vec::new(),
            language_column: None,
            text_columns: vec!["TEXT".to_string()],
        });
        assert!(matches!(
            layout.validate(),
            Err(ExtractError::InvalidSpec(_))
        ));
    }
}
