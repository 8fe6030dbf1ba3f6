//! Query specifications.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::layout::{validate_identifier, TableLayout};
use crate::config::DEFAULT_LANGUAGE;
use crate::error_handling::ExtractError;
use crate::source::Value;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day included.
    pub start: NaiveDate,
    /// Last day included.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range; ordering is checked by [`QuerySpec::validate`].
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Both bounds rendered with `format` (the source's date encoding).
    pub fn encode(&self, format: &str) -> (String, String) {
        (
            self.start.format(format).to_string(),
            self.end.format(format).to_string(),
        )
    }
}

/// One logical extraction request.
///
/// Filters live in a `BTreeMap`, so they are applied in column-name order and
/// the generated SQL is the same for equal specs.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Tables and columns involved.
    pub layout: TableLayout,
    /// Optional inclusive date range.
    pub date_range: Option<DateRange>,
    /// Primary filter key (e.g. a plant code).
    pub key: Option<String>,
    /// Language key for descriptive texts; defaults to `E`.
    pub language: Option<String>,
    /// Additional `column = value` filters on the primary table.
    pub filters: BTreeMap<String, Value>,
    /// Remove duplicate rows.
    pub distinct: bool,
    /// Maximum number of rows to fetch.
    pub limit: Option<u64>,
}

impl QuerySpec {
    /// A spec for `layout` with no restrictions.
    pub fn new(layout: TableLayout) -> Self {
        Self {
            layout,
            date_range: None,
            key: None,
            language: None,
            filters: BTreeMap::new(),
            distinct: false,
            limit: None,
        }
    }

    /// Restricts to the primary filter key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Restricts to an inclusive date range.
    #[must_use]
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    /// Sets the language key for descriptive texts.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Adds an equality filter; a repeated column replaces the earlier value.
    #[must_use]
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    /// Requests duplicate removal.
    #[must_use]
    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Caps the number of rows.
    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Language key to bind for the lookup join.
    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Checks the request before any SQL is built.
    ///
    /// # Errors
    ///
    /// `ExtractError::InvalidSpec` when the range is reversed, a range is given
    /// for a layout without a date source, a key is given for a layout without
    /// a key column, or any identifier is unsafe.
    pub fn validate(&self) -> Result<(), ExtractError> {
        self.layout.validate()?;

        if let Some(range) = &self.date_range {
            if range.start > range.end {
                return Err(ExtractError::InvalidSpec(format!(
                    "date range start {} is after end {}",
                    range.start, range.end
                )));
            }
            if self.layout.dates.is_none() {
                return Err(ExtractError::InvalidSpec(format!(
                    "table {} has no date source for a date range",
                    self.layout.table
                )));
            }
        }

        if self.key.is_some() && self.layout.key_column.is_none() {
            return Err(ExtractError::InvalidSpec(format!(
                "table {} has no key column for a primary filter key",
                self.layout.table
            )));
        }

        for column in self.filters.keys() {
            validate_identifier("filter column", column)?;
        }

        Ok(())
    }
}
