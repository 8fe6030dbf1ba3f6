//! SQL construction.
//!
//! Values never enter the SQL text: every value is pushed as a `?` placeholder
//! and appended to the parameter list at the same moment, so placeholders and
//! parameters cannot drift out of order. Identifiers come from a validated
//! [`TableLayout`] or are validated here.

use super::layout::{validate_identifier, DateSource, DescriptionLookup, DocumentDates, TableLayout};
use super::spec::QuerySpec;
use crate::error_handling::ExtractError;
use crate::source::Value;

/// Alias of the document subquery joined into the preferred query.
const DOCUMENTS_ALIAS: &str = "docs";

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    text: String,
    params: Vec<Value>,
    has_where: bool,
}

impl SqlQuery {
    /// Starts a query from `base`, which must not contain a WHERE clause yet.
    ///
    /// Use [`SqlQuery::with_where`] for a base that already filters.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            text: base.into(),
            params: Vec::new(),
            has_where: false,
        }
    }

    /// Starts a query from `base`, whose text already ends in a WHERE clause.
    /// `params` are the values for the placeholders `base` already holds.
    ///
    /// Later conditions are joined with ` AND `.
    pub fn with_where(base: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Self {
        Self {
            text: base.into(),
            params: params.into_iter().collect(),
            has_where: true,
        }
    }

    /// Appends raw SQL.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.text.push_str(sql);
        self
    }

    /// Appends a `?` placeholder and binds `value` to it.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.text.push('?');
        self.params.push(value.into());
        self
    }

    /// Starts a new condition: ` WHERE ` the first time, ` AND ` afterwards.
    pub fn push_condition(&mut self) -> &mut Self {
        if self.has_where {
            self.text.push_str(" AND ");
        } else {
            self.text.push_str(" WHERE ");
            self.has_where = true;
        }
        self
    }

    /// The SQL text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parameters in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Splits into `(text, params)`.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.text, self.params)
    }
}

/// Appends one bound equality condition per filter, in iteration order.
///
/// Columns are qualified with `qualifier` when it is non-empty. Callers that
/// need reproducible text must pass an ordered collection.
///
/// # Errors
///
/// Returns `ExtractError::InvalidSpec` if a column name is not a plain identifier.
pub fn build_filtered_query<'a, I>(
    mut base: SqlQuery,
    qualifier: &str,
    filters: I,
) -> Result<SqlQuery, ExtractError>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    for (column, value) in filters {
        validate_identifier("filter column", column)?;
        base.push_condition();
        base.push(&qualified(qualifier, column));
        base.push(" = ");
        base.push_bind(value.clone());
    }
    Ok(base)
}

/// The enriched query: primary table joined to the descriptive lookup and, for
/// a date range over documents, to the matching document items.
///
/// # Errors
///
/// Returns `ExtractError::InvalidSpec` if `spec` does not validate.
pub fn build_preferred_query(spec: &QuerySpec) -> Result<SqlQuery, ExtractError> {
    spec.validate()?;
    let layout = &spec.layout;
    let m = layout.alias.as_str();

    let mut query = SqlQuery::new(select_clause(spec.distinct));
    query.push(&preferred_projection(layout));
    query.push(" FROM ");
    query.push(&layout.qualify(&layout.table));
    query.push(" ");
    query.push(m);

    if let Some(lookup) = &layout.lookup {
        push_lookup_join(&mut query, layout, lookup, spec);
    }

    if let (Some(range), Some(DateSource::Documents(docs))) = (&spec.date_range, &layout.dates) {
        let (start, end) = range.encode(&layout.date_format);
        query.push(" JOIN (SELECT DISTINCT ");
        query.push(&qualified_list(&docs.item_alias, &docs.match_columns));
        push_document_from(&mut query, layout, docs);
        query.push(" WHERE ");
        query.push(&qualified(&docs.header_alias, &docs.date_column));
        query.push(" BETWEEN ");
        query.push_bind(start);
        query.push(" AND ");
        query.push_bind(end);
        if let (Some(key), Some(key_column)) = (&spec.key, &layout.key_column) {
            query.push(" AND ");
            query.push(&qualified(&docs.item_alias, key_column));
            query.push(" = ");
            query.push_bind(key.as_str());
        }
        query.push(") ");
        query.push(DOCUMENTS_ALIAS);
        query.push(" ON ");
        query.push(&join_condition(m, DOCUMENTS_ALIAS, &docs.match_columns));
    }

    push_key_condition(&mut query, spec);
    if let (Some(range), Some(DateSource::Column(column))) = (&spec.date_range, &layout.dates) {
        push_column_range(&mut query, m, column, range.encode(&layout.date_format));
    }

    let mut query = build_filtered_query(query, m, &spec.filters)?;
    push_limit(&mut query, spec.limit);
    Ok(query)
}

/// The reduced query: primary table only, primary columns only, same key,
/// date and filter restrictions. A document date range becomes an `EXISTS`
/// semi-join so no lookup or projection from other tables is involved.
///
/// # Errors
///
/// Returns `ExtractError::InvalidSpec` if `spec` does not validate.
pub fn build_fallback_query(spec: &QuerySpec) -> Result<SqlQuery, ExtractError> {
    spec.validate()?;
    let layout = &spec.layout;
    let m = layout.alias.as_str();

    let mut query = SqlQuery::new(select_clause(spec.distinct));
    query.push(&primary_projection(layout));
    query.push(" FROM ");
    query.push(&layout.qualify(&layout.table));
    query.push(" ");
    query.push(m);

    push_key_condition(&mut query, spec);

    if let Some(range) = &spec.date_range {
        let encoded = range.encode(&layout.date_format);
        match &layout.dates {
            Some(DateSource::Column(column)) => push_column_range(&mut query, m, column, encoded),
            Some(DateSource::Documents(docs)) => {
                let (start, end) = encoded;
                query.push_condition();
                query.push("EXISTS (SELECT 1");
                push_document_from(&mut query, layout, docs);
                query.push(" WHERE ");
                query.push(&qualified(&docs.header_alias, &docs.date_column));
                query.push(" BETWEEN ");
                query.push_bind(start);
                query.push(" AND ");
                query.push_bind(end);
                query.push(" AND ");
                query.push(&join_condition(&docs.item_alias, m, &docs.match_columns));
                query.push(")");
            }
            // Rejected by validation
            None => {}
        }
    }

    let mut query = build_filtered_query(query, m, &spec.filters)?;
    push_limit(&mut query, spec.limit);
    Ok(query)
}

/// Column names the preferred query is documented to return, when the layout
/// lists its columns (`None` for an all-columns projection).
pub fn preferred_columns(layout: &TableLayout) -> Option<Vec<String>> {
    if layout.columns.is_empty() {
        return None;
    }
    let mut columns = layout.columns.clone();
    if let Some(lookup) = &layout.lookup {
        let at = text_insert_position(layout, lookup);
        for (offset, text) in lookup.text_columns.iter().enumerate() {
            columns.insert(at + offset, text.clone());
        }
    }
    Some(columns)
}

fn select_clause(distinct: bool) -> &'static str {
    if distinct {
        "SELECT DISTINCT "
    } else {
        "SELECT "
    }
}

fn qualified(qualifier: &str, column: &str) -> String {
    if qualifier.is_empty() {
        column.to_string()
    } else {
        format!("{qualifier}.{column}")
    }
}

fn qualified_list(qualifier: &str, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| qualified(qualifier, c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_condition(left: &str, right: &str, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("{} = {}", qualified(left, c), qualified(right, c)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn primary_projection(layout: &TableLayout) -> String {
    if layout.columns.is_empty() {
        format!("{}.*", layout.alias)
    } else {
        qualified_list(&layout.alias, &layout.columns)
    }
}

/// Descriptive columns go right after the first join column of the primary
/// projection (material text next to material number); at the end otherwise.
fn text_insert_position(layout: &TableLayout, lookup: &DescriptionLookup) -> usize {
    layout
        .columns
        .iter()
        .position(|c| lookup.join_columns.contains(c))
        .map(|i| i + 1)
        .unwrap_or(layout.columns.len())
}

fn preferred_projection(layout: &TableLayout) -> String {
    let Some(lookup) = &layout.lookup else {
        return primary_projection(layout);
    };
    let texts: Vec<String> = lookup
        .text_columns
        .iter()
        .map(|c| qualified(&lookup.alias, c))
        .collect();
    if layout.columns.is_empty() {
        let mut parts = vec![format!("{}.*", layout.alias)];
        parts.extend(texts);
        return parts.join(", ");
    }

    let mut parts: Vec<String> = layout
        .columns
        .iter()
        .map(|c| qualified(&layout.alias, c))
        .collect();
    let at = text_insert_position(layout, lookup);
    for (offset, text) in texts.into_iter().enumerate() {
        parts.insert(at + offset, text);
    }
    parts.join(", ")
}

fn push_lookup_join(
    query: &mut SqlQuery,
    layout: &TableLayout,
    lookup: &DescriptionLookup,
    spec: &QuerySpec,
) {
    query.push(" JOIN ");
    query.push(&layout.qualify(&lookup.table));
    query.push(" ");
    query.push(&lookup.alias);
    query.push(" ON ");
    query.push(&join_condition(
        &layout.alias,
        &lookup.alias,
        &lookup.join_columns,
    ));
    if let Some(language_column) = &lookup.language_column {
        query.push(" AND ");
        query.push(&qualified(&lookup.alias, language_column));
        query.push(" = ");
        query.push_bind(spec.language_or_default());
    }
}

fn push_document_from(query: &mut SqlQuery, layout: &TableLayout, docs: &DocumentDates) {
    query.push(" FROM ");
    query.push(&layout.qualify(&docs.item_table));
    query.push(" ");
    query.push(&docs.item_alias);
    query.push(" JOIN ");
    query.push(&layout.qualify(&docs.header_table));
    query.push(" ");
    query.push(&docs.header_alias);
    query.push(" ON ");
    query.push(&join_condition(
        &docs.item_alias,
        &docs.header_alias,
        &docs.header_join_columns,
    ));
}

fn push_key_condition(query: &mut SqlQuery, spec: &QuerySpec) {
    if let (Some(key), Some(key_column)) = (&spec.key, &spec.layout.key_column) {
        query.push_condition();
        query.push(&qualified(&spec.layout.alias, key_column));
        query.push(" = ");
        query.push_bind(key.as_str());
    }
}

fn push_column_range(query: &mut SqlQuery, alias: &str, column: &str, (start, end): (String, String)) {
    query.push_condition();
    query.push(&qualified(alias, column));
    query.push(" BETWEEN ");
    query.push_bind(start);
    query.push(" AND ");
    query.push_bind(end);
}

fn push_limit(query: &mut SqlQuery, limit: Option<u64>) {
    if let Some(limit) = limit {
        query.push(" LIMIT ");
        // SQLite and HANA both bind LIMIT; i64 covers any practical row cap
        query.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
}
