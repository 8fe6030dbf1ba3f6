//! Query specifications and SQL construction.
//!
//! - [`TableLayout`]: which tables and columns an extraction touches
//! - [`QuerySpec`]: one extraction request (key, date range, filters, ...)
//! - [`build_preferred_query`] / [`build_fallback_query`]: the enriched and
//!   the reduced SELECT for a spec
//! - [`build_filtered_query`]: bound equality filters on top of any base query

mod builder;
mod layout;
mod spec;

pub use builder::{
    build_fallback_query, build_filtered_query, build_preferred_query, preferred_columns, SqlQuery,
};
pub use layout::{validate_identifier, DateSource, DescriptionLookup, DocumentDates, TableLayout};
pub use spec::{DateRange, QuerySpec};
