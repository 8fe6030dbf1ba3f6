//! Configuration constants.
//!
//! Defaults shared by the library and the CLI: source encodings, naming of
//! output files and limits applied to diagnostic text.

use std::time::Duration;

/// Schema that holds the SAP application tables on a standard HANA install.
pub const DEFAULT_SCHEMA: &str = "SAPABAP1";

/// Language key used for descriptive texts when the caller gives none ('E' = English).
pub const DEFAULT_LANGUAGE: &str = "E";

/// Native date encoding of the source system (SAP `DATS`, e.g. `20250401`).
pub const SOURCE_DATE_FORMAT: &str = "%Y%m%d";

/// Date format accepted on the command line.
pub const CLI_DATE_FORMAT: &str = "%Y-%m-%d";

/// Name of the single worksheet written to spreadsheet exports.
pub const SHEET_NAME: &str = "Sheet1";

/// Default per-statement timeout for the sqlx adapter.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(300);

/// Maximum length of a database error message kept in logs and errors.
/// Longer messages are truncated (some drivers echo the full statement back).
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;

/// Passwords that are only ever seen as template placeholders.
/// Production mode refuses to connect with any of these.
pub const PLACEHOLDER_SECRETS: &[&str] = &[
    "password",
    "changeme",
    "change_me",
    "secret",
    "your_password",
    "yourpassword",
    "<password>",
    "replace_me",
    "todo",
];
