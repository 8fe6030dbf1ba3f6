//! Configuration types.
//!
//! This module defines the enums and structs used for command-line argument
//! parsing and for connecting to the data source.

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{DEFAULT_QUERY_TIMEOUT, PLACEHOLDER_SECRETS};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Whether the run is allowed to use throwaway credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Local work; placeholder secrets are tolerated.
    Development,
    /// Real data source; placeholder or empty secrets are rejected.
    Production,
}

/// Connection parameters for the data source.
///
/// Always supplied from outside the program (CLI flags, environment variables
/// or a `.env` file). `Debug` output never includes the password.
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Database URL understood by the adapter (e.g. `sqlite://stock.db`).
    pub url: String,
    /// Password for the database user, if the source needs one.
    pub password: Option<String>,
    /// Run mode, see [`RunMode`].
    pub mode: RunMode,
    /// Per-statement timeout; `None` waits as long as the transport allows.
    pub query_timeout: Option<Duration>,
}

impl ConnectionSettings {
    /// Creates development-mode settings for `url` with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            password: None,
            mode: RunMode::Development,
            query_timeout: Some(DEFAULT_QUERY_TIMEOUT),
        }
    }

    /// Checks the settings before a connection is attempted.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingSetting` if the URL is blank
    /// - `ConfigError::PlaceholderSecret` in production mode when the password
    ///   is missing, empty or a known placeholder
    /// - `ConfigError::Invalid` for a zero timeout
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingSetting("database url"));
        }
        if self.query_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "query timeout must be greater than zero".to_string(),
            ));
        }
        if self.mode == RunMode::Production {
            match self.password.as_deref().map(str::trim) {
                None | Some("") => return Err(ConfigError::PlaceholderSecret),
                Some(p) if is_placeholder_secret(p) => {
                    return Err(ConfigError::PlaceholderSecret)
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("url", &self.url)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("mode", &self.mode)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

fn is_placeholder_secret(password: &str) -> bool {
    let lowered = password.to_ascii_lowercase();
    PLACEHOLDER_SECRETS.iter().any(|p| *p == lowered)
}
