//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout Vintage.
//! Every error maps to a stable error code so that console output and log lines
//! can be matched programmatically.
//!
//! # Error Categories
//! - `AccessDenied`: The server rejected the supplied credentials
//! - `SchemaMissing`: The target database or table does not exist
//! - `Database`: Any other error reported by the server or the driver
//! - `CapabilityViolation`: A query that is not read-only
//! - `InvalidInput`: Malformed input handed to a library operation
//! - `ConfigError`: Profile files, environment variables, missing credentials
//! - `ChartFailed`: The chart surface could not be written
//! - `Io`: Console or file I/O

use thiserror::Error;

/// MySQL server error code for rejected credentials (`ER_ACCESS_DENIED_ERROR`)
pub const ER_ACCESS_DENIED_ERROR: u16 = 1045;

/// MySQL server error code for an unknown database (`ER_BAD_DB_ERROR`)
pub const ER_BAD_DB_ERROR: u16 = 1049;

/// MySQL server error code for an unknown table (`ER_NO_SUCH_TABLE`)
pub const ER_NO_SUCH_TABLE: u16 = 1146;

/// Main error type for Vintage operations
#[derive(Error, Debug)]
pub enum VintageError {
    /// Supplied username or password are invalid
    #[error("The supplied username or password are invalid. MySQL error code: {code}")]
    AccessDenied { code: u16, detail: String },

    /// The database or an object inside it does not exist
    #[error("The specified database or table does not exist. MySQL error code: {code}")]
    SchemaMissing { code: u16, detail: String },

    /// Any other database failure
    #[error("{}", database_message(.code, .detail))]
    Database { code: Option<u16>, detail: String },

    /// Query rejected before execution
    #[error("Capability violation: {0}")]
    CapabilityViolation(String),

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error (profile file, environment, credentials)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Chart could not be produced or written
    #[error("Chart output failed: {0}")]
    ChartFailed(String),

    /// Console or file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn database_message(code: &Option<u16>, detail: &str) -> String {
    match code {
        Some(code) => format!("General MySQL error {code}: {detail}"),
        None => format!("General MySQL error: {detail}"),
    }
}

impl VintageError {
    /// Convert error to a stable error code string
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccessDenied { .. } => "ACCESS_DENIED",
            Self::SchemaMissing { .. } => "SCHEMA_MISSING",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::CapabilityViolation(_) => "CAPABILITY_VIOLATION",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ChartFailed(_) => "CHART_FAILED",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// MySQL server error code, when the failure came from the server
    #[must_use]
    pub const fn server_code(&self) -> Option<u16> {
        match self {
            Self::AccessDenied { code, .. } | Self::SchemaMissing { code, .. } => Some(*code),
            Self::Database { code, .. } => *code,
            _ => None,
        }
    }

    /// Whether this error came from the database service
    ///
    /// Database errors end the reporting session; everything else is a local problem.
    #[must_use]
    pub const fn is_database(&self) -> bool {
        matches!(self, Self::AccessDenied { .. } | Self::SchemaMissing { .. } | Self::Database { .. })
    }

    /// Get human-readable error message
    ///
    /// Never contains the password; server detail text is kept out of the
    /// access-denied and missing-schema messages.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Classify a server error by its MySQL error code
    pub fn from_server_code(code: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match code {
            ER_ACCESS_DENIED_ERROR => Self::AccessDenied { code, detail },
            ER_BAD_DB_ERROR | ER_NO_SUCH_TABLE => Self::SchemaMissing { code, detail },
            _ => Self::Database { code: Some(code), detail },
        }
    }

    /// Create a database error without a server code (driver or transport failure)
    pub fn database(detail: impl Into<String>) -> Self {
        Self::Database { code: None, detail: detail.into() }
    }

    /// Create a capability violation error
    pub fn capability_violation(message: impl Into<String>) -> Self {
        Self::CapabilityViolation(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a chart output error
    pub fn chart_failed(message: impl Into<String>) -> Self {
        Self::ChartFailed(message.into())
    }
}

/// Result type alias for Vintage operations
pub type Result<T> = std::result::Result<T, VintageError>;
