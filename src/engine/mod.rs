//! Query Executor Trait and Core Types
//!
//! This module defines the data-access abstraction used by every report.
//! A `QueryExecutor` owns one open connection, runs opaque SQL text and hands
//! back a fully materialised `ResultSet`.
//!
//! # Handle Lifecycle
//! The executor is opened once by the session, passed by `&mut` into each
//! report, and consumed by `close`. Nothing holds a connection in ambient scope.
//!
//! # Materialised Results
//! Results are read to completion before `fetch_all` returns. Callers consume
//! the rows once; there is no live cursor to iterate a second time.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

use crate::error::{Result, VintageError};

// MySQL implementation
#[cfg(feature = "mysql")]
pub mod mysql;

/// Default MySQL TCP port
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Connection parameters for the database service
///
/// The password is resolved before this struct is built (see `config`).
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Hostname or IP address
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Username
    pub user: String,

    /// Password
    /// WARNING: Sensitive data, do not log or include in error messages
    pub password: String,

    /// Database (schema) name
    pub database: String,

    /// Turn server warnings into query failures
    pub strict_warnings: bool,
}

impl ConnectionConfig {
    /// Create a new connection config with strict warnings enabled
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
            strict_warnings: true,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("strict_warnings", &self.strict_warnings)
            .finish()
    }
}

/// One scalar value returned by the database
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Fixed-point value kept exactly as the server formatted it
    Decimal(String),
    Text(String),
    /// Bytes that are not valid UTF-8
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// MySQL TIME: a signed duration, hours may exceed 24
    Time { negative: bool, hours: u32, minutes: u8, seconds: u8, micros: u32 },
}

impl CellValue {
    /// Numeric view of the value
    ///
    /// NULL becomes `NaN` so that a chart leaves the bar out while keeping its
    /// position in the series. Text that does not parse is an error.
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Self::Null => Ok(f64::NAN),
            Self::Int(i) => Ok(*i as f64),
            Self::UInt(u) => Ok(*u as f64),
            Self::Float(f) => Ok(*f),
            Self::Decimal(s) | Self::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                VintageError::invalid_input(format!("Value '{s}' is not numeric"))
            }),
            other => Err(VintageError::invalid_input(format!("Value '{other}' is not numeric"))),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(s) | Self::Text(s) => f.write_str(s),
            Self::Bytes(bytes) => {
                use base64::Engine;
                f.write_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Time { negative, hours, minutes, seconds, micros } => {
                let sign = if *negative { "-" } else { "" };
                write!(f, "{sign}{hours}:{minutes:02}:{seconds:02}")?;
                if *micros > 0 {
                    write!(f, ".{micros:06}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

/// One row of a result set
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultRow(Vec<CellValue>);

impl ResultRow {
    #[must_use]
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self(cells)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn cells(&self) -> &[CellValue] {
        &self.0
    }

    /// Cell at `idx`, or an `InvalidInput` error naming the missing column
    pub fn cell(&self, idx: usize) -> Result<&CellValue> {
        self.0.get(idx).ok_or_else(|| {
            VintageError::invalid_input(format!(
                "Row has {} column(s), column {idx} requested",
                self.0.len()
            ))
        })
    }

    /// Display string of the cell at `idx`
    pub fn text(&self, idx: usize) -> Result<String> {
        Ok(self.cell(idx)?.to_string())
    }

    /// Numeric value of the cell at `idx`
    pub fn number(&self, idx: usize) -> Result<f64> {
        self.cell(idx)?.as_f64()
    }
}

impl From<Vec<CellValue>> for ResultRow {
    fn from(cells: Vec<CellValue>) -> Self {
        Self(cells)
    }
}

/// Build a `ResultRow` from heterogeneous literals
///
/// ```
/// let row = vintage::row![1_i64, "Merlot", 12.5];
/// assert_eq!(row.len(), 3);
/// ```
#[macro_export]
macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        $crate::engine::ResultRow::new(vec![$($crate::engine::CellValue::from($cell)),*])
    };
}

/// Query execution result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    /// Column names as reported by the server
    pub columns: Vec<String>,

    /// Materialised rows, in server order
    pub rows: Vec<ResultRow>,
}

impl ResultSet {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<ResultRow>) -> Self {
        Self { columns, rows }
    }
}

/// Data-access handle used by every report
///
/// Implementations hold one open connection. `fetch_all` may be called any
/// number of times; `close` releases the connection and consumes the handle.
pub trait QueryExecutor {
    /// Execute an opaque query and return every row it produced
    fn fetch_all(&mut self, sql: &str) -> impl std::future::Future<Output = Result<ResultSet>> + Send;

    /// Release the connection
    fn close(self) -> impl std::future::Future<Output = Result<()>> + Send;
}
