//! MySQL Query Executor
//!
//! This module implements `QueryExecutor` on top of a single `mysql_async`
//! connection that lives for the whole reporting session.
//!
//! # Implementation Notes
//! - Queries go through the binary protocol (`exec_iter`) so integers, floats
//!   and dates arrive typed; DECIMAL columns still arrive as text and are kept that way
//! - Column names are taken from the result metadata, so empty result sets keep them
//! - With `strict_warnings` set, any server warning fails the query
//! - Every query passes the read-only guard before it reaches the server
//! - Server error codes are classified by `VintageError::from_server_code`

use chrono::NaiveDate;
use mysql_async::consts::ColumnType;
use mysql_async::{prelude::*, Conn, OptsBuilder, Row, Value};

use crate::capability::validate_query;
use crate::engine::{CellValue, ConnectionConfig, QueryExecutor, ResultRow, ResultSet};
use crate::error::{Result, VintageError};

/// Executor backed by one open MySQL connection
pub struct MySqlExecutor {
    conn: Conn,
    strict_warnings: bool,
}

impl MySqlExecutor {
    /// Open the connection described by `config`
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let opts = build_mysql_opts(config);

        let conn = Conn::new(opts).await.map_err(map_driver_error)?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Connected to MySQL"
        );

        Ok(Self { conn, strict_warnings: config.strict_warnings })
    }

    /// Fail the last statement if the server reported warnings for it
    async fn check_warnings(&mut self, sql: &str) -> Result<()> {
        let rows: Vec<Row> = self.conn.query("SHOW WARNINGS").await.map_err(map_driver_error)?;

        let Some(first) = rows.first() else {
            return Ok(());
        };

        let level: String = first.get_opt(0).and_then(|v| v.ok()).unwrap_or_default();
        let code: Option<u16> = first.get_opt(1).and_then(|v| v.ok());
        let message: String = first.get_opt(2).and_then(|v| v.ok()).unwrap_or_default();

        tracing::warn!(warnings = rows.len(), %level, ?code, query = sql, "Server reported warnings");

        Err(VintageError::Database {
            code,
            detail: format!("{level}: {message} ({} warning(s) raised in strict mode)", rows.len()),
        })
    }
}

impl QueryExecutor for MySqlExecutor {
    async fn fetch_all(&mut self, sql: &str) -> Result<ResultSet> {
        validate_query(sql)?;

        tracing::debug!(query = sql, "Executing query");

        let (columns, column_types, rows) = {
            let mut result = self.conn.exec_iter(sql, ()).await.map_err(map_driver_error)?;

            let columns: Vec<String> =
                result.columns_ref().iter().map(|col| col.name_str().to_string()).collect();
            let column_types: Vec<ColumnType> =
                result.columns_ref().iter().map(|col| col.column_type()).collect();

            let rows: Vec<Row> = result.collect().await.map_err(map_driver_error)?;
            (columns, column_types, rows)
        };

        if self.strict_warnings {
            self.check_warnings(sql).await?;
        }

        let rows: Vec<ResultRow> = rows.iter().map(|row| convert_row(row, &column_types)).collect();

        tracing::debug!(rows = rows.len(), columns = columns.len(), "Query complete");

        Ok(ResultSet::new(columns, rows))
    }

    async fn close(self) -> Result<()> {
        self.conn.disconnect().await.map_err(map_driver_error)?;
        tracing::info!("MySQL connection closed");
        Ok(())
    }
}

/// Build MySQL connection options from ConnectionConfig
fn build_mysql_opts(config: &ConnectionConfig) -> OptsBuilder {
    OptsBuilder::default()
        .ip_or_hostname(config.host.clone())
        .tcp_port(config.port)
        .user(Some(config.user.clone()))
        .pass(Some(config.password.clone()))
        .db_name(Some(config.database.clone()))
}

/// Classify a driver error
fn map_driver_error(err: mysql_async::Error) -> VintageError {
    match err {
        mysql_async::Error::Server(server) => {
            VintageError::from_server_code(server.code, server.message)
        }
        other => VintageError::database(other.to_string()),
    }
}

fn convert_row(row: &Row, column_types: &[ColumnType]) -> ResultRow {
    let cells = (0..row.len())
        .map(|idx| {
            let column_type =
                column_types.get(idx).copied().unwrap_or(ColumnType::MYSQL_TYPE_VAR_STRING);
            row.as_ref(idx).map_or(CellValue::Null, |value| convert_value(value, column_type))
        })
        .collect();
    ResultRow::new(cells)
}

/// Convert a binary-protocol value into a `CellValue`
fn convert_value(value: &Value, column_type: ColumnType) -> CellValue {
    match value {
        Value::NULL => CellValue::Null,

        Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) if is_decimal(column_type) => CellValue::Decimal(s.to_string()),
            Ok(s) => CellValue::Text(s.to_string()),
            Err(_) => CellValue::Bytes(bytes.clone()),
        },

        Value::Int(i) => CellValue::Int(*i),

        Value::UInt(u) => CellValue::UInt(*u),

        // Widen via the shortest f32 text so 0.1 stays 0.1
        Value::Float(f) => CellValue::Float(f.to_string().parse().unwrap_or(f64::from(*f))),

        Value::Double(d) => CellValue::Float(*d),

        Value::Date(year, month, day, hour, minute, second, micro) => {
            let Some(date) =
                NaiveDate::from_ymd_opt(i32::from(*year), u32::from(*month), u32::from(*day))
            else {
                // Zero dates ("0000-00-00") have no calendar representation
                return CellValue::Text(format!("{year:04}-{month:02}-{day:02}"));
            };

            if is_date_only(column_type) {
                return CellValue::Date(date);
            }

            date.and_hms_micro_opt(u32::from(*hour), u32::from(*minute), u32::from(*second), *micro)
                .map_or(CellValue::Date(date), CellValue::DateTime)
        }

        Value::Time(negative, days, hours, minutes, seconds, micros) => CellValue::Time {
            negative: *negative,
            hours: days * 24 + u32::from(*hours),
            minutes: *minutes,
            seconds: *seconds,
            micros: *micros,
        },
    }
}

const fn is_decimal(column_type: ColumnType) -> bool {
    matches!(column_type, ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL)
}

const fn is_date_only(column_type: ColumnType) -> bool {
    matches!(column_type, ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_decimal_kept_as_text() {
        let cell = convert_value(&Value::Bytes(b"41.3333".to_vec()), ColumnType::MYSQL_TYPE_NEWDECIMAL);
        assert_eq!(cell, CellValue::Decimal("41.3333".to_string()));
        assert_eq!(cell.to_string(), "41.3333");
    }

    #[test]
    fn test_convert_text_and_binary() {
        let cell = convert_value(&Value::Bytes(b"Merlot".to_vec()), ColumnType::MYSQL_TYPE_VAR_STRING);
        assert_eq!(cell, CellValue::Text("Merlot".to_string()));

        let cell = convert_value(&Value::Bytes(vec![0xff, 0x00]), ColumnType::MYSQL_TYPE_BLOB);
        assert_eq!(cell, CellValue::Bytes(vec![0xff, 0x00]));
    }

    #[test]
    fn test_convert_numbers() {
        assert_eq!(convert_value(&Value::Int(-3), ColumnType::MYSQL_TYPE_LONG), CellValue::Int(-3));
        assert_eq!(
            convert_value(&Value::UInt(40), ColumnType::MYSQL_TYPE_LONGLONG),
            CellValue::UInt(40)
        );
        assert_eq!(
            convert_value(&Value::Double(2.5), ColumnType::MYSQL_TYPE_DOUBLE),
            CellValue::Float(2.5)
        );
        assert_eq!(convert_value(&Value::NULL, ColumnType::MYSQL_TYPE_LONG), CellValue::Null);
    }

    #[test]
    fn test_convert_float_keeps_shortest_form() {
        let cell = convert_value(&Value::Float(0.1), ColumnType::MYSQL_TYPE_FLOAT);
        assert_eq!(cell, CellValue::Float(0.1));
        assert_eq!(cell.to_string(), "0.1");
    }

    #[test]
    fn test_convert_dates() {
        let date = convert_value(&Value::Date(2024, 3, 2, 0, 0, 0, 0), ColumnType::MYSQL_TYPE_DATE);
        assert_eq!(date.to_string(), "2024-03-02");

        let datetime =
            convert_value(&Value::Date(2024, 3, 2, 14, 5, 9, 0), ColumnType::MYSQL_TYPE_DATETIME);
        assert_eq!(datetime.to_string(), "2024-03-02 14:05:09");

        let zero = convert_value(&Value::Date(0, 0, 0, 0, 0, 0, 0), ColumnType::MYSQL_TYPE_DATE);
        assert_eq!(zero, CellValue::Text("0000-00-00".to_string()));
    }

    #[test]
    fn test_convert_time() {
        let time = convert_value(&Value::Time(false, 1, 2, 3, 4, 0), ColumnType::MYSQL_TYPE_TIME);
        assert_eq!(time.to_string(), "26:03:04");
    }

    // Note: Tests against a live server require a running MySQL instance
    // and are marked #[ignore]: cargo test -- --ignored

    #[tokio::test]
    #[ignore] // Requires running MySQL instance
    async fn test_connect_and_select() {
        let config = ConnectionConfig::new("localhost", 3306, "root", "password", "winery");
        let mut executor = MySqlExecutor::connect(&config).await.expect("connect");
        let result = executor.fetch_all("SELECT 1 AS one").await.expect("select");
        assert_eq!(result.columns, vec!["one".to_string()]);
        assert_eq!(result.rows.len(), 1);
        executor.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_connect_refused_is_database_error() {
        // Port 1 is never a MySQL server
        let config = ConnectionConfig::new("127.0.0.1", 1, "root", "password", "winery");
        let err = MySqlExecutor::connect(&config).await.err().expect("connection must fail");
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.server_code().is_none());
    }
}
