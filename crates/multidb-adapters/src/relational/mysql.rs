// crates/multidb-adapters/src/relational/mysql.rs
// ============================================================================
// Module: MySQL Relational Store
// Description: Bounded, lazily connecting MySQL pool.
// Purpose: Serve the relational tools from a shared MySQL deployment.
// Dependencies: sqlx, chrono
// ============================================================================

//! ## Overview
//! The pool is created without connecting; connections open on demand up to
//! `max_connections` and further acquires queue until one is released.
//! Column values are decoded by their reported MySQL type into JSON.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use serde_json::Value;
use sqlx::Column;
use sqlx::MySqlPool;
use sqlx::Row as _;
use sqlx::TypeInfo;
use sqlx::ValueRef;
use sqlx::mysql::MySqlArguments;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::mysql::MySqlRow;
use sqlx::query::Query;

use super::ExecuteOutcome;
use super::RelationalStore;
use super::Row;
use super::quote_identifier;
use crate::error::StoreError;

/// Time allowed to acquire a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// MySQL connection parameters.
#[derive(Debug, Clone)]
pub struct MySqlSettings {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// User name.
    pub user: String,
    /// Password.
    pub password: String,
    /// Selected database.
    pub database: String,
    /// Pool size.
    pub max_connections: u32,
}

/// MySQL-backed relational store.
pub struct MySqlStore {
    /// Lazily connecting pool.
    pool: MySqlPool,
}

impl MySqlStore {
    /// Builds the pool without opening any connection.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(settings: &MySqlSettings) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database);
        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);
        Self {
            pool,
        }
    }
}

/// Binds JSON values as positional statement parameters.
fn bind_values<'q>(
    mut query: Query<'q, sqlx::MySql, MySqlArguments>,
    values: Vec<Value>,
) -> Query<'q, sqlx::MySql, MySqlArguments> {
    for value in values {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(flag) => query.bind(flag),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    query.bind(int)
                } else if let Some(uint) = number.as_u64() {
                    query.bind(uint)
                } else {
                    query.bind(number.as_f64().unwrap_or_default())
                }
            }
            Value::String(text) => query.bind(text),
            nested @ (Value::Array(_) | Value::Object(_)) => query.bind(nested.to_string()),
        };
    }
    query
}

/// Classifies a driver error as connectivity or statement failure.
fn classify(err: &sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

/// Converts a result row into a column-name keyed JSON object.
fn row_to_json(row: &MySqlRow) -> Result<Row, sqlx::Error> {
    let mut object = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = if row.try_get_raw(index)?.is_null() {
            Value::Null
        } else {
            column_value(row, index, column.type_info().name())?
        };
        object.insert(column.name().to_string(), value);
    }
    Ok(object)
}

/// Decodes one non-null column by its MySQL type name.
fn column_value(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Value::from(row.try_get::<i64, _>(index)?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => Value::from(row.try_get::<u64, _>(index)?),
        "FLOAT" => Value::from(f64::from(row.try_get::<f32, _>(index)?)),
        "DOUBLE" => Value::from(row.try_get::<f64, _>(index)?),
        "DATE" => Value::String(row.try_get::<NaiveDate, _>(index)?.to_string()),
        "DATETIME" | "TIMESTAMP" => {
            Value::String(row.try_get::<NaiveDateTime, _>(index)?.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        "TIME" => Value::String(row.try_get::<NaiveTime, _>(index)?.to_string()),
        "JSON" => {
            let text = row.try_get_unchecked::<String, _>(index)?;
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" | "BIT" => {
            bytes_value(row.try_get_unchecked::<Vec<u8>, _>(index)?)
        }
        _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}

/// Renders binary data as text when it is UTF-8, else as a byte array.
fn bytes_value(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(err) => Value::Array(err.into_bytes().into_iter().map(Value::from).collect()),
    }
}

impl MySqlStore {
    /// Runs a row-returning statement and converts every row.
    async fn fetch_rows(&self, sql: &str, values: Vec<Value>) -> Result<Vec<Row>, StoreError> {
        let rows = bind_values(sqlx::query(sqlx::AssertSqlSafe(sql)), values)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| classify(&err))?;
        rows.iter().map(|row| row_to_json(row).map_err(|err| classify(&err))).collect()
    }
}

#[async_trait]
impl RelationalStore for MySqlStore {
    async fn query(&self, sql: &str, values: Vec<Value>) -> Result<Vec<Row>, StoreError> {
        self.fetch_rows(sql, values).await
    }

    async fn execute(&self, sql: &str, values: Vec<Value>) -> Result<ExecuteOutcome, StoreError> {
        let result = bind_values(sqlx::query(sqlx::AssertSqlSafe(sql)), values)
            .execute(&self.pool)
            .await
            .map_err(|err| classify(&err))?;
        Ok(ExecuteOutcome {
            affected_rows: result.rows_affected(),
            insert_id: result.last_insert_id(),
        })
    }

    async fn show_columns(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let sql = format!("SHOW COLUMNS FROM {}", quote_identifier(table, '`')?);
        self.fetch_rows(&sql, Vec::new()).await
    }

    async fn list_tables(&self) -> Result<Vec<Row>, StoreError> {
        self.fetch_rows("SHOW TABLES", Vec::new()).await
    }
}
