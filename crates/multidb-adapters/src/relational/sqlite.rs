// crates/multidb-adapters/src/relational/sqlite.rs
// ============================================================================
// Module: SQLite Relational Store
// Description: Embedded SQLite database behind a small connection pool.
// Purpose: Serve the relational tools without an external server.
// Dependencies: rusqlite, tokio
// ============================================================================

//! ## Overview
//! Connections open lazily, up to the pool size, and run statements on the
//! blocking thread pool. A semaphore bounds concurrent statements; excess
//! work queues. The blocking task owns its permit and returns the connection
//! to the pool itself, so a caller that stops waiting (deadline expiry) never
//! loses the connection or frees its slot early. An in-memory database is
//! private to its connection, so `:memory:` always uses a single connection.
//!
//! Column output mirrors MySQL's `SHOW COLUMNS` shape so callers see the same
//! keys regardless of backend.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use rusqlite::types::ValueRef;
use serde_json::Value;
use tokio::sync::Semaphore;

use super::ExecuteOutcome;
use super::RelationalStore;
use super::Row;
use super::quote_identifier;
use crate::error::StoreError;

/// Path selecting a private in-memory database.
const MEMORY_PATH: &str = ":memory:";
/// Busy timeout applied to every connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed relational store.
pub struct SqliteStore {
    /// Database path.
    path: Arc<str>,
    /// Bounds concurrent statements to the pool size.
    permits: Arc<Semaphore>,
    /// Idle connections ready for reuse.
    idle: Arc<Mutex<Vec<Connection>>>,
}

impl SqliteStore {
    /// Creates a pool of at most `max_connections` connections to `path`.
    #[must_use]
    pub fn new(path: &str, max_connections: u32) -> Self {
        let size = if path == MEMORY_PATH {
            1
        } else {
            usize::try_from(max_connections.max(1)).unwrap_or(1)
        };
        Self {
            path: Arc::from(path),
            permits: Arc::new(Semaphore::new(size)),
            idle: Arc::new(Mutex::new(Vec::with_capacity(size))),
        }
    }

    /// Runs `work` on a pooled connection off the async runtime.
    async fn with_connection<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| StoreError::Unavailable("sqlite pool closed".to_string()))?;
        let idle = Arc::clone(&self.idle);
        let path = Arc::clone(&self.path);
        let result = tokio::task::spawn_blocking(move || {
            let reused = idle
                .lock()
                .map_err(|_| StoreError::Backend("sqlite pool lock poisoned".to_string()))?
                .pop();
            let connection = match reused {
                Some(connection) => connection,
                None => open_connection(&path)?,
            };
            let result = work(&connection);
            if let Ok(mut idle) = idle.lock() {
                idle.push(connection);
            }
            drop(permit);
            Ok::<_, StoreError>(result)
        })
        .await
        .map_err(|err| StoreError::Backend(err.to_string()))??;
        result.map_err(|err| StoreError::Backend(err.to_string()))
    }
}

/// Opens a connection with the store's pragmas applied.
fn open_connection(path: &str) -> Result<Connection, StoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
        | OpenFlags::SQLITE_OPEN_URI;
    let connection = Connection::open_with_flags(path, flags)
        .map_err(|err| StoreError::Unavailable(err.to_string()))?;
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| StoreError::Unavailable(err.to_string()))?;
    if path != MEMORY_PATH {
        connection
            .execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
    }
    connection.busy_timeout(BUSY_TIMEOUT).map_err(|err| StoreError::Unavailable(err.to_string()))?;
    Ok(connection)
}

/// Converts a JSON parameter into an SQLite value.
fn to_sql_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(flag)),
        Value::Number(number) => match number.as_i64() {
            Some(int) => SqlValue::Integer(int),
            None => SqlValue::Real(number.as_f64().unwrap_or_default()),
        },
        Value::String(text) => SqlValue::Text(text),
        nested @ (Value::Array(_) | Value::Object(_)) => SqlValue::Text(nested.to_string()),
    }
}

/// Converts an SQLite cell into JSON.
fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(int) => Value::from(int),
        ValueRef::Real(real) => Value::from(real),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().copied().map(Value::from).collect()),
    }
}

/// Runs a row-returning statement on `connection`.
fn fetch_rows(
    connection: &Connection,
    sql: &str,
    values: Vec<Value>,
) -> Result<Vec<Row>, rusqlite::Error> {
    let mut statement = connection.prepare(sql)?;
    let names: Vec<String> =
        statement.column_names().into_iter().map(str::to_string).collect();
    let mut rows = statement.query(params_from_iter(values.into_iter().map(to_sql_value)))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut object = Row::new();
        for (index, name) in names.iter().enumerate() {
            object.insert(name.clone(), from_sql_value(row.get_ref(index)?));
        }
        out.push(object);
    }
    Ok(out)
}

/// Reshapes `PRAGMA table_info` rows into `SHOW COLUMNS` form.
fn column_rows(info: Vec<Row>) -> Vec<Row> {
    info.into_iter()
        .map(|column| {
            let not_null = column.get("notnull").and_then(Value::as_i64).unwrap_or_default() != 0;
            let primary = column.get("pk").and_then(Value::as_i64).unwrap_or_default() != 0;
            let mut row = Row::new();
            row.insert("Field".to_string(), column.get("name").cloned().unwrap_or(Value::Null));
            row.insert("Type".to_string(), column.get("type").cloned().unwrap_or(Value::Null));
            row.insert("Null".to_string(), Value::from(if not_null { "NO" } else { "YES" }));
            row.insert("Key".to_string(), Value::from(if primary { "PRI" } else { "" }));
            row.insert(
                "Default".to_string(),
                column.get("dflt_value").cloned().unwrap_or(Value::Null),
            );
            row.insert("Extra".to_string(), Value::from(""));
            row
        })
        .collect()
}

/// Builds the `PRAGMA table_info` statement for a possibly qualified table.
fn table_info_sql(table: &str) -> Result<String, StoreError> {
    match table.split_once('.') {
        Some((schema, name)) => Ok(format!(
            "PRAGMA {}.table_info({})",
            quote_identifier(schema, '"')?,
            quote_identifier(name, '"')?
        )),
        None => Ok(format!("PRAGMA table_info({})", quote_identifier(table, '"')?)),
    }
}

#[async_trait]
impl RelationalStore for SqliteStore {
    async fn query(&self, sql: &str, values: Vec<Value>) -> Result<Vec<Row>, StoreError> {
        let sql = sql.to_string();
        self.with_connection(move |connection| fetch_rows(connection, &sql, values)).await
    }

    async fn execute(&self, sql: &str, values: Vec<Value>) -> Result<ExecuteOutcome, StoreError> {
        let sql = sql.to_string();
        self.with_connection(move |connection| {
            let mut statement = connection.prepare(&sql)?;
            let changed = statement.execute(params_from_iter(values.into_iter().map(to_sql_value)))?;
            Ok(ExecuteOutcome {
                affected_rows: u64::try_from(changed).unwrap_or_default(),
                insert_id: u64::try_from(connection.last_insert_rowid()).unwrap_or_default(),
            })
        })
        .await
    }

    async fn show_columns(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let sql = table_info_sql(table)?;
        let info =
            self.with_connection(move |connection| fetch_rows(connection, &sql, Vec::new())).await?;
        if info.is_empty() {
            return Err(StoreError::Backend(format!("Table '{table}' doesn't exist")));
        }
        Ok(column_rows(info))
    }

    async fn list_tables(&self) -> Result<Vec<Row>, StoreError> {
        self.with_connection(|connection| {
            fetch_rows(
                connection,
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
                Vec::new(),
            )
        })
        .await
    }
}
