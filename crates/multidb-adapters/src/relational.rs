// crates/multidb-adapters/src/relational.rs
// ============================================================================
// Module: Relational Adapter
// Description: Parameterized SQL, schema inspection, and table listing.
// Purpose: Publish the `relational_*` tools and map them onto a `RelationalStore`.
// Dependencies: async-trait, multidb-core, serde
// ============================================================================

//! ## Overview
//! SQL text is passed through to the store with positional `values` bound as
//! statement parameters. Table names for schema inspection are quoted as
//! identifiers and never spliced raw. Row sets render as pretty JSON arrays of
//! column-name keyed objects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use multidb_core::AdapterError;
use multidb_core::Arguments;
use multidb_core::InvocationResult;
use multidb_core::RelationalTool;
use multidb_core::ToolAdapter;
use multidb_core::ToolDescriptor;
use multidb_core::ToolDomain;
use multidb_core::ToolName;
use multidb_core::decode_arguments;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::error::StoreError;

mod mysql;
mod sqlite;

pub use mysql::MySqlSettings;
pub use mysql::MySqlStore;
pub use sqlite::SqliteStore;

// ============================================================================
// SECTION: Store Contract
// ============================================================================

/// One result row keyed by column name.
pub type Row = Map<String, Value>;

/// Outcome of a mutating statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteOutcome {
    /// Rows changed by the statement.
    pub affected_rows: u64,
    /// Last generated row id, or zero.
    pub insert_id: u64,
}

/// Relational operations the adapter needs from a backend.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Runs a row-returning statement.
    async fn query(&self, sql: &str, values: Vec<Value>) -> Result<Vec<Row>, StoreError>;
    /// Runs a mutating statement.
    async fn execute(&self, sql: &str, values: Vec<Value>) -> Result<ExecuteOutcome, StoreError>;
    /// Describes the columns of `table`.
    async fn show_columns(&self, table: &str) -> Result<Vec<Row>, StoreError>;
    /// Lists the tables of the selected database.
    async fn list_tables(&self) -> Result<Vec<Row>, StoreError>;
}

/// Quotes a possibly schema-qualified identifier with `quote`.
///
/// Each dot-separated part is wrapped and embedded quote characters doubled.
///
/// # Errors
///
/// Returns [`StoreError::Backend`] when the name or any part is empty.
pub(crate) fn quote_identifier(name: &str, quote: char) -> Result<String, StoreError> {
    let mut quoted = String::with_capacity(name.len() + 2);
    for (index, part) in name.split('.').enumerate() {
        if part.is_empty() {
            return Err(StoreError::Backend(format!("invalid table name: {name:?}")));
        }
        if index > 0 {
            quoted.push('.');
        }
        quoted.push(quote);
        for ch in part.chars() {
            if ch == quote {
                quoted.push(quote);
            }
            quoted.push(ch);
        }
        quoted.push(quote);
    }
    Ok(quoted)
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Arguments for `relational_query` and `relational_execute`.
#[derive(Debug, Deserialize)]
struct StatementArgs {
    /// SQL text with positional placeholders.
    sql: String,
    /// Values bound to placeholders in order.
    #[serde(default)]
    values: Vec<Value>,
}

/// Arguments for `relational_show_columns`.
#[derive(Debug, Deserialize)]
struct TableArgs {
    /// Table name, optionally schema-qualified.
    table: String,
}

/// Renders rows as a pretty JSON array.
fn rows_result(rows: Vec<Row>) -> InvocationResult {
    InvocationResult::json(&Value::Array(rows.into_iter().map(Value::Object).collect()))
}

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Adapter publishing the relational tools.
pub struct RelationalAdapter {
    /// Backing store.
    store: Arc<dyn RelationalStore>,
}

impl RelationalAdapter {
    /// Creates an adapter over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RelationalStore>) -> Self {
        Self {
            store,
        }
    }

    /// Runs one relational operation.
    async fn run(
        &self,
        tool: RelationalTool,
        arguments: Arguments,
    ) -> Result<InvocationResult, AdapterError> {
        match tool {
            RelationalTool::Query => {
                let args: StatementArgs = decode_arguments(arguments)?;
                Ok(rows_result(self.store.query(&args.sql, args.values).await?))
            }
            RelationalTool::Execute => {
                let args: StatementArgs = decode_arguments(arguments)?;
                let outcome = self.store.execute(&args.sql, args.values).await?;
                Ok(InvocationResult::text(format!(
                    "Success. Affected rows: {}. Insert ID: {}",
                    outcome.affected_rows, outcome.insert_id
                )))
            }
            RelationalTool::ShowColumns => {
                let args: TableArgs = decode_arguments(arguments)?;
                Ok(rows_result(self.store.show_columns(&args.table).await?))
            }
            RelationalTool::ListTables => Ok(rows_result(self.store.list_tables().await?)),
        }
    }
}

#[async_trait]
impl ToolAdapter for RelationalAdapter {
    fn domain(&self) -> ToolDomain {
        ToolDomain::Relational
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        RelationalTool::all().iter().map(|tool| descriptor(*tool)).collect()
    }

    async fn invoke(
        &self,
        tool: ToolName,
        arguments: Arguments,
    ) -> Result<InvocationResult, AdapterError> {
        match tool {
            ToolName::Relational(op) => self.run(op, arguments).await,
            other => Err(AdapterError::ForeignTool(other)),
        }
    }
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Builds the published descriptor for a relational tool.
fn descriptor(tool: RelationalTool) -> ToolDescriptor {
    let statement = json!({
        "type": "object",
        "properties": {
            "sql": {"type": "string"},
            "values": {"type": "array", "items": {}, "description": "Prepared statement values"}
        },
        "required": ["sql"]
    });
    let (description, schema) = match tool {
        RelationalTool::Query => ("Execute a SELECT query", statement),
        RelationalTool::Execute => ("Execute a mutation (INSERT, UPDATE, DELETE)", statement),
        RelationalTool::ShowColumns => (
            "Show columns of a table",
            json!({
                "type": "object",
                "properties": {"table": {"type": "string"}},
                "required": ["table"]
            }),
        ),
        RelationalTool::ListTables => {
            ("List all tables in the database", json!({"type": "object", "properties": {}}))
        }
    };
    ToolDescriptor::new(ToolName::Relational(tool), description, schema)
}
