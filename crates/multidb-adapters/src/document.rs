// crates/multidb-adapters/src/document.rs
// ============================================================================
// Module: Document Adapter
// Description: Find, insert, update, and delete over named collections.
// Purpose: Publish the `document_*` tools and map them onto a `DocumentStore`.
// Dependencies: async-trait, multidb-core, serde
// ============================================================================

//! ## Overview
//! Filters, documents, and update specifications travel as JSON objects in
//! extended-JSON form (`{"$oid": ...}` and friends are honored by the store).
//! Results are returned as pretty-printed relaxed extended JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use multidb_core::AdapterError;
use multidb_core::Arguments;
use multidb_core::DocumentTool;
use multidb_core::InvocationResult;
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

mod mongo;

pub use mongo::MongoStore;

// ============================================================================
// SECTION: Store Contract
// ============================================================================

/// Document operations the adapter needs from a backend.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns up to `limit` documents matching `filter`.
    async fn find(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: u32,
    ) -> Result<Vec<Value>, StoreError>;
    /// Inserts one document and returns the rendered inserted id.
    async fn insert(&self, collection: &str, document: Map<String, Value>)
    -> Result<String, StoreError>;
    /// Updates one or all matching documents, returning the modified count.
    async fn update(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        update: Map<String, Value>,
        multi: bool,
    ) -> Result<u64, StoreError>;
    /// Deletes one or all matching documents, returning the deleted count.
    async fn delete(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        multi: bool,
    ) -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Arguments for `document_find`.
#[derive(Debug, Deserialize)]
struct FindArgs {
    /// Collection name.
    collection: String,
    /// Query filter; absent means match all.
    #[serde(default)]
    query: Option<Map<String, Value>>,
    /// Maximum documents; absent or zero uses the configured default.
    #[serde(default)]
    limit: Option<u32>,
}

/// Arguments for `document_insert`.
#[derive(Debug, Deserialize)]
struct InsertArgs {
    /// Collection name.
    collection: String,
    /// Document to insert.
    document: Map<String, Value>,
}

/// Arguments for `document_update`.
#[derive(Debug, Deserialize)]
struct UpdateArgs {
    /// Collection name.
    collection: String,
    /// Match filter.
    filter: Map<String, Value>,
    /// Update operators, e.g. `{"$set": {...}}`.
    update: Map<String, Value>,
    /// Update every match instead of the first.
    #[serde(default)]
    multi: bool,
}

/// Arguments for `document_delete`.
#[derive(Debug, Deserialize)]
struct DeleteArgs {
    /// Collection name.
    collection: String,
    /// Match filter.
    filter: Map<String, Value>,
    /// Delete every match instead of the first.
    #[serde(default)]
    multi: bool,
}

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Adapter publishing the document tools.
pub struct DocumentAdapter {
    /// Backing store.
    store: Arc<dyn DocumentStore>,
    /// Limit applied when `document_find` omits one.
    default_limit: u32,
}

impl DocumentAdapter {
    /// Creates an adapter over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, default_limit: u32) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    /// Runs one document operation.
    async fn run(
        &self,
        tool: DocumentTool,
        arguments: Arguments,
    ) -> Result<InvocationResult, AdapterError> {
        match tool {
            DocumentTool::Find => {
                let args: FindArgs = decode_arguments(arguments)?;
                let limit = args.limit.filter(|limit| *limit > 0).unwrap_or(self.default_limit);
                let documents =
                    self.store.find(&args.collection, args.query.unwrap_or_default(), limit).await?;
                Ok(InvocationResult::json(&Value::Array(documents)))
            }
            DocumentTool::Insert => {
                let args: InsertArgs = decode_arguments(arguments)?;
                let id = self.store.insert(&args.collection, args.document).await?;
                Ok(InvocationResult::text(format!("Inserted ID: {id}")))
            }
            DocumentTool::Update => {
                let args: UpdateArgs = decode_arguments(arguments)?;
                let count =
                    self.store.update(&args.collection, args.filter, args.update, args.multi).await?;
                Ok(InvocationResult::text(format!("Updated {count} document(s)")))
            }
            DocumentTool::Delete => {
                let args: DeleteArgs = decode_arguments(arguments)?;
                let count = self.store.delete(&args.collection, args.filter, args.multi).await?;
                Ok(InvocationResult::text(format!("Deleted {count} document(s)")))
            }
        }
    }
}

#[async_trait]
impl ToolAdapter for DocumentAdapter {
    fn domain(&self) -> ToolDomain {
        ToolDomain::Document
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        DocumentTool::all().iter().map(|tool| descriptor(*tool, self.default_limit)).collect()
    }

    async fn invoke(
        &self,
        tool: ToolName,
        arguments: Arguments,
    ) -> Result<InvocationResult, AdapterError> {
        match tool {
            ToolName::Document(op) => self.run(op, arguments).await,
            other => Err(AdapterError::ForeignTool(other)),
        }
    }
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Builds the published descriptor for a document tool.
fn descriptor(tool: DocumentTool, default_limit: u32) -> ToolDescriptor {
    let collection = json!({"type": "string"});
    let (description, schema) = match tool {
        DocumentTool::Find => (
            "Find documents in a collection",
            json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "query": {"type": "object", "description": "Query filter"},
                    "limit": {"type": "number", "default": default_limit}
                },
                "required": ["collection", "query"]
            }),
        ),
        DocumentTool::Insert => (
            "Insert a document into a collection",
            json!({
                "type": "object",
                "properties": {"collection": collection, "document": {"type": "object"}},
                "required": ["collection", "document"]
            }),
        ),
        DocumentTool::Update => (
            "Update documents in a collection",
            json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "filter": {"type": "object", "description": "Match filter"},
                    "update": {"type": "object", "description": "Update operators (e.g. { $set: ... })"},
                    "multi": {"type": "boolean", "default": false, "description": "Update multiple documents"}
                },
                "required": ["collection", "filter", "update"]
            }),
        ),
        DocumentTool::Delete => (
            "Delete documents from a collection",
            json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "filter": {"type": "object", "description": "Match filter"},
                    "multi": {"type": "boolean", "default": false, "description": "Delete multiple documents"}
                },
                "required": ["collection", "filter"]
            }),
        ),
    };
    ToolDescriptor::new(ToolName::Document(tool), description, schema)
}

#[cfg(test)]
mod tests;
