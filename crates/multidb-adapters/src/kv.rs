// crates/multidb-adapters/src/kv.rs
// ============================================================================
// Module: Key-Value Adapter
// Description: Plain and hash key operations over a key-value store.
// Purpose: Publish the `kv_*` tools and map them onto a `KeyValueStore`.
// Dependencies: async-trait, multidb-core, serde
// ============================================================================

//! ## Overview
//! [`KvAdapter`] decodes tool arguments and drives a [`KeyValueStore`]. Two
//! stores ship: [`RedisStore`] for deployments and [`MemoryStore`] for local
//! runs and tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use multidb_core::AdapterError;
use multidb_core::Arguments;
use multidb_core::InvocationResult;
use multidb_core::KvTool;
use multidb_core::ToolAdapter;
use multidb_core::ToolDescriptor;
use multidb_core::ToolDomain;
use multidb_core::ToolName;
use multidb_core::decode_arguments;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::error::StoreError;

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

// ============================================================================
// SECTION: Store Contract
// ============================================================================

/// Key-value operations the adapter needs from a backend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a string key.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Writes a string key with an optional expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;
    /// Deletes a key, returning how many keys were removed.
    async fn del(&self, key: &str) -> Result<u64, StoreError>;
    /// Writes one hash field.
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;
    /// Reads one hash field.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;
    /// Reads every field of a hash; missing keys read as empty.
    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError>;
    /// Deletes one hash field, returning how many fields were removed.
    async fn hdel(&self, key: &str, field: &str) -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Arguments naming a single key.
#[derive(Debug, Deserialize)]
struct KeyArgs {
    /// Target key.
    key: String,
}

/// Arguments for `kv_set`.
#[derive(Debug, Deserialize)]
struct SetArgs {
    /// Target key.
    key: String,
    /// Value; non-string JSON is stored as its JSON text.
    value: Value,
    /// Expiry in seconds; absent or zero keeps the key forever.
    #[serde(default)]
    ttl: Option<u64>,
}

/// Arguments naming a hash field.
#[derive(Debug, Deserialize)]
struct FieldArgs {
    /// Hash key.
    key: String,
    /// Field within the hash.
    field: String,
}

/// Arguments for `kv_hset`.
#[derive(Debug, Deserialize)]
struct HashSetArgs {
    /// Hash key.
    key: String,
    /// Field within the hash.
    field: String,
    /// Value; non-string JSON is stored as its JSON text.
    value: Value,
}

/// Renders a JSON value the way it is stored.
fn stored_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Adapter publishing the key-value tools.
pub struct KvAdapter {
    /// Backing store.
    store: Arc<dyn KeyValueStore>,
}

impl KvAdapter {
    /// Creates an adapter over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
        }
    }

    /// Runs one key-value operation.
    async fn run(&self, tool: KvTool, arguments: Arguments) -> Result<InvocationResult, AdapterError> {
        match tool {
            KvTool::Get => {
                let args: KeyArgs = decode_arguments(arguments)?;
                let value = self.store.get(&args.key).await?;
                Ok(InvocationResult::text(value.unwrap_or_else(|| "Key not found".to_string())))
            }
            KvTool::Set => {
                let args: SetArgs = decode_arguments(arguments)?;
                let ttl = args.ttl.filter(|secs| *secs > 0).map(Duration::from_secs);
                self.store.set(&args.key, &stored_text(&args.value), ttl).await?;
                Ok(InvocationResult::text("OK"))
            }
            KvTool::Del => {
                let args: KeyArgs = decode_arguments(arguments)?;
                let count = self.store.del(&args.key).await?;
                Ok(InvocationResult::text(format!("Deleted {count} key(s)")))
            }
            KvTool::HSet => {
                let args: HashSetArgs = decode_arguments(arguments)?;
                self.store.hset(&args.key, &args.field, &stored_text(&args.value)).await?;
                Ok(InvocationResult::text("OK"))
            }
            KvTool::HGet => {
                let args: FieldArgs = decode_arguments(arguments)?;
                let value = self.store.hget(&args.key, &args.field).await?;
                Ok(InvocationResult::text(value.unwrap_or_else(|| "Field not found".to_string())))
            }
            KvTool::HGetAll => {
                let args: KeyArgs = decode_arguments(arguments)?;
                let fields = self.store.hgetall(&args.key).await?;
                let object: serde_json::Map<String, Value> =
                    fields.into_iter().map(|(field, value)| (field, Value::String(value))).collect();
                Ok(InvocationResult::json(&Value::Object(object)))
            }
            KvTool::HDel => {
                let args: FieldArgs = decode_arguments(arguments)?;
                let count = self.store.hdel(&args.key, &args.field).await?;
                Ok(InvocationResult::text(format!("Deleted {count} field(s)")))
            }
        }
    }
}

#[async_trait]
impl ToolAdapter for KvAdapter {
    fn domain(&self) -> ToolDomain {
        ToolDomain::Kv
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        KvTool::all().iter().map(|tool| descriptor(*tool)).collect()
    }

    async fn invoke(
        &self,
        tool: ToolName,
        arguments: Arguments,
    ) -> Result<InvocationResult, AdapterError> {
        match tool {
            ToolName::Kv(op) => self.run(op, arguments).await,
            other => Err(AdapterError::ForeignTool(other)),
        }
    }
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Builds the published descriptor for a key-value tool.
fn descriptor(tool: KvTool) -> ToolDescriptor {
    let key = json!({"type": "string"});
    let (description, schema) = match tool {
        KvTool::Get => (
            "Get value by key",
            json!({"type": "object", "properties": {"key": key}, "required": ["key"]}),
        ),
        KvTool::Set => (
            "Set value by key",
            json!({
                "type": "object",
                "properties": {
                    "key": key,
                    "value": {"type": "string"},
                    "ttl": {"type": "integer", "minimum": 0, "description": "Time to live in seconds (optional)"}
                },
                "required": ["key", "value"]
            }),
        ),
        KvTool::Del => (
            "Delete key",
            json!({"type": "object", "properties": {"key": key}, "required": ["key"]}),
        ),
        KvTool::HSet => (
            "Set field in hash",
            json!({
                "type": "object",
                "properties": {"key": key, "field": {"type": "string"}, "value": {"type": "string"}},
                "required": ["key", "field", "value"]
            }),
        ),
        KvTool::HGet => (
            "Get field from hash",
            json!({
                "type": "object",
                "properties": {"key": key, "field": {"type": "string"}},
                "required": ["key", "field"]
            }),
        ),
        KvTool::HGetAll => (
            "Get all fields and values from hash",
            json!({"type": "object", "properties": {"key": key}, "required": ["key"]}),
        ),
        KvTool::HDel => (
            "Delete field from hash",
            json!({
                "type": "object",
                "properties": {"key": key, "field": {"type": "string"}},
                "required": ["key", "field"]
            }),
        ),
    };
    ToolDescriptor::new(ToolName::Kv(tool), description, schema)
}
