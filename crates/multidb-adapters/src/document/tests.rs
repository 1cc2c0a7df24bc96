// crates/multidb-adapters/src/document/tests.rs
// ============================================================================
// Module: Document Adapter Tests
// Description: Argument decoding and result rendering over a recording store.
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions on document results."
)]

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use multidb_core::AdapterError;
use multidb_core::Arguments;
use multidb_core::DocumentTool;
use multidb_core::ToolAdapter;
use multidb_core::ToolName;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use super::DocumentAdapter;
use super::DocumentStore;
use crate::error::StoreError;

/// Store that records calls and answers with canned counts.
#[derive(Default)]
struct RecordingStore {
    /// Calls as `(operation, collection, payload)`.
    calls: Mutex<Vec<(String, String, Value)>>,
}

impl RecordingStore {
    fn record(&self, op: &str, collection: &str, payload: Value) {
        self.calls.lock().unwrap().push((op.to_string(), collection.to_string(), payload));
    }

    fn last(&self) -> (String, String, Value) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn find(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: u32,
    ) -> Result<Vec<Value>, StoreError> {
        self.record("find", collection, json!({"filter": filter, "limit": limit}));
        if collection == "offline" {
            return Err(StoreError::Unavailable("server selection timeout".to_string()));
        }
        Ok(vec![json!({"_id": {"$oid": "65f0c0ffee0000000000abcd"}, "name": "widget"})])
    }

    async fn insert(
        &self,
        collection: &str,
        document: Map<String, Value>,
    ) -> Result<String, StoreError> {
        self.record("insert", collection, Value::Object(document));
        Ok("65f0c0ffee0000000000abcd".to_string())
    }

    async fn update(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        update: Map<String, Value>,
        multi: bool,
    ) -> Result<u64, StoreError> {
        self.record("update", collection, json!({"filter": filter, "update": update, "multi": multi}));
        Ok(if multi { 3 } else { 1 })
    }

    async fn delete(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        multi: bool,
    ) -> Result<u64, StoreError> {
        self.record("delete", collection, json!({"filter": filter, "multi": multi}));
        Ok(if multi { 5 } else { 0 })
    }
}

fn fixture() -> (Arc<RecordingStore>, DocumentAdapter) {
    let store = Arc::new(RecordingStore::default());
    let adapter = DocumentAdapter::new(store.clone(), 10);
    (store, adapter)
}

fn args(value: Value) -> Arguments {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn find_applies_default_limit_and_renders_json() {
    let (store, adapter) = fixture();
    let result = adapter
        .invoke(ToolName::Document(DocumentTool::Find), args(json!({"collection": "items", "query": {"name": "widget"}})))
        .await
        .unwrap();
    assert!(!result.is_error);
    let rendered: Value = serde_json::from_str(&result.joined_text()).unwrap();
    assert_eq!(rendered[0]["name"], "widget");
    let (op, collection, payload) = store.last();
    assert_eq!((op.as_str(), collection.as_str()), ("find", "items"));
    assert_eq!(payload, json!({"filter": {"name": "widget"}, "limit": 10}));
}

#[tokio::test]
async fn find_honors_explicit_limit_and_missing_query() {
    let (store, adapter) = fixture();
    adapter
        .invoke(ToolName::Document(DocumentTool::Find), args(json!({"collection": "items", "limit": 2})))
        .await
        .unwrap();
    assert_eq!(store.last().2, json!({"filter": {}, "limit": 2}));
}

#[tokio::test]
async fn insert_reports_inserted_id() {
    let (_, adapter) = fixture();
    let result = adapter
        .invoke(
            ToolName::Document(DocumentTool::Insert),
            args(json!({"collection": "items", "document": {"name": "gadget"}})),
        )
        .await
        .unwrap();
    assert_eq!(result.joined_text(), "Inserted ID: 65f0c0ffee0000000000abcd");
}

#[tokio::test]
async fn update_and_delete_report_counts_and_forward_multi() {
    let (store, adapter) = fixture();
    let single = adapter
        .invoke(
            ToolName::Document(DocumentTool::Update),
            args(json!({"collection": "items", "filter": {}, "update": {"$set": {"a": 1}}})),
        )
        .await
        .unwrap();
    assert_eq!(single.joined_text(), "Updated 1 document(s)");
    assert_eq!(store.last().2["multi"], json!(false));

    let many = adapter
        .invoke(
            ToolName::Document(DocumentTool::Delete),
            args(json!({"collection": "items", "filter": {"a": 1}, "multi": true})),
        )
        .await
        .unwrap();
    assert_eq!(many.joined_text(), "Deleted 5 document(s)");
}

#[tokio::test]
async fn non_object_filter_is_invalid_arguments() {
    let (_, adapter) = fixture();
    let err = adapter
        .invoke(
            ToolName::Document(DocumentTool::Delete),
            args(json!({"collection": "items", "filter": "everything"})),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "invalid_arguments");
}

#[tokio::test]
async fn store_unavailability_propagates() {
    let (_, adapter) = fixture();
    let err = adapter
        .invoke(ToolName::Document(DocumentTool::Find), args(json!({"collection": "offline", "query": {}})))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Unavailable(_)));
}

#[test]
fn find_descriptor_advertises_configured_default_limit() {
    let (_, adapter) = fixture();
    let find = adapter.descriptors().into_iter().next().unwrap();
    assert_eq!(find.name, ToolName::Document(DocumentTool::Find));
    assert_eq!(find.input_schema["properties"]["limit"]["default"], json!(10));
}
