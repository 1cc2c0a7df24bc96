// crates/multidb-mcp/src/protocol/tests.rs
// ============================================================================
// Module: JSON-RPC Protocol Tests
// Description: Method handling, notifications, and protocol errors.
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions on protocol responses."
)]

use std::sync::Arc;

use multidb_adapters::KvAdapter;
use multidb_adapters::kv::MemoryStore;
use multidb_core::Dispatcher;
use multidb_core::ToolAdapter;
use multidb_core::ToolRegistry;
use serde_json::Value;
use serde_json::json;

use super::INVALID_PARAMS;
use super::INVALID_REQUEST;
use super::JsonRpcRequest;
use super::METHOD_NOT_FOUND;
use super::McpMethod;
use super::McpOutcome;
use super::PROTOCOL_VERSION;
use super::catalog_notification;
use super::handle_request;

fn dispatcher() -> Dispatcher {
    let adapters: Vec<Arc<dyn ToolAdapter>> =
        vec![Arc::new(KvAdapter::new(Arc::new(MemoryStore::new())))];
    Dispatcher::new(Arc::new(ToolRegistry::new(adapters).unwrap()), None)
}

fn request(value: Value) -> JsonRpcRequest {
    serde_json::from_value(value).unwrap()
}

fn response_json(dispatcher: &Dispatcher, value: Value) -> Value {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    let handled = rt.block_on(handle_request(dispatcher, request(value)));
    serde_json::to_value(handled.response.unwrap()).unwrap()
}

#[test]
fn initialize_advertises_protocol_and_tools_capability() {
    let body = response_json(&dispatcher(), json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}));
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["result"]["protocolVersion"], json!(PROTOCOL_VERSION));
    assert!(body["result"]["capabilities"]["tools"].is_object());
    assert_eq!(body["result"]["serverInfo"]["name"], json!("multidb-gateway"));
}

#[test]
fn ping_answers_with_empty_object() {
    let body = response_json(&dispatcher(), json!({"jsonrpc": "2.0", "id": "p", "method": "ping"}));
    assert_eq!(body["result"], json!({}));
    assert!(body.get("error").is_none());
}

#[test]
fn tools_list_matches_registry_catalog() {
    let dispatcher = dispatcher();
    let body = response_json(&dispatcher, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}));
    let tools = body["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), dispatcher.registry().len());
    assert!(tools.iter().all(|tool| tool["inputSchema"].is_object()));
    assert!(tools.iter().any(|tool| tool["name"] == json!("kv_hgetall")));
}

#[tokio::test]
async fn tools_call_round_trips_through_dispatcher() {
    let dispatcher = dispatcher();
    let set = handle_request(
        &dispatcher,
        request(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "kv_set", "arguments": {"key": "k", "value": "v"}}
        })),
    )
    .await;
    assert_eq!(set.method, McpMethod::ToolsCall);
    assert_eq!(set.outcome, McpOutcome::Ok);
    assert_eq!(set.tool.map(|tool| tool.as_str()), Some("kv_set"));

    let get = handle_request(
        &dispatcher,
        request(json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {"name": "kv_get", "arguments": {"key": "k"}}
        })),
    )
    .await;
    let body = serde_json::to_value(get.response.unwrap()).unwrap();
    assert_eq!(body["result"]["content"][0]["text"], json!("v"));
    assert_eq!(body["result"]["isError"], json!(false));
}

#[tokio::test]
async fn unknown_tool_is_an_error_result_not_a_protocol_error() {
    let handled = handle_request(
        &dispatcher(),
        request(json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": {"name": "does_not_exist"}
        })),
    )
    .await;
    assert_eq!(handled.outcome, McpOutcome::Error);
    assert_eq!(handled.error_code, None);
    assert_eq!(handled.error_kind, Some("unknown_tool"));
    let body = serde_json::to_value(handled.response.unwrap()).unwrap();
    assert!(body.get("error").is_none());
    assert_eq!(body["result"]["isError"], json!(true));
    assert!(body["result"]["content"][0]["text"].as_str().unwrap().contains("does_not_exist"));
}

#[tokio::test]
async fn notifications_get_no_response() {
    let handled = handle_request(
        &dispatcher(),
        request(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
    )
    .await;
    assert!(handled.response.is_none());
    assert_eq!(handled.method, McpMethod::Notification);
}

#[test]
fn unknown_method_is_method_not_found() {
    let body = response_json(&dispatcher(), json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"}));
    assert_eq!(body["error"]["code"], json!(METHOD_NOT_FOUND));
    assert!(body.get("result").is_none());
}

#[test]
fn malformed_tool_params_are_invalid_params() {
    let body = response_json(
        &dispatcher(),
        json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {"arguments": {}}}),
    );
    assert_eq!(body["error"]["code"], json!(INVALID_PARAMS));
}

#[test]
fn wrong_version_is_invalid_request() {
    let body = response_json(&dispatcher(), json!({"jsonrpc": "1.0", "id": 8, "method": "ping"}));
    assert_eq!(body["error"]["code"], json!(INVALID_REQUEST));
    assert_eq!(body["id"], json!(8));
}

#[test]
fn catalog_notification_carries_every_descriptor() {
    let dispatcher = dispatcher();
    let frame: Value = serde_json::from_str(&catalog_notification(dispatcher.registry().list())).unwrap();
    assert!(frame.get("id").is_none());
    assert_eq!(frame["params"]["tools"].as_array().unwrap().len(), dispatcher.registry().len());
}
