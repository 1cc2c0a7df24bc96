// crates/multidb-core/src/dispatch/tests.rs
// ============================================================================
// Module: Dispatcher Tests
// Description: Routing, pass-through, and failure normalization.
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions on dispatch outcomes."
)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use serde_json::json;

use super::Dispatcher;
use crate::adapter::ToolAdapter;
use crate::envelope::Arguments;
use crate::envelope::InvocationRequest;
use crate::registry::ToolRegistry;
use crate::test_support::ScriptedAdapter;
use crate::tooling::KvTool;
use crate::tooling::ToolDomain;
use crate::tooling::ToolName;

fn dispatcher(timeout: Option<Duration>) -> Dispatcher {
    let adapters: Vec<Arc<dyn ToolAdapter>> = vec![
        Arc::new(ScriptedAdapter::full(ToolDomain::Kv)),
        Arc::new(ScriptedAdapter {
            domain: ToolDomain::Relational,
            tools: Vec::new(),
        }),
    ];
    Dispatcher::new(Arc::new(ToolRegistry::new(adapters).unwrap()), timeout)
}

fn args(value: Value) -> Arguments {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn success_passes_adapter_result_through() {
    let dispatcher = dispatcher(None);
    let trace =
        dispatcher.dispatch_traced(InvocationRequest::new("kv_get", args(json!({"key": "a"})))).await;
    assert_eq!(trace.tool, Some(ToolName::Kv(KvTool::Get)));
    assert!(!trace.result.is_error);
    assert!(trace.failure_kind.is_none());
    let body: Value = serde_json::from_str(&trace.result.joined_text()).unwrap();
    assert_eq!(body, json!({"tool": "kv_get", "arguments": {"key": "a"}}));
}

#[tokio::test]
async fn unknown_name_yields_error_envelope_with_name() {
    let result = dispatcher(None).dispatch(InvocationRequest::new("does_not_exist", Arguments::new())).await;
    assert!(result.is_error);
    assert!(result.joined_text().contains("does_not_exist"));
    assert_eq!(result.joined_text(), "Error: Unknown tool: does_not_exist");
}

#[tokio::test]
async fn domain_without_adapter_is_unknown() {
    let trace = dispatcher(None)
        .dispatch_traced(InvocationRequest::new("wiki_search", Arguments::new()))
        .await;
    assert!(trace.result.is_error);
    assert_eq!(trace.tool, None);
    assert_eq!(trace.failure_kind, Some("unknown_tool"));
    assert!(trace.result.joined_text().contains("wiki_search"));
}

#[tokio::test]
async fn unpublished_tool_is_unknown_even_when_domain_is_registered() {
    let result = dispatcher(None)
        .dispatch(InvocationRequest::new("relational_query", args(json!({"sql": "SELECT 1"}))))
        .await;
    assert!(result.is_error);
    assert!(result.joined_text().contains("relational_query"));
}

#[tokio::test]
async fn adapter_failure_is_normalized() {
    let trace = dispatcher(None)
        .dispatch_traced(InvocationRequest::new(
            "kv_set",
            args(json!({"fail": "connection refused"})),
        ))
        .await;
    assert!(trace.result.is_error);
    assert_eq!(trace.result.joined_text(), "Error: connection refused");
    assert_eq!(trace.failure_kind, Some("backend"));
}

#[tokio::test]
async fn deadline_expiry_is_normalized() {
    let trace = dispatcher(Some(Duration::from_millis(20)))
        .dispatch_traced(InvocationRequest::new("kv_get", args(json!({"sleep_ms": 2_000}))))
        .await;
    assert!(trace.result.is_error);
    assert_eq!(trace.failure_kind, Some("timeout"));
    assert_eq!(trace.result.joined_text(), "Error: tool kv_get timed out after 20 ms");
}

#[tokio::test]
async fn dispatcher_keeps_serving_after_failures() {
    let dispatcher = dispatcher(None);
    for _ in 0 .. 3 {
        let failed = dispatcher
            .dispatch(InvocationRequest::new("kv_del", args(json!({"fail": "boom"}))))
            .await;
        assert!(failed.is_error);
    }
    let ok = dispatcher.dispatch(InvocationRequest::new("kv_del", args(json!({"key": "k"})))).await;
    assert!(!ok.is_error);
}

#[tokio::test]
async fn adapter_panic_is_normalized() {
    let dispatcher = dispatcher(Some(Duration::from_secs(5)));
    let trace = dispatcher
        .dispatch_traced(InvocationRequest::new("kv_set", args(json!({"panic": "overflow"}))))
        .await;
    assert!(trace.result.is_error);
    assert_eq!(trace.failure_kind, Some("backend"));
    assert_eq!(trace.result.joined_text(), "Error: tool kv_set panicked: overflow");

    let ok = dispatcher.dispatch(InvocationRequest::new("kv_get", args(json!({"key": "k"})))).await;
    assert!(!ok.is_error);
}

#[tokio::test]
async fn adapter_panic_inside_spawned_task_still_yields_envelope() {
    let dispatcher = dispatcher(None);
    let handle = tokio::spawn(async move {
        dispatcher.dispatch(InvocationRequest::new("kv_del", args(json!({"panic": "boom"})))).await
    });
    let result = handle.await.unwrap();
    assert!(result.is_error);
    assert!(result.joined_text().contains("boom"));
}
