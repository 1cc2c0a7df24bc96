// crates/multidb-adapters/tests/gateway_dispatch.rs
// ============================================================================
// Module: Bootstrapped Gateway Dispatch Tests
// Description: Config -> adapters -> registry -> dispatcher end to end.
// Purpose: Exercise the published catalog with local backends only.
// Dependencies: multidb-adapters, multidb-config, multidb-core, tokio
// ============================================================================

//! ## Overview
//! Uses the in-memory key-value store and an in-memory SQLite database so no
//! external service is required.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]

use std::sync::Arc;
use std::time::Duration;

use multidb_adapters::BootstrapError;
use multidb_adapters::build_registry;
use multidb_config::GatewayConfig;
use multidb_core::Arguments;
use multidb_core::Dispatcher;
use multidb_core::InvocationRequest;
use serde_json::Value;
use serde_json::json;

fn local_config() -> GatewayConfig {
    let config = GatewayConfig::parse(
        r#"
[kv]
backend = "memory"

[document]
enabled = false

[relational]
backend = "sqlite"
path = ":memory:"

[wiki]
enabled = false
"#,
    )
    .unwrap();
    config.validate().unwrap();
    config
}

fn dispatcher(config: &GatewayConfig) -> Dispatcher {
    Dispatcher::new(Arc::new(build_registry(config).unwrap()), Some(Duration::from_secs(10)))
}

fn args(value: Value) -> Arguments {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn disabled_backends_publish_no_tools() {
    let registry = build_registry(&local_config()).unwrap();
    let names: Vec<String> = registry.list().iter().map(|d| d.name.to_string()).collect();
    assert_eq!(names.len(), 11);
    assert!(names.iter().all(|name| name.starts_with("kv_") || name.starts_with("relational_")));
}

#[tokio::test]
async fn full_default_catalog_has_every_tool_without_connecting() {
    let registry = build_registry(&GatewayConfig::default()).unwrap();
    assert_eq!(registry.len(), 18);
}

#[tokio::test]
async fn missing_key_on_empty_store() {
    let result = dispatcher(&local_config())
        .dispatch(InvocationRequest::new("kv_get", args(json!({"key": "nope"}))))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.joined_text(), "Key not found");
}

#[tokio::test]
async fn select_one_through_the_dispatcher() {
    let result = dispatcher(&local_config())
        .dispatch(InvocationRequest::new("relational_query", args(json!({"sql": "SELECT 1"}))))
        .await;
    assert!(!result.is_error);
    let rows: Value = serde_json::from_str(&result.joined_text()).unwrap();
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn disabled_domain_tool_is_unknown() {
    let result = dispatcher(&local_config())
        .dispatch(InvocationRequest::new("document_find", args(json!({"collection": "c"}))))
        .await;
    assert!(result.is_error);
    assert_eq!(result.joined_text(), "Error: Unknown tool: document_find");
}

#[tokio::test]
async fn unreachable_backend_fails_the_call_and_gateway_keeps_serving() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let mut config = local_config();
    config.kv.backend = multidb_config::KvBackend::Redis;
    config.kv.url = format!("redis://127.0.0.1:{port}");
    let dispatcher = dispatcher(&config);

    let failed = dispatcher.dispatch(InvocationRequest::new("kv_get", args(json!({"key": "k"})))).await;
    assert!(failed.is_error);
    assert!(failed.joined_text().starts_with("Error: "));

    let ok = dispatcher
        .dispatch(InvocationRequest::new("relational_query", args(json!({"sql": "SELECT 2 AS two"}))))
        .await;
    assert!(!ok.is_error);
}

#[tokio::test]
async fn malformed_redis_url_is_a_bootstrap_error() {
    let mut config = local_config();
    config.kv.backend = multidb_config::KvBackend::Redis;
    config.kv.url = "http://not-redis".to_string();
    match build_registry(&config) {
        Err(BootstrapError::Backend { domain, .. }) => assert_eq!(domain.token(), "kv"),
        other => panic!("expected bootstrap failure, got {:?}", other.map(|r| r.len())),
    }
}
