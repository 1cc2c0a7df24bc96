// crates/multidb-mcp/tests/sse_transport.rs
// ============================================================================
// Module: SSE Transport Tests
// Description: End-to-end session tests over a real HTTP listener.
// Purpose: Exercise stream open, posted calls, rejections, and health.
// Dependencies: multidb-mcp, multidb-config, reqwest, tokio
// ============================================================================

//! ## Overview
//! Starts the gateway on an ephemeral port with the in-memory key-value store
//! and an in-memory SQLite database, then drives it with an HTTP client.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]

use std::net::SocketAddr;
use std::time::Duration;

use multidb_config::GatewayConfig;
use multidb_mcp::McpServer;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const LOCAL_CONFIG: &str = r#"
[server]
bind = "127.0.0.1:0"
max_body_bytes = 2048

[server.audit]
enabled = false

[kv]
backend = "memory"

[document]
enabled = false

[relational]
backend = "sqlite"
path = ":memory:"

[wiki]
enabled = false
"#;

async fn start_gateway() -> SocketAddr {
    let config = GatewayConfig::parse(LOCAL_CONFIG).unwrap();
    let server = McpServer::from_config(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve_with_listener(listener));
    addr
}

/// Incremental reader of SSE events from a streaming response.
struct EventReader {
    response: reqwest::Response,
    buffer: String,
}

impl EventReader {
    async fn open(addr: SocketAddr) -> Self {
        let response = reqwest::get(format!("http://{addr}/sse")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        Self {
            response,
            buffer: String::new(),
        }
    }

    /// Returns the next `(event, data)` pair, skipping keep-alive comments.
    async fn next_event(&mut self) -> (String, String) {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(.. end + 2).collect();
                let mut event = String::new();
                let mut data = String::new();
                for line in block.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        event = value.trim().to_string();
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push_str(value.trim_start());
                    }
                }
                if event.is_empty() && data.is_empty() {
                    continue;
                }
                return (event, data);
            }
            let chunk = tokio::time::timeout(Duration::from_secs(10), self.response.chunk())
                .await
                .expect("event within deadline")
                .unwrap()
                .expect("stream still open");
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    async fn next_message(&mut self) -> Value {
        let (event, data) = self.next_event().await;
        assert_eq!(event, "message");
        serde_json::from_str(&data).unwrap()
    }
}

async fn post(addr: SocketAddr, endpoint: &str, body: String) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}{endpoint}"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn session_opens_with_endpoint_and_catalog() {
    let addr = start_gateway().await;
    let mut reader = EventReader::open(addr).await;

    let (event, endpoint) = reader.next_event().await;
    assert_eq!(event, "endpoint");
    assert!(endpoint.starts_with("/message?sessionId="));

    let catalog = reader.next_message().await;
    assert_eq!(catalog["method"], json!("notifications/tools/catalog"));
    assert_eq!(catalog["params"]["tools"].as_array().unwrap().len(), 11);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn posted_calls_are_answered_on_the_stream() {
    let addr = start_gateway().await;
    let mut reader = EventReader::open(addr).await;
    let (_, endpoint) = reader.next_event().await;
    reader.next_message().await;

    let missing = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": "kv_get", "arguments": {"key": "absent"}}
    });
    let accepted = post(addr, &endpoint, missing.to_string()).await;
    assert_eq!(accepted.status().as_u16(), 202);
    let reply = reader.next_message().await;
    assert_eq!(reply["id"], json!(1));
    assert_eq!(reply["result"]["content"][0]["text"], json!("Key not found"));

    let select = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {"name": "relational_query", "arguments": {"sql": "SELECT 1"}}
    });
    assert_eq!(post(addr, &endpoint, select.to_string()).await.status().as_u16(), 202);
    let reply = reader.next_message().await;
    let rows: Value = serde_json::from_str(reply["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(rows, json!([{"1": 1}]));

    let list = json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"});
    assert_eq!(post(addr, &endpoint, list.to_string()).await.status().as_u16(), 202);
    let reply = reader.next_message().await;
    assert_eq!(reply["result"]["tools"].as_array().unwrap().len(), 11);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn posts_are_rejected_with_transport_statuses() {
    let addr = start_gateway().await;
    let ping = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string();

    let unknown = post(addr, "/message?sessionId=unknown", ping.clone()).await;
    assert_eq!(unknown.status().as_u16(), 404);
    let missing = post(addr, "/message", ping).await;
    assert_eq!(missing.status().as_u16(), 404);

    let mut reader = EventReader::open(addr).await;
    let (_, endpoint) = reader.next_event().await;
    let malformed = post(addr, &endpoint, "{not json".to_string()).await;
    assert_eq!(malformed.status().as_u16(), 400);
    let oversized = post(addr, &endpoint, "x".repeat(4096)).await;
    assert_eq!(oversized.status().as_u16(), 413);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_reports_sessions_and_tools() {
    let addr = start_gateway().await;
    let mut reader = EventReader::open(addr).await;
    reader.next_event().await;

    let health: Value =
        reqwest::get(format!("http://{addr}/health")).await.unwrap().json().await.unwrap();
    assert_eq!(health["status"], json!("ok"));
    assert_eq!(health["sessions"], json!(1));
    assert_eq!(health["tools"], json!(11));
}
