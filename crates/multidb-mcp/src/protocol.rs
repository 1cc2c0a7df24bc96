// crates/multidb-mcp/src/protocol.rs
// ============================================================================
// Module: MCP JSON-RPC Protocol
// Description: JSON-RPC 2.0 payloads and method handling for the gateway.
// Purpose: Turn one decoded request into at most one response.
// Dependencies: multidb-core, serde
// ============================================================================

//! ## Overview
//! Supported methods are `initialize`, `ping`, `tools/list`, and
//! `tools/call`. Messages without an `id` are notifications and never get a
//! response. Tool failures are not protocol errors: `tools/call` always
//! answers with an [`InvocationResult`](multidb_core::InvocationResult), whose
//! `isError` flag carries the failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use multidb_core::Arguments;
use multidb_core::Dispatcher;
use multidb_core::InvocationRequest;
use multidb_core::ToolDescriptor;
use multidb_core::ToolName;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON-RPC protocol version accepted and emitted.
pub const JSONRPC_VERSION: &str = "2.0";
/// MCP protocol revision advertised by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";
/// Server name advertised by `initialize`.
pub const SERVER_NAME: &str = "multidb-gateway";
/// Notification method carrying the tool catalog on session open.
pub const CATALOG_NOTIFICATION: &str = "notifications/tools/catalog";

/// Invalid request error code.
pub const INVALID_REQUEST: i64 = -32600;
/// Method not found error code.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid params error code.
pub const INVALID_PARAMS: i64 = -32602;
/// Internal error code.
pub const INTERNAL_ERROR: i64 = -32603;

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// Incoming JSON-RPC message.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    pub jsonrpc: String,
    /// Request identifier; absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Optional parameters payload.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    pub jsonrpc: &'static str,
    /// Request identifier.
    pub id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    #[must_use]
    pub const fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Serializes the response to a single-line JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{{\"code\":{INTERNAL_ERROR},\"message\":\
                 \"serialization failed\"}}}}"
            )
        })
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
}

/// Parameters of `tools/call`.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name as sent by the caller.
    name: String,
    /// Tool arguments; omitted arguments mean `{}`.
    #[serde(default)]
    arguments: Option<Arguments>,
}

/// Builds the catalog notification sent when a session opens.
#[must_use]
pub fn catalog_notification(tools: &[ToolDescriptor]) -> String {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": CATALOG_NOTIFICATION,
        "params": {"tools": tools},
    })
    .to_string()
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// JSON-RPC method classification for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum McpMethod {
    /// `initialize`.
    #[serde(rename = "initialize")]
    Initialize,
    /// `ping`.
    #[serde(rename = "ping")]
    Ping,
    /// `tools/list`.
    #[serde(rename = "tools/list")]
    ToolsList,
    /// `tools/call`.
    #[serde(rename = "tools/call")]
    ToolsCall,
    /// Message without an id.
    #[serde(rename = "notification")]
    Notification,
    /// Undecodable message.
    #[serde(rename = "invalid")]
    Invalid,
    /// Unsupported method.
    #[serde(rename = "other")]
    Other,
}

/// Request outcome classification for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum McpOutcome {
    /// Request succeeded (including tool results without `isError`).
    Ok,
    /// Request failed or the tool reported `isError`.
    Error,
}

/// Result of handling one JSON-RPC message.
#[derive(Debug)]
pub struct HandledRequest {
    /// Response to write, or `None` for notifications.
    pub response: Option<JsonRpcResponse>,
    /// Method classification.
    pub method: McpMethod,
    /// Resolved tool for `tools/call`.
    pub tool: Option<ToolName>,
    /// Outcome classification.
    pub outcome: McpOutcome,
    /// JSON-RPC error code, when the response is an error.
    pub error_code: Option<i64>,
    /// Stable failure label, when the request or tool call failed.
    pub error_kind: Option<&'static str>,
}

impl HandledRequest {
    /// Builds a successful handling record.
    const fn ok(method: McpMethod, response: Option<JsonRpcResponse>) -> Self {
        Self {
            response,
            method,
            tool: None,
            outcome: McpOutcome::Ok,
            error_code: None,
            error_kind: None,
        }
    }

    /// Builds a protocol-error handling record.
    fn protocol_error(method: McpMethod, id: Value, code: i64, message: &str, kind: &'static str) -> Self {
        Self {
            response: Some(JsonRpcResponse::failure(id, code, message)),
            method,
            tool: None,
            outcome: McpOutcome::Error,
            error_code: Some(code),
            error_kind: Some(kind),
        }
    }
}

// ============================================================================
// SECTION: Handling
// ============================================================================

/// Handles one decoded JSON-RPC message.
pub async fn handle_request(dispatcher: &Dispatcher, request: JsonRpcRequest) -> HandledRequest {
    let Some(id) = request.id else {
        return HandledRequest::ok(McpMethod::Notification, None);
    };
    let method = classify(&request.method);
    if request.jsonrpc != JSONRPC_VERSION {
        return HandledRequest::protocol_error(
            method,
            id,
            INVALID_REQUEST,
            "invalid json-rpc version",
            "invalid_request",
        );
    }
    match method {
        McpMethod::Initialize => {
            HandledRequest::ok(method, Some(JsonRpcResponse::success(id, initialize_result())))
        }
        McpMethod::Ping => HandledRequest::ok(method, Some(JsonRpcResponse::success(id, json!({})))),
        McpMethod::ToolsList => {
            let tools = json!({"tools": dispatcher.registry().list()});
            HandledRequest::ok(method, Some(JsonRpcResponse::success(id, tools)))
        }
        McpMethod::ToolsCall => call_tool(dispatcher, id, request.params).await,
        McpMethod::Notification | McpMethod::Invalid | McpMethod::Other => {
            HandledRequest::protocol_error(
                McpMethod::Other,
                id,
                METHOD_NOT_FOUND,
                "method not found",
                "method_not_found",
            )
        }
    }
}

/// Maps a method name to its classification.
fn classify(method: &str) -> McpMethod {
    match method {
        "initialize" => McpMethod::Initialize,
        "ping" => McpMethod::Ping,
        "tools/list" => McpMethod::ToolsList,
        "tools/call" => McpMethod::ToolsCall,
        _ => McpMethod::Other,
    }
}

/// Builds the `initialize` result.
fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {"tools": {"listChanged": false}},
        "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
    })
}

/// Executes `tools/call` through the dispatcher.
async fn call_tool(dispatcher: &Dispatcher, id: Value, params: Option<Value>) -> HandledRequest {
    let params = params.unwrap_or(Value::Null);
    let Ok(call) = serde_json::from_value::<ToolCallParams>(params) else {
        return HandledRequest::protocol_error(
            McpMethod::ToolsCall,
            id,
            INVALID_PARAMS,
            "invalid tool params",
            "invalid_params",
        );
    };
    let trace = dispatcher
        .dispatch_traced(InvocationRequest::new(call.name, call.arguments.unwrap_or_default()))
        .await;
    let outcome = if trace.result.is_error { McpOutcome::Error } else { McpOutcome::Ok };
    match serde_json::to_value(&trace.result) {
        Ok(result) => HandledRequest {
            response: Some(JsonRpcResponse::success(id, result)),
            method: McpMethod::ToolsCall,
            tool: trace.tool,
            outcome,
            error_code: None,
            error_kind: trace.failure_kind,
        },
        Err(_) => HandledRequest::protocol_error(
            McpMethod::ToolsCall,
            id,
            INTERNAL_ERROR,
            "serialization failed",
            "serialization",
        ),
    }
}

#[cfg(test)]
mod tests;
