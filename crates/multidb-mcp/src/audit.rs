// crates/multidb-mcp/src/audit.rs
// ============================================================================
// Module: MCP Audit Logging
// Description: Structured audit events for sessions and request handling.
// Purpose: Emit JSON-lines audit logs without hard dependencies.
// Dependencies: multidb-core, serde
// ============================================================================

//! ## Overview
//! Audit events are plain serializable structs recorded through
//! [`McpAuditSink`]. Sinks write one JSON object per line to stderr or an
//! append-only file, or discard events. Payloads (arguments, results) are
//! never logged; only sizes, labels, and identifiers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use multidb_core::ToolName;
use serde::Serialize;

use crate::protocol::McpMethod;
use crate::protocol::McpOutcome;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Per-request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct McpAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Session that carried the request.
    pub session_id: String,
    /// JSON-RPC request id when provided.
    pub request_id: Option<String>,
    /// JSON-RPC method classification.
    pub method: McpMethod,
    /// Tool name when available (tools/call).
    pub tool: Option<ToolName>,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response frame size in bytes.
    pub response_bytes: usize,
    /// Handling time in milliseconds.
    pub duration_ms: u128,
}

/// Inputs required to construct a request audit event.
pub struct McpAuditEventParams {
    /// Session that carried the request.
    pub session_id: String,
    /// JSON-RPC request id when provided.
    pub request_id: Option<String>,
    /// JSON-RPC method classification.
    pub method: McpMethod,
    /// Tool name when available.
    pub tool: Option<ToolName>,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response frame size in bytes.
    pub response_bytes: usize,
    /// Handling time in milliseconds.
    pub duration_ms: u128,
}

impl McpAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: McpAuditEventParams) -> Self {
        Self {
            event: "mcp_request",
            timestamp_ms: now_ms(),
            session_id: params.session_id,
            request_id: params.request_id,
            method: params.method,
            tool: params.tool,
            outcome: params.outcome,
            error_code: params.error_code,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
            duration_ms: params.duration_ms,
        }
    }
}

/// Session lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    /// A stream was opened and registered.
    SessionOpened,
    /// A session was removed (explicit close or stream drop).
    SessionClosed,
    /// A response was produced after its stream had closed.
    ResultDropped,
}

/// Session lifecycle audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct SessionAuditEvent {
    /// Event identifier.
    pub event: SessionEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Session identifier.
    pub session_id: String,
    /// JSON-RPC request id for dropped results.
    pub request_id: Option<String>,
    /// Open sessions after the event (zero when not tracked).
    pub active_sessions: usize,
}

impl SessionAuditEvent {
    /// Creates a new session event with a consistent timestamp.
    #[must_use]
    pub fn new(
        event: SessionEventKind,
        session_id: &str,
        request_id: Option<String>,
        active_sessions: usize,
    ) -> Self {
        Self {
            event,
            timestamp_ms: now_ms(),
            session_id: session_id.to_string(),
            request_id,
            active_sessions,
        }
    }
}

/// Returns the wall-clock time in milliseconds since the epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for MCP events.
pub trait McpAuditSink: Send + Sync {
    /// Record a request audit event.
    fn record(&self, event: &McpAuditEvent);

    /// Record a session lifecycle event.
    fn record_session(&self, _event: &SessionAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct McpStderrAuditSink;

impl McpAuditSink for McpStderrAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_session(&self, event: &SessionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct McpFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl McpFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event.
    fn append(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl McpAuditSink for McpFileAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }

    fn record_session(&self, event: &SessionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.append(&payload);
        }
    }
}

/// No-op audit sink.
pub struct McpNoopAuditSink;

impl McpAuditSink for McpNoopAuditSink {
    fn record(&self, _event: &McpAuditEvent) {}
}
