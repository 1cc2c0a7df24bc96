// crates/multidb-mcp/src/lib.rs
// ============================================================================
// Module: Multi-DB Gateway MCP
// Description: MCP protocol handling and SSE session transport.
// Purpose: Serve the tool catalog to remote callers over JSON-RPC 2.0.
// Dependencies: axum, multidb-core, multidb-adapters, multidb-config, tokio
// ============================================================================

//! ## Overview
//! [`protocol`] maps JSON-RPC messages onto the core dispatcher, [`session`]
//! correlates posted messages with their event streams, [`server`] exposes
//! both over HTTP, and [`audit`] records one JSON line per request and per
//! session lifecycle change.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod protocol;
pub mod server;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::McpAuditEvent;
pub use audit::McpAuditSink;
pub use audit::McpFileAuditSink;
pub use audit::McpNoopAuditSink;
pub use audit::McpStderrAuditSink;
pub use audit::SessionAuditEvent;
pub use audit::SessionEventKind;
pub use protocol::JsonRpcRequest;
pub use protocol::JsonRpcResponse;
pub use protocol::handle_request;
pub use server::McpServer;
pub use server::McpServerError;
pub use session::Acknowledgement;
pub use session::Session;
pub use session::SessionFrame;
pub use session::SessionId;
pub use session::SessionManager;
pub use session::TransportError;
