// crates/multidb-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: Axum router exposing the gateway over SSE sessions.
// Purpose: Wire configuration, registry, sessions, and audit into HTTP routes.
// Dependencies: axum, multidb-adapters, multidb-config, tokio
// ============================================================================

//! ## Overview
//! Routes:
//! - `GET /sse` opens a session and streams `endpoint` and `message` events.
//! - `POST /message?sessionId=<id>` accepts one JSON-RPC message (202); the
//!   reply arrives on the session stream.
//! - `GET /health` reports open sessions and published tools.
//!
//! [`McpServer::from_config`] must run inside a tokio runtime because some
//! backend pools are created lazily against the current runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::Sse;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::routing::get;
use axum::routing::post;
use multidb_adapters::build_registry;
use multidb_config::GatewayConfig;
use multidb_config::ServerAuditConfig;
use multidb_core::Dispatcher;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_stream::StreamExt;

use crate::audit::McpAuditSink;
use crate::audit::McpFileAuditSink;
use crate::audit::McpNoopAuditSink;
use crate::audit::McpStderrAuditSink;
use crate::session::MESSAGE_PATH;
use crate::session::SessionFrame;
use crate::session::SessionManager;
use crate::session::SessionSettings;

/// Path that opens a session stream.
pub const SSE_PATH: &str = "/sse";
/// Path of the liveness probe.
pub const HEALTH_PATH: &str = "/health";
/// Interval between SSE keep-alive comments.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Server configuration.
    config: GatewayConfig,
    /// Open sessions and the shared dispatcher.
    sessions: Arc<SessionManager>,
}

impl McpServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError::Config`] for invalid configuration and
    /// [`McpServerError::Init`] when a backend or the audit log cannot be set up.
    pub fn from_config(config: GatewayConfig) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let registry = build_registry(&config).map_err(|err| McpServerError::Init(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)?;
        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            Some(Duration::from_millis(config.server.call_timeout_ms)),
        );
        let sessions = SessionManager::new(
            dispatcher,
            SessionSettings {
                channel_capacity: config.server.session_channel_capacity,
                max_body_bytes: config.server.max_body_bytes,
            },
            audit,
        );
        Ok(Self {
            config,
            sessions,
        })
    }

    /// Returns the session manager.
    #[must_use]
    pub const fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Builds the HTTP router.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route(SSE_PATH, get(handle_sse))
            .route(MESSAGE_PATH, post(handle_message))
            .route(HEALTH_PATH, get(handle_health))
            .layer(DefaultBodyLimit::max(self.config.server.max_body_bytes.saturating_add(1)))
            .with_state(Arc::clone(&self.sessions))
    }

    /// Binds the configured address and serves until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        let addr =
            self.config.server.bind_addr().map_err(|err| McpServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|_| McpServerError::Transport(format!("sse bind failed on {addr}")))?;
        self.serve_with_listener(listener).await
    }

    /// Serves on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError::Transport`] when the server fails.
    pub async fn serve_with_listener(self, listener: TcpListener) -> Result<(), McpServerError> {
        let app = self.router();
        axum::serve(listener, app)
            .await
            .map_err(|_| McpServerError::Transport("sse server failed".to_string()))
    }
}

/// Selects the audit sink for the configured audit settings.
fn build_audit_sink(config: &ServerAuditConfig) -> Result<Arc<dyn McpAuditSink>, McpServerError> {
    if !config.enabled {
        return Ok(Arc::new(McpNoopAuditSink));
    }
    match config.path.as_deref() {
        Some(path) => {
            let sink = McpFileAuditSink::new(Path::new(path))
                .map_err(|err| McpServerError::Init(format!("audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(McpStderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Query string of `POST /message`.
#[derive(Debug, Deserialize)]
struct MessageQuery {
    /// Target session.
    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,
}

/// Opens a session and streams its frames as SSE events.
async fn handle_sse(State(sessions): State<Arc<SessionManager>>) -> impl IntoResponse {
    let stream = sessions.open_session().map(|frame| {
        let event = match frame {
            SessionFrame::Endpoint(path) => Event::default().event("endpoint").data(path),
            SessionFrame::Message(payload) => Event::default().event("message").data(payload),
        };
        Ok::<_, Infallible>(event)
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

/// Accepts a posted JSON-RPC message for a session.
async fn handle_message(
    State(sessions): State<Arc<SessionManager>>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let session_id = query.session_id.unwrap_or_default();
    match sessions.deliver_posted(&session_id, &body) {
        Ok(_) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

/// Reports liveness with session and tool counts.
async fn handle_health(State(sessions): State<Arc<SessionManager>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sessions": sessions.session_count(),
        "tools": sessions.dispatcher().registry().len(),
    }))
}
