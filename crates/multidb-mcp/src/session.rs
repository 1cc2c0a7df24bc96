// crates/multidb-mcp/src/session.rs
// ============================================================================
// Module: Session Manager
// Description: Registry of open event streams keyed by session id.
// Purpose: Correlate posted messages with the stream that must carry replies.
// Dependencies: multidb-core, rand, tokio, tokio-stream
// ============================================================================

//! ## Overview
//! [`SessionManager::open_session`] registers a bounded outbound channel under
//! a fresh random id and queues the `endpoint` and catalog frames.
//! [`SessionManager::deliver_posted`] validates a posted body, acknowledges
//! it, and handles it on its own task; the response is written to the
//! session's channel in completion order.
//!
//! ## Invariants
//! - Ids are unique among open sessions; many sessions may be open at once.
//! - Dropping a [`Session`] (the stream) removes its id.
//! - A result for a closed session is dropped and audited, never misrouted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::task::Context;
use std::task::Poll;
use std::time::Instant;

use axum::http::StatusCode;
use multidb_core::Dispatcher;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::ReceiverStream;

use crate::audit::McpAuditEvent;
use crate::audit::McpAuditEventParams;
use crate::audit::McpAuditSink;
use crate::audit::SessionAuditEvent;
use crate::audit::SessionEventKind;
use crate::protocol::JsonRpcRequest;
use crate::protocol::McpMethod;
use crate::protocol::McpOutcome;
use crate::protocol::catalog_notification;
use crate::protocol::handle_request;

/// Path callers post messages to; the session id is appended as a query.
pub const MESSAGE_PATH: &str = "/message";
/// Frames queued before any response (endpoint and catalog).
const INITIAL_FRAMES: usize = 2;

// ============================================================================
// SECTION: Identifiers and Frames
// ============================================================================

/// Opaque session identifier (128 random bits, hex encoded).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound frame written to a session stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFrame {
    /// Tells the caller where to post messages.
    Endpoint(String),
    /// A serialized JSON-RPC message.
    Message(String),
}

// ============================================================================
// SECTION: Errors and Acknowledgements
// ============================================================================

/// Rejections for posted messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No open session has this id.
    #[error("session not found: {0}")]
    SessionNotFound(String),
    /// Body exceeds the configured limit.
    #[error("payload too large: limit is {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },
    /// Body is not a JSON-RPC message.
    #[error("malformed message: {0}")]
    MalformedMessage(String),
}

impl TransportError {
    /// Returns the HTTP status reported to the poster.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge {
                ..
            } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MalformedMessage(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Positive answer to a posted message; the reply arrives on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Message accepted for handling.
    Accepted,
}

// ============================================================================
// SECTION: Session Manager
// ============================================================================

/// Limits applied to every session.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Buffered outbound frames per session.
    pub channel_capacity: usize,
    /// Maximum posted body size in bytes.
    pub max_body_bytes: usize,
}

/// Registry of open sessions.
pub struct SessionManager {
    /// Dispatcher shared by all sessions.
    dispatcher: Dispatcher,
    /// Outbound channel per open session.
    sessions: Mutex<HashMap<SessionId, mpsc::Sender<SessionFrame>>>,
    /// Per-session limits.
    settings: SessionSettings,
    /// Audit sink.
    audit: Arc<dyn McpAuditSink>,
}

impl SessionManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(
        dispatcher: Dispatcher,
        settings: SessionSettings,
        audit: Arc<dyn McpAuditSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            dispatcher,
            sessions: Mutex::new(HashMap::new()),
            settings,
            audit,
        })
    }

    /// Returns the dispatcher shared by all sessions.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the number of open sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    /// Opens a session and queues its endpoint and catalog frames.
    #[must_use]
    pub fn open_session(self: &Arc<Self>) -> Session {
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(INITIAL_FRAMES));
        let mut sessions = self.lock();
        let mut id = SessionId::generate();
        while sessions.contains_key(&id) {
            id = SessionId::generate();
        }
        let endpoint = SessionFrame::Endpoint(format!("{MESSAGE_PATH}?sessionId={id}"));
        let catalog = SessionFrame::Message(catalog_notification(self.dispatcher.registry().list()));
        let _ = tx.try_send(endpoint);
        let _ = tx.try_send(catalog);
        sessions.insert(id.clone(), tx);
        let active = sessions.len();
        drop(sessions);
        self.audit.record_session(&SessionAuditEvent::new(
            SessionEventKind::SessionOpened,
            id.as_str(),
            None,
            active,
        ));
        Session {
            id: id.clone(),
            frames: ReceiverStream::new(rx),
            _guard: SessionGuard {
                id,
                manager: Arc::clone(self),
            },
        }
    }

    /// Removes a session; returns whether it was open.
    pub fn close_session(&self, id: &str) -> bool {
        let mut sessions = self.lock();
        let removed = sessions.remove(id).is_some();
        let active = sessions.len();
        drop(sessions);
        if removed {
            self.audit.record_session(&SessionAuditEvent::new(
                SessionEventKind::SessionClosed,
                id,
                None,
                active,
            ));
        }
        removed
    }

    /// Validates a posted body and schedules it for handling.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the session is unknown, the body is
    /// oversized, or the body is not a JSON-RPC message.
    pub fn deliver_posted(&self, session_id: &str, body: &[u8]) -> Result<Acknowledgement, TransportError> {
        let Some(outbound) = self.lock().get(session_id).cloned() else {
            return Err(TransportError::SessionNotFound(session_id.to_string()));
        };
        if body.len() > self.settings.max_body_bytes {
            return Err(TransportError::PayloadTooLarge {
                limit: self.settings.max_body_bytes,
            });
        }
        let request = match serde_json::from_slice::<JsonRpcRequest>(body) {
            Ok(request) => request,
            Err(err) => {
                self.audit.record(&McpAuditEvent::new(McpAuditEventParams {
                    session_id: session_id.to_string(),
                    request_id: None,
                    method: McpMethod::Invalid,
                    tool: None,
                    outcome: McpOutcome::Error,
                    error_code: None,
                    error_kind: Some("malformed_message"),
                    request_bytes: body.len(),
                    response_bytes: 0,
                    duration_ms: 0,
                }));
                return Err(TransportError::MalformedMessage(err.to_string()));
            }
        };

        let task = InFlight {
            session_id: session_id.to_string(),
            request_bytes: body.len(),
            dispatcher: self.dispatcher.clone(),
            audit: Arc::clone(&self.audit),
            outbound,
        };
        tokio::spawn(task.run(request));
        Ok(Acknowledgement::Accepted)
    }

    /// Locks the session map, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, mpsc::Sender<SessionFrame>>> {
        self.sessions.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// One posted request being handled off the transport.
struct InFlight {
    /// Session that posted the request.
    session_id: String,
    /// Posted body size.
    request_bytes: usize,
    /// Dispatcher clone.
    dispatcher: Dispatcher,
    /// Audit sink.
    audit: Arc<dyn McpAuditSink>,
    /// Session's outbound channel.
    outbound: mpsc::Sender<SessionFrame>,
}

impl InFlight {
    /// Handles the request and writes its response to the session.
    async fn run(self, request: JsonRpcRequest) {
        let started = Instant::now();
        let request_id = request.id.as_ref().map(ToString::to_string);
        let handled = handle_request(&self.dispatcher, request).await;
        let mut response_bytes = 0;
        if let Some(response) = handled.response {
            let payload = response.to_json();
            response_bytes = payload.len();
            if self.outbound.send(SessionFrame::Message(payload)).await.is_err() {
                self.audit.record_session(&SessionAuditEvent::new(
                    SessionEventKind::ResultDropped,
                    &self.session_id,
                    request_id.clone(),
                    0,
                ));
            }
        }
        self.audit.record(&McpAuditEvent::new(McpAuditEventParams {
            session_id: self.session_id,
            request_id,
            method: handled.method,
            tool: handled.tool,
            outcome: handled.outcome,
            error_code: handled.error_code,
            error_kind: handled.error_kind,
            request_bytes: self.request_bytes,
            response_bytes,
            duration_ms: started.elapsed().as_millis(),
        }));
    }
}

// ============================================================================
// SECTION: Session Stream
// ============================================================================

/// An open session: the stream of outbound frames for one caller.
pub struct Session {
    /// Session identifier.
    id: SessionId,
    /// Outbound frames.
    frames: ReceiverStream<SessionFrame>,
    /// Removes the session when the stream is dropped.
    _guard: SessionGuard,
}

impl Session {
    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> &SessionId {
        &self.id
    }
}

impl Stream for Session {
    type Item = SessionFrame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.frames).poll_next(cx)
    }
}

/// Closes its session on drop.
struct SessionGuard {
    /// Session to close.
    id: SessionId,
    /// Owning manager.
    manager: Arc<SessionManager>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.manager.close_session(self.id.as_str());
    }
}
