// crates/multidb-core/src/dispatch.rs
// ============================================================================
// Module: Tool Dispatcher
// Description: Routes invocations to adapters and normalizes failures.
// Purpose: Guarantee every invocation yields an envelope, never a fault.
// Dependencies: futures-util, tokio, thiserror
// ============================================================================

//! ## Overview
//! [`Dispatcher::dispatch`] resolves the owning adapter from the tool name,
//! invokes it under an optional deadline, and maps every failure to an
//! `isError = true` [`InvocationResult`] through [`normalize`]. This is the
//! only place failures are turned into envelopes.
//!
//! ## Invariants
//! - Dispatch always returns an [`InvocationResult`].
//! - Successful adapter results pass through unchanged.
//! - A panicking adapter yields an error envelope, not a dead task.
//! - Unknown-tool messages contain the caller-supplied name verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use futures_util::FutureExt;
use thiserror::Error;

use crate::adapter::AdapterError;
use crate::envelope::Arguments;
use crate::envelope::InvocationRequest;
use crate::envelope::InvocationResult;
use crate::registry::ToolRegistry;
use crate::tooling::ToolName;

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Reasons a dispatch produced an error envelope.
#[derive(Debug, Error)]
pub enum DispatchFailure {
    /// No registered adapter claims the name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    /// The owning adapter reported a failure.
    #[error("{0}")]
    Adapter(#[from] AdapterError),
    /// The adapter call exceeded the configured deadline.
    #[error("tool {tool} timed out after {} ms", .limit.as_millis())]
    Timeout {
        /// Tool that timed out.
        tool: ToolName,
        /// Deadline that elapsed.
        limit: Duration,
    },
}

impl DispatchFailure {
    /// Returns a stable label for audit and telemetry.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::Adapter(err) => err.kind(),
            Self::Timeout {
                ..
            } => "timeout",
        }
    }
}

/// Maps a dispatch failure to its error envelope.
#[must_use]
pub fn normalize(failure: &DispatchFailure) -> InvocationResult {
    InvocationResult::error(format!("Error: {failure}"))
}

// ============================================================================
// SECTION: Dispatch Trace
// ============================================================================

/// Dispatch result with routing metadata for audit logging.
#[derive(Debug)]
pub struct DispatchTrace {
    /// Resolved tool, when the name was known.
    pub tool: Option<ToolName>,
    /// Envelope returned to the caller.
    pub result: InvocationResult,
    /// Stable failure label, when the call failed.
    pub failure_kind: Option<&'static str>,
    /// Wall-clock time spent dispatching.
    pub elapsed: Duration,
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Routes invocations to registered adapters.
#[derive(Clone)]
pub struct Dispatcher {
    /// Tool catalog and adapter lookup.
    registry: Arc<ToolRegistry>,
    /// Optional per-call deadline.
    call_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry` with an optional per-call deadline.
    #[must_use]
    pub const fn new(registry: Arc<ToolRegistry>, call_timeout: Option<Duration>) -> Self {
        Self {
            registry,
            call_timeout,
        }
    }

    /// Returns the registry backing this dispatcher.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Dispatches a request and returns its envelope.
    pub async fn dispatch(&self, request: InvocationRequest) -> InvocationResult {
        self.dispatch_traced(request).await.result
    }

    /// Dispatches a request and returns the envelope with routing metadata.
    pub async fn dispatch_traced(&self, request: InvocationRequest) -> DispatchTrace {
        let started = Instant::now();
        let tool = ToolName::parse(&request.name).filter(|tool| self.registry.contains(*tool));
        let outcome = match tool {
            Some(tool) => self.invoke(tool, request.arguments).await,
            None => Err(DispatchFailure::UnknownTool(request.name)),
        };
        let (result, failure_kind) = match outcome {
            Ok(result) => (result, None),
            Err(failure) => (normalize(&failure), Some(failure.kind())),
        };
        DispatchTrace {
            tool,
            result,
            failure_kind,
            elapsed: started.elapsed(),
        }
    }

    /// Invokes the adapter owning `tool`, bounded by the call deadline.
    async fn invoke(
        &self,
        tool: ToolName,
        arguments: Arguments,
    ) -> Result<InvocationResult, DispatchFailure> {
        let Some(adapter) = self.registry.adapter_for(tool.domain()) else {
            return Err(DispatchFailure::UnknownTool(tool.as_str().to_string()));
        };
        let call = AssertUnwindSafe(adapter.invoke(tool, arguments))
            .catch_unwind()
            .map(|outcome| outcome.unwrap_or_else(|payload| Err(panic_failure(tool, payload.as_ref()))));
        match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result.map_err(DispatchFailure::from),
                Err(_) => Err(DispatchFailure::Timeout {
                    tool,
                    limit,
                }),
            },
            None => call.await.map_err(DispatchFailure::from),
        }
    }
}

/// Maps an adapter panic payload to a backend failure.
fn panic_failure(tool: ToolName, payload: &(dyn Any + Send)) -> AdapterError {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    AdapterError::Backend(format!("tool {tool} panicked: {detail}"))
}

#[cfg(test)]
mod tests;
