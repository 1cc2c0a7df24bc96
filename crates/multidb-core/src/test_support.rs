// crates/multidb-core/src/test_support.rs
// ============================================================================
// Module: Core Test Support
// Description: Scripted adapter used by registry and dispatcher unit tests.
// Dependencies: async-trait, serde_json, tokio
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only fixtures favor direct assertions."
)]

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use serde_json::json;

use crate::adapter::AdapterError;
use crate::adapter::ToolAdapter;
use crate::envelope::Arguments;
use crate::envelope::InvocationResult;
use crate::envelope::ToolDescriptor;
use crate::tooling::ToolDomain;
use crate::tooling::ToolName;

/// Adapter that echoes its arguments and follows simple scripting keys.
///
/// - `"fail": "<msg>"` returns [`AdapterError::Backend`].
/// - `"sleep_ms": <n>` delays the reply.
/// - `"panic": "<msg>"` panics with the message.
pub struct ScriptedAdapter {
    /// Served domain.
    pub domain: ToolDomain,
    /// Published tools.
    pub tools: Vec<ToolName>,
}

impl ScriptedAdapter {
    /// Publishes every tool of `domain`.
    pub fn full(domain: ToolDomain) -> Self {
        let tools = ToolName::all().into_iter().filter(|tool| tool.domain() == domain).collect();
        Self {
            domain,
            tools,
        }
    }
}

#[async_trait]
impl ToolAdapter for ScriptedAdapter {
    fn domain(&self) -> ToolDomain {
        self.domain
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| ToolDescriptor::new(*tool, format!("scripted {tool}"), json!({"type": "object"})))
            .collect()
    }

    async fn invoke(
        &self,
        tool: ToolName,
        arguments: Arguments,
    ) -> Result<InvocationResult, AdapterError> {
        if let Some(ms) = arguments.get("sleep_ms").and_then(Value::as_u64) {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if let Some(message) = arguments.get("panic").and_then(Value::as_str) {
            panic!("{message}");
        }
        if let Some(message) = arguments.get("fail").and_then(Value::as_str) {
            return Err(AdapterError::Backend(message.to_string()));
        }
        Ok(InvocationResult::json(&json!({"tool": tool.as_str(), "arguments": arguments})))
    }
}
