// crates/multidb-core/src/adapter.rs
// ============================================================================
// Module: Backend Adapter Contract
// Description: Interface every backend adapter implements for the router.
// Purpose: Keep backend specifics behind a declare/invoke contract.
// Dependencies: async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! An adapter owns one backend connection (injected at construction, opened
//! lazily) and exposes two operations: publish its [`ToolDescriptor`]s and
//! execute one of its tools. Adapters report failures as [`AdapterError`];
//! the dispatcher is the only place those are turned into error envelopes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::envelope::Arguments;
use crate::envelope::InvocationResult;
use crate::envelope::ToolDescriptor;
use crate::tooling::ToolDomain;
use crate::tooling::ToolName;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Adapter failures surfaced to the dispatcher.
///
/// # Invariants
/// - Variants are stable for programmatic handling and audit labels.
/// - Messages never embed credentials from connection configuration.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Arguments could not be decoded into the tool's parameter shape.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Backend could not be reached or the connection could not be opened.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// Backend rejected or failed the operation.
    #[error("{0}")]
    Backend(String),
    /// Tool belongs to another adapter's domain.
    #[error("tool {0} is not handled by this adapter")]
    ForeignTool(ToolName),
}

impl AdapterError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Unavailable(_) => "unavailable",
            Self::Backend(_) => "backend",
            Self::ForeignTool(_) => "foreign_tool",
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Backend adapter consumed by the tool registry and dispatcher.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Returns the domain this adapter serves.
    fn domain(&self) -> ToolDomain;

    /// Returns the tools this adapter publishes, in catalog order.
    fn descriptors(&self) -> Vec<ToolDescriptor>;

    /// Executes one tool call against the backend.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when arguments are malformed or the backend
    /// call fails.
    async fn invoke(
        &self,
        tool: ToolName,
        arguments: Arguments,
    ) -> Result<InvocationResult, AdapterError>;
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes an argument map into a typed parameter struct.
///
/// # Errors
///
/// Returns [`AdapterError::InvalidArguments`] when the map does not match `T`.
pub fn decode_arguments<T: DeserializeOwned>(arguments: Arguments) -> Result<T, AdapterError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|err| AdapterError::InvalidArguments(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only decoding assertions.")]

    use serde::Deserialize;
    use serde_json::json;

    use super::AdapterError;
    use super::decode_arguments;

    #[derive(Debug, Deserialize)]
    struct KeyArgs {
        key: String,
    }

    #[test]
    fn decode_arguments_reads_typed_fields() {
        let args = json!({"key": "alpha"}).as_object().cloned().unwrap();
        let decoded: KeyArgs = decode_arguments(args).unwrap();
        assert_eq!(decoded.key, "alpha");
    }

    #[test]
    fn decode_arguments_reports_missing_field() {
        let err = decode_arguments::<KeyArgs>(serde_json::Map::new()).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidArguments(_)));
        assert!(err.to_string().contains("key"));
    }
}
