// crates/multidb-core/src/envelope.rs
// ============================================================================
// Module: Invocation Envelopes
// Description: Descriptor, request, and result payloads for tool calls.
// Purpose: Define the uniform wire shapes exchanged with callers.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Callers see three shapes: the published [`ToolDescriptor`], the inbound
//! [`InvocationRequest`], and the [`InvocationResult`] envelope. Failures are
//! carried as data (`isError = true`), never as protocol aborts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::tooling::ToolName;

/// Tool call arguments keyed by parameter name.
pub type Arguments = Map<String, Value>;

// ============================================================================
// SECTION: Descriptor
// ============================================================================

/// Published metadata for one tool.
///
/// # Invariants
/// - `name` is globally unique within a registry.
/// - `input_schema` is a JSON Schema object describing the argument shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Canonical tool name.
    pub name: ToolName,
    /// Human-readable description for callers.
    pub description: String,
    /// JSON schema for the tool arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Builds a descriptor.
    #[must_use]
    pub fn new(name: ToolName, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name,
            description: description.into(),
            input_schema,
        }
    }
}

// ============================================================================
// SECTION: Request
// ============================================================================

/// Inbound tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Raw tool name as sent by the caller.
    pub name: String,
    /// Tool arguments; omitted arguments decode as an empty map.
    #[serde(default)]
    pub arguments: Arguments,
}

impl InvocationRequest {
    /// Builds a request from a name and an argument map.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

// ============================================================================
// SECTION: Result
// ============================================================================

/// One content block in an invocation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Plain text payload.
    Text {
        /// Text body.
        text: String,
    },
}

impl ContentItem {
    /// Returns the text body of the block.
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text {
                text,
            } => text,
        }
    }
}

/// Uniform envelope returned for every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Ordered content blocks.
    pub content: Vec<ContentItem>,
    /// True when the invocation failed.
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl InvocationResult {
    /// Builds a successful single-text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text {
                text: text.into(),
            }],
            is_error: false,
        }
    }

    /// Builds a successful result rendering `value` as pretty JSON.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self::text(rendered)
    }

    /// Builds a failed single-text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Concatenates all text blocks, separated by newlines.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content.iter().map(ContentItem::as_text).collect::<Vec<_>>().join("\n")
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
