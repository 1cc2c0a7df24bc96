// crates/multidb-core/src/lib.rs
// ============================================================================
// Module: Multi-DB Gateway Core
// Description: Tool identity, adapter contract, registry, and dispatcher.
// Purpose: Provide the backend-agnostic tool-dispatch gateway.
// Dependencies: async-trait, serde, thiserror, tokio
// ============================================================================

//! ## Overview
//! The core crate defines what a tool is ([`ToolName`], [`ToolDescriptor`]),
//! what an invocation returns ([`InvocationResult`]), how backends plug in
//! ([`ToolAdapter`]), and how calls are routed ([`ToolRegistry`],
//! [`Dispatcher`]). It has no knowledge of transports or concrete backends.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod adapter;
pub mod dispatch;
pub mod envelope;
pub mod registry;
pub mod tooling;

#[cfg(test)]
mod test_support;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use adapter::AdapterError;
pub use adapter::ToolAdapter;
pub use adapter::decode_arguments;
pub use dispatch::DispatchFailure;
pub use dispatch::DispatchTrace;
pub use dispatch::Dispatcher;
pub use dispatch::normalize;
pub use envelope::Arguments;
pub use envelope::ContentItem;
pub use envelope::InvocationRequest;
pub use envelope::InvocationResult;
pub use envelope::ToolDescriptor;
pub use registry::RegistryError;
pub use registry::ToolRegistry;
pub use tooling::DocumentTool;
pub use tooling::KvTool;
pub use tooling::RelationalTool;
pub use tooling::ToolDomain;
pub use tooling::ToolName;
pub use tooling::WikiTool;
