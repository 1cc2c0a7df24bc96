// crates/multidb-config/src/lib.rs
// ============================================================================
// Module: Multi-DB Gateway Config Library
// Description: Canonical config model, overrides, and validation.
// Purpose: Single source of truth for multidb-gateway.toml semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `multidb-config` defines the gateway configuration model: the SSE server
//! section and one section per backend domain. Loading is strict and
//! fail-closed; deployment environment variables override file values.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
