// crates/multidb-adapters/src/lib.rs
// ============================================================================
// Module: Multi-DB Gateway Adapters
// Description: Backend adapters and the clients they drive.
// Purpose: Bridge the tool contract to Redis, MongoDB, MySQL/SQLite, and BookStack.
// Dependencies: multidb-core, multidb-config, redis, mongodb, sqlx, rusqlite, reqwest
// ============================================================================

//! ## Overview
//! Each domain module pairs an adapter (argument decoding, result rendering,
//! descriptors) with a store contract and its concrete clients. The adapter
//! never sees a driver type; tests swap in in-memory or recording stores.
//! [`bootstrap`] wires clients to adapters from configuration.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bootstrap;
pub mod document;
pub mod error;
pub mod kv;
pub mod relational;
pub mod wiki;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bootstrap::BootstrapError;
pub use bootstrap::build_adapters;
pub use bootstrap::build_registry;
pub use document::DocumentAdapter;
pub use document::DocumentStore;
pub use error::StoreError;
pub use kv::KeyValueStore;
pub use kv::KvAdapter;
pub use relational::RelationalAdapter;
pub use relational::RelationalStore;
pub use wiki::WikiAdapter;
pub use wiki::WikiApi;
