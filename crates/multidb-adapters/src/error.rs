// crates/multidb-adapters/src/error.rs
// ============================================================================
// Module: Store Errors
// Description: Failure type shared by backend store clients.
// Purpose: Separate "could not reach" from "backend said no" for every store.
// Dependencies: multidb-core, thiserror
// ============================================================================

//! ## Overview
//! Store clients report [`StoreError`]; adapters convert it into the core
//! [`AdapterError`] so audit labels stay stable across backends.

use multidb_core::AdapterError;
use thiserror::Error;

/// Backend store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection could not be opened or was lost.
    #[error("{0}")]
    Unavailable(String),
    /// Backend rejected or failed the operation.
    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for AdapterError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => Self::Unavailable(message),
            StoreError::Backend(message) => Self::Backend(message),
        }
    }
}
