// crates/multidb-adapters/src/bootstrap.rs
// ============================================================================
// Module: Adapter Bootstrap
// Description: Builds backend clients and adapters from configuration.
// Purpose: Construct every backend connection once, explicitly, at startup.
// Dependencies: multidb-config, multidb-core
// ============================================================================

//! ## Overview
//! [`build_registry`] turns a validated [`GatewayConfig`] into a frozen
//! [`ToolRegistry`]. Clients are created here and injected into adapters;
//! none of them connects until its first call. Disabled backends contribute
//! no tools.

use std::sync::Arc;
use std::time::Duration;

use multidb_config::GatewayConfig;
use multidb_config::KvBackend;
use multidb_config::RelationalBackend;
use multidb_core::RegistryError;
use multidb_core::ToolAdapter;
use multidb_core::ToolDomain;
use multidb_core::ToolRegistry;
use thiserror::Error;

use crate::document::DocumentAdapter;
use crate::document::MongoStore;
use crate::kv::KvAdapter;
use crate::kv::KeyValueStore;
use crate::kv::MemoryStore;
use crate::kv::RedisStore;
use crate::relational::MySqlSettings;
use crate::relational::MySqlStore;
use crate::relational::RelationalAdapter;
use crate::relational::RelationalStore;
use crate::relational::SqliteStore;
use crate::wiki::BookStackClient;
use crate::wiki::WikiAdapter;

/// Startup failures while assembling adapters.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A backend client could not be constructed.
    #[error("{domain} backend: {message}")]
    Backend {
        /// Domain whose client failed.
        domain: ToolDomain,
        /// Failure description.
        message: String,
    },
    /// Adapters produced an inconsistent catalog.
    #[error("tool registry: {0}")]
    Registry(#[from] RegistryError),
}

/// Builds one adapter per enabled backend, in catalog order.
///
/// Must be called inside a Tokio runtime (the MySQL pool spawns maintenance
/// tasks).
///
/// # Errors
///
/// Returns [`BootstrapError::Backend`] when a client cannot be constructed.
pub fn build_adapters(config: &GatewayConfig) -> Result<Vec<Arc<dyn ToolAdapter>>, BootstrapError> {
    let mut adapters: Vec<Arc<dyn ToolAdapter>> = Vec::new();

    if config.kv.enabled {
        let store: Arc<dyn KeyValueStore> = match config.kv.backend {
            KvBackend::Redis => Arc::new(RedisStore::new(&config.kv.url).map_err(|err| {
                BootstrapError::Backend {
                    domain: ToolDomain::Kv,
                    message: err.to_string(),
                }
            })?),
            KvBackend::Memory => Arc::new(MemoryStore::new()),
        };
        adapters.push(Arc::new(KvAdapter::new(store)));
    }

    if config.document.enabled {
        let store = MongoStore::new(&config.document.url, &config.document.database);
        adapters.push(Arc::new(DocumentAdapter::new(
            Arc::new(store),
            config.document.default_find_limit,
        )));
    }

    if config.relational.enabled {
        let relational = &config.relational;
        let store: Arc<dyn RelationalStore> = match relational.backend {
            RelationalBackend::Mysql => Arc::new(MySqlStore::new(&MySqlSettings {
                host: relational.host.clone(),
                port: relational.port,
                user: relational.user.clone(),
                password: relational.password.clone(),
                database: relational.database.clone(),
                max_connections: relational.max_connections,
            })),
            RelationalBackend::Sqlite => {
                let path = relational.path.as_deref().ok_or_else(|| BootstrapError::Backend {
                    domain: ToolDomain::Relational,
                    message: "sqlite backend requires a path".to_string(),
                })?;
                Arc::new(SqliteStore::new(path, relational.max_connections))
            }
        };
        adapters.push(Arc::new(RelationalAdapter::new(store)));
    }

    if config.wiki.enabled {
        let wiki = &config.wiki;
        let client = BookStackClient::new(
            &wiki.url,
            &wiki.token_id,
            &wiki.token_secret,
            Duration::from_millis(wiki.timeout_ms),
        )
        .map_err(|err| BootstrapError::Backend {
            domain: ToolDomain::Wiki,
            message: err.to_string(),
        })?;
        adapters.push(Arc::new(WikiAdapter::new(Arc::new(client))));
    }

    Ok(adapters)
}

/// Builds adapters and freezes them into a registry.
///
/// # Errors
///
/// Returns [`BootstrapError`] when a client fails or the catalog is inconsistent.
pub fn build_registry(config: &GatewayConfig) -> Result<ToolRegistry, BootstrapError> {
    Ok(ToolRegistry::new(build_adapters(config)?)?)
}
