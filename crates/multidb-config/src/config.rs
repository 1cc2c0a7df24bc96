// crates/multidb-config/src/config.rs
// ============================================================================
// Module: Multi-DB Gateway Configuration
// Description: Configuration loading, environment overrides, and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file, then overlaid with the
//! deployment environment variables (`REDIS_URL`, `MYSQL_HOST`, ...), then
//! validated. When no file is named and the default file is absent, built-in
//! defaults are used so a bare process still starts against local backends.
//! Security posture: config inputs are untrusted; credentials are never echoed
//! in validation errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "multidb-gateway.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "MULTIDB_GATEWAY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum accepted request body size in bytes.
pub(crate) const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Maximum per-call deadline in milliseconds.
pub(crate) const MAX_CALL_TIMEOUT_MS: u64 = 600_000;
/// Maximum buffered frames per session stream.
pub(crate) const MAX_SESSION_CHANNEL_CAPACITY: usize = 4096;
/// Maximum `document_find` default limit.
pub(crate) const MAX_FIND_LIMIT: u32 = 10_000;
/// Maximum relational pool size.
pub(crate) const MAX_POOL_CONNECTIONS: u32 = 256;
/// Minimum wiki request timeout in milliseconds.
pub(crate) const MIN_WIKI_TIMEOUT_MS: u64 = 100;
/// Maximum wiki request timeout in milliseconds.
pub(crate) const MAX_WIKI_TIMEOUT_MS: u64 = 120_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Multi-DB gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Key-value backend configuration.
    #[serde(default)]
    pub kv: KvConfig,
    /// Document backend configuration.
    #[serde(default)]
    pub document: DocumentConfig,
    /// Relational backend configuration.
    #[serde(default)]
    pub relational: RelationalConfig,
    /// Wiki backend configuration.
    #[serde(default)]
    pub wiki: WikiConfig,
}

impl GatewayConfig {
    /// Loads configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overrides, or validation fail.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration using `lookup` for environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overrides, or validation fail.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match resolve_path(path, &lookup)? {
            Some(resolved) => Self::from_file(&resolved)?,
            None => Self::default(),
        };
        config.apply_env_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, oversized, or malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses TOML content without applying overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML is malformed.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies deployment environment variables over file values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric override does not parse.
    pub fn apply_env_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            let port = parse_port("PORT", &port)?;
            let mut addr = self.server.bind_addr()?;
            addr.set_port(port);
            self.server.bind = addr.to_string();
        }
        if let Some(url) = lookup("REDIS_URL") {
            self.kv.url = url;
        }
        if let Some(url) = lookup("MONGODB_URL") {
            self.document.url = url;
        }
        if let Some(database) = lookup("MONGODB_DB_NAME") {
            self.document.database = database;
        }
        if let Some(host) = lookup("MYSQL_HOST") {
            self.relational.host = host;
        }
        if let Some(port) = lookup("MYSQL_PORT") {
            self.relational.port = parse_port("MYSQL_PORT", &port)?;
        }
        if let Some(user) = lookup("MYSQL_USER") {
            self.relational.user = user;
        }
        if let Some(password) = lookup("MYSQL_PASSWORD") {
            self.relational.password = password;
        }
        if let Some(database) = lookup("MYSQL_DATABASE") {
            self.relational.database = database;
        }
        if let Some(url) = lookup("BOOKSTACK_URL") {
            self.wiki.url = url;
        }
        if let Some(token_id) = lookup("BOOKSTACK_TOKEN_ID") {
            self.wiki.token_id = token_id;
        }
        if let Some(token_secret) = lookup("BOOKSTACK_TOKEN_SECRET") {
            self.wiki.token_secret = token_secret;
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        if self.kv.enabled {
            self.kv.validate()?;
        }
        if self.document.enabled {
            self.document.validate()?;
        }
        if self.relational.enabled {
            self.relational.validate()?;
        }
        if self.wiki.enabled {
            self.wiki.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP/SSE server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the SSE transport.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum posted message size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Per-call adapter deadline in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Buffered outbound frames per session before writers wait.
    #[serde(default = "default_session_channel_capacity")]
    pub session_channel_capacity: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            call_timeout_ms: default_call_timeout_ms(),
            session_channel_capacity: default_session_channel_capacity(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Validates server limits and addresses.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be between 1 and {MAX_BODY_BYTES}"
            )));
        }
        if self.call_timeout_ms == 0 || self.call_timeout_ms > MAX_CALL_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "server.call_timeout_ms must be between 1 and {MAX_CALL_TIMEOUT_MS}"
            )));
        }
        if self.session_channel_capacity == 0
            || self.session_channel_capacity > MAX_SESSION_CHANNEL_CAPACITY
        {
            return Err(ConfigError::Invalid(format!(
                "server.session_channel_capacity must be between 1 and \
                 {MAX_SESSION_CHANNEL_CAPACITY}"
            )));
        }
        self.audit.validate()
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Key-Value Backend
// ============================================================================

/// Key-value backend implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KvBackend {
    /// Redis server.
    #[default]
    Redis,
    /// Process-local store (development and tests).
    Memory,
}

/// Key-value backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KvConfig {
    /// Publish key-value tools.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Backend implementation.
    #[serde(default)]
    pub backend: KvBackend,
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: KvBackend::default(),
            url: default_redis_url(),
        }
    }
}

impl KvConfig {
    /// Validates the Redis URL when Redis is selected.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == KvBackend::Redis {
            validate_url("kv.url", &self.url, &["redis", "rediss", "redis+unix", "unix"])?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Document Backend
// ============================================================================

/// Document backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// Publish document tools.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// `MongoDB` connection string.
    #[serde(default = "default_mongodb_url")]
    pub url: String,
    /// Database selected for all collections.
    #[serde(default = "default_database")]
    pub database: String,
    /// Result limit applied when `document_find` omits `limit`.
    #[serde(default = "default_find_limit")]
    pub default_find_limit: u32,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: default_mongodb_url(),
            database: default_database(),
            default_find_limit: default_find_limit(),
        }
    }
}

impl DocumentConfig {
    /// Validates connection string, database, and limits.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_url("document.url", &self.url, &["mongodb", "mongodb+srv"])?;
        if self.database.trim().is_empty() {
            return Err(ConfigError::Invalid("document.database must be non-empty".to_string()));
        }
        if self.default_find_limit == 0 || self.default_find_limit > MAX_FIND_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "document.default_find_limit must be between 1 and {MAX_FIND_LIMIT}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Relational Backend
// ============================================================================

/// Relational backend implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationalBackend {
    /// MySQL server via a bounded connection pool.
    #[default]
    Mysql,
    /// Embedded `SQLite` database file.
    Sqlite,
}

/// Relational backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationalConfig {
    /// Publish relational tools.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Backend implementation.
    #[serde(default)]
    pub backend: RelationalBackend,
    /// MySQL host.
    #[serde(default = "default_mysql_host")]
    pub host: String,
    /// MySQL port.
    #[serde(default = "default_mysql_port")]
    pub port: u16,
    /// MySQL user.
    #[serde(default = "default_mysql_user")]
    pub user: String,
    /// MySQL password.
    #[serde(default = "default_mysql_password")]
    pub password: String,
    /// MySQL database.
    #[serde(default = "default_database")]
    pub database: String,
    /// `SQLite` database path (`:memory:` for a private in-memory database).
    #[serde(default)]
    pub path: Option<String>,
    /// Maximum pooled connections; excess work queues.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: RelationalBackend::default(),
            host: default_mysql_host(),
            port: default_mysql_port(),
            user: default_mysql_user(),
            password: default_mysql_password(),
            database: default_database(),
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

impl RelationalConfig {
    /// Validates backend-specific connection settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 || self.max_connections > MAX_POOL_CONNECTIONS {
            return Err(ConfigError::Invalid(format!(
                "relational.max_connections must be between 1 and {MAX_POOL_CONNECTIONS}"
            )));
        }
        match self.backend {
            RelationalBackend::Mysql => {
                if self.host.trim().is_empty() {
                    return Err(ConfigError::Invalid("relational.host must be non-empty".to_string()));
                }
                if self.port == 0 {
                    return Err(ConfigError::Invalid("relational.port must be non-zero".to_string()));
                }
                if self.database.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "relational.database must be non-empty".to_string(),
                    ));
                }
            }
            RelationalBackend::Sqlite => {
                let path = self.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite relational backend requires path".to_string())
                })?;
                validate_path_string("relational.path", path)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Wiki Backend
// ============================================================================

/// Wiki backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WikiConfig {
    /// Publish wiki tools.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// `BookStack` base URL (the `/api` suffix is appended).
    #[serde(default = "default_bookstack_url")]
    pub url: String,
    /// API token identifier.
    #[serde(default)]
    pub token_id: String,
    /// API token secret.
    #[serde(default)]
    pub token_secret: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_wiki_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: default_bookstack_url(),
            token_id: String::new(),
            token_secret: String::new(),
            timeout_ms: default_wiki_timeout_ms(),
        }
    }
}

impl WikiConfig {
    /// Validates the base URL, token pair, and timeout.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_url("wiki.url", &self.url, &["http", "https"])?;
        if self.token_id.is_empty() != self.token_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "wiki.token_id and wiki.token_secret must be set together".to_string(),
            ));
        }
        if !(MIN_WIKI_TIMEOUT_MS ..= MAX_WIKI_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "wiki.timeout_ms must be between {MIN_WIKI_TIMEOUT_MS} and {MAX_WIKI_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default bind address.
fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// Default request body limit (4 MiB).
const fn default_max_body_bytes() -> usize {
    4 * 1024 * 1024
}

/// Default per-call deadline.
const fn default_call_timeout_ms() -> u64 {
    30_000
}

/// Default per-session outbound buffer.
const fn default_session_channel_capacity() -> usize {
    64
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Backends are published unless disabled.
const fn default_enabled() -> bool {
    true
}

/// Default Redis URL.
fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

/// Default `MongoDB` URL.
fn default_mongodb_url() -> String {
    "mongodb://localhost:27017".to_string()
}

/// Default database name for document and relational backends.
fn default_database() -> String {
    "mcp_test".to_string()
}

/// Default `document_find` limit.
const fn default_find_limit() -> u32 {
    10
}

/// Default MySQL host.
fn default_mysql_host() -> String {
    "localhost".to_string()
}

/// Default MySQL port.
const fn default_mysql_port() -> u16 {
    3306
}

/// Default MySQL user.
fn default_mysql_user() -> String {
    "root".to_string()
}

/// Default MySQL password.
fn default_mysql_password() -> String {
    "password".to_string()
}

/// Default relational pool size.
const fn default_max_connections() -> u32 {
    10
}

/// Default `BookStack` URL.
fn default_bookstack_url() -> String {
    "https://demo.bookstackapp.com".to_string()
}

/// Default wiki request timeout.
const fn default_wiki_timeout_ms() -> u64 {
    10_000
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI, environment, or the default file.
///
/// Returns `None` when no path was requested and the default file is absent.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a URL and its scheme without echoing the URL (it may hold secrets).
fn validate_url(field: &str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let parsed =
        Url::parse(value.trim()).map_err(|_| ConfigError::Invalid(format!("{field} is not a valid url")))?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(ConfigError::Invalid(format!(
            "{field} scheme must be one of: {}",
            schemes.join(", ")
        )));
    }
    Ok(())
}

/// Parses a TCP port from an environment override.
fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::Invalid(format!("{key} must be a port between 1 and 65535"))),
    }
}
