// crates/multidb-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for gateway configuration. Every value shown equals the
//! built-in default unless commented otherwise.

/// Returns a canonical example `multidb-gateway.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
# Loopback only by default. PORT replaces the port and keeps this host, so
# container deployments reached from outside need the wildcard host:
# bind = "0.0.0.0:3000"
bind = "127.0.0.1:3000"
max_body_bytes = 4194304
call_timeout_ms = 30000
session_channel_capacity = 64

[server.audit]
enabled = true
# path = "multidb-gateway-audit.jsonl"

[kv]
enabled = true
backend = "redis"
url = "redis://localhost:6379"

[document]
enabled = true
url = "mongodb://localhost:27017"
database = "mcp_test"
default_find_limit = 10

[relational]
enabled = true
backend = "mysql"
host = "localhost"
port = 3306
user = "root"
password = "password"
database = "mcp_test"
max_connections = 10
# backend = "sqlite"
# path = "multidb-gateway.db"

[wiki]
enabled = true
url = "https://demo.bookstackapp.com"
token_id = ""
token_secret = ""
timeout_ms = 10000
"#,
    )
}
