// crates/multidb-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests for catalog and config commands.
// Purpose: Ensure offline commands succeed on valid input and fail closed.
// Dependencies: multidb-gateway binary
// ============================================================================

//! ## Overview
//! Runs the CLI binary with isolated environments so host variables such as
//! `REDIS_URL` cannot leak into the loaded configuration.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const OVERRIDE_VARS: [&str; 13] = [
    "MULTIDB_GATEWAY_CONFIG",
    "PORT",
    "REDIS_URL",
    "MONGODB_URL",
    "MONGODB_DB_NAME",
    "MYSQL_HOST",
    "MYSQL_PORT",
    "MYSQL_USER",
    "MYSQL_PASSWORD",
    "MYSQL_DATABASE",
    "BOOKSTACK_URL",
    "BOOKSTACK_TOKEN_ID",
    "BOOKSTACK_TOKEN_SECRET",
];

fn gateway_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_multidb-gateway"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(gateway_bin());
    command.current_dir(dir).args(args);
    for var in OVERRIDE_VARS {
        command.env_remove(var);
    }
    command.output().expect("run multidb-gateway")
}

fn write_config(dir: &Path, contents: &str) -> String {
    let path = dir.join("gateway.toml");
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn config_example_validates() {
    let dir = tempfile::tempdir().unwrap();
    let example = run(dir.path(), &["config", "example"]);
    assert!(example.status.success());
    let path = write_config(dir.path(), &String::from_utf8(example.stdout).unwrap());

    let validate = run(dir.path(), &["config", "validate", "--config", &path]);
    assert!(validate.status.success(), "stderr: {}", String::from_utf8_lossy(&validate.stderr));
    assert_eq!(String::from_utf8(validate.stdout).unwrap().trim(), "config valid");
}

#[test]
fn config_validate_without_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let validate = run(dir.path(), &["config", "validate"]);
    assert!(validate.status.success());
}

#[test]
fn config_validate_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[server]\nmax_body_bytes = 0\n");
    let validate = run(dir.path(), &["config", "validate", "--config", &path]);
    assert!(!validate.status.success());
    let stderr = String::from_utf8(validate.stderr).unwrap();
    assert!(stderr.contains("server.max_body_bytes"), "stderr: {stderr}");
}

#[test]
fn config_validate_rejects_malformed_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[server\n");
    let validate = run(dir.path(), &["config", "validate", "--config", &path]);
    assert!(!validate.status.success());
    assert!(String::from_utf8(validate.stderr).unwrap().starts_with("failed to load config"));
}

#[test]
fn tools_prints_catalog_for_enabled_domains() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[kv]
backend = "memory"

[document]
enabled = false

[relational]
backend = "sqlite"
path = ":memory:"

[wiki]
enabled = false
"#,
    );
    let tools = run(dir.path(), &["tools", "--config", &path]);
    assert!(tools.status.success(), "stderr: {}", String::from_utf8_lossy(&tools.stderr));
    let catalog: Value = serde_json::from_slice(&tools.stdout).unwrap();
    let names: Vec<&str> =
        catalog.as_array().unwrap().iter().map(|tool| tool["name"].as_str().unwrap()).collect();
    assert_eq!(names.len(), 11);
    assert!(names.contains(&"kv_hgetall"));
    assert!(names.contains(&"relational_list_tables"));
    assert!(!names.iter().any(|name| name.starts_with("wiki_")));
}

#[test]
fn tools_with_defaults_publishes_every_domain_without_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let tools = run(dir.path(), &["tools"]);
    assert!(tools.status.success(), "stderr: {}", String::from_utf8_lossy(&tools.stderr));
    let catalog: Value = serde_json::from_slice(&tools.stdout).unwrap();
    assert_eq!(catalog.as_array().unwrap().len(), 18);
}
