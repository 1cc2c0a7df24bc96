// crates/multidb-config/tests/env_overrides.rs
// =============================================================================
// Module: Environment Override Tests
// Description: Deployment variables layered over file configuration.
// Purpose: Ensure each documented variable lands in the right field.
// =============================================================================

//! Environment override tests for multidb-config.

use std::collections::HashMap;
use std::fs;

use multidb_config::CONFIG_ENV_VAR;
use multidb_config::GatewayConfig;

type TestResult = Result<(), String>;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn backend_variables_override_defaults() -> TestResult {
    let lookup = lookup_from(&[
        ("PORT", "8088"),
        ("REDIS_URL", "redis://cache:6380"),
        ("MONGODB_URL", "mongodb://docs:27018"),
        ("MONGODB_DB_NAME", "catalog"),
        ("MYSQL_HOST", "sql"),
        ("MYSQL_PORT", "3307"),
        ("MYSQL_USER", "gateway"),
        ("MYSQL_PASSWORD", "s3cret"),
        ("MYSQL_DATABASE", "inventory"),
        ("BOOKSTACK_URL", "https://wiki.internal"),
        ("BOOKSTACK_TOKEN_ID", "id"),
        ("BOOKSTACK_TOKEN_SECRET", "secret"),
    ]);
    let config = GatewayConfig::load_with_env(None, lookup).map_err(|err| err.to_string())?;
    let checks = [
        (config.server.bind.as_str(), "127.0.0.1:8088"),
        (config.kv.url.as_str(), "redis://cache:6380"),
        (config.document.url.as_str(), "mongodb://docs:27018"),
        (config.document.database.as_str(), "catalog"),
        (config.relational.host.as_str(), "sql"),
        (config.relational.user.as_str(), "gateway"),
        (config.relational.password.as_str(), "s3cret"),
        (config.relational.database.as_str(), "inventory"),
        (config.wiki.url.as_str(), "https://wiki.internal"),
        (config.wiki.token_id.as_str(), "id"),
        (config.wiki.token_secret.as_str(), "secret"),
    ];
    for (actual, expected) in checks {
        if actual != expected {
            return Err(format!("expected {expected}, got {actual}"));
        }
    }
    if config.relational.port != 3307 {
        return Err(format!("unexpected mysql port {}", config.relational.port));
    }
    Ok(())
}

#[test]
fn environment_wins_over_file_values() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("gateway.toml");
    fs::write(&path, "[server]\nbind = \"0.0.0.0:3000\"\n[kv]\nurl = \"redis://file:6379\"\n")
        .map_err(|err| err.to_string())?;
    let lookup = lookup_from(&[("PORT", "9000"), ("REDIS_URL", "redis://env:6379")]);
    let config = GatewayConfig::load_with_env(Some(&path), lookup).map_err(|err| err.to_string())?;
    if config.server.bind != "0.0.0.0:9000" {
        return Err(format!("unexpected bind {}", config.server.bind));
    }
    if config.kv.url != "redis://env:6379" {
        return Err(format!("unexpected redis url {}", config.kv.url));
    }
    Ok(())
}

#[test]
fn config_path_variable_is_honored() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("from-env.toml");
    fs::write(&path, "[document]\ndatabase = \"from_env\"\n").map_err(|err| err.to_string())?;
    let path_text = path.to_string_lossy().to_string();
    let lookup = lookup_from(&[(CONFIG_ENV_VAR, path_text.as_str())]);
    let config = GatewayConfig::load_with_env(None, lookup).map_err(|err| err.to_string())?;
    if config.document.database != "from_env" {
        return Err(format!("unexpected database {}", config.document.database));
    }
    Ok(())
}

#[test]
fn invalid_port_override_is_rejected() -> TestResult {
    for value in ["0", "seventy", "70000"] {
        let lookup = lookup_from(&[("PORT", value)]);
        match GatewayConfig::load_with_env(None, lookup) {
            Err(err) if err.to_string().contains("PORT") => {}
            other => return Err(format!("PORT={value} should fail, got {other:?}")),
        }
    }
    Ok(())
}

#[test]
fn overridden_values_are_still_validated() -> TestResult {
    let lookup = lookup_from(&[("MONGODB_URL", "postgres://nope")]);
    match GatewayConfig::load_with_env(None, lookup) {
        Err(err) if err.to_string().contains("document.url") => Ok(()),
        other => Err(format!("expected document.url failure, got {other:?}")),
    }
}
