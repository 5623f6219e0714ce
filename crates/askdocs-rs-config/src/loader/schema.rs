//! Schema validation helpers for askdocs JSON5 configuration.
//!
//! Layers are checked before merging so that an error names the file that
//! introduced it.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer (or the merged result) against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "ui", "secrets", "knowledge_base", "retry"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("ui") {
        validate_ui(value, layer, "ui")?;
    }
    if let Some(value) = map.get("secrets") {
        validate_secrets(value, layer, "secrets")?;
    }
    if let Some(value) = map.get("knowledge_base") {
        validate_knowledge_base(value, layer, "knowledge_base")?;
    }
    if let Some(value) = map.get("retry") {
        validate_retry(value, layer, "retry")?;
    }
    Ok(())
}

fn validate_ui(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["title", "input_placeholder"], layer, path)?;
    for key in ["title", "input_placeholder"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn validate_secrets(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["provider", "secret_id", "region", "env_var", "path"],
        layer,
        path,
    )?;
    if let Some(value) = map.get("provider") {
        expect_one_of(value, &["env", "file"], layer, &join_path(path, "provider"))?;
    }
    for key in ["secret_id", "region", "env_var", "path"] {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn validate_knowledge_base(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["endpoint", "model_arn", "timeout_secs", "auth_token_env"],
        layer,
        path,
    )?;
    if let Some(value) = map.get("endpoint") {
        let endpoint_path = join_path(path, "endpoint");
        expect_string(value, layer, &endpoint_path)?;
        let endpoint = value.as_str().unwrap_or_default();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(invalid_field(layer, &endpoint_path, "expected http(s) URL"));
        }
    }
    if let Some(value) = map.get("model_arn") {
        expect_string(value, layer, &join_path(path, "model_arn"))?;
    }
    if let Some(value) = map.get("timeout_secs") {
        expect_u64(value, layer, &join_path(path, "timeout_secs"))?;
    }
    if let Some(value) = map.get("auth_token_env") {
        // null disables bearer auth.
        if !value.is_null() {
            expect_string(value, layer, &join_path(path, "auth_token_env"))?;
        }
    }
    Ok(())
}

fn validate_retry(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["max_attempts", "delay_ms"], layer, path)?;
    if let Some(value) = map.get("max_attempts") {
        expect_u64(value, layer, &join_path(path, "max_attempts"))?;
    }
    if let Some(value) = map.get("delay_ms") {
        expect_u64(value, layer, &join_path(path, "delay_ms"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| invalid_field(layer, path, "expected object"))
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value {
        Value::String(_) => Ok(()),
        _ => Err(invalid_field(layer, path, "expected string")),
    }
}

/// Expect a non-negative integer.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Expect a string drawn from a fixed set.
fn expect_one_of(
    value: &Value,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match value.as_str() {
        Some(found) if allowed.contains(&found) => Ok(()),
        _ => Err(invalid_field(
            layer,
            path,
            &format!("expected one of {}", allowed.join(", ")),
        )),
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
