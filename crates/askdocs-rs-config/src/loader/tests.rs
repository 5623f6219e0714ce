//! Tests for layered configuration loading.

use super::*;
use crate::RetryConfig;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Project layout with a `.git` marker and a nested working directory.
fn project_tree(root: &Path) -> (PathBuf, PathBuf) {
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    (project_root, cwd)
}

fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = None;
    options.user_config_path = None;
    options.requirements_path = None;
    options
}

#[test]
fn empty_config_uses_defaults() {
    let config = AskdocsConfig::load_from_str("{}").expect("config");
    assert_eq!(config.retry, RetryConfig {
        max_attempts: 3,
        delay_ms: 2_000,
    });
    assert_eq!(config.secrets.secret_id, "bedrock_api");
    assert_eq!(config.secrets.region, "us-east-1");
    assert_eq!(config.secrets.provider, SecretsProviderKind::Env);
    assert_eq!(
        config.knowledge_base.resolved_endpoint(&config.secrets.region),
        "https://bedrock-agent-runtime.us-east-1.amazonaws.com"
    );
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = AskdocsConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_unknown_secrets_provider() {
    let err = AskdocsConfig::load_from_str(r#"{ secrets: { provider: "vault" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("secrets.provider"), "{msg}");
}

#[test]
fn rejects_zero_attempts() {
    let err = AskdocsConfig::load_from_str("{ retry: { max_attempts: 0 } }").unwrap_err();
    assert!(format!("{err}").contains("retry.max_attempts"));
}

#[test]
fn file_provider_requires_path() {
    let err = AskdocsConfig::load_from_str(r#"{ secrets: { provider: "file" } }"#).unwrap_err();
    assert!(format!("{err}").contains("secrets.path"));
}

#[test]
fn rejects_non_http_endpoint() {
    let err = AskdocsConfig::load_from_str(r#"{ knowledge_base: { endpoint: "ftp://kb" } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("knowledge_base.endpoint"));
}

#[test]
fn null_auth_token_env_disables_bearer_auth() {
    let config =
        AskdocsConfig::load_from_str("{ knowledge_base: { auth_token_env: null } }").expect("config");
    assert_eq!(config.knowledge_base.auth_token_env, None);
}

#[test]
fn repo_layer_wins_over_cwd_and_user() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (project_root, cwd) = project_tree(root);

    let user_config = root.join("user.json5");
    write_json5(&user_config, "{ ui: { title: \"user\" }, retry: { delay_ms: 5 } }");
    write_json5(&project_root.join(DEFAULT_CONFIG_FILE), "{ ui: { title: \"project\" } }");
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ ui: { title: \"cwd\" } }");
    write_json5(
        &project_root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        "{ ui: { title: \"repo\" } }",
    );

    let mut options = isolated_options(&cwd);
    options.user_config_path = Some(user_config);

    let layered = AskdocsConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.ui.title, "repo");
    assert_eq!(layered.config.retry.delay_ms, 5);
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Repo,
        ]
    );
}

#[test]
fn project_and_cwd_layer_are_loaded_once_when_they_coincide() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, _) = project_tree(temp.path());
    write_json5(&project_root.join(DEFAULT_CONFIG_FILE), "{ ui: { title: \"root\" } }");

    let layered = AskdocsConfig::load_layered_with_options(isolated_options(&project_root))
        .expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::Project);
}

#[test]
fn runtime_override_wins_without_constraints() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (_, cwd) = project_tree(root);

    let system_config = root.join("system.json5");
    write_json5(&system_config, "{ retry: { max_attempts: 5 } }");
    let runtime_config = root.join("runtime.json5");
    write_json5(&runtime_config, "{ retry: { max_attempts: 7 } }");

    let mut options = isolated_options(&cwd).with_runtime_path(&runtime_config);
    options.system_config_path = Some(system_config);

    let layered = AskdocsConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.retry.max_attempts, 7);
}

#[test]
fn requirements_lock_region_but_not_siblings() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (_, cwd) = project_tree(root);

    let requirements = root.join("requirements.json5");
    write_json5(&requirements, "{ secrets: { region: \"eu-central-1\" } }");
    let runtime_config = root.join("runtime.json5");
    write_json5(
        &runtime_config,
        "{ secrets: { region: \"us-west-2\", secret_id: \"team_kb\" } }",
    );

    let mut options = isolated_options(&cwd).with_runtime_path(&runtime_config);
    options.requirements_path = Some(requirements);

    let layered = AskdocsConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.secrets.region, "eu-central-1");
    assert_eq!(layered.config.secrets.secret_id, "team_kb");
}

#[test]
fn schema_errors_name_the_offending_layer() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (_, cwd) = project_tree(root);
    let runtime_config = root.join("broken.json5");
    write_json5(&runtime_config, "{ retry: { delay_ms: \"soon\" } }");

    let options = isolated_options(&cwd).with_runtime_path(&runtime_config);
    let err = AskdocsConfig::load_layered_with_options(options).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("runtime("), "{msg}");
    assert!(msg.contains("retry.delay_ms"), "{msg}");
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options = isolated_options(temp.path()).with_runtime_path(temp.path().join("absent.json5"));
    let err = AskdocsConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed { .. }));
}
