//! Startup wiring from config to a ready retrieval client.

use anyhow::Context;
use askdocs_rs_config::{AskdocsConfig, LayeredConfigOptions};
use askdocs_rs_core::{AppSecrets, HttpKnowledgeBase, RetrievalClient, RetryPolicy, SecretsSource};
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// Load the layered config from the current directory, with an optional
/// runtime override file applied last.
pub fn load_config(runtime_path: Option<&Path>) -> anyhow::Result<AskdocsConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    load_config_in(&cwd, runtime_path)
}

pub(crate) fn load_config_in(
    cwd: &Path,
    runtime_path: Option<&Path>,
) -> anyhow::Result<AskdocsConfig> {
    info!(
        "loading layered config (cwd={}, runtime_set={})",
        cwd.display(),
        runtime_path.is_some()
    );
    let mut options = LayeredConfigOptions::new(cwd);
    if let Some(path) = runtime_path {
        options = options.with_runtime_path(path);
    }
    let layered = AskdocsConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

/// Fetch the access password and knowledge-base id.
pub fn fetch_secrets(source: &SecretsSource) -> anyhow::Result<AppSecrets> {
    source
        .fetch()
        .with_context(|| format!("failed to fetch secret {}", source.secret_id()))
}

/// Build the retrieval client over the HTTP knowledge-base backend.
pub fn build_retrieval_client(config: &AskdocsConfig) -> anyhow::Result<RetrievalClient> {
    let backend = HttpKnowledgeBase::from_config(&config.knowledge_base, &config.secrets.region)
        .context("failed to build knowledge base client")?;
    info!(
        "knowledge base client ready (endpoint={}, max_attempts={}, delay_ms={})",
        backend.endpoint(),
        config.retry.max_attempts,
        config.retry.delay_ms
    );
    Ok(RetrievalClient::new(
        Arc::new(backend),
        RetryPolicy::from(config.retry),
    ))
}
