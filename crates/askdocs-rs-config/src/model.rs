//! Configuration schema for askdocs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root config for askdocs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AskdocsConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Presentation settings for the chat UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_input_placeholder")]
    pub input_placeholder: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            input_placeholder: default_input_placeholder(),
        }
    }
}

fn default_title() -> String {
    "Knowledge Base Chat".to_string()
}

fn default_input_placeholder() -> String {
    "What can I try to answer?".to_string()
}

/// Where the access password and knowledge-base id come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub provider: SecretsProviderKind,
    #[serde(default = "default_secret_id")]
    pub secret_id: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Environment variable holding the secret JSON for the `env` provider.
    #[serde(default = "default_secret_env_var")]
    pub env_var: String,
    /// Secret file for the `file` provider.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            provider: SecretsProviderKind::default(),
            secret_id: default_secret_id(),
            region: default_region(),
            env_var: default_secret_env_var(),
            path: None,
        }
    }
}

/// Default secret identifier.
fn default_secret_id() -> String {
    "bedrock_api".to_string()
}

/// Default service region.
fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_secret_env_var() -> String {
    "ASKDOCS_SECRET_STRING".to_string()
}

/// Secrets provider selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretsProviderKind {
    #[default]
    Env,
    File,
}

/// Remote knowledge-base service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Service base URL; derived from the secrets region when unset.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_model_arn")]
    pub model_arn: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable holding a bearer token for the service, if any.
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: Option<String>,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model_arn: default_model_arn(),
            timeout_secs: default_timeout_secs(),
            auth_token_env: default_auth_token_env(),
        }
    }
}

impl KnowledgeBaseConfig {
    /// Resolve the service base URL for a region.
    pub fn resolved_endpoint(&self, region: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-agent-runtime.{region}.amazonaws.com"),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default foundation model used for answer generation.
fn default_model_arn() -> String {
    "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-3-5-sonnet-20240620-v1:0"
        .to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_auth_token_env() -> Option<String> {
    Some("AWS_BEARER_TOKEN_BEDROCK".to_string())
}

/// Bounded retry policy for throttled retrievals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Fixed wait between attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Default attempt bound, including the first call.
fn default_max_attempts() -> u32 {
    3
}

/// Default inter-attempt delay in milliseconds.
fn default_delay_ms() -> u64 {
    2_000
}
