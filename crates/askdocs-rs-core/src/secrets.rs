//! Secrets providers for the access password and knowledge-base id.
//!
//! Both providers accept the `SecretString` JSON object stored in the
//! secrets service. The file provider also accepts a full
//! `get-secret-value` response with the object nested as a string.

use crate::error::SecretsError;
use askdocs_rs_config::{SecretsConfig, SecretsProviderKind};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Key holding the access password.
pub const PASSWORD_KEY: &str = "BEDROCK_ACCESS_PASSWORD";
/// Key holding the knowledge-base id.
pub const KNOWLEDGE_BASE_ID_KEY: &str = "BEDROCK_KB_ID";

/// Values the app needs from the secrets service.
#[derive(Clone, PartialEq, Eq)]
pub struct AppSecrets {
    pub access_password: String,
    pub knowledge_base_id: String,
}

impl fmt::Debug for AppSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSecrets")
            .field("access_password", &"<redacted>")
            .field("knowledge_base_id", &self.knowledge_base_id)
            .finish()
    }
}

/// Source of `AppSecrets`.
pub trait SecretsProvider: Send + Sync {
    /// Fetch the secret named `secret_id` in `region`.
    fn fetch(&self, secret_id: &str, region: &str) -> Result<AppSecrets, SecretsError>;
}

/// Reads the secret JSON from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvSecretsProvider {
    env_var: String,
}

impl EnvSecretsProvider {
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }
}

impl SecretsProvider for EnvSecretsProvider {
    fn fetch(&self, secret_id: &str, region: &str) -> Result<AppSecrets, SecretsError> {
        debug!(
            "reading secret from env (secret_id={}, region={}, env_var={})",
            secret_id, region, self.env_var
        );
        let raw = std::env::var(&self.env_var)
            .map_err(|_| SecretsError::MissingEnv(self.env_var.clone()))?;
        parse_secret_string(secret_id, &raw)
    }
}

/// Reads the secret JSON from a file.
#[derive(Debug, Clone)]
pub struct FileSecretsProvider {
    path: PathBuf,
}

impl FileSecretsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SecretsProvider for FileSecretsProvider {
    fn fetch(&self, secret_id: &str, region: &str) -> Result<AppSecrets, SecretsError> {
        debug!(
            "reading secret from file (secret_id={}, region={}, path={})",
            secret_id,
            region,
            self.path.display()
        );
        let raw = fs::read_to_string(&self.path).map_err(|source| SecretsError::Read {
            path: self.path.clone(),
            source,
        })?;
        parse_secret_string(secret_id, &raw)
    }
}

/// Build the provider selected in config.
pub fn provider_from_config(
    config: &SecretsConfig,
) -> Result<Arc<dyn SecretsProvider>, SecretsError> {
    match config.provider {
        SecretsProviderKind::Env => Ok(Arc::new(EnvSecretsProvider::new(&config.env_var))),
        SecretsProviderKind::File => {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| SecretsError::Malformed {
                    secret_id: config.secret_id.clone(),
                    message: "file provider configured without secrets.path".to_string(),
                })?;
            Ok(Arc::new(FileSecretsProvider::new(path)))
        }
    }
}

/// Provider bound to the secret id and region it should be asked for.
///
/// Cloneable so the UI can fetch again after logout and pick up a rotated
/// password or knowledge-base id.
#[derive(Clone)]
pub struct SecretsSource {
    provider: Arc<dyn SecretsProvider>,
    secret_id: String,
    region: String,
}

impl SecretsSource {
    pub fn new(
        provider: Arc<dyn SecretsProvider>,
        secret_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            secret_id: secret_id.into(),
            region: region.into(),
        }
    }

    pub fn from_config(config: &SecretsConfig) -> Result<Self, SecretsError> {
        Ok(Self::new(
            provider_from_config(config)?,
            &config.secret_id,
            &config.region,
        ))
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    pub fn fetch(&self) -> Result<AppSecrets, SecretsError> {
        self.provider.fetch(&self.secret_id, &self.region)
    }
}

/// Parse a secret payload into `AppSecrets`.
pub fn parse_secret_string(secret_id: &str, raw: &str) -> Result<AppSecrets, SecretsError> {
    let value: Value = serde_json::from_str(raw).map_err(|err| malformed(secret_id, err))?;
    let object = expect_object(secret_id, &value)?;

    let nested;
    let object = match object.get("SecretString") {
        Some(Value::String(inner)) => {
            if let Some(Value::String(name)) = object.get("Name")
                && name != secret_id
            {
                warn!("secret name mismatch (expected={secret_id}, found={name})");
            }
            nested = serde_json::from_str::<Value>(inner).map_err(|err| malformed(secret_id, err))?;
            expect_object(secret_id, &nested)?
        }
        Some(_) => {
            return Err(SecretsError::Malformed {
                secret_id: secret_id.to_string(),
                message: "SecretString must be a string".to_string(),
            });
        }
        None => object,
    };

    Ok(AppSecrets {
        access_password: required_key(secret_id, object, PASSWORD_KEY)?,
        knowledge_base_id: required_key(secret_id, object, KNOWLEDGE_BASE_ID_KEY)?,
    })
}

fn expect_object<'a>(secret_id: &str, value: &'a Value) -> Result<&'a Map<String, Value>, SecretsError> {
    value.as_object().ok_or_else(|| SecretsError::Malformed {
        secret_id: secret_id.to_string(),
        message: "expected a JSON object".to_string(),
    })
}

fn required_key(
    secret_id: &str,
    object: &Map<String, Value>,
    key: &'static str,
) -> Result<String, SecretsError> {
    match object.get(key).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(SecretsError::MissingKey {
            secret_id: secret_id.to_string(),
            key,
        }),
    }
}

fn malformed(secret_id: &str, err: serde_json::Error) -> SecretsError {
    SecretsError::Malformed {
        secret_id: secret_id.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn parses_plain_secret_string() {
        let secrets = parse_secret_string(
            "bedrock_api",
            r#"{"BEDROCK_ACCESS_PASSWORD":"pw","BEDROCK_KB_ID":"KB12345"}"#,
        )
        .expect("secrets");
        assert_eq!(
            secrets,
            AppSecrets {
                access_password: "pw".to_string(),
                knowledge_base_id: "KB12345".to_string(),
            }
        );
    }

    #[test]
    fn missing_kb_id_is_reported() {
        let err = parse_secret_string("bedrock_api", r#"{"BEDROCK_ACCESS_PASSWORD":"pw"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SecretsError::MissingKey {
                key: KNOWLEDGE_BASE_ID_KEY,
                ..
            }
        ));
    }

    #[test]
    fn file_provider_reads_response_envelope() {
        let dir = tempdir().expect("tmp");
        let path = dir.path().join("secret.json");
        let envelope = serde_json::json!({
            "Name": "bedrock_api",
            "SecretString": r#"{"BEDROCK_ACCESS_PASSWORD":"pw","BEDROCK_KB_ID":"KB9"}"#,
        });
        fs::write(&path, envelope.to_string()).expect("write");

        let secrets = FileSecretsProvider::new(&path)
            .fetch("bedrock_api", "us-east-1")
            .expect("secrets");
        assert_eq!(secrets.knowledge_base_id, "KB9");
    }

    #[test]
    fn file_provider_reports_missing_file() {
        let dir = tempdir().expect("tmp");
        let err = FileSecretsProvider::new(dir.path().join("absent.json"))
            .fetch("bedrock_api", "us-east-1")
            .unwrap_err();
        assert!(matches!(err, SecretsError::Read { .. }));
    }

    #[test]
    fn env_provider_reports_unset_variable() {
        let err = EnvSecretsProvider::new("ASKDOCS_TEST_SECRET_THAT_IS_NEVER_SET")
            .fetch("bedrock_api", "us-east-1")
            .unwrap_err();
        assert!(matches!(err, SecretsError::MissingEnv(_)));
    }

    #[test]
    fn debug_output_hides_password() {
        let secrets = AppSecrets {
            access_password: "hunter2".to_string(),
            knowledge_base_id: "KB1".to_string(),
        };
        assert!(!format!("{secrets:?}").contains("hunter2"));
    }
}
