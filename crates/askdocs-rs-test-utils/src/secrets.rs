use askdocs_rs_core::{AppSecrets, SecretsError, SecretsProvider};
use parking_lot::Mutex;

/// Secrets provider returning preset values and remembering lookups.
pub struct StaticSecretsProvider {
    secrets: Mutex<AppSecrets>,
    lookups: Mutex<Vec<(String, String)>>,
}

impl StaticSecretsProvider {
    pub fn new(password: &str, knowledge_base_id: &str) -> Self {
        Self {
            secrets: Mutex::new(app_secrets(password, knowledge_base_id)),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Replace the values returned by later fetches.
    pub fn rotate(&self, password: &str, knowledge_base_id: &str) {
        *self.secrets.lock() = app_secrets(password, knowledge_base_id);
    }

    /// `(secret_id, region)` pairs requested so far.
    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().clone()
    }
}

impl SecretsProvider for StaticSecretsProvider {
    fn fetch(&self, secret_id: &str, region: &str) -> Result<AppSecrets, SecretsError> {
        self.lookups
            .lock()
            .push((secret_id.to_string(), region.to_string()));
        Ok(self.secrets.lock().clone())
    }
}

fn app_secrets(password: &str, knowledge_base_id: &str) -> AppSecrets {
    AppSecrets {
        access_password: password.to_string(),
        knowledge_base_id: knowledge_base_id.to_string(),
    }
}
