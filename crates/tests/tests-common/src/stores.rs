//! In-memory secret and parameter stores that remember what was asked of them.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use query_engine_references::{ParameterStore, SecretStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secret(mut self, secret_id: &str, secret_string: &str) -> Self {
        self.secrets
            .insert(secret_id.to_string(), secret_string.to_string());
        self
    }

    /// Ids of every secret fetched so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn secret_string(
        &self,
        secret_id: &str,
        _version_id: Option<&str>,
        _version_stage: Option<&str>,
    ) -> Result<Option<String>, StoreError> {
        self.requests.lock().unwrap().push(secret_id.to_string());
        match self.secrets.get(secret_id) {
            Some(secret) => Ok(Some(secret.clone())),
            None => Err(format!("ResourceNotFoundException: {secret_id}").into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    parameters: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `selector` is the parameter name, optionally suffixed with `:version`.
    #[must_use]
    pub fn with_parameter(mut self, selector: &str, value: &str) -> Self {
        self.parameters
            .insert(selector.to_string(), value.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn parameter(&self, selector: &str) -> Result<Option<String>, StoreError> {
        self.requests.lock().unwrap().push(selector.to_string());
        match self.parameters.get(selector) {
            Some(value) => Ok(Some(value.clone())),
            None => Err(format!("ParameterNotFound: {selector}").into()),
        }
    }
}
