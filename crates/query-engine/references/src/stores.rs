//! The external stores dynamic references are fetched from.

use async_trait::async_trait;

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Fetches secret strings.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// The secret string of `secret_id`, qualified by version id and/or version stage.
    /// `Ok(None)` means the secret exists but holds binary data.
    async fn secret_string(
        &self,
        secret_id: &str,
        version_id: Option<&str>,
        version_stage: Option<&str>,
    ) -> Result<Option<String>, StoreError>;
}

/// Fetches parameters, decrypting secure strings.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// The value of `selector`, a parameter name optionally suffixed with `:version`.
    async fn parameter(&self, selector: &str) -> Result<Option<String>, StoreError>;
}
