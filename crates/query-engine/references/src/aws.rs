//! Stores backed by AWS Secrets Manager and Systems Manager Parameter Store.

use async_trait::async_trait;

use crate::stores::{ParameterStore, SecretStore, StoreError};

#[derive(Debug, Clone)]
pub struct AwsSecretStore {
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        AwsSecretStore {
            client: aws_sdk_secretsmanager::Client::new(config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn secret_string(
        &self,
        secret_id: &str,
        version_id: Option<&str>,
        version_stage: Option<&str>,
    ) -> Result<Option<String>, StoreError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .set_version_id(version_id.map(str::to_string))
            .set_version_stage(version_stage.map(str::to_string))
            .send()
            .await
            .map_err(|err| Box::new(err.into_service_error()) as StoreError)?;
        Ok(output.secret_string().map(str::to_string))
    }
}

#[derive(Debug, Clone)]
pub struct AwsParameterStore {
    client: aws_sdk_ssm::Client,
}

impl AwsParameterStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        AwsParameterStore {
            client: aws_sdk_ssm::Client::new(config),
        }
    }
}

#[async_trait]
impl ParameterStore for AwsParameterStore {
    async fn parameter(&self, selector: &str) -> Result<Option<String>, StoreError> {
        let output = self
            .client
            .get_parameter()
            .name(selector)
            .with_decryption(true)
            .send()
            .await
            .map_err(|err| Box::new(err.into_service_error()) as StoreError)?;
        Ok(output
            .parameter()
            .and_then(|parameter| parameter.value())
            .map(str::to_string))
    }
}
