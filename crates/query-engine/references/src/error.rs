//! Errors raised while resolving dynamic references.

use thiserror::Error;

use crate::stores::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to fetch secret '{secret_id}': {source}")]
    SecretUnavailable {
        secret_id: String,
        #[source]
        source: StoreError,
    },
    #[error("secret '{secret_id}' has no string value")]
    SecretNotString { secret_id: String },
    #[error("secret '{secret_id}' is not a JSON object: {source}")]
    SecretNotJsonObject {
        secret_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("secret '{secret_id}' has no key '{key}'")]
    SecretKeyNotFound { secret_id: String, key: String },
    #[error("unable to fetch parameter '{name}': {source}")]
    ParameterUnavailable {
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("parameter '{name}' has no value")]
    ParameterHasNoValue { name: String },
    #[error("malformed dynamic reference near '{0}'")]
    Malformed(String),
}
