//! `{{resolve:secretsmanager:...}}` references.

use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::cache::ReferenceCache;
use crate::error::Error;
use crate::resolver::{occurrences, reject_leftovers, splice, ReferenceResolver};
use crate::stores::SecretStore;

lazy_static! {
    // The secret id may be a full ARN, which contains colons of its own; it ends at
    // the `secret:<name>` segment.
    static ref SECRET_REFERENCE: Regex = Regex::new(
        r"(?i)\{\{resolve:secretsmanager:(?P<secret_id>[^}]+secret:[^:]+):SecretString:(?P<json_key>[^:]*):(?P<version_stage>[^:]*):(?P<version_id>[^:}]*)\}\}"
    )
    .unwrap();
    static ref SECRET_REFERENCE_OPENING: Regex =
        Regex::new(r"(?i)\{\{resolve:secretsmanager:").unwrap();
}

/// The parts of a secret reference. Empty segments are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    pub secret_id: String,
    pub json_key: Option<String>,
    pub version_stage: Option<String>,
    pub version_id: Option<String>,
}

impl SecretReference {
    fn from_captures(captures: &Captures) -> Self {
        let segment = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        SecretReference {
            secret_id: segment("secret_id").unwrap_or_default(),
            json_key: segment("json_key"),
            version_stage: segment("version_stage"),
            version_id: segment("version_id"),
        }
    }
}

/// Replaces secret references with the secret string, or with one key of a JSON
/// secret.
pub struct SecretsManagerResolver {
    store: Arc<dyn SecretStore>,
    cache: Option<ReferenceCache>,
}

impl SecretsManagerResolver {
    pub fn new(store: Arc<dyn SecretStore>, cache: Option<ReferenceCache>) -> Self {
        SecretsManagerResolver { store, cache }
    }

    async fn fetch(&self, raw: &str, reference: &SecretReference) -> Result<String, Error> {
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(raw)) {
            tracing::debug!(secret_id = %reference.secret_id, "Using cached secret");
            return Ok(cached);
        }

        tracing::info!(
            secret_id = %reference.secret_id,
            version_stage = ?reference.version_stage,
            version_id = ?reference.version_id,
            "Fetching secret"
        );
        let secret_string = self
            .store
            .secret_string(
                &reference.secret_id,
                reference.version_id.as_deref(),
                reference.version_stage.as_deref(),
            )
            .await
            .map_err(|source| Error::SecretUnavailable {
                secret_id: reference.secret_id.clone(),
                source,
            })?
            .ok_or_else(|| Error::SecretNotString {
                secret_id: reference.secret_id.clone(),
            })?;

        let value = match &reference.json_key {
            None => secret_string,
            Some(key) => select_key(&reference.secret_id, &secret_string, key)?,
        };

        if let Some(cache) = &self.cache {
            cache.insert(raw.to_string(), value.clone());
        }
        Ok(value)
    }
}

/// Read `key` from a flat JSON object. Strings are returned as is, other values in
/// their JSON form.
fn select_key(secret_id: &str, secret_string: &str, key: &str) -> Result<String, Error> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(secret_string)
        .map_err(|source| Error::SecretNotJsonObject {
            secret_id: secret_id.to_string(),
            source,
        })?;
    match object.get(key) {
        Some(serde_json::Value::String(value)) => Ok(value.clone()),
        Some(value) => Ok(value.to_string()),
        None => Err(Error::SecretKeyNotFound {
            secret_id: secret_id.to_string(),
            key: key.to_string(),
        }),
    }
}

#[async_trait]
impl ReferenceResolver for SecretsManagerResolver {
    async fn resolve(&self, value: &str) -> Result<String, Error> {
        let found = occurrences(&SECRET_REFERENCE, value, SecretReference::from_captures);
        reject_leftovers(&SECRET_REFERENCE_OPENING, value, &found)?;
        if found.is_empty() {
            return Ok(value.to_string());
        }

        let mut replacements = Vec::with_capacity(found.len());
        for occurrence in &found {
            let resolved = self.fetch(&occurrence.raw, &occurrence.reference).await?;
            replacements.push((occurrence.range.clone(), resolved));
        }
        Ok(splice(value, replacements))
    }
}
