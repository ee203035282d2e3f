//! `{{resolve:ssm:...}}` and `{{resolve:ssm-secure:...}}` references.

use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::cache::ReferenceCache;
use crate::error::Error;
use crate::resolver::{occurrences, reject_leftovers, splice, ReferenceResolver};
use crate::stores::ParameterStore;

lazy_static! {
    static ref PARAMETER_REFERENCE: Regex = Regex::new(
        r"\{\{resolve:ssm(?:-secure)?:(?P<name>[a-zA-Z0-9_.\-/]+)(?::(?P<version>\d+))?\}\}"
    )
    .unwrap();
    static ref PARAMETER_REFERENCE_OPENING: Regex =
        Regex::new(r"\{\{resolve:ssm(?:-secure)?:").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterReference {
    pub name: String,
    pub version: Option<String>,
}

impl ParameterReference {
    fn from_captures(captures: &Captures) -> Self {
        ParameterReference {
            name: captures
                .name("name")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            version: captures.name("version").map(|m| m.as_str().to_string()),
        }
    }

    /// `name` or `name:version`, as understood by the parameter store.
    pub fn selector(&self) -> String {
        match &self.version {
            None => self.name.clone(),
            Some(version) => format!("{}:{version}", self.name),
        }
    }
}

/// Replaces parameter references with the (decrypted) parameter value.
pub struct ParameterStoreResolver {
    store: Arc<dyn ParameterStore>,
    cache: Option<ReferenceCache>,
}

impl ParameterStoreResolver {
    pub fn new(store: Arc<dyn ParameterStore>, cache: Option<ReferenceCache>) -> Self {
        ParameterStoreResolver { store, cache }
    }

    async fn fetch(&self, raw: &str, reference: &ParameterReference) -> Result<String, Error> {
        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(raw)) {
            return Ok(cached);
        }

        let selector = reference.selector();
        tracing::info!(parameter = %selector, "Fetching parameter");
        let value = self
            .store
            .parameter(&selector)
            .await
            .map_err(|source| Error::ParameterUnavailable {
                name: selector.clone(),
                source,
            })?
            .ok_or_else(|| Error::ParameterHasNoValue {
                name: selector.clone(),
            })?;

        if let Some(cache) = &self.cache {
            cache.insert(raw.to_string(), value.clone());
        }
        Ok(value)
    }
}

#[async_trait]
impl ReferenceResolver for ParameterStoreResolver {
    async fn resolve(&self, value: &str) -> Result<String, Error> {
        let found = occurrences(
            &PARAMETER_REFERENCE,
            value,
            ParameterReference::from_captures,
        );
        reject_leftovers(&PARAMETER_REFERENCE_OPENING, value, &found)?;
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
