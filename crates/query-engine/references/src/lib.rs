//! Resolution of dynamic references (`{{resolve:...}}` placeholders) embedded in
//! connection credentials, SQL text, and parameter values.
//!
//! Resolution is lazy: a value is resolved right before it is bound or embedded.

pub mod aws;
pub mod cache;
pub mod error;
pub mod parameter_store;
pub mod resolver;
pub mod secrets_manager;
pub mod stores;

use std::sync::Arc;

pub use aws::{AwsParameterStore, AwsSecretStore};
pub use cache::ReferenceCache;
pub use error::Error;
pub use parameter_store::ParameterStoreResolver;
pub use resolver::{CompositeResolver, ReferenceResolver};
pub use secrets_manager::SecretsManagerResolver;
pub use stores::{ParameterStore, SecretStore, StoreError};

/// The resolver chain for the dynamic reference grammars we support: secrets manager
/// secrets first, then parameter store parameters.
///
/// Pass a fresh cache per invocation, or `None` to fetch every occurrence.
pub fn dynamic_references(
    secrets: Arc<dyn SecretStore>,
    parameters: Arc<dyn ParameterStore>,
    cache: Option<ReferenceCache>,
) -> CompositeResolver {
    CompositeResolver::new(vec![
        Box::new(SecretsManagerResolver::new(secrets, cache.clone())),
        Box::new(ParameterStoreResolver::new(parameters, cache)),
    ])
}
