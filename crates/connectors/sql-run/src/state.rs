//! Long-lived state of the handler process.
//!
//! This is initialized once on startup and shared by every invocation.

use std::sync::Arc;

use query_engine_execution::DatabaseConnector;
use query_engine_references::{AwsParameterStore, AwsSecretStore};
use sql_run_configuration::RuntimeSettings;
use tracing::{info_span, Instrument};

use crate::connector::Handler;

/// Build a handler talking to real databases and the AWS secret and parameter stores.
///
/// Region and credentials come from the standard AWS environment.
pub async fn create_handler(settings: RuntimeSettings) -> Handler {
    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest())
        .instrument(info_span!("Load AWS configuration"))
        .await;
    tracing::info!(
        region = ?sdk_config.region().map(ToString::to_string),
        cache_references = settings.cache_references,
        "Handler initialized"
    );

    Handler::new(
        Arc::new(DatabaseConnector),
        Arc::new(AwsSecretStore::new(&sdk_config)),
        Arc::new(AwsParameterStore::new(&sdk_config)),
        settings,
    )
}
