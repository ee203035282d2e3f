//! The lifecycle event handler.
//!
//! Routes each event to the statements it must run, runs them on one connection in one
//! transaction, and builds the reply.

use std::sync::Arc;

use query_engine_execution::execution;
use query_engine_execution::{Connector, StatementResult};
use query_engine_references::{dynamic_references, ParameterStore, ReferenceCache, SecretStore};
use sql_run_configuration::{ConnectionDescriptor, RuntimeSettings, SqlStatement};
use tracing::{info_span, Instrument};

use crate::error::{Error, Result};
use crate::event::{CreateEvent, DeleteEvent, LifecycleEvent, UpdateEvent};
use crate::response::ResponseEnvelope;

/// Handles lifecycle events. Holds only collaborators that outlive an invocation.
#[derive(Clone)]
pub struct Handler {
    connector: Arc<dyn Connector>,
    secrets: Arc<dyn SecretStore>,
    parameters: Arc<dyn ParameterStore>,
    settings: RuntimeSettings,
}

impl Handler {
    pub fn new(
        connector: Arc<dyn Connector>,
        secrets: Arc<dyn SecretStore>,
        parameters: Arc<dyn ParameterStore>,
        settings: RuntimeSettings,
    ) -> Self {
        Handler {
            connector,
            secrets,
            parameters,
            settings,
        }
    }

    /// Handle one event and build the reply.
    pub async fn handle(&self, event: &LifecycleEvent) -> Result<ResponseEnvelope> {
        let common = event.common();
        let span = info_span!(
            "Handle event",
            request_id = %common.request_id,
            logical_resource_id = %common.logical_resource_id,
            request_type = %event.request_type(),
        );
        async {
            let result = self.dispatch(event).await;
            if let Err(err) = &result {
                log_error(err);
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Decode a raw event, handle it, and encode the reply.
    pub async fn handle_json(&self, event: serde_json::Value) -> Result<serde_json::Value> {
        let event = serde_json::from_value(event).map_err(|err| {
            let err = Error::Decode(err);
            log_error(&err);
            err
        })?;
        let response = self.handle(&event).await?;
        serde_json::to_value(response).map_err(Error::Serialization)
    }

    pub async fn handle_bytes(&self, event: &[u8]) -> Result<Vec<u8>> {
        let event = serde_json::from_slice(event).map_err(|err| {
            let err = Error::Decode(err);
            log_error(&err);
            err
        })?;
        let response = self.handle(&event).await?;
        serde_json::to_vec(&response).map_err(Error::Serialization)
    }

    async fn dispatch(&self, event: &LifecycleEvent) -> Result<ResponseEnvelope> {
        let statements = statements_for(event);
        tracing::info!(statements = statements.len(), "Dispatching event");
        let results = self
            .run(&event.resource_properties().connection, &statements)
            .await?;
        Ok(ResponseEnvelope::build(event, &results))
    }

    /// Open a connection, run the batch, and close the connection on every path.
    async fn run(
        &self,
        descriptor: &ConnectionDescriptor,
        statements: &[&SqlStatement],
    ) -> Result<Vec<StatementResult>> {
        let cache = self.settings.cache_references.then(ReferenceCache::new);
        let resolver = dynamic_references(self.secrets.clone(), self.parameters.clone(), cache);

        let mut connection = self.connector.open(descriptor, &resolver).await?;
        let outcome = execution::run(connection.as_mut(), statements, &resolver).await;
        let closed = connection
            .close()
            .instrument(info_span!("Close connection"))
            .await;

        let results = outcome?;
        if let Err(err) = closed {
            tracing::warn!(error = %err, "Unable to close the connection cleanly");
        }
        Ok(results)
    }
}

/// The statements an event runs, in execution order.
///
/// Updates revert the old properties before applying the new ones, so results of the
/// old `down` statements come first.
pub fn statements_for(event: &LifecycleEvent) -> Vec<&SqlStatement> {
    match event {
        LifecycleEvent::Create(CreateEvent { common }) => {
            common.resource_properties.up.run.iter().collect()
        }
        LifecycleEvent::Update(UpdateEvent {
            common,
            old_resource_properties,
            ..
        }) => old_resource_properties
            .down
            .iter()
            .flat_map(|down| down.run.iter())
            .chain(common.resource_properties.up.run.iter())
            .collect(),
        LifecycleEvent::Delete(DeleteEvent { common, .. }) => common
            .resource_properties
            .down
            .iter()
            .flat_map(|down| down.run.iter())
            .collect(),
    }
}

fn log_error(err: &Error) {
    tracing::error!(
        meta.signal_type = "log",
        event.domain = "sql-run",
        event.name = %err.kind(),
        name = %err.kind(),
        body = %err,
        error = true,
    );
}

#[cfg(test)]
mod tests {
    use sql_run_configuration::{
        ConnectionDescriptor, DriverType, ResourceProperties, StatementBatch,
    };

    use super::*;
    use crate::event::EventCommon;

    fn properties(up: &[&str], down: Option<&[&str]>) -> ResourceProperties {
        let batch = |sql: &[&str]| -> StatementBatch {
            sql.iter().map(|sql| SqlStatement::new(*sql)).collect::<Vec<_>>().into()
        };
        ResourceProperties {
            service_token: None,
            connection: ConnectionDescriptor::host_port(
                DriverType::Postgresql,
                "localhost",
                "app",
                "admin",
                "secret",
            ),
            up: batch(up),
            down: down.map(batch),
        }
    }

    fn common(resource_properties: ResourceProperties) -> EventCommon {
        EventCommon {
            service_token: "token".to_string(),
            response_url: "url".to_string(),
            stack_id: "stack".to_string(),
            request_id: "request".to_string(),
            logical_resource_id: "resource".to_string(),
            resource_type: "Custom::SqlRun".to_string(),
            resource_properties,
        }
    }

    fn sql<'a>(statements: &[&'a SqlStatement]) -> Vec<&'a str> {
        statements.iter().map(|statement| statement.sql.as_str()).collect()
    }

    #[test]
    fn create_runs_up() {
        let event = LifecycleEvent::Create(CreateEvent {
            common: common(properties(&["create"], Some(&["drop"]))),
        });
        assert_eq!(sql(&statements_for(&event)), vec!["create"]);
    }

    #[test]
    fn update_runs_old_down_then_new_up() {
        let event = LifecycleEvent::Update(UpdateEvent {
            common: common(properties(&["create v2"], Some(&["drop v2"]))),
            physical_resource_id: "id".to_string(),
            old_resource_properties: properties(&["create v1"], Some(&["drop v1", "cleanup v1"])),
        });
        assert_eq!(
            sql(&statements_for(&event)),
            vec!["drop v1", "cleanup v1", "create v2"]
        );
    }

    #[test]
    fn delete_without_down_runs_nothing() {
        let event = LifecycleEvent::Delete(DeleteEvent {
            common: common(properties(&["create"], None)),
            physical_resource_id: "id".to_string(),
        });
        assert!(statements_for(&event).is_empty());
    }
}
