//! The properties of a `Custom::SqlRun` resource.
//!
//! The same shape arrives twice in an update event: once as the new properties and
//! once as the old ones.

use indexmap::IndexMap;
use schemars::{gen::SchemaSettings, schema::RootSchema, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::connection_settings::ConnectionDescriptor;
use crate::values::ParameterValue;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ResourceProperties {
    /// Copied into the properties by the orchestrator. Not used.
    #[serde(
        rename = "ServiceToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub service_token: Option<String>,
    pub connection: ConnectionDescriptor,
    /// Statements applied when the resource is created or updated.
    pub up: StatementBatch,
    /// Statements reverting `up`, applied when the resource is deleted or replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<StatementBatch>,
}

/// An ordered list of statements, run in a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct StatementBatch {
    pub run: Vec<SqlStatement>,
}

/// A SQL template with `:name` placeholders and the values bound to them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct SqlStatement {
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, ParameterValue>>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        SqlStatement {
            sql: sql.into(),
            parameters: None,
        }
    }

    /// Add a named parameter, keeping insertion order.
    #[must_use]
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Self {
        self.parameters
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }
}

impl StatementBatch {
    pub fn new(run: Vec<SqlStatement>) -> Self {
        StatementBatch { run }
    }
}

impl From<Vec<SqlStatement>> for StatementBatch {
    fn from(run: Vec<SqlStatement>) -> Self {
        StatementBatch { run }
    }
}

/// The JSON schema of the resource properties, for the construct layer.
pub fn properties_schema() -> RootSchema {
    SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<ResourceProperties>()
}
